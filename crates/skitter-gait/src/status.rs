//! Read-only view of a leg used by the step policies.

/// The per-leg state a gait policy reads.
///
/// Implemented by the locomotion crate's `Leg`; policies never mutate legs.
pub trait LegStatus {
    /// Actively stepping toward its target.
    fn is_moving(&self) -> bool;
    /// Forced up by an external command.
    fn is_disabled(&self) -> bool;
    /// Whether the current target is a ground foothold.
    fn target_grounded(&self) -> bool;
    /// Whether the foot currently rests on ground.
    fn touching_ground(&self) -> bool;
    /// Whether the foot has left its trigger zone.
    fn outside_trigger_zone(&self) -> bool;
    /// Ticks since this leg last began a step.
    fn time_since_begin_move(&self) -> u32;
    /// Gallop role for this tick.
    fn is_primary(&self) -> bool;
    /// Whether the foot already sits on its target.
    fn at_target(&self) -> bool;

    /// Planted and bearing weight.
    fn is_grounded(&self) -> bool {
        self.touching_ground() && !self.is_moving() && !self.is_disabled()
    }

    /// Able to support a pair partner: enabled with a ground target.
    fn has_footing(&self) -> bool {
        !self.is_disabled() && self.target_grounded()
    }

    /// Motivated to step: out of its trigger zone or off the ground, and not
    /// already on its target.
    fn wants_to_move(&self) -> bool {
        (self.outside_trigger_zone() || !self.touching_ground()) && !self.at_target()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::LegStatus;

    /// Plain leg state for policy tests.
    #[derive(Debug, Clone, Copy)]
    pub struct MockLeg {
        pub moving: bool,
        pub disabled: bool,
        pub target_grounded: bool,
        pub touching_ground: bool,
        pub outside_trigger: bool,
        pub since_begin: u32,
        pub primary: bool,
        pub at_target: bool,
    }

    impl MockLeg {
        /// Planted inside its trigger zone, idle for a long time.
        pub const fn planted() -> Self {
            Self {
                moving: false,
                disabled: false,
                target_grounded: true,
                touching_ground: true,
                outside_trigger: false,
                since_begin: 100,
                primary: false,
                at_target: false,
            }
        }

        /// Planted but out of its trigger zone.
        pub const fn restless() -> Self {
            Self {
                outside_trigger: true,
                ..Self::planted()
            }
        }

        /// Mid-step, started `since_begin` ticks ago.
        pub const fn stepping(since_begin: u32) -> Self {
            Self {
                moving: true,
                touching_ground: false,
                since_begin,
                ..Self::planted()
            }
        }
    }

    impl LegStatus for MockLeg {
        fn is_moving(&self) -> bool {
            self.moving
        }
        fn is_disabled(&self) -> bool {
            self.disabled
        }
        fn target_grounded(&self) -> bool {
            self.target_grounded
        }
        fn touching_ground(&self) -> bool {
            self.touching_ground
        }
        fn outside_trigger_zone(&self) -> bool {
            self.outside_trigger
        }
        fn time_since_begin_move(&self) -> u32 {
            self.since_begin
        }
        fn is_primary(&self) -> bool {
            self.primary
        }
        fn at_target(&self) -> bool {
            self.at_target
        }
    }
}
