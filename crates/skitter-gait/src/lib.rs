//! Step policies for skitter bodies.
//!
//! A policy answers one question per leg per tick: may this idle leg begin a
//! step now? Answers depend on the fixed [`LegTopology`], the per-leg
//! [`LegStatus`] of every leg (including legs updated earlier in the same
//! tick) and a small [`GaitContext`].
//!
//! - [`WalkPolicy`]: diagonal alternation gated by adjacency and cooldowns.
//! - [`GallopPolicy`]: left/right pairs with a leading and a trailing leg.

pub mod gallop;
pub mod status;
pub mod topology;
pub mod walk;

use skitter_core::config::{Gait, GaitKind};

pub use gallop::{GallopPolicy, assign_primaries};
pub use status::LegStatus;
pub use topology::LegTopology;
pub use walk::WalkPolicy;

/// Body-wide inputs to a step decision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GaitContext {
    /// Horizontal body speed this tick.
    pub speed: f64,
    /// The body itself rests on the ground.
    pub body_on_ground: bool,
}

/// The step policy selected by a [`Gait`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GaitPolicy {
    Walk(WalkPolicy),
    Gallop(GallopPolicy),
}

impl GaitPolicy {
    pub const fn from_gait(gait: &Gait) -> Self {
        match gait.kind {
            GaitKind::Walk => Self::Walk(WalkPolicy::from_gait(gait)),
            GaitKind::Gallop => Self::Gallop(GallopPolicy::from_gait(gait)),
        }
    }

    /// Whether `leg` may begin a step this tick.
    pub fn can_move_leg<L: LegStatus>(
        &self,
        legs: &[L],
        leg: usize,
        topology: &LegTopology,
        context: &GaitContext,
    ) -> bool {
        match self {
            Self::Walk(walk) => walk.can_move_leg(legs, leg, topology, context),
            Self::Gallop(gallop) => gallop.can_move_leg(legs, leg, topology, context),
        }
    }

    pub const fn kind(&self) -> GaitKind {
        match self {
            Self::Walk(_) => GaitKind::Walk,
            Self::Gallop(_) => GaitKind::Gallop,
        }
    }
}

pub mod prelude {
    pub use crate::{
        GaitContext, GaitPolicy, GallopPolicy, LegStatus, LegTopology, WalkPolicy,
        assign_primaries,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_follows_gait_kind() {
        assert_eq!(GaitPolicy::from_gait(&Gait::walk()).kind(), GaitKind::Walk);
        assert_eq!(
            GaitPolicy::from_gait(&Gait::gallop()).kind(),
            GaitKind::Gallop
        );
    }

    #[test]
    fn gallop_policy_carries_walk_fallback() {
        let gait = Gait {
            walk_cooldown: 9,
            ..Gait::gallop()
        };
        let GaitPolicy::Gallop(gallop) = GaitPolicy::from_gait(&gait) else {
            panic!("expected gallop policy");
        };
        assert_eq!(gallop.walk.cooldown, 9);
    }
}
