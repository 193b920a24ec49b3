//! Procedural legged locomotion for skitter bodies.
//!
//! A [`SpiderBody`](body::SpiderBody) is ticked at a fixed rate against a
//! [`GroundQuery`](skitter_core::traits::GroundQuery). Each tick runs an
//! explicit, ordered list of passes:
//!
//! ```text
//!   DesiredMotion
//!        │
//!        ▼
//!   steer ──► integrate (drag, gravity, support, collision)
//!        │
//!        ▼
//!   orientation ──► leg memo (all legs) ──► gallop roles
//!        │
//!        ▼
//!   per leg, diagonal group order:
//!     target ──► follow body ──► gait policy ──► step
//!        │
//!        ▼
//!   chain solve (all legs) ──► stabilizer (support for next tick)
//! ```
//!
//! Events raised along the way are queued on the body and drained by the
//! caller.

pub mod behaviour;
pub mod body;
pub mod leg;
pub mod snapshot;
pub mod stabilizer;

pub mod prelude {
    pub use crate::behaviour::Behaviour;
    pub use crate::body::SpiderBody;
    pub use crate::leg::{BodyFrame, Leg, LegContact, LegState, LegTarget};
    pub use crate::snapshot::{BodySnapshot, LegSnapshot};
    pub use crate::stabilizer::{BodyStabilizer, NormalInfo};
    pub use skitter_gait::LegStatus;
}
