//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod knockback;
pub mod level;
pub mod motion;
pub mod player;
pub mod state;
pub mod tick;

pub use collision::{Aabb, Contact, ContactPhase, ContactTracker};
pub use entity::{Entity, EntityId, SurfaceKind};
pub use knockback::Knockback;
pub use level::{FinishPoint, LaneSpec, Level, LevelLayout, SurfaceSpec};
pub use motion::{Direction, Pose, Roll, snap_orientation};
pub use player::{BodyConstraints, CarrierLink, ContactOutcome, Motion, MovementMode, Player};
pub use state::{GamePhase, World};
pub use tick::{TickInput, tick};
