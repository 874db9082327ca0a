//! Event records exchanged between the player and the session controller
//!
//! Records are immutable once built and serialize to the camelCase JSON
//! layout consumed by the web page.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sim::{ContactPhase, EntityId, SurfaceKind};

/// Where and when an event happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStamp {
    pub level: String,
    pub reset_index: u32,
    /// Seconds since the cycle started
    pub time: f32,
}

/// One completed step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementEvent {
    #[serde(flatten)]
    pub stamp: EventStamp,
    pub from: Vec3,
    pub to: Vec3,
    pub direction: Vec3,
    /// True for instant grid jumps, false for rolls
    pub instant: bool,
    pub step_size: f32,
}

impl MovementEvent {
    /// Step toward +Z
    pub fn is_forward(&self) -> bool {
        self.direction.z > 0.5
    }

    /// Step toward -Z
    pub fn is_backward(&self) -> bool {
        self.direction.z < -0.5
    }
}

/// A collision/trigger transition against a named entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionEvent {
    #[serde(flatten)]
    pub stamp: EventStamp,
    pub other: String,
    pub tag: SurfaceKind,
    pub phase: ContactPhase,
}

/// Per-cycle summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSummary {
    pub level: String,
    pub reset_index: u32,
    pub duration_seconds: f32,
    pub deaths: u32,
    pub score: u64,
}

/// Everything delivered to the session controller
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayerMoved(MovementEvent),
    PlayerCollision(CollisionEvent),
    PlayerDeath,
    PlayerReachedFinish,
    /// A completion point switched to Done (first time only)
    CompletionPointDone(EntityId),
}
