//! Level entities: moving obstacles, carriers and static surfaces

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;

/// Stable entity identifier (never reused within a level load)
pub type EntityId = u32;

/// What a surface does to the player on contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    /// Kills on contact (cars, trucks)
    Obstacle,
    /// Solid ground; may move and carry the player
    Land,
    /// Floating log; carries the player
    Wood,
    /// Fatal unless something supports the player
    Water,
    /// Completion point
    Finish,
    /// Out-of-bounds volume
    Deadzone,
}

impl SurfaceKind {
    /// Surfaces the player rides along with
    pub fn is_carrier(self) -> bool {
        matches!(self, SurfaceKind::Land | SurfaceKind::Wood)
    }

    /// Surfaces that keep the player out of the water
    pub fn supports(self) -> bool {
        matches!(self, SurfaceKind::Land | SurfaceKind::Wood | SurfaceKind::Finish)
    }

    /// Surfaces with no reaction on contact beyond riding or sinking
    pub fn is_passive(self) -> bool {
        matches!(self, SurfaceKind::Land | SurfaceKind::Wood | SurfaceKind::Water)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceKind::Obstacle => "obstacle",
            SurfaceKind::Land => "land",
            SurfaceKind::Wood => "wood",
            SurfaceKind::Water => "water",
            SurfaceKind::Finish => "finish",
            SurfaceKind::Deadzone => "deadzone",
        }
    }
}

/// A box-shaped body with a position and a constant velocity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: SurfaceKind,
    pub pos: Vec3,
    pub vel: Vec3,
    pub half_extents: Vec3,
}

impl Entity {
    pub fn new(id: EntityId, name: impl Into<String>, kind: SurfaceKind, pos: Vec3, half_extents: Vec3) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            pos,
            vel: Vec3::ZERO,
            half_extents,
        }
    }

    pub fn with_velocity(mut self, vel: Vec3) -> Self {
        self.vel = vel;
        self
    }

    /// Integrate position by velocity
    pub fn advance(&mut self, dt: f32) {
        self.pos += self.vel * dt;
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, self.half_extents)
    }
}
