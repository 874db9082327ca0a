//! Level layout and lane traffic
//!
//! A layout is an immutable blueprint; `Level` is its runtime instance.
//! Lanes keep a stream of moving entities alive: anything that leaves the
//! play width is despawned and fresh entities (with new ids) enter from the
//! upstream edge at a fixed cadence. Difficulty scales speed and cadence.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, SurfaceKind};
use super::motion::Pose;

/// One row of moving entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneSpec {
    pub name: String,
    pub kind: SurfaceKind,
    /// Lane centre on the forward axis
    pub z: f32,
    /// Signed speed along +X at difficulty 1.0
    pub speed: f32,
    /// Entity length along X
    pub length: f32,
    /// Distance between entity centres at difficulty 1.0
    pub spacing: f32,
}

/// A static box surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceSpec {
    pub name: String,
    pub kind: SurfaceKind,
    pub center: Vec3,
    pub half_extents: Vec3,
}

/// Level blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelLayout {
    pub id: String,
    /// Spawn transform; the origin is used when absent
    pub spawn: Option<Pose>,
    /// Play area spans x in [-half_width, half_width]
    pub half_width: f32,
    pub surfaces: Vec<SurfaceSpec>,
    pub lanes: Vec<LaneSpec>,
    /// Completion point centres
    pub finish_points: Vec<Vec3>,
}

impl LevelLayout {
    /// Classic crossing: a road of cars, a median, a river of logs, five homes
    pub fn classic() -> Self {
        let half_width = 6.5;
        let width = half_width * 2.0;
        let strip = |name: &str, kind: SurfaceKind, z0: f32, z1: f32| SurfaceSpec {
            name: name.to_string(),
            kind,
            center: Vec3::new(0.0, 0.0, (z0 + z1) / 2.0),
            half_extents: Vec3::new(half_width, 0.5, (z1 - z0) / 2.0),
        };

        let mut surfaces = vec![
            strip("start-bank", SurfaceKind::Land, -0.5, 0.5),
            strip("median", SurfaceKind::Land, 5.5, 6.5),
            strip("river", SurfaceKind::Water, 6.5, 11.5),
            strip("home-row", SurfaceKind::Water, 11.5, 12.5),
            strip("south-edge", SurfaceKind::Deadzone, -2.5, -0.5),
        ];
        // Side walls outside the play width
        for (name, x) in [("west-edge", -half_width - 1.0), ("east-edge", half_width + 1.0)] {
            surfaces.push(SurfaceSpec {
                name: name.to_string(),
                kind: SurfaceKind::Deadzone,
                center: Vec3::new(x, 0.0, 6.0),
                half_extents: Vec3::new(0.5, 0.5, 7.0),
            });
        }

        let lane = |name: &str, kind: SurfaceKind, z: f32, speed: f32, length: f32, spacing: f32| LaneSpec {
            name: name.to_string(),
            kind,
            z,
            speed,
            length,
            spacing,
        };
        let lanes = vec![
            lane("car", SurfaceKind::Obstacle, 1.0, -2.0, 1.0, 4.5),
            lane("truck", SurfaceKind::Obstacle, 2.0, 1.5, 2.0, 6.0),
            lane("car", SurfaceKind::Obstacle, 3.0, -3.0, 1.0, 5.0),
            lane("racer", SurfaceKind::Obstacle, 4.0, 4.0, 1.0, 7.0),
            lane("truck", SurfaceKind::Obstacle, 5.0, -1.5, 2.0, 6.5),
            lane("log", SurfaceKind::Wood, 7.0, 1.5, 3.0, 5.0),
            lane("log", SurfaceKind::Wood, 8.0, -2.0, 4.0, 6.0),
            lane("log", SurfaceKind::Wood, 9.0, 1.0, 3.0, 4.5),
            lane("log", SurfaceKind::Wood, 10.0, -1.5, 5.0, 7.0),
            lane("log", SurfaceKind::Wood, 11.0, 2.0, 3.0, 5.5),
        ];

        let finish_points = (0..5)
            .map(|i| Vec3::new(-width / 2.0 + 1.5 + i as f32 * 2.5, 0.0, 12.0))
            .collect();

        Self {
            id: "classic".to_string(),
            spawn: Some(Pose::at(Vec3::ZERO)),
            half_width,
            surfaces,
            lanes,
            finish_points,
        }
    }
}

/// A completion point in the level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishPoint {
    pub entity: EntityId,
    pub done: bool,
}

impl FinishPoint {
    /// Mark as done. Returns true only for the first call.
    pub fn mark_done(&mut self) -> bool {
        if self.done {
            return false;
        }
        self.done = true;
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LaneRuntime {
    spec: LaneSpec,
    velocity: Vec3,
    /// Seconds between spawns
    interval: f32,
    timer: f32,
}

/// Runtime level instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub layout: LevelLayout,
    pub entities: Vec<Entity>,
    pub finish_points: Vec<FinishPoint>,
    /// Shown once the game is finally complete
    pub finish_marker_visible: bool,
    lanes: Vec<LaneRuntime>,
    next_id: EntityId,
}

impl Level {
    /// Instantiate a layout with lanes pre-populated across the play width
    pub fn load(layout: LevelLayout, difficulty: f32) -> Self {
        let mut level = Self {
            layout: layout.clone(),
            entities: Vec::new(),
            finish_points: Vec::new(),
            finish_marker_visible: false,
            lanes: Vec::new(),
            next_id: 1,
        };

        for surface in &layout.surfaces {
            let id = level.next_entity_id();
            level
                .entities
                .push(Entity::new(id, surface.name.clone(), surface.kind, surface.center, surface.half_extents));
        }

        for (i, center) in layout.finish_points.iter().enumerate() {
            let id = level.next_entity_id();
            level.entities.push(Entity::new(
                id,
                format!("finish-{i}"),
                SurfaceKind::Finish,
                *center,
                Vec3::new(0.5, 0.5, 0.5),
            ));
            level.finish_points.push(FinishPoint {
                entity: id,
                done: false,
            });
        }

        for spec in &layout.lanes {
            let speed = spec.speed * difficulty;
            let interval = if speed.abs() > f32::EPSILON {
                spec.spacing / difficulty / speed.abs()
            } else {
                f32::INFINITY
            };
            let runtime = LaneRuntime {
                spec: spec.clone(),
                velocity: Vec3::new(speed, 0.0, 0.0),
                interval,
                timer: interval,
            };

            // Fill the lane so the level does not start empty
            let spacing = spec.spacing / difficulty;
            let mut x = -layout.half_width;
            while x <= layout.half_width && spacing > 0.0 {
                level.spawn_in_lane(&runtime, x);
                x += spacing;
            }
            level.lanes.push(runtime);
        }

        log::debug!(
            "Level {} loaded: {} entities, {} finish points",
            layout.id,
            level.entities.len(),
            level.finish_points.len()
        );
        level
    }

    /// Spawn pose from the layout (origin when missing)
    pub fn spawn_pose(&self) -> Pose {
        self.layout.spawn.unwrap_or_default()
    }

    pub fn id(&self) -> &str {
        &self.layout.id
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Add an entity (tests and scripted levels)
    pub fn spawn(&mut self, name: impl Into<String>, kind: SurfaceKind, pos: Vec3, half_extents: Vec3, vel: Vec3) -> EntityId {
        let id = self.next_entity_id();
        self.entities
            .push(Entity::new(id, name, kind, pos, half_extents).with_velocity(vel));
        id
    }

    pub fn despawn(&mut self, id: EntityId) {
        self.entities.retain(|e| e.id != id);
    }

    /// Mark the completion point backed by `entity`. Returns true the
    /// first time only.
    pub fn mark_finish_done(&mut self, entity: EntityId) -> bool {
        self.finish_points
            .iter_mut()
            .find(|p| p.entity == entity)
            .map(|p| p.mark_done())
            .unwrap_or(false)
    }

    /// Move traffic, despawn what left the play area, spawn new arrivals
    pub fn advance(&mut self, dt: f32) {
        for entity in &mut self.entities {
            entity.advance(dt);
        }

        let limit = self.layout.half_width + 2.0;
        self.entities.retain(|e| {
            e.vel == Vec3::ZERO || e.pos.x.abs() - e.half_extents.x <= limit
        });

        let mut due = Vec::new();
        for (i, lane) in self.lanes.iter_mut().enumerate() {
            lane.timer -= dt;
            if lane.timer <= 0.0 {
                lane.timer += lane.interval;
                due.push(i);
            }
        }
        for i in due {
            let lane = self.lanes[i].clone();
            let half_length = lane.spec.length / 2.0;
            let edge = self.layout.half_width + half_length;
            let x = if lane.velocity.x >= 0.0 { -edge } else { edge };
            self.spawn_in_lane(&lane, x);
        }
    }

    fn spawn_in_lane(&mut self, lane: &LaneRuntime, x: f32) {
        let id = self.next_entity_id();
        let entity = Entity::new(
            id,
            lane.spec.name.clone(),
            lane.spec.kind,
            Vec3::new(x, 0.0, lane.spec.z),
            Vec3::new(lane.spec.length / 2.0, 0.5, 0.45),
        )
        .with_velocity(lane.velocity);
        self.entities.push(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_layout() -> LevelLayout {
        LevelLayout {
            id: "empty".to_string(),
            spawn: None,
            half_width: 5.0,
            surfaces: Vec::new(),
            lanes: Vec::new(),
            finish_points: Vec::new(),
        }
    }

    #[test]
    fn test_missing_spawn_defaults_to_origin() {
        let level = Level::load(empty_layout(), 1.0);
        assert_eq!(level.spawn_pose(), Pose::default());
        assert!(level.finish_points.is_empty());
    }

    #[test]
    fn test_classic_layout_loads() {
        let level = Level::load(LevelLayout::classic(), 1.0);
        assert_eq!(level.finish_points.len(), 5);
        assert!(level.entities.iter().any(|e| e.kind == SurfaceKind::Wood));
        assert!(level.entities.iter().any(|e| e.kind == SurfaceKind::Obstacle));
    }

    #[test]
    fn test_finish_point_done_is_idempotent() {
        let mut layout = empty_layout();
        layout.finish_points.push(Vec3::new(0.0, 0.0, 3.0));
        let mut level = Level::load(layout, 1.0);
        let entity = level.finish_points[0].entity;
        assert!(level.mark_finish_done(entity));
        assert!(!level.mark_finish_done(entity));
        assert!(level.finish_points[0].done);
    }

    #[test]
    fn test_lane_recycles_entities() {
        let mut layout = empty_layout();
        layout.lanes.push(LaneSpec {
            name: "car".to_string(),
            kind: SurfaceKind::Obstacle,
            z: 1.0,
            speed: 5.0,
            length: 1.0,
            spacing: 5.0,
        });
        let mut level = Level::load(layout, 1.0);
        let first_ids: Vec<_> = level.entities.iter().map(|e| e.id).collect();
        for _ in 0..600 {
            level.advance(1.0 / 60.0);
        }
        assert!(!level.entities.is_empty());
        assert!(level.entities.iter().all(|e| !first_ids.contains(&e.id)));
        assert!(level.entities.iter().all(|e| e.pos.x.abs() <= 5.0 + 2.5 + 0.2));
    }

    #[test]
    fn test_difficulty_scales_lane_speed() {
        let mut layout = empty_layout();
        layout.lanes.push(LaneSpec {
            name: "log".to_string(),
            kind: SurfaceKind::Wood,
            z: 2.0,
            speed: -2.0,
            length: 3.0,
            spacing: 6.0,
        });
        let level = Level::load(layout, 1.5);
        assert!(level.entities.iter().all(|e| (e.vel.x + 3.0).abs() < 1e-5));
    }
}
