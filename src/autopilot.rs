//! Scripted player for headless runs
//!
//! Hops forward when the next cell stays clear of traffic and dry for the
//! length of a hop. Sidesteps toward the middle when its carrier is about
//! to leave the play area, dodges when the current cell is about to be hit,
//! and otherwise waits.

use glam::Vec3;

use crate::consts::PLAYER_HALF_EXTENT;
use crate::settings::Settings;
use crate::sim::{Aabb, Direction, SurfaceKind, TickInput, World};

/// Samples taken across the lookahead window
const SAMPLES: usize = 4;
/// Distance from the play area edge at which a rider steps inwards
const EDGE_MARGIN: f32 = 1.5;

#[derive(Debug, Clone)]
pub struct Autopilot {
    step_size: f32,
    lookahead: f32,
    released: bool,
}

impl Autopilot {
    pub fn new(settings: &Settings) -> Self {
        Self {
            step_size: settings.step_size,
            lookahead: settings.roll_duration + 0.15,
            released: true,
        }
    }

    /// Input for the next tick
    pub fn next_input(&mut self, world: &World) -> TickInput {
        // A held direction fires once, so release between hops
        if !self.released {
            self.released = true;
            return TickInput::default();
        }
        if !world.player.is_idle() {
            return TickInput::default();
        }
        match self.choose(world) {
            Some(dir) => {
                self.released = false;
                TickInput::held(dir)
            }
            None => TickInput::default(),
        }
    }

    fn choose(&self, world: &World) -> Option<Direction> {
        let here = world.player.pose.position;
        let edge = world.level.layout.half_width - EDGE_MARGIN;

        let drifting_out = world
            .player
            .carrier()
            .and_then(|id| world.level.entity(id))
            .is_some_and(|e| here.x.abs() > edge && here.x * e.vel.x > 0.0);
        if drifting_out {
            let inwards = if here.x > 0.0 { Direction::Left } else { Direction::Right };
            if self.is_safe(world, here + inwards.to_vec3() * self.step_size) {
                return Some(inwards);
            }
        }

        let ahead = here + Direction::Forward.to_vec3() * self.step_size;
        if self.is_safe(world, ahead) {
            return Some(Direction::Forward);
        }

        if self.is_safe(world, here) {
            return None;
        }
        [Direction::Left, Direction::Right, Direction::Back]
            .into_iter()
            .find(|dir| self.is_safe(world, here + dir.to_vec3() * self.step_size))
    }

    /// Whether standing on `target` survives the next hop's worth of time
    fn is_safe(&self, world: &World, target: Vec3) -> bool {
        if target.x.abs() > world.level.layout.half_width {
            return false;
        }
        let player = Aabb::from_center(target, Vec3::splat(PLAYER_HALF_EXTENT * self.step_size));

        for k in 0..=SAMPLES {
            let t = self.lookahead * k as f32 / SAMPLES as f32;
            let mut wet = false;
            let mut supported = false;
            for entity in &world.level.entities {
                let predicted = Aabb::from_center(entity.pos + entity.vel * t, entity.half_extents);
                if !player.overlaps(&predicted) {
                    continue;
                }
                match entity.kind {
                    SurfaceKind::Obstacle | SurfaceKind::Deadzone => return false,
                    SurfaceKind::Water => wet = true,
                    kind if kind.supports() => supported = true,
                    _ => {}
                }
            }
            // Only the landing sample has to be dry
            if k == SAMPLES && wet && !supported {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::session::{MemorySink, Session};
    use crate::sim::{GamePhase, LevelLayout, Pose, SurfaceSpec, tick};

    fn layout() -> LevelLayout {
        let strip = |name: &str, kind: SurfaceKind, z: f32| SurfaceSpec {
            name: name.to_string(),
            kind,
            center: Vec3::new(0.0, 0.0, z),
            half_extents: Vec3::new(5.0, 0.5, 0.5),
        };
        LevelLayout {
            id: "lane".to_string(),
            spawn: Some(Pose::at(Vec3::ZERO)),
            half_width: 5.0,
            surfaces: vec![
                strip("bank", SurfaceKind::Land, 0.0),
                strip("road", SurfaceKind::Land, 1.0),
                strip("grass", SurfaceKind::Land, 2.0),
            ],
            lanes: Vec::new(),
            finish_points: vec![Vec3::new(0.0, 0.0, 3.0)],
        }
    }

    fn setup(settings: &Settings) -> (World, Session) {
        let world = World::new(layout(), settings);
        let sink = MemorySink::new();
        let session = Session::new(
            world.level.id().to_string(),
            settings,
            world.completion_points(),
            Box::new(sink.clone()),
            Box::new(sink),
        );
        (world, session)
    }

    #[test]
    fn test_walks_an_empty_level_to_completion() {
        for juicy in [true, false] {
            let settings = Settings {
                juicy,
                total_level_resets: 0,
                ..Default::default()
            };
            let (mut world, mut session) = setup(&settings);
            let mut pilot = Autopilot::new(&settings);
            for _ in 0..2000 {
                if world.phase == GamePhase::Complete {
                    break;
                }
                let input = pilot.next_input(&world);
                tick(&mut world, &mut session, &input, SIM_DT);
            }
            assert_eq!(world.phase, GamePhase::Complete, "juicy={juicy}");
            assert_eq!(session.totals().total_deaths, 0);
        }
    }

    #[test]
    fn test_waits_for_oncoming_traffic() {
        let settings = Settings::default();
        let (mut world, _) = setup(&settings);
        world.level.spawn(
            "car",
            SurfaceKind::Obstacle,
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(0.5, 0.5, 0.45),
            Vec3::new(4.0, 0.0, 0.0),
        );
        let pilot = Autopilot::new(&settings);
        assert_eq!(pilot.choose(&world), None);
    }

    #[test]
    fn test_releases_between_hops() {
        let settings = Settings {
            juicy: false,
            ..Default::default()
        };
        let (world, _) = setup(&settings);
        let mut pilot = Autopilot::new(&settings);
        assert_eq!(pilot.next_input(&world).direction, Some(Direction::Forward));
        assert_eq!(pilot.next_input(&world).direction, None);
    }

    #[test]
    fn test_refuses_open_water() {
        let settings = Settings::default();
        let (mut world, _) = setup(&settings);
        world.level.spawn(
            "river",
            SurfaceKind::Water,
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::new(5.0, 0.5, 0.5),
            Vec3::ZERO,
        );
        let pilot = Autopilot::new(&settings);
        // Clear of the finish home at x = 0
        assert!(!pilot.is_safe(&world, Vec3::new(4.0, 0.0, 3.0)));
        assert!(pilot.is_safe(&world, Vec3::new(4.0, 0.0, 2.0)));
    }
}
