//! Fixed timestep simulation tick
//!
//! One call is one frame: the update pass samples input, the fixed pass
//! moves traffic and the player, then contacts are diffed and handled. Every
//! event the player published is delivered to the session before the tick
//! returns, and the session's directives are applied.

use super::motion::Direction;
use super::player::ContactOutcome;
use super::state::{GamePhase, World};
use crate::session::{Directive, ReloadReason, Session};

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Cardinal direction currently held, if any
    pub direction: Option<Direction>,
}

impl TickInput {
    pub fn held(direction: Direction) -> Self {
        Self {
            direction: Some(direction),
        }
    }
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, session: &mut Session, input: &TickInput, dt: f32) {
    // Startup may already have produced directives (level without points)
    apply_directives(world, session);

    if world.phase == GamePhase::Complete {
        return;
    }

    world.time_ticks += 1;
    session.advance(dt);
    let stamp = session.stamp();

    // Update pass
    world.player.handle_input(input.direction);

    // Fixed pass
    world.level.advance(dt);
    world
        .player
        .fixed_update(dt, &world.level, &mut world.contacts, &stamp);

    if world.player.body().collider_enabled {
        let transitions = world
            .contacts
            .update(&world.player.aabb(), &world.level.entities);
        let outcome = world
            .player
            .on_contacts(&transitions, &mut world.level, &mut world.contacts, &stamp);
        if outcome == ContactOutcome::Continue {
            world
                .player
                .check_water(&world.level, &mut world.contacts, &stamp);
        }
    }

    for event in world.player.drain_events() {
        session.handle(event);
    }
    apply_directives(world, session);
}

/// Apply session directives until none are left (a reload can complete a
/// level without points straight away)
fn apply_directives(world: &mut World, session: &mut Session) {
    loop {
        let directives = session.take_directives();
        if directives.is_empty() {
            return;
        }

        if directives.contains(&Directive::FinishGame) {
            world.finish();
            log::info!("All cycles of {} done", world.level.id());
            return;
        }
        if directives.contains(&Directive::ReloadLevel) {
            world.reload_level();
            session.begin_cycle(ReloadReason::LevelCompleted, world.completion_points());
            world.respawn_player(&session.stamp());
        } else if directives.contains(&Directive::RespawnPlayer) {
            world.respawn_player(&session.stamp());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FINISH_BONUS, MAX_LIVES, SIM_DT, STEP_SCORE};
    use crate::session::MemorySink;
    use crate::settings::Settings;
    use crate::sim::{LevelLayout, Pose, SurfaceKind, SurfaceSpec};
    use glam::Vec3;

    fn strip(name: &str, kind: SurfaceKind, z: f32) -> SurfaceSpec {
        SurfaceSpec {
            name: name.to_string(),
            kind,
            center: Vec3::new(0.0, 0.0, z),
            half_extents: Vec3::new(5.0, 0.5, 0.5),
        }
    }

    /// Spawn on a bank, two rows of ground, a single home on row 3
    fn short_layout() -> LevelLayout {
        LevelLayout {
            id: "short".to_string(),
            spawn: Some(Pose::at(Vec3::ZERO)),
            half_width: 5.0,
            surfaces: vec![
                strip("bank", SurfaceKind::Land, 0.0),
                strip("grass", SurfaceKind::Land, 1.0),
                strip("grass", SurfaceKind::Land, 2.0),
            ],
            lanes: Vec::new(),
            finish_points: vec![Vec3::new(0.0, 0.0, 3.0)],
        }
    }

    fn setup(settings: &Settings, layout: LevelLayout) -> (World, Session, MemorySink) {
        let sink = MemorySink::new();
        let world = World::new(layout, settings);
        let session = Session::new(
            world.level.id().to_string(),
            settings,
            world.completion_points(),
            Box::new(sink.clone()),
            Box::new(sink.clone()),
        );
        (world, session, sink)
    }

    /// Press a direction, then release until the player is idle again
    fn hop(world: &mut World, session: &mut Session, dir: Direction) {
        tick(world, session, &TickInput::held(dir), SIM_DT);
        for _ in 0..60 {
            if world.player.is_idle() {
                break;
            }
            tick(world, session, &TickInput::default(), SIM_DT);
        }
        tick(world, session, &TickInput::default(), SIM_DT);
    }

    #[test]
    fn test_walk_to_finish_completes_cycle() {
        for juicy in [true, false] {
            let settings = Settings {
                juicy,
                total_level_resets: 0,
                ..Default::default()
            };
            let (mut world, mut session, sink) = setup(&settings, short_layout());

            for _ in 0..3 {
                hop(&mut world, &mut session, Direction::Forward);
            }

            assert_eq!(world.phase, GamePhase::Complete, "juicy={juicy}");
            assert!(world.level.finish_marker_visible);
            let summary = session.last_summary().unwrap();
            assert_eq!(summary.deaths, 0);
            // The final roll is interrupted by the finish in rolling mode
            let steps = if juicy { 2 } else { 3 };
            assert_eq!(summary.score, steps * STEP_SCORE + FINISH_BONUS);
            assert_eq!(sink.cycles().len(), 1);
        }
    }

    #[test]
    fn test_finish_respawns_player() {
        let mut layout = short_layout();
        layout.finish_points.push(Vec3::new(3.0, 0.0, 3.0));
        let settings = Settings {
            juicy: false,
            ..Default::default()
        };
        let (mut world, mut session, _) = setup(&settings, layout);
        for _ in 0..3 {
            hop(&mut world, &mut session, Direction::Forward);
        }
        assert_eq!(world.player.pose, world.player.spawn_pose());
        assert_eq!(world.phase, GamePhase::Playing);
        assert_eq!(session.scores().committed, 3 * STEP_SCORE + FINISH_BONUS);
        assert_eq!(session.completion().done_count(), 1);
        // Landed back on the bank
        assert!(world.player.carrier().is_some());
    }

    #[test]
    fn test_completions_cycle_through_resets() {
        let settings = Settings {
            juicy: false,
            total_level_resets: 3,
            ..Default::default()
        };
        let (mut world, mut session, sink) = setup(&settings, short_layout());
        for cycle in 0..4 {
            assert_eq!(session.reset_index(), cycle);
            for _ in 0..3 {
                hop(&mut world, &mut session, Direction::Forward);
            }
        }
        assert_eq!(world.phase, GamePhase::Complete);
        assert_eq!(sink.cycles().len(), 4);
        // Four summaries plus the totals
        assert_eq!(sink.messages().len(), 5);
        assert_eq!(session.totals().levels_cleared, 4);
    }

    #[test]
    fn test_knockback_blocks_input_and_costs_one_life() {
        let settings = Settings {
            juicy: true,
            ..Default::default()
        };
        let (mut world, mut session, _) = setup(&settings, short_layout());
        world.level.spawn(
            "car",
            SurfaceKind::Obstacle,
            Vec3::new(1.5, 0.0, 0.0),
            Vec3::splat(0.5),
            Vec3::new(-4.0, 0.0, 0.0),
        );

        let mut ticks = 0;
        while !world.player.is_flung_off() {
            tick(&mut world, &mut session, &TickInput::default(), SIM_DT);
            ticks += 1;
            assert!(ticks < 60);
        }
        assert_eq!(session.lives(), MAX_LIVES - 1);

        let steps_before = session.movements().len();
        while world.player.is_flung_off() {
            tick(&mut world, &mut session, &TickInput::held(Direction::Forward), SIM_DT);
            assert!(!world.player.is_rolling());
            ticks += 1;
            assert!(ticks < 400);
        }
        assert_eq!(session.movements().len(), steps_before);
        assert_eq!(world.player.pose, world.player.spawn_pose());
        assert_eq!(session.lives(), MAX_LIVES - 1);
        assert_eq!(session.deaths(), 1);
    }

    #[test]
    fn test_three_deaths_reload_level() {
        let settings = Settings {
            juicy: false,
            total_level_resets: 1,
            ..Default::default()
        };
        let mut layout = short_layout();
        layout.surfaces.push(strip("edge", SurfaceKind::Deadzone, -1.0));
        let (mut world, mut session, sink) = setup(&settings, layout);

        for _ in 0..MAX_LIVES {
            hop(&mut world, &mut session, Direction::Back);
        }
        assert_eq!(session.reset_index(), 1);
        assert_eq!(session.lives(), MAX_LIVES);
        assert_eq!(session.deaths(), 0);
        let cycles = sink.cycles();
        assert_eq!(cycles.len(), 1);
        let summary: serde_json::Value = serde_json::from_str(&cycles[0].summary).unwrap();
        assert_eq!(summary["deaths"], 3);
        assert_eq!(world.phase, GamePhase::Playing);
    }

    #[test]
    fn test_obstacle_parked_on_spawn_kills() {
        let settings = Settings {
            juicy: false,
            total_level_resets: 1,
            ..Default::default()
        };
        let (mut world, mut session, sink) = setup(&settings, short_layout());
        world.level.spawn(
            "truck",
            SurfaceKind::Obstacle,
            Vec3::ZERO,
            Vec3::splat(0.5),
            Vec3::ZERO,
        );

        tick(&mut world, &mut session, &TickInput::default(), SIM_DT);
        assert_eq!(session.deaths(), 1);
        assert_eq!(session.lives(), MAX_LIVES - 1);

        // Still parked there after the respawn, so each tick costs a life
        let mut ticks = 1;
        while session.reset_index() == 0 {
            tick(&mut world, &mut session, &TickInput::default(), SIM_DT);
            ticks += 1;
            assert!(ticks <= MAX_LIVES as usize);
        }
        let cycles = sink.cycles();
        let summary: serde_json::Value = serde_json::from_str(&cycles[0].summary).unwrap();
        assert_eq!(summary["deaths"], MAX_LIVES);
    }

    #[test]
    fn test_every_enter_is_exited_across_a_death() {
        use crate::sim::ContactPhase;

        let settings = Settings {
            juicy: false,
            ..Default::default()
        };
        let mut layout = short_layout();
        layout.surfaces.push(strip("pond", SurfaceKind::Water, -1.0));
        let (mut world, mut session, _) = setup(&settings, layout);

        hop(&mut world, &mut session, Direction::Back);
        assert_eq!(session.deaths(), 1);
        assert_eq!(world.player.pose, world.player.spawn_pose());

        let mut open: std::collections::BTreeMap<String, i32> = Default::default();
        for c in session.collisions() {
            let n = open.entry(c.other.clone()).or_default();
            match c.phase {
                ContactPhase::Enter => *n += 1,
                ContactPhase::Exit => *n -= 1,
            }
            assert!((0..=1).contains(n), "{} {:?} out of order", c.other, c.phase);
        }
        // Only the bank the player respawned on is still open
        assert_eq!(open.get("pond"), Some(&0));
        assert_eq!(open.get("bank"), Some(&1));
        assert!(open.iter().all(|(name, n)| *n == 0 || name == "bank"));
    }

    #[test]
    fn test_level_without_points_finishes_on_first_tick() {
        let settings = Settings {
            total_level_resets: 2,
            ..Default::default()
        };
        let mut layout = short_layout();
        layout.finish_points.clear();
        let (mut world, mut session, sink) = setup(&settings, layout);
        tick(&mut world, &mut session, &TickInput::default(), SIM_DT);
        assert_eq!(world.phase, GamePhase::Complete);
        assert_eq!(sink.cycles().len(), 3);
    }

    #[test]
    fn test_collisions_are_logged() {
        let settings = Settings {
            juicy: false,
            ..Default::default()
        };
        let (mut world, mut session, _) = setup(&settings, short_layout());
        hop(&mut world, &mut session, Direction::Forward);
        let log = session.collisions();
        assert!(log.iter().any(|c| c.other == "bank" && c.phase == crate::sim::ContactPhase::Exit));
        assert!(log.iter().any(|c| c.other == "grass" && c.phase == crate::sim::ContactPhase::Enter));
        assert!(log.iter().all(|c| c.stamp.level == "short"));
    }

    #[test]
    fn test_riding_a_log_on_classic_layout() {
        let settings = Settings {
            juicy: false,
            ..Default::default()
        };
        let (mut world, mut session, _) = setup(&settings, crate::sim::LevelLayout::classic());
        // Stand on a log directly
        let log = world.level.spawn(
            "test-log",
            SurfaceKind::Wood,
            Vec3::new(0.0, 0.0, 9.0),
            Vec3::new(1.5, 0.5, 0.45),
            Vec3::new(1.0, 0.0, 0.0),
        );
        world.player.pose = Pose::at(Vec3::new(0.0, 0.0, 9.0));
        world.contacts.clear();
        for _ in 0..30 {
            tick(&mut world, &mut session, &TickInput::default(), SIM_DT);
        }
        assert_eq!(session.deaths(), 0);
        assert_eq!(world.player.carrier(), Some(log));
        // Riding starts on the first tick, after the log already moved once
        assert!((world.player.pose.position.x - 29.0 * SIM_DT).abs() < 1e-3);
        assert!(session.collisions().iter().any(|c| c.tag == SurfaceKind::Water));
    }
}
