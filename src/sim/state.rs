//! World state: the loaded level, the player and its contact set

use serde::{Deserialize, Serialize};

use super::collision::ContactTracker;
use super::level::{Level, LevelLayout};
use super::player::Player;
use crate::session::EventStamp;
use crate::settings::Settings;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Cycles are still being played
    Playing,
    /// Every cycle is done; the finish marker is shown
    Complete,
}

/// Everything the simulation mutates
#[derive(Debug, Clone)]
pub struct World {
    pub phase: GamePhase,
    pub level: Level,
    pub player: Player,
    pub contacts: ContactTracker,
    /// Simulation tick counter
    pub time_ticks: u64,
    layout: LevelLayout,
    difficulty: f32,
}

impl World {
    /// Load the layout and place the player on its spawn pose. What the
    /// player starts on is logged at cycle 0, time 0.
    pub fn new(layout: LevelLayout, settings: &Settings) -> Self {
        let difficulty = settings.effective_difficulty();
        let level = Level::load(layout.clone(), difficulty);
        let player = Player::new(level.spawn_pose(), settings);
        let mut world = Self {
            phase: GamePhase::Playing,
            level,
            player,
            contacts: ContactTracker::new(),
            time_ticks: 0,
            layout,
            difficulty,
        };
        let stamp = EventStamp {
            level: world.level.id().to_string(),
            reset_index: 0,
            time: 0.0,
        };
        world.respawn_player(&stamp);
        world
    }

    pub fn respawn_player(&mut self, stamp: &EventStamp) {
        self.player.respawn(&self.level, &mut self.contacts, stamp);
    }

    /// Rebuild the level from its layout for the next cycle. The player is
    /// parked on the new spawn; `respawn_player` places it once the new
    /// cycle has begun.
    pub fn reload_level(&mut self) {
        self.level = Level::load(self.layout.clone(), self.difficulty);
        self.player.reload(&self.level, &mut self.contacts);
        log::debug!("Level {} reloaded", self.level.id());
    }

    /// Reveal the finish marker and stop simulating
    pub fn finish(&mut self) {
        self.phase = GamePhase::Complete;
        self.level.finish_marker_visible = true;
    }

    pub fn completion_points(&self) -> usize {
        self.level.finish_points.len()
    }
}
