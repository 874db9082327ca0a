//! Score keeping
//!
//! Run score is unbanked progress since the last respawn; committed score is
//! banked when a finish point is reached. The high score survives level
//! reloads for the lifetime of the process.

use serde::{Deserialize, Serialize};

use crate::consts::{FINISH_BONUS, STEP_SCORE};

/// Per-cycle score state plus the process-wide high score
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scoreboard {
    /// Banked score for the current cycle
    pub committed: u64,
    /// Unbanked score since the last respawn
    pub run: u64,
    /// Running max of committed + run
    pub high: u64,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible score (banked + unbanked)
    pub fn total(&self) -> u64 {
        self.committed + self.run
    }

    /// Forward step: +10 run score
    pub fn step_forward(&mut self) {
        self.run += STEP_SCORE;
        self.update_high();
    }

    /// Backward step: -10 run score, floored at 0
    pub fn step_back(&mut self) {
        self.run = self.run.saturating_sub(STEP_SCORE);
        self.update_high();
    }

    /// Bank run score plus the finish bonus. Returns the amount banked.
    pub fn bank_finish(&mut self) -> u64 {
        let banked = self.run + FINISH_BONUS;
        self.committed += banked;
        self.run = 0;
        self.update_high();
        banked
    }

    /// Lost progress after a death
    pub fn lose_run(&mut self) {
        self.run = 0;
    }

    /// Clear both cycle scores (high score persists)
    pub fn reset_cycle(&mut self) {
        self.committed = 0;
        self.run = 0;
    }

    fn update_high(&mut self) {
        self.high = self.high.max(self.total());
    }
}

/// Process-wide aggregate forwarded when the whole game is complete
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTotals {
    pub total_points: u64,
    pub total_time: f32,
    pub total_deaths: u32,
    pub levels_cleared: u32,
    pub difficulty_level: f32,
    pub is_juicy: bool,
}

impl GameTotals {
    pub fn new(difficulty_level: f32, is_juicy: bool) -> Self {
        Self {
            difficulty_level,
            is_juicy,
            ..Default::default()
        }
    }

    /// Fold one finished cycle into the totals
    pub fn record_cycle(&mut self, score: u64, duration: f32, deaths: u32, cleared: bool) {
        self.total_points += score;
        self.total_time += duration;
        self.total_deaths += deaths;
        if cleared {
            self.levels_cleared += 1;
        }
    }
}
