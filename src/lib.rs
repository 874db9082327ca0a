//! Hop Lab - a lane-crossing arcade game core
//!
//! Core modules:
//! - `sim`: Fixed-timestep simulation (player state machine, lanes, contacts)
//! - `session`: Level session controller, scoring and event logs
//! - `scoreboard`: Score rules and process-wide totals
//! - `persistence`: Per-cycle log artifacts (files / LocalStorage)
//! - `platform`: Native/browser message sinks
//! - `settings`: Data-driven tuning and juicy-mode toggle
//! - `autopilot`: Scripted player for headless runs

pub mod autopilot;
pub mod persistence;
pub mod platform;
pub mod scoreboard;
pub mod session;
pub mod settings;
pub mod sim;

pub use scoreboard::{GameTotals, Scoreboard};
pub use settings::{KnockbackTuning, Settings};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Lives at the start of every cycle
    pub const MAX_LIVES: u8 = 3;
    /// Banked on top of the run score when a finish point is reached
    pub const FINISH_BONUS: u64 = 140;
    /// Score delta for one forward (or backward) step
    pub const STEP_SCORE: u64 = 10;

    /// Player collision box half size (fraction of one grid cell)
    pub const PLAYER_HALF_EXTENT: f32 = 0.4;

    /// Lower bound of the difficulty multiplier
    pub const MIN_DIFFICULTY: f32 = 0.5;
    /// Upper bound of the difficulty multiplier
    pub const MAX_DIFFICULTY: f32 = 1.5;
}

/// Drop the vertical component of a vector
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Round a float to the nearest multiple of `step`
#[inline]
pub fn round_to(value: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}
