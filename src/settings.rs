//! Game settings and tuning
//!
//! Read-only inputs to the simulation core. Persisted as JSON: a file on
//! native, LocalStorage on the web.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::sim::MovementMode;

/// Knockback parameters for the juicy death animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnockbackTuning {
    /// Fixed back/up impulse applied on every hit
    pub hit_force: f32,
    /// Weight of the up vector when mixing the knockback direction
    pub upward_weight: f32,
    /// Extra impulse per unit of obstacle closing speed
    pub speed_bonus: f32,
    /// Cap on the combined impulse
    pub max_total_hit_force: f32,
    /// Spin impulse range (radians/sec)
    pub min_torque: f32,
    pub max_torque: f32,
    /// Downward acceleration while flung off
    pub gravity: f32,
}

impl Default for KnockbackTuning {
    fn default() -> Self {
        Self {
            hit_force: 6.0,
            upward_weight: 1.2,
            speed_bonus: 0.5,
            max_total_hit_force: 12.0,
            min_torque: 4.0,
            max_torque: 12.0,
            gravity: 9.81,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Juicy mode: rolling steps and knockback deaths
    pub juicy: bool,
    /// Obstacle speed/cadence multiplier (see `effective_difficulty`)
    pub difficulty: f32,

    // === Movement ===
    /// Grid cell size (world units per step)
    pub step_size: f32,
    /// Duration of one 90° roll (seconds)
    pub roll_duration: f32,
    /// Delay between a knockback hit and the respawn (seconds)
    pub respawn_delay: f32,
    /// Grace period after leaving a carrier over water (seconds)
    pub water_grace: f32,
    pub knockback: KnockbackTuning,

    // === Session ===
    /// How many times a level is replayed before the game is complete
    pub total_level_resets: u32,
    /// Seed for knockback randomness
    pub seed: u64,
    /// Directory for per-cycle log artifacts (native only)
    pub log_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            juicy: true,
            difficulty: 1.0,

            step_size: 1.0,
            roll_duration: 0.2,
            respawn_delay: 1.5,
            water_grace: 0.05,
            knockback: KnockbackTuning::default(),

            total_level_resets: 3,
            seed: 0x5eed,
            log_dir: "session_logs".to_string(),
        }
    }
}

impl Settings {
    /// Difficulty clamped to the supported range
    pub fn effective_difficulty(&self) -> f32 {
        if self.difficulty.is_nan() {
            return 1.0;
        }
        self.difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
    }

    /// Movement mode selected by the juicy toggle
    pub fn movement_mode(&self) -> MovementMode {
        if self.juicy {
            MovementMode::Rolling
        } else {
            MovementMode::InstantJump
        }
    }

    /// Parse settings from JSON, falling back to defaults
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Malformed settings ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Environment variable naming a settings file (native)
    #[allow(dead_code)]
    const SETTINGS_ENV: &'static str = "HOP_LAB_SETTINGS";

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "hop_lab_settings";

    /// Read settings from a JSON file, falling back to defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => {
                log::info!("Loaded settings from {}", path.display());
                Self::from_json(&json)
            }
            Err(e) => {
                log::warn!("Could not read {} ({e}), using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Load settings from the file named by `HOP_LAB_SETTINGS`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        match std::env::var(Self::SETTINGS_ENV) {
            Ok(path) => Self::load_from(path),
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json(&json);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }
}
