//! Per-cycle log artifacts
//!
//! Each cycle produces three JSON documents, stored under a stem of
//! `<level>_<resetIndex>`:
//! - `<stem>_movements.json`
//! - `<stem>_collisions.json`
//! - `<stem>_summary.json`
//!
//! Re-running a cycle overwrites its files. Native builds write to a
//! directory; the web build writes LocalStorage keys with the same names.

use crate::session::{CycleArtifacts, SinkError, SummarySink};

/// Artifact file names for a cycle, in write order
pub fn artifact_names(artifacts: &CycleArtifacts) -> [(String, &str); 3] {
    let stem = artifacts.stem();
    [
        (format!("{stem}_movements.json"), artifacts.movements.as_str()),
        (format!("{stem}_collisions.json"), artifacts.collisions.as_str()),
        (format!("{stem}_summary.json"), artifacts.summary.as_str()),
    ]
}

/// Writes cycle artifacts to a directory (native)
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileSummarySink {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileSummarySink {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl SummarySink for FileSummarySink {
    fn write_cycle(&mut self, artifacts: &CycleArtifacts) -> Result<(), SinkError> {
        std::fs::create_dir_all(&self.dir)?;
        for (name, contents) in artifact_names(artifacts) {
            std::fs::write(self.dir.join(&name), contents)?;
        }
        log::info!("Cycle logs written to {}/{}_*.json", self.dir.display(), artifacts.stem());
        Ok(())
    }
}

/// Writes cycle artifacts to LocalStorage (WASM)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct FileSummarySink;

#[cfg(target_arch = "wasm32")]
impl FileSummarySink {
    pub fn new(_dir: impl Into<String>) -> Self {
        Self
    }
}

#[cfg(target_arch = "wasm32")]
impl SummarySink for FileSummarySink {
    fn write_cycle(&mut self, artifacts: &CycleArtifacts) -> Result<(), SinkError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| SinkError::Storage("LocalStorage unavailable".to_string()))?;

        for (name, contents) in artifact_names(artifacts) {
            storage
                .set_item(&name, contents)
                .map_err(|e| SinkError::Storage(format!("{e:?}")))?;
        }
        log::info!("Cycle logs saved ({})", artifacts.stem());
        Ok(())
    }
}
