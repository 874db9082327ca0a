//! Output boundary for session logs
//!
//! A `SummarySink` stores the three per-cycle artifacts durably; a
//! `MessageSink` forwards string payloads out of the process. Delivery is
//! at-most-once: failures are reported to the caller, never retried.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;

use super::events::{CollisionEvent, LevelSummary, MovementEvent};

/// Sink failure
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Storage(String),
}

/// The three JSON documents written at the end of a cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleArtifacts {
    pub level: String,
    pub reset_index: u32,
    /// JSON array of movement events
    pub movements: String,
    /// JSON array of collision events
    pub collisions: String,
    /// JSON summary object
    pub summary: String,
}

impl CycleArtifacts {
    pub fn build(
        summary: &LevelSummary,
        movements: &[MovementEvent],
        collisions: &[CollisionEvent],
    ) -> Result<Self, SinkError> {
        Ok(Self {
            level: summary.level.clone(),
            reset_index: summary.reset_index,
            movements: to_pretty(movements)?,
            collisions: to_pretty(collisions)?,
            summary: serde_json::to_string(summary)?,
        })
    }

    /// Base name shared by the three artifacts of this cycle
    pub fn stem(&self) -> String {
        format!("{}_{}", self.level, self.reset_index)
    }
}

fn to_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, SinkError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Durable per-cycle storage
pub trait SummarySink {
    fn write_cycle(&mut self, artifacts: &CycleArtifacts) -> Result<(), SinkError>;
}

/// String payload forwarding (web page bridge, log, ...)
pub trait MessageSink {
    fn send(&mut self, payload: &str) -> Result<(), SinkError>;
}

/// In-memory sink. Clones share storage, so a test can keep one handle and
/// give another to the session.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Rc<RefCell<MemoryLog>>,
}

#[derive(Debug, Default)]
struct MemoryLog {
    cycles: Vec<CycleArtifacts>,
    messages: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cycles(&self) -> Vec<CycleArtifacts> {
        self.inner.borrow().cycles.clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.inner.borrow().messages.clone()
    }
}

impl SummarySink for MemorySink {
    fn write_cycle(&mut self, artifacts: &CycleArtifacts) -> Result<(), SinkError> {
        let mut log = self.inner.borrow_mut();
        // Same cycle written again replaces the old artifacts
        log.cycles
            .retain(|c| !(c.level == artifacts.level && c.reset_index == artifacts.reset_index));
        log.cycles.push(artifacts.clone());
        Ok(())
    }
}

impl MessageSink for MemorySink {
    fn send(&mut self, payload: &str) -> Result<(), SinkError> {
        self.inner.borrow_mut().messages.push(payload.to_string());
        Ok(())
    }
}

/// Sink that always fails (exercises the non-fatal error path)
#[derive(Debug, Clone, Copy, Default)]
pub struct BrokenSink;

impl SummarySink for BrokenSink {
    fn write_cycle(&mut self, _artifacts: &CycleArtifacts) -> Result<(), SinkError> {
        Err(SinkError::Storage("sink is offline".to_string()))
    }
}

impl MessageSink for BrokenSink {
    fn send(&mut self, _payload: &str) -> Result<(), SinkError> {
        Err(SinkError::Storage("sink is offline".to_string()))
    }
}
