//! Level session controller
//!
//! Folds player events into score, lives and event logs; decides when a
//! level cycle ends; writes the cycle artifacts; and tells the simulation
//! whether to respawn the player, reload the level, or stop.
//!
//! The controller is an explicitly constructed service. The world hands it
//! every event synchronously within the tick that caused it, then drains its
//! directives.

pub mod completion;
pub mod events;
pub mod sink;

pub use completion::CompletionTracker;
pub use events::{CollisionEvent, EventStamp, GameEvent, LevelSummary, MovementEvent};
pub use sink::{BrokenSink, CycleArtifacts, MemorySink, MessageSink, SinkError, SummarySink};

use crate::consts::MAX_LIVES;
use crate::scoreboard::{GameTotals, Scoreboard};
use crate::settings::Settings;
use crate::sim::EntityId;

/// Why the session is (re)initialising
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadReason {
    /// Process start: everything zeroed, full lives
    Startup,
    /// Lives refill and run score resets; committed score persists.
    /// Reserved: lives exhaustion ends the cycle instead.
    LivesReset,
    /// New cycle after the previous one ended
    LevelCompleted,
}

/// Instruction for the simulation, produced while handling events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Put the player back on the spawn pose (same life, same cycle)
    RespawnPlayer,
    /// Rebuild the level and start the next cycle
    ReloadLevel,
    /// No cycles left: reveal the finish marker and stop
    FinishGame,
}

/// Session state for one level
pub struct Session {
    level: String,
    total_level_resets: u32,
    resets_remaining: u32,
    reset_index: u32,
    /// Seconds since the current cycle started
    elapsed: f32,
    lives: u8,
    deaths: u32,
    scores: Scoreboard,
    movements: Vec<MovementEvent>,
    collisions: Vec<CollisionEvent>,
    completion: CompletionTracker,
    cycle_over: bool,
    finished: bool,
    totals: GameTotals,
    last_summary: Option<LevelSummary>,
    directives: Vec<Directive>,
    summary_sink: Box<dyn SummarySink>,
    message_sink: Box<dyn MessageSink>,
}

impl Session {
    /// Create a session and run the startup initialisation. A level with no
    /// completion points completes immediately (see `take_directives`).
    pub fn new(
        level: impl Into<String>,
        settings: &Settings,
        completion_points: usize,
        summary_sink: Box<dyn SummarySink>,
        message_sink: Box<dyn MessageSink>,
    ) -> Self {
        let mut session = Self {
            level: level.into(),
            total_level_resets: settings.total_level_resets,
            resets_remaining: settings.total_level_resets,
            reset_index: 0,
            elapsed: 0.0,
            lives: MAX_LIVES,
            deaths: 0,
            scores: Scoreboard::new(),
            movements: Vec::new(),
            collisions: Vec::new(),
            completion: CompletionTracker::new(completion_points),
            cycle_over: false,
            finished: false,
            totals: GameTotals::new(settings.effective_difficulty(), settings.juicy),
            last_summary: None,
            directives: Vec::new(),
            summary_sink,
            message_sink,
        };
        session.begin_cycle(ReloadReason::Startup, completion_points);
        session
    }

    /// (Re)initialise counters for a new cycle
    pub fn begin_cycle(&mut self, reason: ReloadReason, completion_points: usize) {
        match reason {
            ReloadReason::Startup => {
                self.scores = Scoreboard::new();
                self.deaths = 0;
                self.lives = MAX_LIVES;
                self.resets_remaining = self.total_level_resets;
                self.reset_index = 0;
            }
            ReloadReason::LivesReset => {
                self.scores.lose_run();
                self.lives = MAX_LIVES;
                log::info!("Lives reset on {} (cycle {})", self.level, self.reset_index);
                return;
            }
            ReloadReason::LevelCompleted => {
                self.scores.reset_cycle();
                self.deaths = 0;
                self.lives = MAX_LIVES;
                self.reset_index += 1;
            }
        }

        self.elapsed = 0.0;
        self.movements.clear();
        self.collisions.clear();
        self.completion = CompletionTracker::new(completion_points);
        self.cycle_over = false;

        log::info!(
            "Cycle {} of {} started ({:?}, {} completion points, {} resets left)",
            self.reset_index,
            self.level,
            reason,
            completion_points,
            self.resets_remaining
        );

        if self.completion.check() {
            log::info!("{} has no completion points, cycle completes immediately", self.level);
            self.complete_cycle(true);
        }
    }

    /// Advance the cycle clock
    pub fn advance(&mut self, dt: f32) {
        if !self.cycle_over && !self.finished {
            self.elapsed += dt;
        }
    }

    /// Stamp for events raised now
    pub fn stamp(&self) -> EventStamp {
        EventStamp {
            level: self.level.clone(),
            reset_index: self.reset_index,
            time: self.elapsed,
        }
    }

    /// Fold one event into the session
    pub fn handle(&mut self, event: GameEvent) {
        if self.cycle_over || self.finished {
            log::debug!("Ignoring {event:?} after cycle end");
            return;
        }

        match event {
            GameEvent::PlayerMoved(step) => {
                if step.is_forward() {
                    self.scores.step_forward();
                } else if step.is_backward() {
                    self.scores.step_back();
                }
                self.movements.push(step);
            }
            GameEvent::PlayerCollision(contact) => {
                self.collisions.push(contact);
            }
            GameEvent::PlayerDeath => {
                self.deaths += 1;
                self.lives = self.lives.saturating_sub(1);
                self.scores.lose_run();
                log::debug!("Death {} on {}, {} lives left", self.deaths, self.level, self.lives);
                if self.lives == 0 {
                    self.complete_cycle(false);
                }
            }
            GameEvent::PlayerReachedFinish => {
                let banked = self.scores.bank_finish();
                log::debug!("Finish reached, banked {banked} (score {})", self.scores.total());
                self.directives.push(Directive::RespawnPlayer);
            }
            GameEvent::CompletionPointDone(point) => {
                self.on_point_done(point);
            }
        }
    }

    fn on_point_done(&mut self, point: EntityId) {
        if self.completion.mark_done(point) {
            self.complete_cycle(true);
        }
    }

    /// Write the cycle artifacts, then schedule a reload or finish the game
    fn complete_cycle(&mut self, cleared: bool) {
        if self.cycle_over {
            return;
        }
        self.cycle_over = true;

        let summary = LevelSummary {
            level: self.level.clone(),
            reset_index: self.reset_index,
            duration_seconds: self.elapsed,
            deaths: self.deaths,
            score: self.scores.total(),
        };
        self.totals
            .record_cycle(summary.score, summary.duration_seconds, summary.deaths, cleared);
        log::info!(
            "Cycle {} of {} over ({}): score {}, deaths {}, {:.1}s",
            summary.reset_index,
            summary.level,
            if cleared { "cleared" } else { "out of lives" },
            summary.score,
            summary.deaths,
            summary.duration_seconds
        );

        self.publish(&summary);
        self.last_summary = Some(summary);

        if self.resets_remaining > 0 {
            self.resets_remaining -= 1;
            self.directives.push(Directive::ReloadLevel);
        } else {
            self.finished = true;
            self.directives.push(Directive::FinishGame);
            self.publish_totals();
        }
    }

    fn publish(&mut self, summary: &LevelSummary) {
        match CycleArtifacts::build(summary, &self.movements, &self.collisions) {
            Ok(artifacts) => {
                if let Err(e) = self.summary_sink.write_cycle(&artifacts) {
                    log::warn!("Failed to write logs for {}: {e}", artifacts.stem());
                }
                if let Err(e) = self.message_sink.send(&artifacts.summary) {
                    log::warn!("Failed to forward summary: {e}");
                }
            }
            Err(e) => log::warn!("Failed to serialize cycle logs: {e}"),
        }
    }

    fn publish_totals(&mut self) {
        log::info!(
            "Game complete: {} points, {} deaths, {} levels cleared",
            self.totals.total_points,
            self.totals.total_deaths,
            self.totals.levels_cleared
        );
        match serde_json::to_string(&self.totals) {
            Ok(json) => {
                if let Err(e) = self.message_sink.send(&json) {
                    log::warn!("Failed to forward game totals: {e}");
                }
            }
            Err(e) => log::warn!("Failed to serialize game totals: {e}"),
        }
    }

    /// Drain the directives raised since the last call
    pub fn take_directives(&mut self) -> Vec<Directive> {
        std::mem::take(&mut self.directives)
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    pub fn scores(&self) -> &Scoreboard {
        &self.scores
    }

    pub fn score(&self) -> u64 {
        self.scores.total()
    }

    pub fn high_score(&self) -> u64 {
        self.scores.high
    }

    pub fn reset_index(&self) -> u32 {
        self.reset_index
    }

    pub fn resets_remaining(&self) -> u32 {
        self.resets_remaining
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn movements(&self) -> &[MovementEvent] {
        &self.movements
    }

    pub fn collisions(&self) -> &[CollisionEvent] {
        &self.collisions
    }

    pub fn completion(&self) -> &CompletionTracker {
        &self.completion
    }

    pub fn is_cycle_over(&self) -> bool {
        self.cycle_over
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn totals(&self) -> &GameTotals {
        &self.totals
    }

    pub fn last_summary(&self) -> Option<&LevelSummary> {
        self.last_summary.as_ref()
    }
}
