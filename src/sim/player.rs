//! Player movement, surface riding, death and respawn
//!
//! Exactly one of {idle, rolling, flung off} is active at a time (`Motion`).
//! Riding a carrier is an orthogonal flag that is suspended while flung off.
//! Long-running behaviour (the roll animation, the knockback countdown) lives
//! inside `Motion` and advances once per fixed step; clearing it cancels it.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Contact, ContactPhase, ContactTracker};
use super::entity::{EntityId, SurfaceKind};
use super::knockback::Knockback;
use super::level::Level;
use super::motion::{Direction, Pose, Roll};
use crate::consts::PLAYER_HALF_EXTENT;
use crate::session::{CollisionEvent, EventStamp, GameEvent, MovementEvent};
use crate::settings::{KnockbackTuning, Settings};

/// How a step is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementMode {
    /// Animated 90° pivot roll, knockback on death (juicy)
    Rolling,
    /// One-tick grid snap, immediate respawn on death
    InstantJump,
}

/// Mutually exclusive movement state
#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
    Idle,
    Rolling(Roll),
    FlungOff(Knockback),
}

/// The carrier being ridden and where it was last tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarrierLink {
    pub entity: EntityId,
    pub last_pos: Vec3,
}

/// Collision-response constraints on the player body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyConstraints {
    /// Driven by the state machine rather than by free rigid motion
    pub kinematic: bool,
    /// Rotation locked (riding a carrier in rolling mode)
    pub freeze_rotation: bool,
    /// Collider participates in contact detection
    pub collider_enabled: bool,
}

impl Default for BodyConstraints {
    fn default() -> Self {
        Self {
            kinematic: true,
            freeze_rotation: false,
            collider_enabled: true,
        }
    }
}

/// What handling a contact did to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Continue,
    /// The player died; remaining contacts of this tick are stale
    Died,
}

/// The player entity
#[derive(Debug, Clone)]
pub struct Player {
    pub pose: Pose,
    spawn: Pose,
    mode: MovementMode,
    motion: Motion,
    carrier: Option<CarrierLink>,
    body: BodyConstraints,
    /// Per-axis press latch: a held direction fires once
    axis_latch: [bool; 2],
    pending_jump: Option<Direction>,
    /// Seconds left before a water-only overlap becomes fatal
    water_grace: Option<f32>,
    step_size: f32,
    roll_duration: f32,
    respawn_delay: f32,
    water_grace_duration: f32,
    knockback: KnockbackTuning,
    rng: Pcg32,
    events: Vec<GameEvent>,
}

impl Player {
    pub fn new(spawn: Pose, settings: &Settings) -> Self {
        Self {
            pose: spawn,
            spawn,
            mode: settings.movement_mode(),
            motion: Motion::Idle,
            carrier: None,
            body: BodyConstraints::default(),
            axis_latch: [false; 2],
            pending_jump: None,
            water_grace: None,
            step_size: settings.step_size,
            roll_duration: settings.roll_duration,
            respawn_delay: settings.respawn_delay,
            water_grace_duration: settings.water_grace,
            knockback: settings.knockback.clone(),
            rng: Pcg32::seed_from_u64(settings.seed),
            events: Vec::new(),
        }
    }

    pub fn mode(&self) -> MovementMode {
        self.mode
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.motion, Motion::Idle)
    }

    pub fn is_rolling(&self) -> bool {
        matches!(self.motion, Motion::Rolling(_))
    }

    pub fn is_flung_off(&self) -> bool {
        matches!(self.motion, Motion::FlungOff(_))
    }

    pub fn carrier(&self) -> Option<EntityId> {
        self.carrier.map(|c| c.entity)
    }

    pub fn body(&self) -> BodyConstraints {
        self.body
    }

    pub fn spawn_pose(&self) -> Pose {
        self.spawn
    }

    pub fn water_grace(&self) -> Option<f32> {
        self.water_grace
    }

    /// Physical velocity (non-zero only while flung off)
    pub fn velocity(&self) -> Vec3 {
        match &self.motion {
            Motion::FlungOff(kb) => kb.velocity,
            _ => Vec3::ZERO,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pose.position, Vec3::splat(PLAYER_HALF_EXTENT * self.step_size))
    }

    /// Take the events published since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Update pass: sample the held direction
    pub fn handle_input(&mut self, held: Option<Direction>) {
        if self.is_flung_off() {
            return;
        }

        // Release the latch of every axis that is no longer held
        for (axis, latched) in self.axis_latch.iter_mut().enumerate() {
            if held.map(Direction::axis) != Some(axis) {
                *latched = false;
            }
        }

        let Some(dir) = held else {
            return;
        };
        if self.axis_latch[dir.axis()] {
            return;
        }

        match self.mode {
            MovementMode::Rolling => {
                // One roll in flight at a time
                if !self.is_idle() {
                    return;
                }
                self.axis_latch[dir.axis()] = true;
                self.motion = Motion::Rolling(Roll::new(self.pose, dir, self.step_size, self.roll_duration));
            }
            MovementMode::InstantJump => {
                self.axis_latch[dir.axis()] = true;
                self.pending_jump = Some(dir);
            }
        }
    }

    /// Fixed pass: carrier following, step progress, knockback, timers
    pub fn fixed_update(&mut self, dt: f32, level: &Level, contacts: &mut ContactTracker, stamp: &EventStamp) {
        if !self.is_flung_off() {
            self.follow_carrier(level);
        }

        match &mut self.motion {
            Motion::Idle => {
                if let Some(dir) = self.pending_jump.take() {
                    let from = self.pose.position;
                    let to = from + dir.to_vec3() * self.step_size;
                    self.pose.position = to;
                    self.publish_step(stamp, from, to, (to - from).normalize_or_zero(), true);
                }
            }
            Motion::Rolling(roll) => {
                if roll.advance(dt) {
                    let end = roll.finish();
                    let from = roll.start.position;
                    let direction = roll.direction.to_vec3();
                    self.pose = end;
                    self.motion = Motion::Idle;
                    self.publish_step(stamp, from, end.position, direction, false);
                } else {
                    self.pose = roll.pose();
                }
            }
            Motion::FlungOff(kb) => {
                if kb.advance(&mut self.pose, dt) {
                    self.respawn(level, contacts, stamp);
                }
            }
        }

        if let Some(remaining) = self.water_grace.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.water_grace = None;
                if contacts.water_only() {
                    log::debug!("Grace period over, still in water");
                    self.die(level, contacts, stamp);
                }
            }
        }
    }

    /// Log a tick's transitions, then react to them in order. Stops at the
    /// first death; later transitions are still logged.
    pub fn on_contacts(
        &mut self,
        transitions: &[Contact],
        level: &mut Level,
        contacts: &mut ContactTracker,
        stamp: &EventStamp,
    ) -> ContactOutcome {
        if self.is_flung_off() || !self.body.collider_enabled {
            return ContactOutcome::Continue;
        }
        for contact in transitions {
            self.log_contact(contact, stamp);
        }
        for contact in transitions {
            if self.on_contact(contact, level, contacts, stamp) == ContactOutcome::Died {
                return ContactOutcome::Died;
            }
        }
        ContactOutcome::Continue
    }

    /// Record a transition in the collision log. Obstacle hits are only
    /// logged in instant mode.
    pub fn log_contact(&mut self, contact: &Contact, stamp: &EventStamp) {
        if contact.kind == SurfaceKind::Obstacle && self.mode == MovementMode::Rolling {
            return;
        }
        self.events.push(GameEvent::PlayerCollision(CollisionEvent {
            stamp: stamp.clone(),
            other: contact.name.clone(),
            tag: contact.kind,
            phase: contact.phase,
        }));
    }

    /// React to one enter/exit transition (see `on_contacts` for logging)
    pub fn on_contact(
        &mut self,
        contact: &Contact,
        level: &mut Level,
        contacts: &mut ContactTracker,
        stamp: &EventStamp,
    ) -> ContactOutcome {
        if self.is_flung_off() || !self.body.collider_enabled {
            return ContactOutcome::Continue;
        }

        // Any exit cancels a pending water grace period
        if contact.phase == ContactPhase::Exit {
            self.water_grace = None;
        }

        match (contact.kind, contact.phase) {
            (SurfaceKind::Obstacle, ContactPhase::Enter) => {
                self.hit_obstacle(contact, level, contacts, stamp);
                return ContactOutcome::Died;
            }
            (SurfaceKind::Deadzone, ContactPhase::Enter) => {
                self.die(level, contacts, stamp);
                return ContactOutcome::Died;
            }
            (SurfaceKind::Land | SurfaceKind::Wood, ContactPhase::Enter) => {
                self.start_following(contact.entity, contact.pos);
            }
            (SurfaceKind::Land | SurfaceKind::Wood, ContactPhase::Exit) => {
                self.leave_carrier(contact.entity, level, contacts);
            }
            (SurfaceKind::Finish, ContactPhase::Enter) => {
                self.events.push(GameEvent::PlayerReachedFinish);
                if level.mark_finish_done(contact.entity) {
                    self.events.push(GameEvent::CompletionPointDone(contact.entity));
                }
            }
            // Water is judged on the whole overlap set after all transitions
            (SurfaceKind::Water, _)
            | (SurfaceKind::Obstacle, ContactPhase::Exit)
            | (SurfaceKind::Deadzone, ContactPhase::Exit)
            | (SurfaceKind::Finish, ContactPhase::Exit) => {}
        }
        ContactOutcome::Continue
    }

    /// Water-only overlap check, run after the tick's transitions
    pub fn check_water(&mut self, level: &Level, contacts: &mut ContactTracker, stamp: &EventStamp) -> ContactOutcome {
        if self.is_flung_off() || self.water_grace.is_some() || !contacts.water_only() {
            return ContactOutcome::Continue;
        }
        let fatal = match self.mode {
            MovementMode::InstantJump => true,
            // Mid-roll the player is in the air
            MovementMode::Rolling => self.is_idle(),
        };
        if fatal {
            log::debug!("Player sank at {:?}", self.pose.position);
            self.die(level, contacts, stamp);
            return ContactOutcome::Died;
        }
        ContactOutcome::Continue
    }

    /// Put the player back on the spawn pose. Cancels any roll or
    /// knockback, clears carrier riding, restores default constraints, then
    /// re-evaluates what the player is standing on. Surfaces left behind
    /// and surfaces found at the spawn are logged; obstacles, deadzones and
    /// finish points at the spawn enter on the next contact update.
    pub fn respawn(&mut self, level: &Level, contacts: &mut ContactTracker, stamp: &EventStamp) {
        self.reset_to_spawn();

        for contact in contacts.reseed(&self.aabb(), &level.entities) {
            self.log_contact(&contact, stamp);
        }
        if let Some((id, pos)) = Self::carrier_under(level, contacts) {
            self.start_following(id, pos);
        }
        log::debug!("Player respawned at {:?}", self.spawn.position);
    }

    /// New level instance: take its spawn pose and forget the old overlaps.
    /// The caller respawns the player once the new cycle has begun.
    pub fn reload(&mut self, level: &Level, contacts: &mut ContactTracker) {
        self.spawn = level.spawn_pose();
        self.reset_to_spawn();
        contacts.clear();
    }

    fn reset_to_spawn(&mut self) {
        self.motion = Motion::Idle;
        self.carrier = None;
        self.pending_jump = None;
        self.water_grace = None;
        self.pose = self.spawn;
        self.body = BodyConstraints::default();
    }

    fn publish_step(&mut self, stamp: &EventStamp, from: Vec3, to: Vec3, direction: Vec3, instant: bool) {
        self.events.push(GameEvent::PlayerMoved(MovementEvent {
            stamp: stamp.clone(),
            from,
            to,
            direction,
            instant,
            step_size: self.step_size,
        }));
    }

    fn follow_carrier(&mut self, level: &Level) {
        let Some(link) = self.carrier.as_mut() else {
            return;
        };
        // A despawned carrier is let go when its exit comes through
        let Some(entity) = level.entity(link.entity) else {
            return;
        };

        let delta = entity.pos - link.last_pos;
        link.last_pos = entity.pos;
        self.pose.position += delta;
        if let Motion::Rolling(roll) = &mut self.motion {
            roll.shift(delta);
        }
    }

    /// Carrier surface currently overlapped, with its position
    fn carrier_under(level: &Level, contacts: &ContactTracker) -> Option<(EntityId, Vec3)> {
        contacts
            .first_carrier()
            .and_then(|id| level.entity(id).map(|e| (id, e.pos)))
    }

    fn start_following(&mut self, entity: EntityId, pos: Vec3) {
        self.carrier = Some(CarrierLink {
            entity,
            last_pos: pos,
        });
        if self.mode == MovementMode::Rolling {
            self.body.freeze_rotation = true;
        }
    }

    fn leave_carrier(&mut self, entity: EntityId, level: &Level, contacts: &ContactTracker) {
        if self.carrier() != Some(entity) {
            return;
        }
        self.carrier = None;
        self.body.freeze_rotation = false;

        if let Some((next, pos)) = Self::carrier_under(level, contacts) {
            self.start_following(next, pos);
        } else if self.mode == MovementMode::InstantJump && contacts.water_only() {
            self.water_grace = Some(self.water_grace_duration);
        }
    }

    fn hit_obstacle(&mut self, contact: &Contact, level: &Level, contacts: &mut ContactTracker, stamp: &EventStamp) {
        self.events.push(GameEvent::PlayerDeath);
        match self.mode {
            MovementMode::InstantJump => self.respawn(level, contacts, stamp),
            MovementMode::Rolling => {
                let kb = Knockback::launch(
                    self.pose.position,
                    contact.pos,
                    contact.vel,
                    &self.knockback,
                    self.respawn_delay,
                    &mut self.rng,
                );
                log::debug!("Hit by {}, flung off at {:?}", contact.name, kb.velocity);
                self.motion = Motion::FlungOff(kb);
                self.carrier = None;
                self.pending_jump = None;
                self.water_grace = None;
                self.body = BodyConstraints {
                    kinematic: false,
                    freeze_rotation: false,
                    collider_enabled: false,
                };
                for exit in contacts.clear() {
                    self.log_contact(&exit, stamp);
                }
            }
        }
    }

    fn die(&mut self, level: &Level, contacts: &mut ContactTracker, stamp: &EventStamp) {
        self.events.push(GameEvent::PlayerDeath);
        self.respawn(level, contacts, stamp);
    }
}
