//! Overlap detection between the player box and level entities
//!
//! The simulation does not resolve contacts physically. It only needs to
//! know when the player starts or stops touching a surface, so each tick the
//! tracker diffs the current overlap set against the previous one.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, SurfaceKind};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Strict overlap: boxes that only share a face do not touch
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

/// Contact transition phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactPhase {
    Enter,
    Exit,
}

/// One enter/exit transition against an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub entity: EntityId,
    pub name: String,
    pub kind: SurfaceKind,
    /// Entity position at the time of the transition
    pub pos: Vec3,
    pub vel: Vec3,
    pub phase: ContactPhase,
}

#[derive(Debug, Clone)]
struct Touching {
    name: String,
    kind: SurfaceKind,
    pos: Vec3,
    vel: Vec3,
}

impl Touching {
    fn contact(&self, entity: EntityId, phase: ContactPhase) -> Contact {
        Contact {
            entity,
            name: self.name.clone(),
            kind: self.kind,
            pos: self.pos,
            vel: self.vel,
            phase,
        }
    }
}

/// Tracks which entities the player currently overlaps
#[derive(Debug, Clone, Default)]
pub struct ContactTracker {
    touching: BTreeMap<EntityId, Touching>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute overlaps and return the transitions (exits first, then
    /// enters, each ordered by entity id)
    pub fn update(&mut self, player: &Aabb, entities: &[Entity]) -> Vec<Contact> {
        let current = Self::overlapping(player, entities);
        self.replace(current)
    }

    /// Replace the overlap set after a teleport and return the transitions.
    /// Only passive surfaces are recorded, so anything that reacts on
    /// contact (obstacles, deadzones, finish points) enters on the next
    /// `update`.
    pub fn reseed(&mut self, player: &Aabb, entities: &[Entity]) -> Vec<Contact> {
        let mut current = Self::overlapping(player, entities);
        current.retain(|_, t| t.kind.is_passive());
        self.replace(current)
    }

    /// Forget every overlap (collider disabled), returning an exit for each
    pub fn clear(&mut self) -> Vec<Contact> {
        self.replace(BTreeMap::new())
    }

    fn replace(&mut self, current: BTreeMap<EntityId, Touching>) -> Vec<Contact> {
        let mut contacts = Vec::new();

        for (id, touch) in &self.touching {
            if !current.contains_key(id) {
                contacts.push(touch.contact(*id, ContactPhase::Exit));
            }
        }
        for (id, touch) in &current {
            if !self.touching.contains_key(id) {
                contacts.push(touch.contact(*id, ContactPhase::Enter));
            }
        }

        self.touching = current;
        contacts
    }

    pub fn touches_kind(&self, kind: SurfaceKind) -> bool {
        self.touching.values().any(|t| t.kind == kind)
    }

    /// Overlapping water with nothing underfoot
    pub fn water_only(&self) -> bool {
        self.touches_kind(SurfaceKind::Water) && !self.touching.values().any(|t| t.kind.supports())
    }

    /// First carrier surface in the overlap set (lowest id)
    pub fn first_carrier(&self) -> Option<EntityId> {
        self.touching
            .iter()
            .find(|(_, t)| t.kind.is_carrier())
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.touching.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touching.is_empty()
    }

    fn overlapping(player: &Aabb, entities: &[Entity]) -> BTreeMap<EntityId, Touching> {
        entities
            .iter()
            .filter(|e| player.overlaps(&e.aabb()))
            .map(|e| {
                (
                    e.id,
                    Touching {
                        name: e.name.clone(),
                        kind: e.kind,
                        pos: e.pos,
                        vel: e.vel,
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(id: EntityId, kind: SurfaceKind, x: f32, z: f32) -> Entity {
        Entity::new(id, format!("{}-{id}", kind.as_str()), kind, Vec3::new(x, 0.0, z), Vec3::splat(0.5))
    }

    fn player_at(x: f32, z: f32) -> Aabb {
        Aabb::from_center(Vec3::new(x, 0.0, z), Vec3::splat(0.4))
    }

    #[test]
    fn test_face_contact_is_not_overlap() {
        let a = Aabb::from_center(Vec3::ZERO, Vec3::splat(0.5));
        let b = Aabb::from_center(Vec3::new(1.0, 0.0, 0.0), Vec3::splat(0.5));
        assert!(!a.overlaps(&b));
        let c = Aabb::from_center(Vec3::new(0.9, 0.0, 0.0), Vec3::splat(0.5));
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_enter_then_exit() {
        let entities = vec![cell(1, SurfaceKind::Land, 0.0, 0.0), cell(2, SurfaceKind::Water, 0.0, 1.0)];
        let mut tracker = ContactTracker::new();

        let contacts = tracker.update(&player_at(0.0, 0.0), &entities);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].entity, 1);
        assert_eq!(contacts[0].phase, ContactPhase::Enter);

        // Staying put produces nothing
        assert!(tracker.update(&player_at(0.0, 0.0), &entities).is_empty());

        let contacts = tracker.update(&player_at(0.0, 1.0), &entities);
        assert_eq!(contacts.len(), 2);
        assert_eq!((contacts[0].entity, contacts[0].phase), (1, ContactPhase::Exit));
        assert_eq!((contacts[1].entity, contacts[1].phase), (2, ContactPhase::Enter));
        assert!(tracker.water_only());
    }

    #[test]
    fn test_despawned_entity_exits() {
        let mut entities = vec![cell(7, SurfaceKind::Wood, 0.0, 0.0)];
        let mut tracker = ContactTracker::new();
        tracker.update(&player_at(0.0, 0.0), &entities);
        entities.clear();
        let contacts = tracker.update(&player_at(0.0, 0.0), &entities);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].kind, SurfaceKind::Wood);
        assert_eq!(contacts[0].phase, ContactPhase::Exit);
    }

    #[test]
    fn test_reseed_reports_the_difference() {
        let entities = vec![
            cell(3, SurfaceKind::Wood, 0.0, 0.0),
            cell(4, SurfaceKind::Water, 0.0, 0.0),
            cell(5, SurfaceKind::Water, 0.0, 4.0),
        ];
        let mut tracker = ContactTracker::new();
        tracker.update(&player_at(0.0, 4.0), &entities);

        let contacts = tracker.reseed(&player_at(0.0, 0.0), &entities);
        let phases: Vec<_> = contacts.iter().map(|c| (c.entity, c.phase)).collect();
        assert_eq!(
            phases,
            vec![(5, ContactPhase::Exit), (3, ContactPhase::Enter), (4, ContactPhase::Enter)]
        );
        assert_eq!(tracker.first_carrier(), Some(3));
        assert!(!tracker.water_only());
        assert!(tracker.update(&player_at(0.0, 0.0), &entities).is_empty());
    }

    #[test]
    fn test_reseed_leaves_reactive_surfaces_for_update() {
        let entities = vec![
            cell(1, SurfaceKind::Land, 0.0, 0.0),
            cell(2, SurfaceKind::Obstacle, 0.0, 0.0),
            cell(3, SurfaceKind::Deadzone, 0.0, 0.0),
        ];
        let mut tracker = ContactTracker::new();
        let seeded = tracker.reseed(&player_at(0.0, 0.0), &entities);
        assert_eq!(seeded.len(), 1);
        assert_eq!(tracker.len(), 1);
        assert!(!tracker.touches_kind(SurfaceKind::Obstacle));

        let contacts = tracker.update(&player_at(0.0, 0.0), &entities);
        let kinds: Vec<_> = contacts.iter().map(|c| (c.kind, c.phase)).collect();
        assert_eq!(
            kinds,
            vec![
                (SurfaceKind::Obstacle, ContactPhase::Enter),
                (SurfaceKind::Deadzone, ContactPhase::Enter)
            ]
        );
    }

    #[test]
    fn test_clear_exits_everything() {
        let entities = vec![cell(1, SurfaceKind::Land, 0.0, 0.0), cell(2, SurfaceKind::Obstacle, 0.0, 0.0)];
        let mut tracker = ContactTracker::new();
        tracker.update(&player_at(0.0, 0.0), &entities);
        let exits = tracker.clear();
        assert_eq!(exits.len(), 2);
        assert!(exits.iter().all(|c| c.phase == ContactPhase::Exit));
        assert!(tracker.is_empty());
    }
}
