//! Juicy death: the player is flung off by an obstacle, spins, and respawns
//! after a fixed delay.

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::motion::Pose;
use crate::horizontal;
use crate::settings::KnockbackTuning;

/// Below this horizontal offset the hit direction is picked at random
const DEGENERATE_OFFSET: f32 = 1e-4;

/// Launch direction away from an obstacle, tilted upward
pub fn knockback_direction(player: Vec3, obstacle: Vec3, upward_weight: f32, rng: &mut impl Rng) -> Vec3 {
    let offset = horizontal(player - obstacle);
    let away = if offset.length() < DEGENERATE_OFFSET {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        Vec3::new(angle.cos(), 0.0, angle.sin())
    } else {
        offset.normalize()
    };
    (away + Vec3::Y * upward_weight).normalize()
}

/// Speed at which the obstacle was approaching the player (never negative)
pub fn closing_speed(player: Vec3, obstacle: Vec3, obstacle_vel: Vec3) -> f32 {
    let toward_player = horizontal(player - obstacle).normalize_or_zero();
    obstacle_vel.dot(toward_player).max(0.0)
}

/// Impulse magnitude: fixed force plus a closing-speed bonus, capped
pub fn hit_impulse(tuning: &KnockbackTuning, closing_speed: f32) -> f32 {
    (tuning.hit_force + tuning.speed_bonus * closing_speed).min(tuning.max_total_hit_force)
}

/// Free rigid motion while flung off, counting down to respawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knockback {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Seconds left before respawn
    pub remaining: f32,
    pub gravity: f32,
}

impl Knockback {
    /// Compute the hit and start the respawn countdown
    pub fn launch(
        player: Vec3,
        obstacle: Vec3,
        obstacle_vel: Vec3,
        tuning: &KnockbackTuning,
        respawn_delay: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let dir = knockback_direction(player, obstacle, tuning.upward_weight, rng);
        let impulse = hit_impulse(tuning, closing_speed(player, obstacle, obstacle_vel));

        let (lo, hi) = if tuning.min_torque <= tuning.max_torque {
            (tuning.min_torque, tuning.max_torque)
        } else {
            (tuning.max_torque, tuning.min_torque)
        };
        let spin_axis = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        )
        .normalize_or(Vec3::X);
        let spin = if hi > lo { rng.random_range(lo..hi) } else { lo };

        Self {
            velocity: dir * impulse,
            angular_velocity: spin_axis * spin,
            remaining: respawn_delay,
            gravity: tuning.gravity,
        }
    }

    /// Integrate one step. Returns true when the respawn delay has elapsed.
    pub fn advance(&mut self, pose: &mut Pose, dt: f32) -> bool {
        self.velocity.y -= self.gravity * dt;
        pose.position += self.velocity * dt;

        let spin = self.angular_velocity * dt;
        let angle = spin.length();
        if angle > 0.0 {
            pose.orientation = (Quat::from_axis_angle(spin / angle, angle) * pose.orientation).normalize();
        }

        self.remaining -= dt;
        self.remaining <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_direction_points_away_and_up() {
        let mut rng = Pcg32::seed_from_u64(1);
        let dir = knockback_direction(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, 1.0, &mut rng);
        assert!(dir.z > 0.0);
        assert!(dir.y > 0.0);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!((dir.z - dir.y).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_offset_uses_random_direction() {
        let mut rng = Pcg32::seed_from_u64(7);
        let dir = knockback_direction(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO, 1.0, &mut rng);
        assert!(dir.is_finite());
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(horizontal(dir).length() > 0.1);
    }

    #[test]
    fn test_impulse_is_capped() {
        let tuning = KnockbackTuning::default();
        assert_eq!(hit_impulse(&tuning, 0.0), tuning.hit_force);
        assert_eq!(hit_impulse(&tuning, 1000.0), tuning.max_total_hit_force);
    }

    #[test]
    fn test_receding_obstacle_adds_no_bonus() {
        let speed = closing_speed(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, Vec3::new(-5.0, 0.0, 0.0));
        assert_eq!(speed, 0.0);
        let speed = closing_speed(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0));
        assert!((speed - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_countdown_reaches_respawn() {
        let mut rng = Pcg32::seed_from_u64(3);
        let tuning = KnockbackTuning::default();
        let mut kb = Knockback::launch(Vec3::Z, Vec3::ZERO, Vec3::ZERO, &tuning, 0.5, &mut rng);
        let mut pose = Pose::at(Vec3::Z);
        let mut ticks = 0;
        while !kb.advance(&mut pose, 0.1) {
            ticks += 1;
            assert!(ticks < 10);
        }
        assert!(pose.position.z > 1.0);
    }
}
