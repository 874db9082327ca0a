//! Step geometry for both movement modes
//!
//! A roll pivots the player box 90° over its leading bottom edge. The pivot
//! sits half a step ahead and half a step down from the centre, so after a
//! quarter turn the centre has advanced exactly one step.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Cardinal input direction. Forward is +Z, right is +X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
}

impl Direction {
    pub fn to_vec3(self) -> Vec3 {
        match self {
            Direction::Forward => Vec3::Z,
            Direction::Back => Vec3::NEG_Z,
            Direction::Left => Vec3::NEG_X,
            Direction::Right => Vec3::X,
        }
    }

    /// Input axis this direction belongs to (0 = horizontal, 1 = vertical)
    pub fn axis(self) -> usize {
        match self {
            Direction::Left | Direction::Right => 0,
            Direction::Forward | Direction::Back => 1,
        }
    }
}

/// Position + orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Snap an orientation to the nearest 90° rotation about each axis.
///
/// Rotations by multiples of 90° are signed permutation matrices, so rounding
/// every matrix element to -1/0/1 removes accumulated drift.
pub fn snap_orientation(q: Quat) -> Quat {
    let m = Mat3::from_quat(q.normalize());
    let snap = |v: Vec3| Vec3::new(v.x.round(), v.y.round(), v.z.round());
    let snapped = Mat3::from_cols(snap(m.x_axis), snap(m.y_axis), snap(m.z_axis));
    // Rounding only yields a rotation when the input was near a right angle
    if (snapped.determinant() - 1.0).abs() > 1e-3 {
        return q.normalize();
    }
    Quat::from_mat3(&snapped).normalize()
}

/// An in-flight 90° roll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roll {
    pub start: Pose,
    pub pivot: Vec3,
    pub axis: Vec3,
    pub direction: Direction,
    pub elapsed: f32,
    pub duration: f32,
}

impl Roll {
    pub fn new(start: Pose, direction: Direction, step: f32, duration: f32) -> Self {
        let d = direction.to_vec3();
        let half = step / 2.0;
        Self {
            start,
            pivot: start.position + d * half + Vec3::NEG_Y * half,
            axis: Vec3::Y.cross(d),
            direction,
            elapsed: 0.0,
            duration,
        }
    }

    /// Completed fraction in [0, 1]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    /// Interpolated pose at the current progress
    pub fn pose(&self) -> Pose {
        let angle = std::f32::consts::FRAC_PI_2 * self.progress();
        let delta = Quat::from_axis_angle(self.axis, angle);
        Pose::new(
            self.pivot + delta * (self.start.position - self.pivot),
            delta * self.start.orientation,
        )
    }

    /// Advance time. Returns true once the roll has completed.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        self.progress() >= 1.0
    }

    /// Move the whole roll (a carrier moved underneath it)
    pub fn shift(&mut self, delta: Vec3) {
        self.start.position += delta;
        self.pivot += delta;
    }

    /// Final pose with the orientation snapped to right angles
    pub fn finish(&self) -> Pose {
        let mut end = self.pose();
        end.orientation = snap_orientation(end.orientation);
        end
    }
}
