// src/transform.rs
//! Position / rotation / scale primitive shared by every spatial type in the crate.
//!
//! Scale is private: the only way to change it is [`Transform::set_scale`], which
//! recomputes the cached half-scale, so the AABB half-extent can never go stale.

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransformRecord", into = "TransformRecord")]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    scale: Vec3,
    half_scale: Vec3,
}

/// Serialized form supplied by the world loader. Half-scale is derived, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
struct TransformRecord {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl Default for TransformRecord {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl From<TransformRecord> for Transform {
    fn from(record: TransformRecord) -> Self {
        let mut transform = Transform::from_position(record.position);
        transform.rotation = record.rotation.normalize();
        transform.set_scale(record.scale);
        transform
    }
}

impl From<Transform> for TransformRecord {
    fn from(transform: Transform) -> Self {
        Self { position: transform.position, rotation: transform.rotation, scale: transform.scale }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            half_scale: Vec3::splat(0.5),
        }
    }
}

impl Transform {
    #[inline]
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    #[inline]
    pub fn from_position_scale(position: Vec3, scale: Vec3) -> Self {
        let mut transform = Self::from_position(position);
        transform.set_scale(scale);
        transform
    }

    #[inline]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[inline(always)]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Half of the scale, used as the AABB half-extent.
    #[inline(always)]
    pub fn half_scale(&self) -> Vec3 {
        self.half_scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.update_half_scale();
    }

    #[inline]
    pub fn update_half_scale(&mut self) {
        self.half_scale = self.scale / 2.0;
    }

    #[inline]
    pub fn translate(&mut self, translation: Vec3) {
        self.position += translation;
    }

    /// Rotates around `axis` (Z when `None`) by `degrees`, in local space.
    pub fn rotate(&mut self, degrees: f32, axis: Option<Vec3>) {
        let axis = axis.unwrap_or(Vec3::Z).normalize_or_zero();
        if axis == Vec3::ZERO {
            return;
        }
        let delta = Quat::from_axis_angle(axis, degrees.to_radians());
        self.rotation = (self.rotation * delta).normalize();
    }

    /// Euler angles in radians, `x` = pitch, `y` = yaw, `z` = roll, applied Y then X then Z.
    pub fn set_rotation_euler(&mut self, euler: Vec3) {
        self.rotation = Quat::from_euler(EulerRot::YXZ, euler.y, euler.x, euler.z);
    }

    pub fn euler_rotation(&self) -> Vec3 {
        let (yaw, pitch, roll) = self.rotation.to_euler(EulerRot::YXZ);
        Vec3::new(pitch, yaw, roll)
    }

    #[inline]
    pub fn average_scale(&self) -> f32 {
        (self.scale.x + self.scale.y + self.scale.z) / 3.0
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn matrix_half_scale(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.half_scale, self.rotation, self.position)
    }

    /// Local point to world space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.matrix().transform_point3(point)
    }

    /// Position and rotation match within `epsilon`. Scale is not part of the native pose.
    pub fn pose_eq(&self, other: &Transform, epsilon: f32) -> bool {
        self.position.abs_diff_eq(other.position, epsilon)
            && (self.rotation.abs_diff_eq(other.rotation, epsilon)
                || self.rotation.abs_diff_eq(-other.rotation, epsilon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_scale_follows_set_scale() {
        let mut t = Transform::default();
        assert_eq!(t.half_scale(), Vec3::splat(0.5));
        t.set_scale(Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(t.half_scale(), Vec3::new(1.0, 2.0, 3.0));
        assert!((t.average_scale() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotate_defaults_to_z() {
        let mut t = Transform::default();
        t.rotate(90.0, None);
        let p = t.transform_point(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::Y, 1e-5));
        assert!((t.rotation.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_euler_round_trip() {
        let mut t = Transform::default();
        let euler = Vec3::new(0.3, -0.7, 0.2);
        t.set_rotation_euler(euler);
        assert!(t.euler_rotation().abs_diff_eq(euler, 1e-4));
    }

    #[test]
    fn test_deserialize_derives_half_scale() {
        let t: Transform =
            serde_json::from_str(r#"{ "position": [1.0, 2.0, 3.0], "scale": [4.0, 4.0, 4.0] }"#)
                .unwrap();
        assert_eq!(t.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.half_scale(), Vec3::splat(2.0));
    }

    #[test]
    fn test_pose_eq_ignores_quaternion_sign() {
        let a = Transform::default().with_rotation(Quat::from_rotation_y(0.4));
        let b = Transform::default().with_rotation(-Quat::from_rotation_y(0.4));
        assert!(a.pose_eq(&b, 1e-6));
    }
}
