// src/collider.rs
//! Collider geometry.
//!
//! One canonical set of bounding volumes ([`Aabb`], [`Sphere`]) with closed-form tests,
//! and the [`Collider`] record the layered [`PhysicalSpace`](crate::PhysicalSpace) works on.
//! All bounds are closed intervals: touching volumes overlap.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::transform::Transform;

pub const DEFAULT_COLLIDER_NAME: &str = "DefaultColliderName";

/* -------------------------------------------------------------------------- */
/*                               Bounding volumes                             */
/* -------------------------------------------------------------------------- */

/// Axis aligned box given by its min and max corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min: min.min(max), max: min.max(max) }
    }

    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self { min: center - half, max: center + half }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Per-axis interval overlap.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    #[inline]
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        let closest = self.closest_point(sphere.center);
        closest.distance_squared(sphere.center) <= sphere.radius * sphere.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    #[inline]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius: radius.abs() }
    }

    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.center.distance_squared(point) <= self.radius * self.radius
    }

    #[inline]
    pub fn intersects(&self, other: &Sphere) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) <= reach * reach
    }
}

/// A resolved bounding volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Aabb(Aabb),
    Sphere(Sphere),
}

impl Shape {
    pub fn contains_point(&self, point: Vec3) -> bool {
        match self {
            Shape::Aabb(aabb) => aabb.contains_point(point),
            Shape::Sphere(sphere) => sphere.contains_point(point),
        }
    }

    pub fn intersects(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Aabb(a), Shape::Aabb(b)) => a.intersects(b),
            (Shape::Aabb(a), Shape::Sphere(s)) => a.intersects_sphere(s),
            (Shape::Sphere(s), Shape::Aabb(a)) => a.intersects_sphere(s),
            (Shape::Sphere(a), Shape::Sphere(b)) => a.intersects(b),
        }
    }
}

/* -------------------------------------------------------------------------- */
/*                                   Collider                                  */
/* -------------------------------------------------------------------------- */

/// Detection model of a [`Collider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColliderModel {
    Aabb,
    Sphere,
}

/// A transform with a detection model and the simple rigid-body parameters used by
/// [`PhysicalSpace`](crate::PhysicalSpace). The `name` is its identity inside a space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collider {
    pub name: String,
    pub transform: Transform,
    /// `None` is a configuration error: tests against it log and report no collision.
    pub model: Option<ColliderModel>,
    pub radius: f32,
    pub is_rigid_body: bool,
    /// Never moved by the space.
    pub fixed: bool,
    pub mass: f32,
    pub bounce: f32,
    pub velocity: Vec3,
    pub gravity: Vec3,
}

impl Default for Collider {
    fn default() -> Self {
        Self {
            name: DEFAULT_COLLIDER_NAME.to_string(),
            transform: Transform::default(),
            model: None,
            radius: 0.5,
            is_rigid_body: false,
            fixed: false,
            mass: 1.0,
            bounce: 1.0,
            velocity: Vec3::ZERO,
            gravity: Vec3::ZERO,
        }
    }
}

impl Collider {
    pub fn new<S: Into<String>>(name: S, model: ColliderModel) -> Self {
        Self { name: name.into(), model: Some(model), ..Self::default() }
    }

    pub fn aabb<S: Into<String>>(name: S, position: Vec3, scale: Vec3) -> Self {
        let mut collider = Self::new(name, ColliderModel::Aabb);
        collider.transform = Transform::from_position_scale(position, scale);
        collider
    }

    pub fn sphere<S: Into<String>>(name: S, position: Vec3, radius: f32) -> Self {
        let mut collider = Self::new(name, ColliderModel::Sphere);
        collider.transform = Transform::from_position_scale(position, Vec3::splat(radius * 2.0));
        collider.radius = radius;
        collider
    }

    #[inline]
    pub fn with_rigid_body(mut self, state: bool) -> Self {
        self.is_rigid_body = state;
        self
    }

    #[inline]
    pub fn with_fixed(mut self, state: bool) -> Self {
        self.fixed = state;
        self
    }

    #[inline]
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    #[inline(always)]
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    #[inline]
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    pub fn set_rigid_body(&mut self, state: bool) {
        self.is_rigid_body = state;
    }

    /// Accumulates velocity, consumed by the next space update.
    pub fn move_by(&mut self, direction: Vec3) {
        self.velocity += direction;
    }

    /// Bounds centred on the position with the half-scale as half-extent.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(self.transform.position, self.transform.half_scale())
    }

    /// The bounding volume, or `None` (logged) when no detection model is set.
    pub fn shape(&self) -> Option<Shape> {
        match self.model {
            Some(ColliderModel::Aabb) => Some(Shape::Aabb(self.bounds())),
            Some(ColliderModel::Sphere) => {
                Some(Shape::Sphere(Sphere::new(self.transform.position, self.radius)))
            }
            None => {
                log::error!("Collider: {} have no detection model set", self.name);
                None
            }
        }
    }

    pub fn point_in(&self, point: Vec3) -> bool {
        self.shape().map_or(false, |shape| shape.contains_point(point))
    }

    pub fn other_in(&self, other: &Collider) -> bool {
        match (self.shape(), other.shape()) {
            (Some(a), Some(b)) => a.intersects(&b),
            _ => false,
        }
    }
}
