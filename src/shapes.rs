// src/shapes.rs
//! Native collision shapes for [`PhysicalObject`](crate::PhysicalObject)s.

use glam::Vec3;
use rapier3d::prelude::{MassProperties, SharedShape};

use crate::collider::{Collider, ColliderModel};

/// Box (cuboid) using half extents.
pub fn cuboid(half_extents: Vec3) -> SharedShape {
    SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
}

pub fn ball(radius: f32) -> SharedShape {
    SharedShape::ball(radius)
}

/// Capsule aligned on Y.
pub fn capsule(half_height: f32, radius: f32) -> SharedShape {
    SharedShape::capsule_y(half_height, radius)
}

pub fn cylinder(half_height: f32, radius: f32) -> SharedShape {
    SharedShape::cylinder(half_height, radius)
}

/// Same volume as a space collider: its half-scale box or its sphere.
pub fn from_collider(collider: &Collider) -> Option<SharedShape> {
    match collider.model {
        Some(ColliderModel::Aabb) => Some(cuboid(collider.transform.half_scale())),
        Some(ColliderModel::Sphere) => Some(ball(collider.radius)),
        None => {
            log::error!("Collider: {} have no detection model set", collider.name);
            None
        }
    }
}

/// Mass properties of `shape` rescaled to `mass`, keeping its inertia distribution.
pub fn mass_properties(shape: &SharedShape, mass: f32) -> MassProperties {
    let unit = shape.mass_properties(1.0);
    let scale = if unit.mass() > 0.0 { mass / unit.mass() } else { 0.0 };
    MassProperties::with_principal_inertia_frame(
        unit.local_com,
        mass,
        unit.principal_inertia() * scale,
        unit.principal_inertia_local_frame,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_properties_rescaled() {
        let shape = ball(2.0);
        let props = mass_properties(&shape, 1.0);
        assert!((props.mass() - 1.0).abs() < 1e-5);
        // solid sphere: I = 2/5 m r^2
        let expected = 0.4 * 1.0 * 4.0;
        assert!((props.principal_inertia().x - expected).abs() < 1e-3);

        let heavy = mass_properties(&shape, 10.0);
        assert!((heavy.principal_inertia().x - expected * 10.0).abs() < 1e-2);
    }

    #[test]
    fn test_from_collider_matches_model() {
        let boxed = Collider::aabb("box", Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0));
        let shape = from_collider(&boxed).unwrap();
        let cuboid = shape.as_cuboid().unwrap();
        assert_eq!(cuboid.half_extents.x, 1.0);
        assert_eq!(cuboid.half_extents.z, 3.0);

        let sphere = Collider::sphere("ball", Vec3::ZERO, 0.75);
        assert_eq!(from_collider(&sphere).unwrap().as_ball().unwrap().radius, 0.75);

        assert!(from_collider(&Collider::default()).is_none());
    }
}
