// src/physics.rs
//! Rapier 3D world owned by a [`PhysicalEngine`](crate::PhysicalEngine).
//!
//! Thin wrapper around the rapier pipeline and sets plus the glam <-> nalgebra conversions.
//! Bodies and colliders carry the owning object's physic id in `user_data`, which is how
//! contact manifolds are traced back to engine objects.

use glam::{Quat, Vec3};
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rapier3d::prelude as rap3d;

use crate::transform::Transform;

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

#[inline(always)]
pub fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

#[inline(always)]
pub fn from_vector(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub fn to_rotation(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

#[inline]
pub fn from_rotation(q: &UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

/// Position and rotation of `transform` as a native pose. Scale is not part of it.
pub fn to_isometry(transform: &Transform) -> Isometry3<f32> {
    let p = transform.position;
    Isometry3::from_parts(Translation3::new(p.x, p.y, p.z), to_rotation(transform.rotation))
}

pub fn from_isometry(iso: &Isometry3<f32>) -> (Vec3, Quat) {
    (from_vector(&iso.translation.vector), from_rotation(&iso.rotation))
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

pub struct PhysicsWorld {
    gravity: Vector3<f32>,
    pipeline: rap3d::PhysicsPipeline,
    integration_params: rap3d::IntegrationParameters,
    islands: rap3d::IslandManager,
    broad_phase: rap3d::BroadPhase,
    narrow_phase: rap3d::NarrowPhase,
    pub(crate) bodies: rap3d::RigidBodySet,
    pub(crate) colliders: rap3d::ColliderSet,
    impulse_joints: rap3d::ImpulseJointSet,
    multibody_joints: rap3d::MultibodyJointSet,
    ccd_solver: rap3d::CCDSolver,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: to_vector(gravity),
            pipeline: rap3d::PhysicsPipeline::new(),
            integration_params: rap3d::IntegrationParameters::default(),
            islands: rap3d::IslandManager::new(),
            broad_phase: rap3d::BroadPhase::new(),
            narrow_phase: rap3d::NarrowPhase::new(),
            bodies: rap3d::RigidBodySet::new(),
            colliders: rap3d::ColliderSet::new(),
            impulse_joints: rap3d::ImpulseJointSet::new(),
            multibody_joints: rap3d::MultibodyJointSet::new(),
            ccd_solver: rap3d::CCDSolver::new(),
        }
    }

    #[inline]
    pub fn gravity(&self) -> Vec3 {
        from_vector(&self.gravity)
    }

    #[inline]
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = to_vector(gravity);
    }

    /// Advances the world by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration_params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    // -------------------------------------------------------------------------
    // Body Management
    // -------------------------------------------------------------------------

    /// Inserts a body with its single collider attached.
    pub fn insert(
        &mut self,
        body: rap3d::RigidBody,
        collider: rap3d::Collider,
    ) -> (rap3d::RigidBodyHandle, rap3d::ColliderHandle) {
        let body_handle = self.bodies.insert(body);
        let collider_handle = self.colliders.insert_with_parent(collider, body_handle, &mut self.bodies);
        (body_handle, collider_handle)
    }

    /// Takes a body and its collider back out of the world. Joints attached to the body
    /// are destroyed with it.
    pub fn remove(
        &mut self,
        body: rap3d::RigidBodyHandle,
        collider: rap3d::ColliderHandle,
    ) -> Option<(rap3d::RigidBody, rap3d::Collider)> {
        let collider = self.colliders.remove(collider, &mut self.islands, &mut self.bodies, false);
        let body = self.bodies.remove(
            body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        body.zip(collider)
    }

    #[inline]
    pub fn body(&self, handle: rap3d::RigidBodyHandle) -> Option<&rap3d::RigidBody> {
        self.bodies.get(handle)
    }

    #[inline]
    pub fn body_mut(&mut self, handle: rap3d::RigidBodyHandle) -> Option<&mut rap3d::RigidBody> {
        self.bodies.get_mut(handle)
    }

    #[inline]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    // -------------------------------------------------------------------------
    // Joints
    // -------------------------------------------------------------------------

    pub fn insert_joint(
        &mut self,
        body1: rap3d::RigidBodyHandle,
        body2: rap3d::RigidBodyHandle,
        joint: rap3d::GenericJoint,
    ) -> rap3d::ImpulseJointHandle {
        self.impulse_joints.insert(body1, body2, joint, true)
    }

    pub fn remove_joint(&mut self, handle: rap3d::ImpulseJointHandle) -> bool {
        self.impulse_joints.remove(handle, true).is_some()
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.impulse_joints.len()
    }

    // -------------------------------------------------------------------------
    // Contacts
    // -------------------------------------------------------------------------

    /// `user_data` of both colliders for every contact manifold that produced solver
    /// contacts in the last step, plus every intersecting sensor pair.
    pub fn contact_manifold_pairs(&self) -> Vec<(u128, u128)> {
        let mut pairs = Vec::new();

        for contact_pair in self.narrow_phase.contact_pairs() {
            let (Some(c1), Some(c2)) = (
                self.colliders.get(contact_pair.collider1),
                self.colliders.get(contact_pair.collider2),
            ) else {
                continue;
            };
            for manifold in &contact_pair.manifolds {
                if !manifold.data.solver_contacts.is_empty() {
                    pairs.push((c1.user_data, c2.user_data));
                }
            }
        }

        for (h1, h2, intersecting) in self.narrow_phase.intersection_pairs() {
            if !intersecting {
                continue;
            }
            if let (Some(c1), Some(c2)) = (self.colliders.get(h1), self.colliders.get(h2)) {
                pairs.push((c1.user_data, c2.user_data));
            }
        }

        pairs
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}
