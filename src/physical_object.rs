// src/physical_object.rs
//! Engine-side object backed by a rapier body.
//!
//! An object owns exactly one native representation: a dynamic rigid body, or a
//! kinematic "ghost" carrying a sensor (trigger) or solid (collider) shape. While unlinked
//! the native body and collider are owned by the object itself; linking moves them into a
//! [`PhysicsWorld`] and unlinking takes them back, so native resources always have exactly
//! one owner.

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec3;
use nalgebra::Point3;
use rapier3d::prelude as rap3d;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::physics::{self, PhysicsWorld};
use crate::shapes;
use crate::transform::Transform;

/// Identity used to trace native contacts back to objects. Unique per engine.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysicId(pub u32);

impl fmt::Display for PhysicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PhysicalType {
    /// No native representation yet.
    #[default]
    Unknown,
    RigidBody,
    /// Reports overlaps, no contact response.
    TriggerSensor,
    /// Solid obstacle that dynamic bodies collide with but never move.
    Collider,
}

/// Gameplay tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    pub fn add_tag<S: Into<String>>(&mut self, tag: S) {
        self.0.insert(tag.into());
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.0.remove(tag)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Overridable callbacks. All methods default to no-ops.
pub trait PhysicalHooks: Send {
    /// Before the engine transform is pushed into the native body.
    fn on_physic_pre_update(&mut self, _transform: &mut Transform) {}

    /// After the post-step native transform was pulled into the engine transform.
    fn on_physic_post_update(&mut self, _transform: &mut Transform) {}

    /// Once per contact manifold per step, for each side of the pair.
    fn on_collide(&mut self, _this: &PhysicalObject, _other: &PhysicalObject) {}
}

enum NativeObject {
    None,
    Detached { body: rap3d::RigidBody, collider: rap3d::Collider },
    Linked { body: rap3d::RigidBodyHandle, collider: rap3d::ColliderHandle },
}

/// Native-state requests recorded by the setters and applied at the next push.
#[derive(Debug, Default)]
struct PendingRequests {
    mass: Option<(f32, Vec3)>,
    linear_velocity: Option<Vec3>,
    impulse: Vec3,
    gravity_dirty: bool,
}

pub struct PhysicalObject {
    pub transform: Transform,
    pub tags: Tags,
    physic_id: PhysicId,
    physical_type: PhysicalType,
    native: NativeObject,
    pending: PendingRequests,
    mass: f32,
    gravity: Option<Vec3>,
    linear_velocity: Vec3,
    /// Pose last written to or read from the native body.
    last_synced: Option<Transform>,
    simulated: bool,
    unlink_requested: bool,
    hooks: Option<Box<dyn PhysicalHooks>>,
}

impl fmt::Debug for PhysicalObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicalObject")
            .field("physic_id", &self.physic_id)
            .field("physical_type", &self.physical_type)
            .field("transform", &self.transform)
            .field("linked", &self.is_linked())
            .field("simulated", &self.simulated)
            .field("unlink_requested", &self.unlink_requested)
            .finish()
    }
}

impl PhysicalObject {
    pub(crate) fn new(physic_id: PhysicId, transform: Transform) -> Self {
        Self {
            transform,
            tags: Tags::default(),
            physic_id,
            physical_type: PhysicalType::Unknown,
            native: NativeObject::None,
            pending: PendingRequests::default(),
            mass: 1.0,
            gravity: None,
            linear_velocity: Vec3::ZERO,
            last_synced: None,
            simulated: true,
            unlink_requested: false,
            hooks: None,
        }
    }

    #[inline(always)]
    pub fn physic_id(&self) -> PhysicId {
        self.physic_id
    }

    #[inline(always)]
    pub fn physical_type(&self) -> PhysicalType {
        self.physical_type
    }

    #[inline]
    pub fn is_linked(&self) -> bool {
        matches!(self.native, NativeObject::Linked { .. })
    }

    /// Whether the object was inside the simulation space at the last simulate.
    #[inline]
    pub fn is_simulated(&self) -> bool {
        self.simulated
    }

    #[inline]
    pub fn is_unlink_requested(&self) -> bool {
        self.unlink_requested
    }

    /// Asks the owning engine to unlink this object at the start of its next simulate.
    pub fn unlink(&mut self) {
        self.unlink_requested = true;
    }

    pub fn set_hooks<H: PhysicalHooks + 'static>(&mut self, hooks: H) {
        self.hooks = Some(Box::new(hooks));
    }

    pub fn clear_hooks(&mut self) {
        self.hooks = None;
    }

    pub(crate) fn take_hooks(&mut self) -> Option<Box<dyn PhysicalHooks>> {
        self.hooks.take()
    }

    pub(crate) fn restore_hooks(&mut self, hooks: Option<Box<dyn PhysicalHooks>>) {
        if self.hooks.is_none() {
            self.hooks = hooks;
        }
    }

    // -------------------------------------------------------------------------
    // Native representation
    // -------------------------------------------------------------------------

    /// Dynamic body of unit mass with the shape's inertia distribution.
    pub fn create_rigidbody(&mut self, shape: rap3d::SharedShape) -> Result<()> {
        self.ensure_detached()?;
        let user_data = self.physic_id.0 as u128;
        let body = rap3d::RigidBodyBuilder::dynamic()
            .position(physics::to_isometry(&self.transform))
            .user_data(user_data)
            .build();
        let collider = rap3d::ColliderBuilder::new(shape.clone())
            .mass_properties(shapes::mass_properties(&shape, 1.0))
            .user_data(user_data)
            .build();

        self.mass = 1.0;
        self.linear_velocity = Vec3::ZERO;
        self.install(PhysicalType::RigidBody, body, collider);
        Ok(())
    }

    /// Kinematic ghost. Triggers get a sensor collider without contact response.
    pub fn create_collider(&mut self, shape: rap3d::SharedShape, is_trigger: bool) -> Result<()> {
        self.ensure_detached()?;
        let user_data = self.physic_id.0 as u128;
        let body = rap3d::RigidBodyBuilder::kinematic_position_based()
            .position(physics::to_isometry(&self.transform))
            .user_data(user_data)
            .build();
        let collider = rap3d::ColliderBuilder::new(shape)
            .sensor(is_trigger)
            .density(0.0)
            .user_data(user_data)
            .build();

        let physical_type =
            if is_trigger { PhysicalType::TriggerSensor } else { PhysicalType::Collider };
        self.install(physical_type, body, collider);
        Ok(())
    }

    fn ensure_detached(&self) -> Result<()> {
        if self.is_linked() {
            return Err(Error::invalid_argument(format!(
                "object {} is linked, unlink it before replacing its shape",
                self.physic_id
            )));
        }
        Ok(())
    }

    fn install(&mut self, physical_type: PhysicalType, body: rap3d::RigidBody, collider: rap3d::Collider) {
        self.physical_type = physical_type;
        self.native = NativeObject::Detached { body, collider };
        self.pending = PendingRequests::default();
        self.gravity = None;
        self.last_synced = None;
    }

    /// Fails unless the object holds a detached native body that `link` can insert.
    pub(crate) fn ensure_linkable(&self) -> Result<()> {
        match self.native {
            NativeObject::Detached { .. } => Ok(()),
            NativeObject::Linked { .. } => Err(Error::invalid_argument(format!(
                "object {} is already linked",
                self.physic_id
            ))),
            NativeObject::None => Err(Error::invalid_argument(format!(
                "object {} has no native representation",
                self.physic_id
            ))),
        }
    }

    /// Moves the native body into `world`.
    pub(crate) fn link(&mut self, world: &mut PhysicsWorld) -> Result<()> {
        self.ensure_linkable()?;
        if let NativeObject::Detached { mut body, collider } =
            std::mem::replace(&mut self.native, NativeObject::None)
        {
            body.set_position(physics::to_isometry(&self.transform), false);
            let (body, collider) = world.insert(body, collider);
            self.native = NativeObject::Linked { body, collider };
            self.last_synced = Some(self.transform);
            self.simulated = true;
            self.unlink_requested = false;
            self.pending.gravity_dirty = self.gravity.is_some();
        }
        Ok(())
    }

    /// Takes the native body back out of `world`.
    pub(crate) fn unlink_native(&mut self, world: &mut PhysicsWorld) {
        if let NativeObject::Linked { body, collider } = self.native {
            self.native = match world.remove(body, collider) {
                Some((body, collider)) => NativeObject::Detached { body, collider },
                None => {
                    log::warn!("physics: native body of object {} was already gone", self.physic_id);
                    NativeObject::None
                }
            };
        }
        self.unlink_requested = false;
    }

    pub(crate) fn body_handle(&self) -> Option<rap3d::RigidBodyHandle> {
        match self.native {
            NativeObject::Linked { body, .. } => Some(body),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Rigid body state (no-ops for other types)
    // -------------------------------------------------------------------------

    /// Mass and principal inertia. Zero inertia locks rotation.
    pub fn set_mass(&mut self, mass: f32, inertia: Vec3) {
        if self.physical_type == PhysicalType::RigidBody {
            self.mass = mass;
            self.pending.mass = Some((mass, inertia));
            self.pending.gravity_dirty |= self.gravity.is_some();
        }
    }

    #[inline]
    pub fn mass(&self) -> Option<f32> {
        (self.physical_type == PhysicalType::RigidBody).then_some(self.mass)
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        if self.physical_type == PhysicalType::RigidBody {
            self.linear_velocity = velocity;
            self.pending.linear_velocity = Some(velocity);
        }
    }

    pub fn reset_linear_velocity(&mut self) {
        self.set_linear_velocity(Vec3::ZERO);
    }

    /// Last known linear velocity, `None` unless this is a rigid body.
    pub fn linear_velocity(&self) -> Option<Vec3> {
        (self.physical_type == PhysicalType::RigidBody).then_some(self.linear_velocity)
    }

    /// Per-body gravity overriding the world gravity.
    pub fn set_gravity(&mut self, gravity: Vec3) {
        if self.physical_type == PhysicalType::RigidBody {
            self.gravity = Some(gravity);
            self.pending.gravity_dirty = true;
        }
    }

    pub fn gravity(&self) -> Option<Vec3> {
        self.gravity
    }

    pub fn apply_impulse(&mut self, impulse: Vec3) {
        if self.physical_type == PhysicalType::RigidBody {
            self.pending.impulse += impulse;
        }
    }

    // -------------------------------------------------------------------------
    // Transform sync
    // -------------------------------------------------------------------------

    /// Runs the pre-update hook then pushes position and rotation into the native body,
    /// along with any pending rigid-body requests.
    pub fn update_physic_transform(&mut self, world: &mut PhysicsWorld) {
        if let Some(hooks) = self.hooks.as_mut() {
            hooks.on_physic_pre_update(&mut self.transform);
        }
        let NativeObject::Linked { body, collider } = self.native else { return };
        let Some(rb) = world.bodies.get_mut(body) else { return };

        let moved = self.last_synced.map_or(true, |last| {
            last.position != self.transform.position || last.rotation != self.transform.rotation
        });
        if moved {
            let pose = physics::to_isometry(&self.transform);
            rb.set_position(pose, true);
            if rb.is_kinematic() {
                rb.set_next_kinematic_position(pose);
            }
            self.last_synced = Some(self.transform);
        }

        if self.physical_type != PhysicalType::RigidBody {
            return;
        }

        if let Some(velocity) = self.pending.linear_velocity.take() {
            rb.set_linvel(physics::to_vector(velocity), true);
        }
        let impulse = std::mem::take(&mut self.pending.impulse);
        if impulse != Vec3::ZERO {
            rb.apply_impulse(physics::to_vector(impulse), true);
        }
        if std::mem::take(&mut self.pending.gravity_dirty) {
            rb.reset_forces(false);
            match self.gravity {
                Some(gravity) => {
                    rb.set_gravity_scale(0.0, true);
                    rb.add_force(physics::to_vector(gravity * self.mass), true);
                }
                None => rb.set_gravity_scale(1.0, true),
            }
        }
        if let Some((mass, inertia)) = self.pending.mass.take() {
            if let Some(native) = world.colliders.get_mut(collider) {
                native.set_mass_properties(rap3d::MassProperties::new(
                    Point3::origin(),
                    mass,
                    physics::to_vector(inertia),
                ));
            }
        }
    }

    /// Pulls the post-step native pose into the engine transform, then runs the
    /// post-update hook. No-op without a linked native body.
    pub fn update_object_transform(&mut self, world: &PhysicsWorld) {
        if !self.sync_pose(world) {
            return;
        }
        if let Some(hooks) = self.hooks.as_mut() {
            hooks.on_physic_post_update(&mut self.transform);
        }
    }

    /// Copies the native pose (and velocity) without running hooks.
    pub(crate) fn sync_pose(&mut self, world: &PhysicsWorld) -> bool {
        let Some(rb) = self.body_handle().and_then(|h| world.body(h)) else { return false };

        let (position, rotation) = physics::from_isometry(rb.position());
        self.transform.position = position;
        self.transform.rotation = rotation;
        if self.physical_type == PhysicalType::RigidBody {
            self.linear_velocity = physics::from_vector(rb.linvel());
        }
        self.last_synced = Some(self.transform);
        true
    }

    /// Enables or disables native simulation of this object.
    pub(crate) fn set_simulated(&mut self, world: &mut PhysicsWorld, simulated: bool) {
        let Some(rb) = self.body_handle().and_then(|h| world.body_mut(h)) else { return };
        if rb.is_enabled() != simulated {
            rb.set_enabled(simulated);
            if simulated {
                rb.wake_up(true);
            }
        }
        self.simulated = simulated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn placed(id: u32, position: Vec3) -> PhysicalObject {
        PhysicalObject::new(PhysicId(id), Transform::from_position(position))
    }

    #[test]
    fn test_tags() {
        let mut object = placed(1, Vec3::ZERO);
        object.tags.add_tag("enemy");
        object.tags.add_tag("flying");
        assert!(object.tags.has_tag("enemy"));
        assert!(object.tags.remove_tag("enemy"));
        assert!(!object.tags.remove_tag("enemy"));
        assert_eq!(object.tags.iter().collect::<Vec<_>>(), ["flying"]);
    }

    #[test]
    fn test_rigid_body_only_setters_ignore_other_types() {
        let mut unknown = placed(1, Vec3::ZERO);
        unknown.set_linear_velocity(Vec3::X);
        unknown.set_mass(5.0, Vec3::ZERO);
        assert_eq!(unknown.linear_velocity(), None);
        assert_eq!(unknown.mass(), None);

        let mut trigger = placed(2, Vec3::ZERO);
        trigger.create_collider(shapes::ball(1.0), true).unwrap();
        assert_eq!(trigger.physical_type(), PhysicalType::TriggerSensor);
        trigger.set_gravity(Vec3::NEG_Y);
        assert_eq!(trigger.gravity(), None);
        assert_eq!(trigger.linear_velocity(), None);

        let mut body = placed(3, Vec3::ZERO);
        body.create_rigidbody(shapes::ball(1.0)).unwrap();
        assert_eq!(body.mass(), Some(1.0));
        body.set_linear_velocity(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(body.linear_velocity(), Some(Vec3::new(1.0, 2.0, 3.0)));
        body.reset_linear_velocity();
        assert_eq!(body.linear_velocity(), Some(Vec3::ZERO));
    }

    #[test]
    fn test_solid_collider_type() {
        let mut wall = placed(1, Vec3::ZERO);
        wall.create_collider(shapes::cuboid(Vec3::ONE), false).unwrap();
        assert_eq!(wall.physical_type(), PhysicalType::Collider);
    }

    #[test]
    fn test_link_requires_native_and_moves_ownership() {
        let mut world = PhysicsWorld::default();
        let mut object = placed(1, Vec3::ZERO);
        assert!(object.link(&mut world).unwrap_err().is_invalid_argument());

        object.create_rigidbody(shapes::ball(0.5)).unwrap();
        object.link(&mut world).unwrap();
        assert!(object.is_linked());
        assert_eq!(world.body_count(), 1);
        assert!(object.link(&mut world).unwrap_err().is_invalid_argument());
        assert!(object.create_rigidbody(shapes::ball(0.5)).unwrap_err().is_invalid_argument());

        object.unlink_native(&mut world);
        assert!(!object.is_linked());
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.collider_count(), 0);

        object.link(&mut world).unwrap();
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_push_then_pull_without_step_round_trips() {
        let mut world = PhysicsWorld::new(Vec3::new(0.0, -9.81, 0.0));
        let mut object = placed(1, Vec3::new(4.0, 5.0, 6.0));
        object.create_rigidbody(shapes::cuboid(Vec3::splat(0.5))).unwrap();
        object.link(&mut world).unwrap();

        object.transform.position = Vec3::new(-1.0, 2.5, 8.0);
        object.transform.rotation = Quat::from_rotation_y(0.8) * Quat::from_rotation_x(0.3);
        let expected = object.transform;

        object.update_physic_transform(&mut world);
        object.update_object_transform(&world);

        assert!(object.transform.pose_eq(&expected, 1e-5));
    }

    struct Counting {
        pre: Arc<AtomicUsize>,
        post: Arc<AtomicUsize>,
    }

    impl PhysicalHooks for Counting {
        fn on_physic_pre_update(&mut self, transform: &mut Transform) {
            self.pre.fetch_add(1, Ordering::SeqCst);
            transform.translate(Vec3::X);
        }

        fn on_physic_post_update(&mut self, _transform: &mut Transform) {
            self.post.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_hooks_wrap_sync() {
        let pre = Arc::new(AtomicUsize::new(0));
        let post = Arc::new(AtomicUsize::new(0));
        let mut world = PhysicsWorld::default();
        let mut object = placed(1, Vec3::ZERO);
        object.create_collider(shapes::ball(1.0), true).unwrap();
        object.set_hooks(Counting { pre: pre.clone(), post: post.clone() });

        // not linked: pre-update runs, pull is a no-op
        object.update_physic_transform(&mut world);
        object.update_object_transform(&world);
        assert_eq!((pre.load(Ordering::SeqCst), post.load(Ordering::SeqCst)), (1, 0));

        object.link(&mut world).unwrap();
        object.update_physic_transform(&mut world);
        object.update_object_transform(&world);
        assert_eq!((pre.load(Ordering::SeqCst), post.load(Ordering::SeqCst)), (2, 1));
        assert!(object.transform.position.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
    }
}
