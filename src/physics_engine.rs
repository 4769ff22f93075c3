// src/physics_engine.rs
//! Simulation driver.
//!
//! Owns the rapier world and every linked [`PhysicalObject`], keyed by a caller-chosen id.
//! One [`PhysicalEngine::simulate`] call runs, strictly in order:
//!
//! 1. recenter the simulation space on the anchor, drop objects flagged with `unlink()`
//! 2. push engine transforms, enable objects inside the simulation space, disable the rest
//! 3. step the native world (skipped for a non-positive step time)
//! 4. dispatch `on_collide` for every contact manifold, in both directions
//! 5. pull post-step transforms back into the objects

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use indexmap::IndexMap;
use parking_lot::RwLock;
use rapier3d::prelude as rap3d;

use crate::collider::{Aabb, Collider, ColliderModel};
use crate::config::{PhysicsConfig, StepMode};
use crate::error::{Error, Result};
use crate::physical_object::{PhysicId, PhysicalObject, PhysicalType};
use crate::physics::PhysicsWorld;
use crate::time::StepClock;
use crate::transform::Transform;

/// Shared position the simulation space follows, typically written by the camera each frame.
#[derive(Debug, Clone, Default)]
pub struct SimulationAnchor(Arc<RwLock<Vec3>>);

impl SimulationAnchor {
    pub fn new(position: Vec3) -> Self {
        Self(Arc::new(RwLock::new(position)))
    }

    #[inline]
    pub fn set(&self, position: Vec3) {
        *self.0.write() = position;
    }

    #[inline]
    pub fn get(&self) -> Vec3 {
        *self.0.read()
    }
}

/// One side of a dispatched contact manifold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionEvent {
    pub object: String,
    pub other: String,
    pub object_physic_id: PhysicId,
    pub other_physic_id: PhysicId,
}

struct Constraint {
    handle: rap3d::ImpulseJointHandle,
    first: String,
    second: String,
}

pub struct PhysicalEngine {
    world: PhysicsWorld,
    objects: IndexMap<String, PhysicalObject>,
    physic_index: HashMap<PhysicId, String>,
    constraints: IndexMap<String, Constraint>,
    simulation_space: Collider,
    anchor: Option<SimulationAnchor>,
    step_time: f32,
    clock: Option<StepClock>,
    next_physic_id: u32,
    collision_events: Vec<CollisionEvent>,
    unlinked: Vec<(String, PhysicalObject)>,
}

impl Default for PhysicalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicalEngine {
    pub fn new() -> Self {
        Self::with_config(&PhysicsConfig::default())
    }

    pub fn with_config(config: &PhysicsConfig) -> Self {
        let mut simulation_space = Collider::new("SimulationSpace", ColliderModel::Aabb);
        simulation_space
            .transform
            .set_scale(Vec3::splat(config.simulation_distance * 2.0));

        let clock = match config.step_mode {
            StepMode::Variable => None,
            StepMode::Fixed { dt, max_substeps } => Some(StepClock::new(dt, max_substeps)),
        };

        Self {
            world: PhysicsWorld::new(config.gravity),
            objects: IndexMap::new(),
            physic_index: HashMap::new(),
            constraints: IndexMap::new(),
            simulation_space,
            anchor: None,
            step_time: 0.0,
            clock,
            next_physic_id: 1,
            collision_events: Vec::new(),
            unlinked: Vec::new(),
        }
    }

    /// A new unlinked object carrying the next physic id of this engine.
    pub fn create_object(&mut self, transform: Transform) -> PhysicalObject {
        let id = PhysicId(self.next_physic_id);
        self.next_physic_id += 1;
        PhysicalObject::new(id, transform)
    }

    // -------------------------------------------------------------------------
    // Simulation
    // -------------------------------------------------------------------------

    #[inline]
    pub fn set_step_time(&mut self, step_time: f32) {
        self.step_time = step_time;
    }

    #[inline]
    pub fn step_time(&self) -> f32 {
        self.step_time
    }

    /// Half-extent of the simulation space.
    pub fn set_simulation_space(&mut self, distance: f32) {
        self.simulation_space.transform.set_scale(Vec3::splat(distance.abs() * 2.0));
    }

    pub fn simulation_space(&self) -> Aabb {
        self.simulation_space.bounds()
    }

    pub fn set_simulation_anchor(&mut self, anchor: Option<SimulationAnchor>) {
        self.anchor = anchor;
    }

    pub fn simulation_anchor(&self) -> Option<&SimulationAnchor> {
        self.anchor.as_ref()
    }

    pub fn simulate(&mut self) {
        self.collision_events.clear();
        self.unlinked.clear();

        if let Some(anchor) = &self.anchor {
            self.simulation_space.set_position(anchor.get());
        }

        let flagged: Vec<String> = self
            .objects
            .iter()
            .filter(|(_, object)| object.is_unlink_requested())
            .map(|(id, _)| id.clone())
            .collect();
        for id in flagged {
            match self.unlink_object(&id) {
                Ok(object) => self.unlinked.push((id, object)),
                Err(e) => log::warn!("physics: deferred unlink of '{id}' failed: {e}"),
            }
        }

        for object in self.objects.values_mut() {
            object.update_physic_transform(&mut self.world);
            let inside = self.simulation_space.point_in(object.transform.position);
            object.set_simulated(&mut self.world, inside);
        }

        match self.clock.as_mut() {
            None => {
                if self.step_time > 0.0 {
                    self.world.step(self.step_time);
                    self.dispatch_collisions();
                }
            }
            Some(clock) => {
                clock.accumulate(self.step_time);
                let slices: Vec<f32> = clock.steps().collect();
                for dt in slices {
                    self.world.step(dt);
                    self.dispatch_collisions();
                }
            }
        }

        for object in self.objects.values_mut() {
            object.update_object_transform(&self.world);
        }
    }

    fn dispatch_collisions(&mut self) {
        let pairs = self.world.contact_manifold_pairs();
        if pairs.is_empty() {
            return;
        }

        // callbacks see post-step positions
        for object in self.objects.values_mut() {
            object.sync_pose(&self.world);
        }

        for (a, b) in pairs {
            let (Some(first), Some(second)) = (self.index_of(a), self.index_of(b)) else {
                continue;
            };
            if first == second {
                continue;
            }
            self.notify(first, second);
            self.notify(second, first);
        }
    }

    fn index_of(&self, user_data: u128) -> Option<usize> {
        let id = PhysicId(u32::try_from(user_data).ok()?);
        let key = self.physic_index.get(&id)?;
        self.objects.get_index_of(key)
    }

    fn notify(&mut self, this: usize, other: usize) {
        let hooks = self.objects.get_index_mut(this).and_then(|(_, object)| object.take_hooks());

        if let (Some((this_id, this_object)), Some((other_id, other_object))) =
            (self.objects.get_index(this), self.objects.get_index(other))
        {
            self.collision_events.push(CollisionEvent {
                object: this_id.clone(),
                other: other_id.clone(),
                object_physic_id: this_object.physic_id(),
                other_physic_id: other_object.physic_id(),
            });
            if let Some(mut hooks) = hooks {
                hooks.on_collide(this_object, other_object);
                if let Some((_, object)) = self.objects.get_index_mut(this) {
                    object.restore_hooks(Some(hooks));
                }
            }
        }
    }

    /// Both sides of every manifold dispatched by the last `simulate`.
    pub fn collision_events(&self) -> &[CollisionEvent] {
        &self.collision_events
    }

    /// Objects removed by their `unlink()` flag during the last `simulate`.
    pub fn take_unlinked(&mut self) -> Vec<(String, PhysicalObject)> {
        std::mem::take(&mut self.unlinked)
    }

    // -------------------------------------------------------------------------
    // Objects
    // -------------------------------------------------------------------------

    /// Links `object` under `id`. An object already registered under `id` is unlinked first
    /// and handed back.
    pub fn link_object<S: Into<String>>(
        &mut self,
        id: S,
        mut object: PhysicalObject,
    ) -> Result<Option<PhysicalObject>> {
        let id = id.into();
        if object.physical_type() == PhysicalType::Unknown {
            return Err(Error::invalid_argument(format!(
                "object '{id}' has no native representation"
            )));
        }
        if let Some(owner) = self.physic_index.get(&object.physic_id()) {
            if *owner != id {
                return Err(Error::already_exists("physic id", object.physic_id().to_string())
                    .context(format!("linked as '{owner}'")));
            }
        }

        object.ensure_linkable()?;

        let previous = if self.objects.contains_key(&id) {
            log::warn!("physics: '{id}' linked again, unlinking the previous object");
            Some(self.unlink_object(&id)?)
        } else {
            None
        };

        object.link(&mut self.world)?;
        log::debug!("physics: linked '{}' ({})", id, object.physic_id());
        self.physic_index.insert(object.physic_id(), id.clone());
        self.objects.insert(id, object);
        Ok(previous)
    }

    /// Removes `id` from the world now, along with the constraints that use it.
    pub fn unlink_object(&mut self, id: &str) -> Result<PhysicalObject> {
        if !self.objects.contains_key(id) {
            return Err(Error::not_found("object", id));
        }

        let dependent: Vec<String> = self
            .constraints
            .iter()
            .filter(|(_, c)| c.first == id || c.second == id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in dependent {
            log::debug!("physics: constraint '{key}' removed with '{id}'");
            self.remove_constraint(&key)?;
        }

        let mut object = self
            .objects
            .shift_remove(id)
            .ok_or_else(|| Error::not_found("object", id))?;
        object.unlink_native(&mut self.world);
        self.physic_index.remove(&object.physic_id());
        log::debug!("physics: unlinked '{}' ({})", id, object.physic_id());
        Ok(object)
    }

    pub fn object(&self, id: &str) -> Option<&PhysicalObject> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: &str) -> Option<&mut PhysicalObject> {
        self.objects.get_mut(id)
    }

    pub fn object_by_physic_id(&self, physic_id: PhysicId) -> Option<(&str, &PhysicalObject)> {
        let key = self.physic_index.get(&physic_id)?;
        self.objects.get_key_value(key).map(|(k, v)| (k.as_str(), v))
    }

    pub fn objects(&self) -> impl Iterator<Item = (&str, &PhysicalObject)> {
        self.objects.iter().map(|(id, object)| (id.as_str(), object))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether `id` was inside the simulation space at the last simulate.
    pub fn is_object_active(&self, id: &str) -> Option<bool> {
        self.objects.get(id).map(PhysicalObject::is_simulated)
    }

    // -------------------------------------------------------------------------
    // Gravity
    // -------------------------------------------------------------------------

    pub fn set_global_gravity(&mut self, gravity: Vec3) {
        self.world.set_gravity(gravity);
    }

    pub fn global_gravity(&self) -> Vec3 {
        self.world.gravity()
    }

    // -------------------------------------------------------------------------
    // Constraints
    // -------------------------------------------------------------------------

    /// Joins two linked objects. An existing constraint with the same id is replaced.
    pub fn add_constraint<S, J>(&mut self, id: S, first: &str, second: &str, joint: J) -> Result<()>
    where
        S: Into<String>,
        J: Into<rap3d::GenericJoint>,
    {
        let id = id.into();
        let body1 = self.linked_body(first)?;
        let body2 = self.linked_body(second)?;

        if self.constraints.contains_key(&id) {
            log::debug!("physics: constraint '{id}' replaced");
            self.remove_constraint(&id)?;
        }
        let handle = self.world.insert_joint(body1, body2, joint.into());
        self.constraints.insert(
            id,
            Constraint { handle, first: first.to_string(), second: second.to_string() },
        );
        Ok(())
    }

    pub fn remove_constraint(&mut self, id: &str) -> Result<()> {
        let constraint = self
            .constraints
            .shift_remove(id)
            .ok_or_else(|| Error::not_found("constraint", id))?;
        if !self.world.remove_joint(constraint.handle) {
            log::warn!("physics: joint of constraint '{id}' was already gone");
        }
        Ok(())
    }

    pub fn has_constraint(&self, id: &str) -> bool {
        self.constraints.contains_key(id)
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    fn linked_body(&self, id: &str) -> Result<rap3d::RigidBodyHandle> {
        self.objects
            .get(id)
            .and_then(PhysicalObject::body_handle)
            .ok_or_else(|| Error::not_found("object", id))
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Removes every constraint, then every object. Safe to call repeatedly.
    pub fn clear(&mut self) {
        let constraints: Vec<String> = self.constraints.keys().cloned().collect();
        for id in constraints {
            if let Err(e) = self.remove_constraint(&id) {
                log::warn!("physics: clearing constraint '{id}': {e}");
            }
        }

        let objects: Vec<String> = self.objects.keys().cloned().collect();
        for id in objects {
            if let Err(e) = self.unlink_object(&id) {
                log::warn!("physics: clearing object '{id}': {e}");
            }
        }
        self.unlinked.clear();
        self.collision_events.clear();
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }
}

impl Drop for PhysicalEngine {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physical_object::PhysicalHooks;
    use crate::shapes;
    use glam::Quat;
    use parking_lot::Mutex;

    fn ball_body(engine: &mut PhysicalEngine, position: Vec3, radius: f32) -> PhysicalObject {
        let mut object = engine.create_object(Transform::from_position(position));
        object.create_rigidbody(shapes::ball(radius)).unwrap();
        object
    }

    struct Recorder(Arc<Mutex<Vec<PhysicId>>>);

    impl PhysicalHooks for Recorder {
        fn on_collide(&mut self, this: &PhysicalObject, other: &PhysicalObject) {
            assert_ne!(this.physic_id(), other.physic_id());
            self.0.lock().push(other.physic_id());
        }
    }

    #[test]
    fn test_defaults() {
        let engine = PhysicalEngine::new();
        assert_eq!(engine.global_gravity(), Vec3::ZERO);
        assert_eq!(engine.simulation_space().half_extents(), Vec3::splat(100.0));
        assert_eq!(engine.step_time(), 0.0);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_physic_ids_are_engine_scoped() {
        let mut first = PhysicalEngine::new();
        let mut second = PhysicalEngine::new();
        let a = first.create_object(Transform::default());
        let b = first.create_object(Transform::default());
        let c = second.create_object(Transform::default());
        assert_eq!(a.physic_id(), PhysicId(1));
        assert_eq!(b.physic_id(), PhysicId(2));
        assert_eq!(c.physic_id(), PhysicId(1));
    }

    #[test]
    fn test_zero_step_round_trips_transform() {
        let mut engine = PhysicalEngine::new();
        engine.set_global_gravity(Vec3::new(0.0, -9.81, 0.0));
        let mut object = ball_body(&mut engine, Vec3::new(3.0, 4.0, -2.0), 0.5);
        object.transform.rotation = Quat::from_rotation_z(1.2);
        let expected = object.transform;
        engine.link_object("ball", object).unwrap();

        engine.set_step_time(0.0);
        engine.simulate();
        assert!(engine.object("ball").unwrap().transform.pose_eq(&expected, 1e-5));

        let moved = Transform::from_position(Vec3::new(-7.0, 1.0, 0.5))
            .with_rotation(Quat::from_rotation_x(-0.4));
        engine.object_mut("ball").unwrap().transform = moved;
        engine.simulate();
        assert!(engine.object("ball").unwrap().transform.pose_eq(&moved, 1e-5));
    }

    #[test]
    fn test_far_body_is_deactivated_and_frozen() {
        let mut engine = PhysicalEngine::new();
        engine.set_global_gravity(Vec3::new(0.0, -9.81, 0.0));
        engine.set_simulation_anchor(Some(SimulationAnchor::new(Vec3::ZERO)));

        let mut far = ball_body(&mut engine, Vec3::new(200.0, 0.0, 0.0), 0.5);
        far.set_linear_velocity(Vec3::new(5.0, 0.0, 0.0));
        engine.link_object("far", far).unwrap();
        let near = ball_body(&mut engine, Vec3::new(10.0, 0.0, 0.0), 0.5);
        engine.link_object("near", near).unwrap();

        engine.set_step_time(1.0 / 60.0);
        for _ in 0..5 {
            engine.simulate();
        }

        assert_eq!(engine.is_object_active("far"), Some(false));
        let far = engine.object("far").unwrap();
        assert!(far.transform.position.abs_diff_eq(Vec3::new(200.0, 0.0, 0.0), 1e-5));

        assert_eq!(engine.is_object_active("near"), Some(true));
        assert!(engine.object("near").unwrap().transform.position.y < 0.0);
        assert_eq!(engine.is_object_active("missing"), None);
    }

    #[test]
    fn test_anchor_recenters_simulation_space() {
        let mut engine = PhysicalEngine::new();
        let anchor = SimulationAnchor::new(Vec3::new(500.0, 0.0, 0.0));
        engine.set_simulation_anchor(Some(anchor.clone()));
        let body = ball_body(&mut engine, Vec3::new(520.0, 0.0, 0.0), 0.5);
        engine.link_object("body", body).unwrap();

        engine.simulate();
        assert_eq!(engine.is_object_active("body"), Some(true));

        anchor.set(Vec3::ZERO);
        engine.simulate();
        assert_eq!(engine.is_object_active("body"), Some(false));

        engine.set_simulation_space(600.0);
        engine.simulate();
        assert_eq!(engine.is_object_active("body"), Some(true));
    }

    #[test]
    fn test_touching_spheres_notify_each_other() {
        let mut engine = PhysicalEngine::new();
        engine.set_global_gravity(Vec3::new(0.0, -9.81, 0.0));

        let hits_a = Arc::new(Mutex::new(Vec::new()));
        let hits_b = Arc::new(Mutex::new(Vec::new()));
        let mut a = ball_body(&mut engine, Vec3::ZERO, 1.0);
        let mut b = ball_body(&mut engine, Vec3::new(1.5, 0.0, 0.0), 1.0);
        let (id_a, id_b) = (a.physic_id(), b.physic_id());
        a.set_hooks(Recorder(hits_a.clone()));
        b.set_hooks(Recorder(hits_b.clone()));
        engine.link_object("a", a).unwrap();
        engine.link_object("b", b).unwrap();

        engine.set_step_time(1.0 / 60.0);
        for _ in 0..120 {
            engine.simulate();
            if !hits_a.lock().is_empty() && !hits_b.lock().is_empty() {
                break;
            }
        }

        assert!(!hits_a.lock().is_empty());
        assert!(hits_a.lock().iter().all(|id| *id == id_b));
        assert!(!hits_b.lock().is_empty());
        assert!(hits_b.lock().iter().all(|id| *id == id_a));

        let events = engine.collision_events();
        assert!(events.iter().any(|e| e.object == "a" && e.other_physic_id == id_b));
        assert!(events.iter().any(|e| e.object == "b" && e.other_physic_id == id_a));
    }

    #[test]
    fn test_trigger_reports_overlap_without_pushing() {
        let mut engine = PhysicalEngine::new();
        let mut zone = engine.create_object(Transform::default());
        zone.create_collider(shapes::cuboid(Vec3::splat(2.0)), true).unwrap();
        engine.link_object("zone", zone).unwrap();
        let body = ball_body(&mut engine, Vec3::new(0.5, 0.0, 0.0), 0.5);
        engine.link_object("body", body).unwrap();

        engine.set_step_time(1.0 / 60.0);
        engine.simulate();
        engine.simulate();

        let events = engine.collision_events();
        assert!(events.iter().any(|e| e.object == "zone" && e.other == "body"));
        assert!(events.iter().any(|e| e.object == "body" && e.other == "zone"));
        let body = engine.object("body").unwrap();
        assert!(body.transform.position.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-4));
    }

    #[test]
    fn test_flagged_object_is_gone_next_simulate() {
        let mut engine = PhysicalEngine::new();
        let a = ball_body(&mut engine, Vec3::ZERO, 1.0);
        let b = ball_body(&mut engine, Vec3::new(1.5, 0.0, 0.0), 1.0);
        let id_a = a.physic_id();
        engine.link_object("a", a).unwrap();
        engine.link_object("b", b).unwrap();

        engine.set_step_time(1.0 / 60.0);
        engine.simulate();
        assert!(engine.collision_events().iter().any(|e| e.object == "a"));

        engine.object_mut("a").unwrap().unlink();
        assert!(engine.contains("a"));

        engine.simulate();
        assert!(!engine.contains("a"));
        assert!(engine.object_by_physic_id(id_a).is_none());
        assert!(engine
            .collision_events()
            .iter()
            .all(|e| e.object != "a" && e.other != "a"));
        assert_eq!(engine.world().body_count(), 1);

        let unlinked = engine.take_unlinked();
        assert_eq!(unlinked.len(), 1);
        assert_eq!(unlinked[0].0, "a");
        assert!(!unlinked[0].1.is_linked());
    }

    #[test]
    fn test_relink_same_id_unlinks_previous() {
        let mut engine = PhysicalEngine::new();
        let first = ball_body(&mut engine, Vec3::ZERO, 1.0);
        let second = ball_body(&mut engine, Vec3::new(0.0, 5.0, 0.0), 1.0);
        let first_id = first.physic_id();

        assert!(engine.link_object("crate", first).unwrap().is_none());
        let previous = engine.link_object("crate", second).unwrap().unwrap();

        assert_eq!(previous.physic_id(), first_id);
        assert!(!previous.is_linked());
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.world().body_count(), 1);
        assert_eq!(engine.object("crate").unwrap().transform.position.y, 5.0);
    }

    #[test]
    fn test_link_and_unlink_errors() {
        let mut engine = PhysicalEngine::new();
        let bare = engine.create_object(Transform::default());
        assert!(engine.link_object("bare", bare).unwrap_err().is_invalid_argument());
        assert!(engine.unlink_object("nothing").unwrap_err().is_not_found());

        // ids are engine-scoped, so a foreign object can clash with a linked one
        let mut other_engine = PhysicalEngine::new();
        let mine = ball_body(&mut engine, Vec3::ZERO, 1.0);
        let foreign = ball_body(&mut other_engine, Vec3::ZERO, 1.0);
        assert_eq!(mine.physic_id(), PhysicId(2));
        let mine_id = mine.physic_id();
        engine.link_object("mine", mine).unwrap();

        let mut clash = foreign;
        while clash.physic_id() != mine_id {
            clash = ball_body(&mut other_engine, Vec3::ZERO, 1.0);
        }
        assert!(engine.link_object("clash", clash).unwrap_err().is_already_exists());
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_failed_relink_keeps_previous_object() {
        let mut engine = PhysicalEngine::new();
        let kept = ball_body(&mut engine, Vec3::ZERO, 0.5);
        let kept_id = kept.physic_id();
        engine.link_object("crate", kept).unwrap();

        let mut elsewhere = PhysicsWorld::default();
        let mut intruder = ball_body(&mut engine, Vec3::X, 0.5);
        intruder.link(&mut elsewhere).unwrap();

        let err = engine.link_object("crate", intruder).unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(engine.object("crate").unwrap().physic_id(), kept_id);
        assert!(engine.object("crate").unwrap().is_linked());
        assert_eq!(engine.world().body_count(), 1);
        assert!(engine.object_by_physic_id(kept_id).is_some());
    }

    #[test]
    fn test_set_mass_reaches_native_body() {
        let mut engine = PhysicalEngine::new();
        let body = ball_body(&mut engine, Vec3::ZERO, 0.5);
        engine.link_object("body", body).unwrap();

        let object = engine.object_mut("body").unwrap();
        object.set_mass(5.0, Vec3::ZERO);
        assert_eq!(object.mass(), Some(5.0));

        engine.set_step_time(1.0 / 60.0);
        engine.simulate();

        let handle = engine.linked_body("body").unwrap();
        let native = engine.world().body(handle).unwrap();
        assert!((native.mass() - 5.0).abs() < 1e-5);
        let inv_inertia = native.mass_properties().effective_world_inv_inertia_sqrt;
        for value in [
            inv_inertia.m11,
            inv_inertia.m12,
            inv_inertia.m13,
            inv_inertia.m22,
            inv_inertia.m23,
            inv_inertia.m33,
        ] {
            assert_eq!(value, 0.0);
        }
    }

    #[test]
    fn test_constraints_lifecycle() {
        let mut engine = PhysicalEngine::new();
        let a = ball_body(&mut engine, Vec3::ZERO, 0.5);
        let b = ball_body(&mut engine, Vec3::new(2.0, 0.0, 0.0), 0.5);
        let c = ball_body(&mut engine, Vec3::new(4.0, 0.0, 0.0), 0.5);
        engine.link_object("a", a).unwrap();
        engine.link_object("b", b).unwrap();
        engine.link_object("c", c).unwrap();

        let joint = rap3d::FixedJointBuilder::new().build();
        engine.add_constraint("ab", "a", "b", joint).unwrap();
        engine.add_constraint("ab", "a", "b", joint).unwrap();
        engine.add_constraint("bc", "b", "c", joint).unwrap();
        assert_eq!(engine.constraint_count(), 2);
        assert_eq!(engine.world().joint_count(), 2);

        assert!(engine.add_constraint("ax", "a", "x", joint).unwrap_err().is_not_found());
        assert!(engine.remove_constraint("nope").unwrap_err().is_not_found());

        engine.unlink_object("c").unwrap();
        assert!(!engine.has_constraint("bc"));
        assert_eq!(engine.world().joint_count(), 1);

        engine.remove_constraint("ab").unwrap();
        assert_eq!(engine.world().joint_count(), 0);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut engine = PhysicalEngine::new();
        engine.clear();

        let a = ball_body(&mut engine, Vec3::ZERO, 0.5);
        let b = ball_body(&mut engine, Vec3::X * 2.0, 0.5);
        engine.link_object("a", a).unwrap();
        engine.link_object("b", b).unwrap();
        engine
            .add_constraint("ab", "a", "b", rap3d::FixedJointBuilder::new().build())
            .unwrap();

        engine.clear();
        assert!(engine.is_empty());
        assert_eq!(engine.constraint_count(), 0);
        assert_eq!(engine.world().body_count(), 0);
        assert_eq!(engine.world().joint_count(), 0);
        engine.clear();
        engine.simulate();
    }

    #[test]
    fn test_fixed_step_mode_accumulates() {
        let config = PhysicsConfig {
            step_mode: StepMode::Fixed { dt: 0.25, max_substeps: 4 },
            ..PhysicsConfig::default()
        };
        let mut engine = PhysicalEngine::with_config(&config);
        let mut body = ball_body(&mut engine, Vec3::ZERO, 0.5);
        body.set_linear_velocity(Vec3::new(4.0, 0.0, 0.0));
        engine.link_object("body", body).unwrap();

        engine.set_step_time(0.125);
        engine.simulate();
        assert_eq!(engine.object("body").unwrap().transform.position, Vec3::ZERO);

        engine.simulate();
        let x = engine.object("body").unwrap().transform.position.x;
        assert!((x - 1.0).abs() < 1e-3, "x = {x}");
    }

    #[test]
    fn test_per_body_gravity_overrides_world() {
        let mut engine = PhysicalEngine::new();
        let mut falling = ball_body(&mut engine, Vec3::ZERO, 0.5);
        falling.set_gravity(Vec3::new(0.0, -10.0, 0.0));
        engine.link_object("falling", falling).unwrap();
        let resting = ball_body(&mut engine, Vec3::new(10.0, 0.0, 0.0), 0.5);
        engine.link_object("resting", resting).unwrap();

        engine.set_step_time(1.0 / 60.0);
        for _ in 0..30 {
            engine.simulate();
        }

        let falling = engine.object("falling").unwrap();
        assert!(falling.transform.position.y < -0.5);
        assert!(falling.linear_velocity().unwrap().y < 0.0);
        assert!(engine.object("resting").unwrap().transform.position.abs_diff_eq(
            Vec3::new(10.0, 0.0, 0.0),
            1e-5
        ));
    }
}
