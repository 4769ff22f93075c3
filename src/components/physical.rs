// src/components/physical.rs
//! Components putting an entity under physics control.
//!
//! [`PhysicalCollider`] lives in the simple [`PhysicalSpace`](crate::PhysicalSpace) and
//! [`PhysicalBody`] in the native engine. Both own their entry: it is registered on start
//! and released on destroy.

use glam::Vec3;
use rapier3d::prelude::SharedShape;

use super::{Component, ComponentContext};
use crate::collider::{Collider, ColliderModel};
use crate::error::{Error, Result};
use crate::physical_object::PhysicId;
use crate::world::World;

// ---------------------------------------------------------------------------
// Space collider
// ---------------------------------------------------------------------------

/// Collider registered in a space layer. The space drives the owner's position and
/// rotation, the owner drives the collider's scale.
pub struct PhysicalCollider {
    layer: String,
    collider: Collider,
    registered: bool,
}

impl PhysicalCollider {
    pub fn new<S: Into<String>>(layer: S, collider: Collider) -> Self {
        Self { layer: layer.into(), collider, registered: false }
    }

    pub fn collider_name(&self) -> &str {
        &self.collider.name
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Pushes the registered collider by `direction` at the next space update.
    pub fn move_by(&self, world: &mut World, direction: Vec3) -> Result<()> {
        let name = &self.collider.name;
        world
            .space_mut()
            .collider_mut(name)
            .ok_or_else(|| Error::not_found("collider", name.as_str()))?
            .move_by(direction);
        Ok(())
    }
}

impl Component for PhysicalCollider {
    fn on_start(&mut self, ctx: &mut ComponentContext<'_>) -> Result<()> {
        let mut collider = self.collider.clone();
        collider.transform = *ctx.owner;
        if collider.model == Some(ColliderModel::Sphere) {
            collider.radius = ctx.owner.half_scale().x;
        }
        ctx.world.space_mut().add_collider(&self.layer, collider)?;
        self.registered = true;
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) {
        if !self.registered {
            return;
        }
        let Some(collider) = ctx.world.space_mut().collider_mut(&self.collider.name) else {
            log::warn!("PhysicalCollider: '{}' vanished from its space", self.collider.name);
            self.registered = false;
            return;
        };

        ctx.owner.position = collider.position();
        ctx.owner.rotation = collider.transform.rotation;
        collider.transform.set_scale(ctx.owner.scale());
        if collider.model == Some(ColliderModel::Sphere) {
            collider.radius = ctx.owner.half_scale().x;
        }
    }

    fn on_destroy(&mut self, ctx: &mut ComponentContext<'_>) {
        if !std::mem::take(&mut self.registered) {
            return;
        }
        if let Err(e) = ctx.world.space_mut().remove_collider(&self.layer, &self.collider.name) {
            log::warn!("PhysicalCollider: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Engine body
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub enum BodyShape {
    RigidBody(SharedShape),
    Ghost { shape: SharedShape, is_trigger: bool },
}

/// Object linked into the native engine under `id`. The engine drives the owner's
/// position and rotation.
pub struct PhysicalBody {
    id: String,
    shape: BodyShape,
    physic_id: Option<PhysicId>,
}

impl PhysicalBody {
    pub fn rigid_body<S: Into<String>>(id: S, shape: SharedShape) -> Self {
        Self { id: id.into(), shape: BodyShape::RigidBody(shape), physic_id: None }
    }

    pub fn ghost<S: Into<String>>(id: S, shape: SharedShape, is_trigger: bool) -> Self {
        Self { id: id.into(), shape: BodyShape::Ghost { shape, is_trigger }, physic_id: None }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set once the body is linked.
    pub fn physic_id(&self) -> Option<PhysicId> {
        self.physic_id
    }

    pub fn apply_impulse(&self, world: &mut World, impulse: Vec3) -> Result<()> {
        world
            .engine_mut()
            .object_mut(&self.id)
            .ok_or_else(|| Error::not_found("object", self.id.as_str()))?
            .apply_impulse(impulse);
        Ok(())
    }
}

impl Component for PhysicalBody {
    fn on_start(&mut self, ctx: &mut ComponentContext<'_>) -> Result<()> {
        let engine = ctx.world.engine_mut();
        let mut object = engine.create_object(*ctx.owner);
        match &self.shape {
            BodyShape::RigidBody(shape) => object.create_rigidbody(shape.clone())?,
            BodyShape::Ghost { shape, is_trigger } => {
                object.create_collider(shape.clone(), *is_trigger)?
            }
        }

        let physic_id = object.physic_id();
        if let Some(previous) = engine.link_object(self.id.clone(), object)? {
            log::warn!("PhysicalBody: '{}' replaced object {}", self.id, previous.physic_id());
        }
        self.physic_id = Some(physic_id);
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) {
        let Some(physic_id) = self.physic_id else { return };
        match ctx.world.engine().object(&self.id) {
            Some(object) if object.physic_id() == physic_id => {
                ctx.owner.position = object.transform.position;
                ctx.owner.rotation = object.transform.rotation;
            }
            _ => self.physic_id = None,
        }
    }

    fn on_destroy(&mut self, ctx: &mut ComponentContext<'_>) {
        let Some(physic_id) = self.physic_id.take() else { return };
        if let Some(object) = ctx.world.engine_mut().object_mut(&self.id) {
            if object.physic_id() == physic_id {
                object.unlink();
            }
        }
    }
}
