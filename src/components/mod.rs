//! Component lifecycle.
//!
//! An [`Entity`] owns a [`Transform`] and a list of boxed components. The entity drives
//! `on_start` once, `on_update` every frame and `on_destroy` on teardown, handing each
//! component its owner's transform and the [`World`].

use crate::error::Result;
use crate::transform::Transform;
use crate::world::World;

pub mod physical;

pub use physical::{BodyShape, PhysicalBody, PhysicalCollider};

/// What a component sees of the outside during a lifecycle call.
pub struct ComponentContext<'a> {
    pub owner: &'a mut Transform,
    pub world: &'a mut World,
}

pub trait Component: Send + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn on_start(&mut self, _ctx: &mut ComponentContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn on_destroy(&mut self, _ctx: &mut ComponentContext<'_>) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Created,
    Started,
    Destroyed,
}

pub struct Entity {
    pub name: String,
    pub transform: Transform,
    components: Vec<Box<dyn Component>>,
    stage: Stage,
}

impl Entity {
    pub fn new<S: Into<String>>(name: S, transform: Transform) -> Self {
        Self { name: name.into(), transform, components: Vec::new(), stage: Stage::Created }
    }

    pub fn with_component<C: Component>(mut self, component: C) -> Self {
        self.components.push(Box::new(component));
        self
    }

    /// Components added after `start` are not started automatically.
    pub fn add_component<C: Component>(&mut self, component: C) {
        self.components.push(Box::new(component));
    }

    #[inline]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.stage == Stage::Started
    }

    /// Starts every component in insertion order, stopping at the first failure.
    pub fn start(&mut self, world: &mut World) -> Result<()> {
        if self.stage != Stage::Created {
            return Ok(());
        }
        let mut ctx = ComponentContext { owner: &mut self.transform, world };
        for component in &mut self.components {
            component.on_start(&mut ctx).map_err(|e| {
                e.context(format!("starting {} on '{}'", component.name(), self.name))
            })?;
        }
        self.stage = Stage::Started;
        Ok(())
    }

    pub fn update(&mut self, world: &mut World) {
        if self.stage != Stage::Started {
            return;
        }
        let mut ctx = ComponentContext { owner: &mut self.transform, world };
        for component in &mut self.components {
            component.on_update(&mut ctx);
        }
    }

    /// Destroys components in reverse order. Idempotent.
    pub fn destroy(&mut self, world: &mut World) {
        if self.stage == Stage::Destroyed {
            return;
        }
        let mut ctx = ComponentContext { owner: &mut self.transform, world };
        for component in self.components.iter_mut().rev() {
            component.on_destroy(&mut ctx);
        }
        log::debug!("entity '{}' destroyed", self.name);
        self.stage = Stage::Destroyed;
    }
}
