// src/world.rs
//! Per-frame driver tying the simple [`PhysicalSpace`] and the native [`PhysicalEngine`]
//! to the frame loop. The camera position is shared with the engine through a
//! [`SimulationAnchor`], so only objects near the camera are simulated.

use glam::Vec3;

use crate::config::PhysicsConfig;
use crate::physical_space::PhysicalSpace;
use crate::physics_engine::{PhysicalEngine, SimulationAnchor};

pub struct World {
    engine: PhysicalEngine,
    space: PhysicalSpace,
    camera: SimulationAnchor,
    physics_enabled: bool,
    frame: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self::with_config(&PhysicsConfig::default())
    }

    pub fn with_config(config: &PhysicsConfig) -> Self {
        let camera = SimulationAnchor::default();
        let mut engine = PhysicalEngine::with_config(config);
        engine.set_simulation_anchor(Some(camera.clone()));

        Self {
            engine,
            space: PhysicalSpace::with_config(config.space),
            camera,
            physics_enabled: true,
            frame: 0,
        }
    }

    /// One frame: space update, then a native step of `delta` seconds.
    /// Nothing moves while physics is disabled.
    pub fn tick(&mut self, delta: f32) {
        self.frame += 1;
        if !self.physics_enabled {
            return;
        }

        self.space.update_rigid_bodies(delta);
        self.engine.set_step_time(delta);
        self.engine.simulate();

        for (id, object) in self.engine.take_unlinked() {
            log::trace!("world: '{}' ({}) left the simulation", id, object.physic_id());
        }
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn set_physics(&mut self, enabled: bool) {
        if self.physics_enabled != enabled {
            log::info!("world: physics {}", if enabled { "enabled" } else { "disabled" });
        }
        self.physics_enabled = enabled;
    }

    /// Flips physics on or off and returns the new state.
    pub fn toggle_physics(&mut self) -> bool {
        self.set_physics(!self.physics_enabled);
        self.physics_enabled
    }

    #[inline]
    pub fn physics_enabled(&self) -> bool {
        self.physics_enabled
    }

    pub fn set_camera_position(&mut self, position: Vec3) {
        self.camera.set(position);
    }

    pub fn camera_position(&self) -> Vec3 {
        self.camera.get()
    }

    pub fn set_simulation_distance(&mut self, distance: f32) {
        self.engine.set_simulation_space(distance);
    }

    pub fn engine(&self) -> &PhysicalEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PhysicalEngine {
        &mut self.engine
    }

    pub fn space(&self) -> &PhysicalSpace {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut PhysicalSpace {
        &mut self.space
    }
}
