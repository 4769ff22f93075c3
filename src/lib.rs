// src/lib.rs
//! Slop physics: collision and rigid-body core.
//!
//! Two layers share the same [`Transform`]:
//! - [`PhysicalSpace`]: hand-rolled AABB/sphere colliders grouped in named layers, with
//!   overlap queries, push-out extraction and velocity integration.
//! - [`PhysicalEngine`]: rapier-backed rigid bodies and trigger ghosts keyed by string id,
//!   simulated only inside a box that follows the camera.
//!
//! [`World`] ticks both once per frame; [`components`] attaches them to entities.

pub mod collider;
pub mod components;
pub mod config;
pub mod error;
pub mod physical_object;
pub mod physical_space;
pub mod physics;
pub mod physics_engine;
pub mod shapes;
pub mod time;
pub mod transform;
pub mod world;

pub use collider::{Aabb, Collider, ColliderModel, Shape, Sphere};
pub use config::{PhysicsConfig, SpaceConfig, StepMode, VelocityPolicy};
pub use error::{Error, Result};
pub use physical_object::{PhysicId, PhysicalHooks, PhysicalObject, PhysicalType, Tags};
pub use physical_space::{Collision, PhysicalSpace};
pub use physics::PhysicsWorld;
pub use physics_engine::{CollisionEvent, PhysicalEngine, SimulationAnchor};
pub use time::StepClock;
pub use transform::Transform;
pub use world::World;
