// src/physical_space.rs
//! Lightweight layered collision registry.
//!
//! Colliders live in named layers (insertion order = update order) and only collide with
//! colliders of the same layer. Names are unique across the whole space. The rigid-body pass
//! is deliberately simple arcade physics: overlap extraction plus accept/reject velocity moves.

use std::collections::HashMap;

use glam::Vec3;
use indexmap::IndexMap;

use crate::collider::Collider;
use crate::config::{SpaceConfig, VelocityPolicy};
use crate::error::{Error, Result};

/// One overlap found by [`PhysicalSpace::get_collisions`]. Recomputed on every query.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub source: String,
    pub other: String,
    /// The other collider contains the source's position (deep penetration).
    pub collider_center_in_other: bool,
}

#[derive(Debug, Default)]
pub struct PhysicalSpace {
    layers: IndexMap<String, Vec<Collider>>,
    /// Collisions found by the last `update_rigid_bodies`, keyed by collider name.
    collisions: HashMap<String, Vec<Collision>>,
    config: SpaceConfig,
}

impl PhysicalSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SpaceConfig) -> Self {
        Self { config, ..Self::default() }
    }

    #[inline]
    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    pub fn set_velocity_policy(&mut self, policy: VelocityPolicy) {
        self.config.velocity_policy = policy;
    }

    // -------------------------------------------------------------------------
    // Membership
    // -------------------------------------------------------------------------

    /// Registers `collider` at the end of `layer`. Names are define-once across all layers.
    pub fn add_collider(&mut self, layer: &str, collider: Collider) -> Result<()> {
        if let Some(existing) = self.find_collider_layer(&collider.name) {
            return Err(Error::already_exists("collider", collider.name.as_str())
                .context(format!("registered in layer '{existing}'")));
        }
        log::trace!("space: '{}' added to layer '{}'", collider.name, layer);
        self.layers.entry(layer.to_string()).or_default().push(collider);
        Ok(())
    }

    /// Removes the first collider called `name` from `layer`. Absent layers are not created.
    pub fn remove_collider(&mut self, layer: &str, name: &str) -> Result<Collider> {
        let colliders = self
            .layers
            .get_mut(layer)
            .ok_or_else(|| Error::not_found("layer", layer))?;
        let index = colliders
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Error::not_found("collider", name))?;
        self.collisions.remove(name);
        Ok(colliders.remove(index))
    }

    /// The layer's colliders, creating an empty layer if needed. Read-only: colliders
    /// join and leave through `add_collider`/`remove_collider`.
    pub fn get_or_create_layer(&mut self, name: &str) -> &[Collider] {
        self.layers.entry(name.to_string()).or_default().as_slice()
    }

    pub fn layer(&self, name: &str) -> Option<&[Collider]> {
        self.layers.get(name).map(Vec::as_slice)
    }

    pub fn layers(&self) -> impl Iterator<Item = (&str, &[Collider])> {
        self.layers.iter().map(|(name, colliders)| (name.as_str(), colliders.as_slice()))
    }

    pub fn find_collider_layer(&self, name: &str) -> Option<&str> {
        let (layer, _) = self.locate(name)?;
        self.layers.get_index(layer).map(|(layer_name, _)| layer_name.as_str())
    }

    pub fn collider(&self, name: &str) -> Option<&Collider> {
        self.locate(name).map(|(layer, index)| &self.layers[layer][index])
    }

    /// Mutable access for motion and shape edits. The name is the collider's key and must
    /// not be changed through this reference.
    pub fn collider_mut(&mut self, name: &str) -> Option<&mut Collider> {
        let (layer, index) = self.locate(name)?;
        Some(&mut self.layers[layer][index])
    }

    pub fn len(&self) -> usize {
        self.layers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.layers.clear();
        self.collisions.clear();
    }

    fn locate(&self, name: &str) -> Option<(usize, usize)> {
        self.layers.values().enumerate().find_map(|(layer, colliders)| {
            colliders.iter().position(|c| c.name == name).map(|index| (layer, index))
        })
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Every other collider of the same layer overlapping `name`. Empty when unregistered.
    pub fn get_collisions(&self, name: &str) -> Vec<Collision> {
        let Some((layer, index)) = self.locate(name) else {
            log::warn!("space: collisions requested for unregistered collider '{name}'");
            return Vec::new();
        };
        let colliders = &self.layers[layer];
        let source = &colliders[index];

        colliders
            .iter()
            .filter(|other| other.name != source.name && other.other_in(source))
            .map(|other| Collision {
                source: source.name.clone(),
                other: other.name.clone(),
                collider_center_in_other: other.point_in(source.position()),
            })
            .collect()
    }

    /// Collisions cached by the last [`update_rigid_bodies`](Self::update_rigid_bodies).
    pub fn last_collisions(&self, name: &str) -> &[Collision] {
        self.collisions.get(name).map_or(&[], Vec::as_slice)
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    /// Pushes the source away from the other by the vector between their positions.
    pub fn express_overlap_extraction(&mut self, collision: &Collision) -> Result<()> {
        let other_position = self
            .collider(&collision.other)
            .map(Collider::position)
            .ok_or_else(|| Error::not_found("collider", collision.other.as_str()))?;
        let epsilon = self.config.extraction_epsilon;
        let source = self
            .collider_mut(&collision.source)
            .ok_or_else(|| Error::not_found("collider", collision.source.as_str()))?;
        if source.fixed {
            return Ok(());
        }

        let mut offset = source.position() - other_position;
        if offset == Vec3::ZERO {
            offset = Vec3::new(epsilon, 0.0, 0.0);
        }
        source.transform.translate(offset);
        Ok(())
    }

    /// Moves `name` by its velocity, rolling the move back entirely if the collider then
    /// overlaps anything in its layer. The velocity is zeroed either way. Returns whether
    /// the move was kept.
    pub fn rigidbody_apply_velocity(&mut self, name: &str) -> Result<bool> {
        let (layer, index) = self.locate(name).ok_or_else(|| Error::not_found("collider", name))?;
        let colliders = &mut self.layers[layer];

        let velocity = std::mem::take(&mut colliders[index].velocity);
        if colliders[index].fixed || velocity == Vec3::ZERO {
            return Ok(false);
        }

        let saved = colliders[index].position();
        colliders[index].transform.translate(velocity);

        let blocked = overlaps_any(colliders, index);
        if blocked {
            colliders[index].set_position(saved);
        }
        Ok(!blocked)
    }

    /// One simple-physics update over every layer, in insertion order.
    pub fn update_rigid_bodies(&mut self, delta_time: f32) {
        self.collisions.clear();

        let names: Vec<String> = self
            .layers
            .values()
            .flat_map(|colliders| colliders.iter().map(|c| c.name.clone()))
            .collect();

        for name in names {
            let Some(collider) = self.collider_mut(&name) else { continue };
            let is_rigid_body = collider.is_rigid_body;
            let participates = collider.is_rigid_body && !collider.fixed;
            if participates {
                collider.velocity += collider.gravity * delta_time;
            }

            let collisions = self.get_collisions(&name);
            if participates {
                for collision in collisions.iter().filter(|c| c.collider_center_in_other) {
                    if let Err(e) = self.express_overlap_extraction(collision) {
                        log::warn!("space: extraction of '{name}' failed: {e}");
                    }
                }
            }

            let moves = match self.config.velocity_policy {
                VelocityPolicy::RigidBodiesOnly => is_rigid_body,
                VelocityPolicy::AllColliders => true,
            };
            if moves {
                if let Err(e) = self.rigidbody_apply_velocity(&name) {
                    log::warn!("space: velocity of '{name}' not applied: {e}");
                }
            }

            self.collisions.insert(name, collisions);
        }
    }
}

fn overlaps_any(colliders: &[Collider], index: usize) -> bool {
    let source = &colliders[index];
    colliders
        .iter()
        .enumerate()
        .any(|(i, other)| i != index && other.other_in(source))
}
