/// Central CPU-side resource registry.
///
/// Stores geometries, materials and textures in slot maps. Keys are never
/// reused after disposal, so a stale key can never alias a new resource.
/// Every disposal is published as a `ResourceEvent` to each subscriber
/// (one per renderer, since every renderer owns its own GPU cache). Events
/// are kept until all subscribers have drained them.

use std::collections::VecDeque;
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use crate::engine_debug;
use super::{GeometryKey, MaterialKey, TextureKey};
use super::geometry::Geometry;
use super::material::Material;
use super::texture::Texture;

/// Disposal notification consumed by the render resource cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceEvent {
    GeometryDisposed(GeometryKey),
    MaterialDisposed(MaterialKey),
    TextureDisposed(TextureKey),
}

new_key_type! {
    /// Read position of one consumer in the disposal event log
    pub struct EventSubscription;
}

/// Resource registry (owned by the application, borrowed per frame)
#[derive(Default)]
pub struct ResourceManager {
    geometries: SlotMap<GeometryKey, Geometry>,
    materials: SlotMap<MaterialKey, Material>,
    textures: SlotMap<TextureKey, Texture>,
    events: VecDeque<ResourceEvent>,
    /// Absolute index of `events[0]`
    events_base: u64,
    /// Absolute index of the next event each subscriber will read
    subscribers: SlotMap<EventSubscription, u64>,
}

impl ResourceManager {
    /// Create a new empty resource manager
    pub fn new() -> Self {
        Self::default()
    }

    // ===== GEOMETRY =====

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryKey {
        self.geometries.insert(geometry)
    }

    pub fn geometry(&self, key: GeometryKey) -> Option<&Geometry> {
        self.geometries.get(key)
    }

    pub fn geometry_mut(&mut self, key: GeometryKey) -> Option<&mut Geometry> {
        self.geometries.get_mut(key)
    }

    /// Remove a geometry and queue its GPU release
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if the key was already disposed.
    pub fn dispose_geometry(&mut self, key: GeometryKey) -> Result<Geometry> {
        let geometry = self.geometries.remove(key)
            .ok_or_else(|| Error::InvalidHandle(format!("geometry {:?} already disposed", key)))?;
        engine_debug!("nova3d::ResourceManager", "Disposed geometry '{}'", geometry.name());
        self.publish(ResourceEvent::GeometryDisposed(key));
        Ok(geometry)
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    // ===== MATERIAL =====

    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    pub fn material_mut(&mut self, key: MaterialKey) -> Option<&mut Material> {
        self.materials.get_mut(key)
    }

    /// Remove a material and queue its program release
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if the key was already disposed.
    pub fn dispose_material(&mut self, key: MaterialKey) -> Result<Material> {
        let material = self.materials.remove(key)
            .ok_or_else(|| Error::InvalidHandle(format!("material {:?} already disposed", key)))?;
        engine_debug!("nova3d::ResourceManager", "Disposed material '{}'", material.name());
        self.publish(ResourceEvent::MaterialDisposed(key));
        Ok(material)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    // ===== TEXTURE =====

    pub fn add_texture(&mut self, texture: Texture) -> TextureKey {
        self.textures.insert(texture)
    }

    pub fn texture(&self, key: TextureKey) -> Option<&Texture> {
        self.textures.get(key)
    }

    pub fn texture_mut(&mut self, key: TextureKey) -> Option<&mut Texture> {
        self.textures.get_mut(key)
    }

    /// Remove a texture and queue its GPU release
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if the key was already disposed.
    pub fn dispose_texture(&mut self, key: TextureKey) -> Result<Texture> {
        let texture = self.textures.remove(key)
            .ok_or_else(|| Error::InvalidHandle(format!("texture {:?} already disposed", key)))?;
        engine_debug!("nova3d::ResourceManager", "Disposed texture '{}'", texture.name());
        self.publish(ResourceEvent::TextureDisposed(key));
        Ok(texture)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    // ===== EVENTS =====

    /// Register a new consumer of disposal events
    ///
    /// The subscriber sees events published from now on. It must be
    /// released with `unsubscribe`, otherwise the log keeps growing.
    pub fn subscribe(&mut self) -> EventSubscription {
        let end = self.events_end();
        self.subscribers.insert(end)
    }

    /// Release a subscriber; events only it had left to read are dropped
    ///
    /// # Errors
    ///
    /// `InvalidHandle` for an unknown subscription.
    pub fn unsubscribe(&mut self, subscription: EventSubscription) -> Result<()> {
        self.subscribers.remove(subscription)
            .ok_or_else(|| Error::InvalidHandle(format!("event subscription {:?}", subscription)))?;
        self.trim_events();
        Ok(())
    }

    pub fn is_subscribed(&self, subscription: EventSubscription) -> bool {
        self.subscribers.contains_key(subscription)
    }

    /// Events published since this subscriber's last drain, oldest first
    ///
    /// # Errors
    ///
    /// `InvalidHandle` for an unknown subscription.
    pub fn drain_events(&mut self, subscription: EventSubscription) -> Result<Vec<ResourceEvent>> {
        let end = self.events_end();
        let cursor = self.subscribers.get_mut(subscription)
            .ok_or_else(|| Error::InvalidHandle(format!("event subscription {:?}", subscription)))?;
        let skip = (*cursor - self.events_base) as usize;
        *cursor = end;
        let events: Vec<ResourceEvent> = self.events.iter().skip(skip).copied().collect();
        self.trim_events();
        Ok(events)
    }

    /// Events this subscriber has not drained yet (0 if unknown)
    pub fn pending_events(&self, subscription: EventSubscription) -> usize {
        self.subscribers
            .get(subscription)
            .map_or(0, |cursor| (self.events_end() - cursor) as usize)
    }

    /// Events still retained for at least one subscriber
    pub fn retained_events(&self) -> usize {
        self.events.len()
    }

    fn publish(&mut self, event: ResourceEvent) {
        if self.subscribers.is_empty() {
            return;
        }
        self.events.push_back(event);
    }

    fn events_end(&self) -> u64 {
        self.events_base + self.events.len() as u64
    }

    fn trim_events(&mut self) {
        let oldest = self.subscribers.values().copied().min().unwrap_or_else(|| self.events_end());
        while self.events_base < oldest && self.events.pop_front().is_some() {
            self.events_base += 1;
        }
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
