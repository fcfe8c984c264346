/// Camera culling strategies.
///
/// A CameraCuller decides whether a renderable's world-space bounds are
/// visible from the camera. The render list builder applies the hierarchy
/// policy (subtree skipping, groups never culled) around it.

use crate::math::{Aabb, Sphere};
use crate::scene::CameraView;

/// World-space bounding volumes of one renderable
#[derive(Debug, Clone, Copy)]
pub struct WorldBounds {
    pub sphere: Sphere,
    pub aabb: Aabb,
}

/// Strategy for testing renderables against a camera.
///
/// `&mut self` allows stateful implementations (e.g. statistics or
/// temporal coherence) to keep state across frames.
pub trait CameraCuller: Send + Sync {
    /// True if the bounds may be visible from the view
    fn is_visible(&mut self, view: &CameraView, bounds: &WorldBounds) -> bool;
}

/// Culler that never rejects anything
#[derive(Debug, Default)]
pub struct NoCuller;

impl NoCuller {
    pub fn new() -> Self {
        Self
    }
}

impl CameraCuller for NoCuller {
    fn is_visible(&mut self, _view: &CameraView, _bounds: &WorldBounds) -> bool {
        true
    }
}

/// Frustum culler: bounding sphere first, then the box for survivors.
///
/// Empty bounds (geometry without positions) are never culled.
#[derive(Debug, Default)]
pub struct FrustumCuller;

impl FrustumCuller {
    pub fn new() -> Self {
        Self
    }
}

impl CameraCuller for FrustumCuller {
    fn is_visible(&mut self, view: &CameraView, bounds: &WorldBounds) -> bool {
        if bounds.sphere.is_empty() {
            return true;
        }
        if !view.frustum.intersects_sphere(&bounds.sphere) {
            return false;
        }
        bounds.aabb.is_empty() || view.frustum.intersects_aabb(&bounds.aabb)
    }
}

#[cfg(test)]
#[path = "culler_tests.rs"]
mod tests;
