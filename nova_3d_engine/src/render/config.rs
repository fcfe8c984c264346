/// Renderer configuration

use crate::graphics_device::Viewport;

/// What happens to the children of a renderable that fails the frustum test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullPolicy {
    /// Children are tested on their own bounds
    #[default]
    EvaluateChildren,
    /// The whole subtree is skipped
    CullSubtree,
}

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Sort render list buckets by order and depth (insertion order otherwise)
    pub sort_objects: bool,
    /// Test renderables against the camera frustum
    pub frustum_culling: bool,
    pub cull_policy: CullPolicy,
    /// Shadow mapping enabled; part of every program key
    pub shadows_enabled: bool,
    /// None: the device's default viewport
    pub viewport: Option<Viewport>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sort_objects: true,
            frustum_culling: true,
            cull_policy: CullPolicy::EvaluateChildren,
            shadows_enabled: false,
            viewport: None,
        }
    }
}
