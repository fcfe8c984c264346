/// Render list construction.
///
/// One depth-first pass over the scene from the root collects lights into
/// a `LightSummary` and turns visible renderables into draw commands.
///
/// Visibility rules:
/// - an invisible node hides its whole subtree
/// - a layer mismatch skips the node only
/// - a renderable failing the culler is skipped; its children are still
///   evaluated unless the policy or the node asks to cull the subtree
/// - nodes without geometry are never culled, nor are nodes with
///   `frustum_culled == false`

use crate::engine_warn;
use crate::resource::{MaterialKey, ResourceManager, GeometryGroup};
use crate::scene::{CameraView, LightSummary, NodeKey, NodeKind, Scene};
use super::config::{CullPolicy, RenderConfig};
use super::culler::{CameraCuller, FrustumCuller, WorldBounds};
use super::render_list::{DrawCommand, RenderList};

/// Attribute holding per-vertex colours
pub const COLOR_ATTRIBUTE: &str = "color";

/// Counters of the last build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub nodes_visited: u32,
    pub culled: u32,
    pub commands: u32,
    /// Renderables referencing disposed geometry or material
    pub missing_resources: u32,
}

/// Builds the per-frame render list
pub struct RenderListBuilder {
    culler: Box<dyn CameraCuller>,
    list: RenderList,
    lights: LightSummary,
    stats: BuildStats,
    stack: Vec<NodeKey>,
}

impl RenderListBuilder {
    pub fn new() -> Self {
        Self::with_culler(Box::new(FrustumCuller::new()))
    }

    pub fn with_culler(culler: Box<dyn CameraCuller>) -> Self {
        Self {
            culler,
            list: RenderList::new(),
            lights: LightSummary::default(),
            stats: BuildStats::default(),
            stack: Vec::new(),
        }
    }

    pub fn set_culler(&mut self, culler: Box<dyn CameraCuller>) {
        self.culler = culler;
    }

    pub fn list(&self) -> &RenderList {
        &self.list
    }

    pub fn lights(&self) -> &LightSummary {
        &self.lights
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Rebuild and sort the render list for `view`
    ///
    /// World matrices must be current. Missing bounds are computed lazily,
    /// which is why resources are borrowed mutably.
    pub fn build(
        &mut self,
        scene: &Scene,
        resources: &mut ResourceManager,
        view: &CameraView,
        config: &RenderConfig,
    ) -> &RenderList {
        self.list.clear();
        self.lights = LightSummary::default();
        self.stats = BuildStats::default();

        let mut sequence = 0u32;
        let mut stack = std::mem::take(&mut self.stack);
        stack.clear();
        stack.push(scene.root());

        while let Some(key) = stack.pop() {
            let Some(node) = scene.node(key) else { continue };
            if !node.visible() {
                continue;
            }
            self.stats.nodes_visited += 1;

            let mut descend = true;
            if node.layers().test(&view.layers) {
                match node.kind() {
                    NodeKind::Light(light) => self.lights.add(light),
                    NodeKind::Mesh(renderable) => {
                        descend = self.push_renderable(
                            key, renderable, scene, resources, view, config, &mut sequence,
                        );
                    }
                    _ => {}
                }
            }

            if descend {
                stack.extend(node.children().iter().rev().copied());
            }
        }
        self.stack = stack;

        self.list.sort(config.sort_objects);
        &self.list
    }

    /// Push the commands of one renderable; false if its subtree is culled
    #[allow(clippy::too_many_arguments)]
    fn push_renderable(
        &mut self,
        key: NodeKey,
        renderable: &crate::scene::Renderable,
        scene: &Scene,
        resources: &mut ResourceManager,
        view: &CameraView,
        config: &RenderConfig,
        sequence: &mut u32,
    ) -> bool {
        let Some(node) = scene.node(key) else { return true };
        let world_matrix = match node.world_matrix() {
            Ok(m) => m,
            Err(e) => {
                engine_warn!("nova3d::RenderListBuilder", "'{}' skipped: {}", node.name(), e);
                return true;
            }
        };

        let Some(geometry) = resources.geometry_mut(renderable.geometry) else {
            engine_warn!("nova3d::RenderListBuilder",
                "'{}' references a disposed geometry, skipped", node.name());
            self.stats.missing_resources += 1;
            return true;
        };
        geometry.ensure_bounds();
        let local_sphere = geometry.bounding_sphere().copied().unwrap_or_default();
        let local_box = geometry.bounding_box().copied().unwrap_or_default();
        let bounds = WorldBounds {
            sphere: local_sphere.transformed(&world_matrix),
            aabb: local_box.transformed(&world_matrix),
        };

        if config.frustum_culling && node.frustum_culled() && !self.culler.is_visible(view, &bounds) {
            self.stats.culled += 1;
            return !(config.cull_policy == CullPolicy::CullSubtree || node.cull_subtree());
        }

        let z = if config.sort_objects {
            let center = if bounds.sphere.is_empty() {
                world_matrix.w_axis.truncate()
            } else {
                bounds.sphere.center
            };
            view.view_depth(center)
        } else {
            0.0
        };

        let has_colors = geometry.has_attribute(COLOR_ATTRIBUTE);
        let groups: Vec<GeometryGroup> = if renderable.material.is_multi() {
            geometry.groups().to_vec()
        } else {
            Vec::new()
        };

        let mut push = |this: &mut Self, material_key: MaterialKey, group: Option<GeometryGroup>| {
            let Some(material) = resources.material(material_key) else {
                engine_warn!("nova3d::RenderListBuilder",
                    "'{}' references a disposed material, skipped", node.name());
                this.stats.missing_resources += 1;
                return;
            };
            if !material.is_visible() {
                return;
            }
            this.list.push(material.render_bucket(), DrawCommand {
                node: key,
                geometry: renderable.geometry,
                material: material_key,
                group,
                world_matrix,
                z,
                render_order: node.render_order(),
                sequence: *sequence,
                instance_count: renderable.instance_count,
                vertex_colors: has_colors && material.vertex_colors(),
            });
            this.stats.commands += 1;
            *sequence += 1;
        };

        if renderable.material.is_multi() {
            for group in groups {
                if let Some(material_key) = renderable.material.for_group(group.material_index) {
                    push(self, material_key, Some(group));
                }
            }
        } else if let Some(material_key) = renderable.material.for_group(0) {
            push(self, material_key, None);
        }
        true
    }
}

impl Default for RenderListBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "render_list_builder_tests.rs"]
mod tests;
