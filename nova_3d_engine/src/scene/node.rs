/// Scene graph node types.
///
/// A Node owns its local transform (position, rotation, scale), cached
/// local/world matrices and a payload (`NodeKind`). Hierarchy links are
/// arena keys: the parent link is non-owning, the ordered child list is
/// the traversal order.

use glam::{Mat4, Quat, Vec3};
use slotmap::new_key_type;
use crate::error::{Error, Result};
use crate::math::{self, Euler, EulerOrder};
use crate::resource::{GeometryKey, MaterialKey};
use super::camera::Camera;
use super::light::Light;

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key for a Node within a Scene.
    ///
    /// Keys remain valid even after other nodes are destroyed.
    /// A key becomes invalid only when its own node is destroyed, and a
    /// reused slot always produces a different key.
    pub struct NodeKey;
}

// ===== LAYERS =====

/// 32-bit layer membership mask
///
/// A node is rendered by a camera only when their layers share at least one
/// channel. Channels outside 0..32 are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layers {
    mask: u32,
}

impl Default for Layers {
    fn default() -> Self {
        Self { mask: 1 }
    }
}

impl Layers {
    /// Layers with only channel 0 enabled
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mask(mask: u32) -> Self {
        Self { mask }
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    fn bit(channel: u32) -> u32 {
        if channel < 32 { 1 << channel } else { 0 }
    }

    /// Enable only this channel
    pub fn set(&mut self, channel: u32) {
        self.mask = Self::bit(channel);
    }

    pub fn enable(&mut self, channel: u32) {
        self.mask |= Self::bit(channel);
    }

    pub fn disable(&mut self, channel: u32) {
        self.mask &= !Self::bit(channel);
    }

    pub fn toggle(&mut self, channel: u32) {
        self.mask ^= Self::bit(channel);
    }

    pub fn enable_all(&mut self) {
        self.mask = u32::MAX;
    }

    pub fn disable_all(&mut self) {
        self.mask = 0;
    }

    pub fn is_enabled(&self, channel: u32) -> bool {
        self.mask & Self::bit(channel) != 0
    }

    /// True if both masks share at least one channel
    pub fn test(&self, other: &Layers) -> bool {
        self.mask & other.mask != 0
    }
}

// ===== RENDERABLE PAYLOAD =====

/// Material assignment of a renderable
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialBinding {
    /// One material for the whole draw range
    Single(MaterialKey),
    /// One material per geometry group, indexed by `group.material_index`
    Multi(Vec<MaterialKey>),
}

impl MaterialBinding {
    /// Material used for a group's material index
    pub fn for_group(&self, material_index: usize) -> Option<MaterialKey> {
        match self {
            MaterialBinding::Single(key) => Some(*key),
            MaterialBinding::Multi(keys) => keys.get(material_index).copied(),
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, MaterialBinding::Multi(_))
    }
}

/// Geometry + material reference carried by mesh nodes
///
/// Geometry and materials live in the ResourceManager and may be shared by
/// any number of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    pub geometry: GeometryKey,
    pub material: MaterialBinding,
    /// Instanced draw count (`None` = regular draw)
    pub instance_count: Option<u32>,
}

impl Renderable {
    pub fn new(geometry: GeometryKey, material: MaterialKey) -> Self {
        Self {
            geometry,
            material: MaterialBinding::Single(material),
            instance_count: None,
        }
    }

    pub fn with_materials(geometry: GeometryKey, materials: Vec<MaterialKey>) -> Self {
        Self {
            geometry,
            material: MaterialBinding::Multi(materials),
            instance_count: None,
        }
    }

    pub fn with_instances(mut self, count: u32) -> Self {
        self.instance_count = Some(count);
        self
    }
}

// ===== NODE KIND =====

/// Node payload
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Pure grouping node, no bounding volume
    Group,
    Mesh(Renderable),
    Light(Light),
    Camera(Camera),
    /// Skeleton joint (transform only)
    Bone,
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Group => "Group",
            NodeKind::Mesh(_) => "Mesh",
            NodeKind::Light(_) => "Light",
            NodeKind::Camera(_) => "Camera",
            NodeKind::Bone => "Bone",
        }
    }

    pub fn renderable(&self) -> Option<&Renderable> {
        match self {
            NodeKind::Mesh(renderable) => Some(renderable),
            _ => None,
        }
    }

    pub fn camera(&self) -> Option<&Camera> {
        match self {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        match self {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn light(&self) -> Option<&Light> {
        match self {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn light_mut(&mut self) -> Option<&mut Light> {
        match self {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }
}

// ===== NODE =====

/// Scene graph element
///
/// Created detached with an identity transform via `Scene::create_node`.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    local_matrix: Mat4,
    pub(crate) world_matrix: Mat4,
    matrix_auto_update: bool,
    pub(crate) world_matrix_needs_update: bool,
    pub(crate) world_matrix_valid: bool,
    visible: bool,
    layers: Layers,
    render_order: i32,
    frustum_culled: bool,
    cull_subtree: bool,
    kind: NodeKind,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_matrix: Mat4::IDENTITY,
            world_matrix: Mat4::IDENTITY,
            matrix_auto_update: true,
            world_matrix_needs_update: false,
            world_matrix_valid: false,
            visible: true,
            layers: Layers::default(),
            render_order: 0,
            frustum_culled: true,
            cull_subtree: false,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    // ===== IDENTITY / HIERARCHY =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Children in insertion (traversal) order
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    // ===== LOCAL TRANSFORM =====

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Current rotation expressed as Euler angles
    pub fn euler(&self, order: EulerOrder) -> Euler {
        Euler::from_quat(self.rotation, order)
    }

    pub fn set_rotation_from_euler(&mut self, euler: &Euler) {
        self.rotation = euler.to_quat();
    }

    /// `axis` is expected to be normalized
    pub fn set_rotation_from_axis_angle(&mut self, axis: Vec3, angle: f32) {
        self.rotation = Quat::from_axis_angle(axis, angle);
    }

    /// Rotate around an axis in local space
    pub fn rotate_on_axis(&mut self, axis: Vec3, angle: f32) {
        self.rotation = (self.rotation * Quat::from_axis_angle(axis, angle)).normalize();
    }

    pub fn rotate_x(&mut self, angle: f32) {
        self.rotate_on_axis(Vec3::X, angle);
    }

    pub fn rotate_y(&mut self, angle: f32) {
        self.rotate_on_axis(Vec3::Y, angle);
    }

    pub fn rotate_z(&mut self, angle: f32) {
        self.rotate_on_axis(Vec3::Z, angle);
    }

    /// Move along an axis expressed in local space
    pub fn translate_on_axis(&mut self, axis: Vec3, distance: f32) {
        self.position += self.rotation * axis * distance;
    }

    pub fn translate_x(&mut self, distance: f32) {
        self.translate_on_axis(Vec3::X, distance);
    }

    pub fn translate_y(&mut self, distance: f32) {
        self.translate_on_axis(Vec3::Y, distance);
    }

    pub fn translate_z(&mut self, distance: f32) {
        self.translate_on_axis(Vec3::Z, distance);
    }

    // ===== MATRICES =====

    /// Rebuild the local matrix from position/rotation/scale
    ///
    /// Marks the world matrix for recomputation on the next update pass.
    pub fn compose(&mut self) {
        self.local_matrix = math::compose(self.position, self.rotation, self.scale);
        self.world_matrix_needs_update = true;
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.local_matrix
    }

    /// Replace the local matrix and decompose it back into TRS
    ///
    /// # Errors
    ///
    /// Returns `Error::DegenerateMatrix` (node unchanged) for zero-scale matrices.
    pub fn set_local_matrix(&mut self, matrix: Mat4) -> Result<()> {
        let (position, rotation, scale) = math::decompose(&matrix)?;
        self.position = position;
        self.rotation = rotation;
        self.scale = scale;
        self.local_matrix = matrix;
        self.world_matrix_needs_update = true;
        Ok(())
    }

    /// Pre-multiply the local transform by `matrix`
    ///
    /// # Errors
    ///
    /// Returns `Error::DegenerateMatrix` (node unchanged) if the product
    /// cannot be decomposed.
    pub fn apply_matrix(&mut self, matrix: &Mat4) -> Result<()> {
        let local = if self.matrix_auto_update {
            math::compose(self.position, self.rotation, self.scale)
        } else {
            self.local_matrix
        };
        self.set_local_matrix(*matrix * local)
    }

    pub fn matrix_auto_update(&self) -> bool {
        self.matrix_auto_update
    }

    /// When false, the update pass no longer calls `compose()`; the
    /// caller owns the local matrix.
    pub fn set_matrix_auto_update(&mut self, enabled: bool) {
        self.matrix_auto_update = enabled;
    }

    pub fn world_matrix_needs_update(&self) -> bool {
        self.world_matrix_needs_update
    }

    /// Force the next update pass to recompute this node and its subtree
    pub fn mark_world_matrix_dirty(&mut self) {
        self.world_matrix_needs_update = true;
    }

    /// Whether any update pass has computed the world matrix yet
    pub fn has_world_matrix(&self) -> bool {
        self.world_matrix_valid
    }

    /// World matrix from the last update pass
    ///
    /// # Errors
    ///
    /// Returns `Error::ContractViolation` if no update pass ever reached this node.
    pub fn world_matrix(&self) -> Result<Mat4> {
        if !self.world_matrix_valid {
            return Err(Error::ContractViolation(format!(
                "world matrix of node '{}' read before any update pass", self.name
            )));
        }
        Ok(self.world_matrix)
    }

    // ===== RENDER FLAGS =====

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Invisible nodes are skipped together with their whole subtree
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut Layers {
        &mut self.layers
    }

    pub fn render_order(&self) -> i32 {
        self.render_order
    }

    pub fn set_render_order(&mut self, order: i32) {
        self.render_order = order;
    }

    pub fn frustum_culled(&self) -> bool {
        self.frustum_culled
    }

    pub fn set_frustum_culled(&mut self, culled: bool) {
        self.frustum_culled = culled;
    }

    pub fn cull_subtree(&self) -> bool {
        self.cull_subtree
    }

    /// When set, failing the frustum test also skips every descendant
    pub fn set_cull_subtree(&mut self, enabled: bool) {
        self.cull_subtree = enabled;
    }

    // ===== INTERNAL =====

    pub(crate) fn set_local_trs(&mut self, position: Vec3, rotation: Quat, scale: Vec3) {
        self.position = position;
        self.rotation = rotation;
        self.scale = scale;
        self.compose();
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
