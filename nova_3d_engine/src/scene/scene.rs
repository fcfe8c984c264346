/// Scene: the node arena and its hierarchy.
///
/// Uses a SlotMap for O(1) insert/remove with stable keys. The scene owns a
/// root Group node; nodes reachable from it are rendered. Detached nodes and
/// subtrees stay in the arena until destroyed.
///
/// Hierarchy edits validate before mutating: a rejected `add` or `attach`
/// leaves the tree exactly as it was.

use glam::{Mat3, Mat4, Quat, Vec3};
use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::math;
use super::camera::{Camera, CameraView};
use super::light::Light;
use super::node::{Node, NodeKey, NodeKind, Renderable};

/// A scene graph: node arena + root
pub struct Scene {
    nodes: SlotMap<NodeKey, Node>,
    root: NodeKey,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene containing only its root group
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new("Scene", NodeKind::Group));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    // ===== NODE CREATION =====

    /// Create a detached node with an identity transform
    pub fn create_node(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeKey {
        self.nodes.insert(Node::new(name, kind))
    }

    pub fn create_group(&mut self, name: impl Into<String>) -> NodeKey {
        self.create_node(name, NodeKind::Group)
    }

    pub fn create_mesh(&mut self, name: impl Into<String>, renderable: Renderable) -> NodeKey {
        self.create_node(name, NodeKind::Mesh(renderable))
    }

    pub fn create_camera(&mut self, name: impl Into<String>, camera: Camera) -> NodeKey {
        self.create_node(name, NodeKind::Camera(camera))
    }

    pub fn create_light(&mut self, name: impl Into<String>, light: Light) -> NodeKey {
        self.create_node(name, NodeKind::Light(light))
    }

    pub fn create_bone(&mut self, name: impl Into<String>) -> NodeKey {
        self.create_node(name, NodeKind::Bone)
    }

    // ===== QUERIES =====

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Number of nodes in the arena (root and detached nodes included)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|n| n.parent)
    }

    /// Children of a node (empty for unknown keys)
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// True if `ancestor` is a strict ancestor of `key`
    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        let mut current = self.parent(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parent(k);
        }
        false
    }

    /// Ancestors from the parent up to the topmost node
    pub fn ancestors(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut chain = Vec::new();
        let mut current = self.parent(key);
        while let Some(k) = current {
            chain.push(k);
            current = self.parent(k);
        }
        chain
    }

    /// Descendants in pre-order (children in insertion order), `key` excluded
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeKey> = self.children(key).iter().rev().copied().collect();
        while let Some(k) = stack.pop() {
            out.push(k);
            stack.extend(self.children(k).iter().rev().copied());
        }
        out
    }

    /// First node named `name` in pre-order from the root
    ///
    /// Detached subtrees are not searched.
    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|k| self.nodes.get(*k).map(|n| n.name() == name).unwrap_or(false))
    }

    /// Visit `key` and its descendants in pre-order
    pub fn traverse<F: FnMut(NodeKey, &Node)>(&self, key: NodeKey, mut visit: F) {
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.get(k) {
                visit(k, node);
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }

    /// Same as `traverse`, skipping invisible nodes and their subtrees
    pub fn traverse_visible<F: FnMut(NodeKey, &Node)>(&self, key: NodeKey, mut visit: F) {
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.get(k) {
                if !node.visible() {
                    continue;
                }
                visit(k, node);
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }

    // ===== HIERARCHY =====

    fn require(&self, key: NodeKey, role: &str) -> Result<&Node> {
        self.nodes.get(key).ok_or_else(|| {
            Error::InvalidHandle(format!("{} node {:?} does not exist", role, key))
        })
    }

    /// Check that `child` may become a child of `parent`
    fn validate_link(&self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.require(parent, "parent")?;
        let child_node = self.require(child, "child")?;

        let rejection = if parent == child {
            Some("a node cannot be its own child".to_string())
        } else if child == self.root {
            Some("the scene root cannot be re-parented".to_string())
        } else if self.is_ancestor(child, parent) {
            Some(format!("{:?} is an ancestor of {:?}, link would create a cycle", child, parent))
        } else if child_node.parent == Some(parent) {
            Some(format!("{:?} is already a child of {:?}", child, parent))
        } else {
            None
        };

        match rejection {
            Some(message) => {
                crate::engine_warn!("nova3d::Scene", "Rejected hierarchy edit: {}", message);
                Err(Error::StructuralError(message))
            }
            None => Ok(()),
        }
    }

    /// Unlink `child` from its parent, if any
    fn unlink(&mut self, child: NodeKey) {
        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(parent_node) = self.nodes.get_mut(p) {
                parent_node.children.retain(|&k| k != child);
            }
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
            node.world_matrix_needs_update = true;
        }
    }

    /// Append `child` to `parent`'s children, detaching it from any prior parent
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if either key is unknown
    /// - `StructuralError` for self-parenting, cycles, re-parenting the root,
    ///   or if `child` is already a child of `parent`
    ///
    /// The tree is unchanged on error.
    pub fn add(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.validate_link(parent, child)?;
        self.unlink(child);

        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
            node.world_matrix_needs_update = true;
        }
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(child);
        }
        Ok(())
    }

    /// Detach `child` from `parent`
    ///
    /// # Errors
    ///
    /// `InvalidHandle` for unknown keys, `StructuralError` if `child` is not
    /// a child of `parent`.
    pub fn remove(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.require(parent, "parent")?;
        let child_node = self.require(child, "child")?;
        if child_node.parent != Some(parent) {
            return Err(Error::StructuralError(format!(
                "{:?} is not a child of {:?}", child, parent
            )));
        }
        self.unlink(child);
        Ok(())
    }

    /// Detach a node from whatever parent it has (no-op when detached)
    pub fn remove_from_parent(&mut self, key: NodeKey) -> Result<()> {
        self.require(key, "node")?;
        self.unlink(key);
        Ok(())
    }

    /// Detach every child of `parent`, returning them in their former order
    pub fn clear_children(&mut self, parent: NodeKey) -> Result<Vec<NodeKey>> {
        let children = self.require(parent, "parent")?.children.clone();
        for &child in &children {
            self.unlink(child);
        }
        Ok(children)
    }

    /// Re-parent `child` under `parent` keeping its world transform
    ///
    /// The child's local transform becomes `inverse(parent world) * child world`.
    ///
    /// # Errors
    ///
    /// Same as `add`, plus `DegenerateMatrix` when the parent's world matrix
    /// cannot be inverted or the resulting local matrix cannot be decomposed.
    pub fn attach(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.validate_link(parent, child)?;

        self.update_world_matrix(parent, true, false)?;
        self.update_world_matrix(child, true, false)?;

        let parent_world = self.world_matrix(parent)?;
        let child_world = self.world_matrix(child)?;
        let local = math::try_inverse(&parent_world)? * child_world;
        let (position, rotation, scale) = math::decompose(&local)?;

        if let Some(node) = self.nodes.get_mut(child) {
            node.set_local_trs(position, rotation, scale);
        }
        self.add(parent, child)
    }

    /// Destroy a node and its whole subtree, returning the removed keys
    /// (pre-order, `key` first)
    ///
    /// # Errors
    ///
    /// `InvalidHandle` for unknown keys, `StructuralError` for the scene root.
    pub fn destroy(&mut self, key: NodeKey) -> Result<Vec<NodeKey>> {
        self.require(key, "node")?;
        if key == self.root {
            return Err(Error::StructuralError("the scene root cannot be destroyed".to_string()));
        }

        self.unlink(key);

        let mut removed = vec![key];
        removed.extend(self.descendants(key));
        for &k in &removed {
            self.nodes.remove(k);
        }

        crate::engine_debug!("nova3d::Scene", "Destroyed {} node(s)", removed.len());
        Ok(removed)
    }

    // ===== TRANSFORM PROPAGATION =====

    /// Top-down world matrix pass over the whole tree
    ///
    /// Nodes with `matrix_auto_update` recompose their local matrix. A node is
    /// recomputed when it is dirty or `force` is set, and then forces its
    /// whole subtree. Children are processed in insertion order.
    pub fn update_matrix_world(&mut self, force: bool) {
        self.propagate(self.root, force);
    }

    /// Same pass starting at any node (e.g. the root of a detached subtree)
    ///
    /// The start node combines its local matrix with its parent's current
    /// world matrix, if it has a parent.
    pub fn update_node_matrix_world(&mut self, key: NodeKey, force: bool) -> Result<()> {
        self.require(key, "node")?;
        self.propagate(key, force);
        Ok(())
    }

    fn propagate(&mut self, start: NodeKey, force: bool) {
        let mut stack: Vec<(NodeKey, bool)> = vec![(start, force)];

        while let Some((key, force)) = stack.pop() {
            let parent_world = self.parent_world(key);
            let Some(node) = self.nodes.get_mut(key) else { continue };

            if node.matrix_auto_update() {
                node.compose();
            }

            let mut force_children = force;
            if node.world_matrix_needs_update || !node.world_matrix_valid || force {
                node.world_matrix = match parent_world {
                    Some(parent_world) => parent_world * node.local_matrix(),
                    None => node.local_matrix(),
                };
                node.world_matrix_needs_update = false;
                node.world_matrix_valid = true;
                force_children = true;
            }

            for &child in node.children.iter().rev() {
                stack.push((child, force_children));
            }
        }
    }

    fn parent_world(&self, key: NodeKey) -> Option<Mat4> {
        self.nodes
            .get(key)
            .and_then(|n| n.parent)
            .and_then(|p| self.nodes.get(p))
            .map(|p| p.world_matrix)
    }

    /// Recompute one node's world matrix, optionally with its ancestor chain
    /// and/or its descendants
    ///
    /// Recomputation is unconditional. The node's dirty flag is left as is,
    /// so the next full pass still propagates into its descendants.
    pub fn update_world_matrix(&mut self, key: NodeKey, update_parents: bool, update_children: bool) -> Result<()> {
        self.require(key, "node")?;

        let mut chain = if update_parents { self.ancestors(key) } else { Vec::new() };
        chain.reverse();
        chain.push(key);
        if update_children {
            chain.extend(self.descendants(key));
        }

        for k in chain {
            let parent_world = self.parent_world(k);
            if let Some(node) = self.nodes.get_mut(k) {
                if node.matrix_auto_update() {
                    node.compose();
                }
                node.world_matrix = match parent_world {
                    Some(parent_world) => parent_world * node.local_matrix(),
                    None => node.local_matrix(),
                };
                node.world_matrix_valid = true;
            }
        }
        Ok(())
    }

    // ===== WORLD-SPACE READS =====

    /// World matrix from the last update
    ///
    /// # Errors
    ///
    /// `InvalidHandle` for unknown keys, `ContractViolation` if no update
    /// ever reached the node.
    pub fn world_matrix(&self, key: NodeKey) -> Result<Mat4> {
        self.require(key, "node")?.world_matrix()
    }

    /// Fresh world matrix (ancestor chain recomputed first)
    fn fresh_world_matrix(&mut self, key: NodeKey) -> Result<Mat4> {
        self.update_world_matrix(key, true, false)?;
        self.world_matrix(key)
    }

    pub fn world_position(&mut self, key: NodeKey) -> Result<Vec3> {
        Ok(self.fresh_world_matrix(key)?.w_axis.truncate())
    }

    pub fn world_quaternion(&mut self, key: NodeKey) -> Result<Quat> {
        let (_, rotation, _) = math::decompose(&self.fresh_world_matrix(key)?)?;
        Ok(rotation)
    }

    pub fn world_scale(&mut self, key: NodeKey) -> Result<Vec3> {
        let (_, _, scale) = math::decompose(&self.fresh_world_matrix(key)?)?;
        Ok(scale)
    }

    /// Transform a point from the node's local space to world space
    pub fn local_to_world(&mut self, key: NodeKey, point: Vec3) -> Result<Vec3> {
        Ok(self.fresh_world_matrix(key)?.transform_point3(point))
    }

    /// Transform a world-space point into the node's local space
    pub fn world_to_local(&mut self, key: NodeKey, point: Vec3) -> Result<Vec3> {
        let inverse = math::try_inverse(&self.fresh_world_matrix(key)?)?;
        Ok(inverse.transform_point3(point))
    }

    /// Rotate a node to face a world-space target
    ///
    /// Cameras and lights point their -Z axis at the target, other nodes
    /// their +Z axis. The parent's world rotation is compensated.
    pub fn look_at(&mut self, key: NodeKey, target: Vec3) -> Result<()> {
        let position = self.world_position(key)?;
        let points_negative_z = matches!(
            self.require(key, "node")?.kind(),
            NodeKind::Camera(_) | NodeKind::Light(_)
        );

        let z_dir = if points_negative_z { position - target } else { target - position };
        let mut rotation = look_rotation(z_dir, Vec3::Y);

        if let Some(parent) = self.parent(key) {
            let (_, parent_rotation, _) = math::decompose(&self.world_matrix(parent)?)?;
            rotation = parent_rotation.inverse() * rotation;
        }

        if let Some(node) = self.nodes.get_mut(key) {
            node.set_rotation(rotation.normalize());
        }
        Ok(())
    }

    // ===== CAMERA =====

    /// Snapshot a camera node for rendering
    ///
    /// Uses the current world matrix; run an update pass first.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` for unknown keys, `ContractViolation` if the node is
    /// not a camera or was never updated, `DegenerateMatrix` if its world
    /// matrix is singular.
    pub fn camera_view(&self, key: NodeKey) -> Result<CameraView> {
        let node = self.require(key, "camera")?;
        let camera = node.kind().camera().ok_or_else(|| {
            Error::ContractViolation(format!(
                "node '{}' is a {}, not a camera", node.name(), node.kind().type_name()
            ))
        })?;
        CameraView::new(key, camera, &node.world_matrix()?, *node.layers())
    }
}

/// Rotation whose +Z axis points along `z_dir`, keeping `up` as close to +Y as possible
fn look_rotation(z_dir: Vec3, up: Vec3) -> Quat {
    let mut z = z_dir.normalize_or_zero();
    if z == Vec3::ZERO {
        z = Vec3::Z;
    }

    let mut x = up.cross(z);
    if x.length_squared() == 0.0 {
        // up and z are parallel
        if up.z.abs() == 1.0 {
            z.x += 0.0001;
        } else {
            z.z += 0.0001;
        }
        z = z.normalize();
        x = up.cross(z);
    }
    let x = x.normalize();
    let y = z.cross(x);

    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
