//! CPU-side geometry: named vertex attributes, an optional index, draw
//! range, material groups and lazily computed bounds.
//!
//! # Layout
//!
//! ```text
//! Geometry "box"
//! ├── attributes (ordered)
//! │   ├── "position" → BufferAttribute (f32 x3)
//! │   ├── "normal"   → BufferAttribute (f32 x3)
//! │   └── "uv"       → BufferAttribute (f32 x2)
//! ├── index (u16 / u32, optional)
//! ├── draw_range [start, start + count)
//! └── groups → (start, count, material_index)
//! ```
//!
//! Every non-index attribute must describe the same number of vertices and
//! every index must reference an existing vertex. Mutations that would break
//! either rule fail with `StructuralError` and leave the geometry unchanged.

use crate::error::{Error, Result};
use crate::math::{Aabb, Sphere};
use crate::engine_warn;
use super::attribute::BufferAttribute;

/// Name of the attribute bounds are computed from
pub const POSITION: &str = "position";

// ============================================================================
// GROUPS AND DRAW RANGE
// ============================================================================

/// Sub-range of the geometry drawn with one material of a multi-material mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryGroup {
    pub start: u32,
    pub count: u32,
    pub material_index: usize,
}

impl GeometryGroup {
    /// Exclusive end, saturating
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.count)
    }
}

/// Range of vertices (or indices) drawn. `count == u32::MAX` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    pub start: u32,
    pub count: u32,
}

impl Default for DrawRange {
    fn default() -> Self {
        Self { start: 0, count: u32::MAX }
    }
}

impl DrawRange {
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.count)
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// Named vertex attributes plus optional index
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    name: String,
    attributes: Vec<(String, BufferAttribute)>,
    index: Option<BufferAttribute>,
    draw_range: DrawRange,
    groups: Vec<GeometryGroup>,
    bounding_box: Option<Aabb>,
    bounding_sphere: Option<Sphere>,
    layout_version: u64,
}

impl Geometry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ===== ATTRIBUTES =====

    /// Insert or replace an attribute
    ///
    /// # Errors
    ///
    /// `StructuralError` if its item count disagrees with the other
    /// attributes (replacing the only attribute is always accepted), or if
    /// the current index would reference vertices past the new count.
    pub fn set_attribute(&mut self, name: impl Into<String>, attribute: BufferAttribute) -> Result<()> {
        let name = name.into();
        let count = attribute.count();

        if let Some((other, existing)) = self.attributes.iter().find(|(n, _)| *n != name) {
            if existing.count() != count {
                engine_warn!("nova3d::Geometry",
                    "'{}': attribute '{}' has {} items, '{}' has {}",
                    self.name, name, count, other, existing.count());
                return Err(Error::StructuralError(format!(
                    "attribute '{}' has {} items but '{}' has {}", name, count, other, existing.count()
                )));
            }
        }
        if let Some(index) = &self.index {
            if let Some(bad) = first_out_of_range_index(index, count) {
                engine_warn!("nova3d::Geometry",
                    "'{}': index {} out of range for {} vertices", self.name, bad, count);
                return Err(Error::StructuralError(format!(
                    "index {} references a vertex past {}", bad, count
                )));
            }
        }

        if name == POSITION {
            self.invalidate_bounds();
        }
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = attribute,
            None => {
                self.attributes.push((name, attribute));
                self.layout_version += 1;
            }
        }
        Ok(())
    }

    /// Remove an attribute, returning it
    pub fn remove_attribute(&mut self, name: &str) -> Option<BufferAttribute> {
        let pos = self.attributes.iter().position(|(n, _)| n == name)?;
        let (_, attribute) = self.attributes.remove(pos);
        if name == POSITION {
            self.invalidate_bounds();
        }
        self.layout_version += 1;
        Some(attribute)
    }

    pub fn attribute(&self, name: &str) -> Option<&BufferAttribute> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    /// In-place access. Edits to `position` require `invalidate_bounds`.
    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut BufferAttribute> {
        self.attributes.iter_mut().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|(n, _)| n == name)
    }

    /// Attributes in insertion order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &BufferAttribute)> {
        self.attributes.iter().map(|(n, a)| (n.as_str(), a))
    }

    /// Mutable attributes for the upload path (clears update ranges)
    pub(crate) fn attributes_mut(&mut self) -> impl Iterator<Item = (&str, &mut BufferAttribute)> {
        self.attributes.iter_mut().map(|(n, a)| (n.as_str(), a))
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Bumped whenever an attribute is added or removed
    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    // ===== INDEX =====

    /// Set or clear the index
    ///
    /// # Errors
    ///
    /// `StructuralError` if the index is not `u16`/`u32` with item size 1,
    /// or if any index references a missing vertex.
    pub fn set_index(&mut self, index: Option<BufferAttribute>) -> Result<()> {
        if let Some(index) = &index {
            if !index.data().is_index_type() || index.item_size() != 1 {
                engine_warn!("nova3d::Geometry",
                    "'{}': rejected {} index with item size {}",
                    self.name, index.data().type_name(), index.item_size());
                return Err(Error::StructuralError(format!(
                    "index must be u16 or u32 with item size 1 (got {} x{})",
                    index.data().type_name(), index.item_size()
                )));
            }
            if let Some(vertices) = self.attribute_vertex_count() {
                if let Some(bad) = first_out_of_range_index(index, vertices) {
                    engine_warn!("nova3d::Geometry",
                        "'{}': index {} out of range for {} vertices", self.name, bad, vertices);
                    return Err(Error::StructuralError(format!(
                        "index {} references a vertex past {}", bad, vertices
                    )));
                }
            }
        }
        self.index = index;
        Ok(())
    }

    pub fn index(&self) -> Option<&BufferAttribute> {
        self.index.as_ref()
    }

    /// In-place index access. Written values are checked by `validate`.
    pub fn index_mut(&mut self) -> Option<&mut BufferAttribute> {
        self.index.as_mut()
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    // ===== COUNTS =====

    fn attribute_vertex_count(&self) -> Option<usize> {
        self.attributes.first().map(|(_, a)| a.count())
    }

    /// Vertices described by the attributes (0 without attributes)
    pub fn vertex_count(&self) -> usize {
        self.attribute_vertex_count().unwrap_or(0)
    }

    /// Elements a full draw covers: index count if indexed, else vertex
    /// count, clipped by the draw range
    pub fn draw_count(&self) -> u32 {
        let total = match &self.index {
            Some(index) => index.count(),
            None => self.vertex_count(),
        };
        let total = u32::try_from(total).unwrap_or(u32::MAX);
        let start = self.draw_range.start.min(total);
        let end = self.draw_range.end().min(total);
        end - start
    }

    // ===== DRAW RANGE / GROUPS =====

    pub fn draw_range(&self) -> DrawRange {
        self.draw_range
    }

    pub fn set_draw_range(&mut self, start: u32, count: u32) {
        self.draw_range = DrawRange { start, count };
    }

    pub fn add_group(&mut self, start: u32, count: u32, material_index: usize) {
        self.groups.push(GeometryGroup { start, count, material_index });
    }

    pub fn clear_groups(&mut self) {
        self.groups.clear();
    }

    pub fn groups(&self) -> &[GeometryGroup] {
        &self.groups
    }

    // ===== BOUNDS =====

    /// Drop cached bounds; they are recomputed on next request
    pub fn invalidate_bounds(&mut self) {
        self.bounding_box = None;
        self.bounding_sphere = None;
    }

    fn positions(&self) -> Vec<glam::Vec3> {
        self.attribute(POSITION)
            .map(|a| a.iter_vec3().collect())
            .unwrap_or_default()
    }

    /// Recompute the local-space box from `position` (empty without positions)
    pub fn compute_bounding_box(&mut self) -> Aabb {
        let aabb = Aabb::from_points(self.positions());
        self.bounding_box = Some(aabb);
        aabb
    }

    /// Recompute the local-space sphere from `position`
    pub fn compute_bounding_sphere(&mut self) -> Sphere {
        let sphere = Sphere::from_points(&self.positions());
        self.bounding_sphere = Some(sphere);
        sphere
    }

    /// Compute whichever bound is missing
    pub fn ensure_bounds(&mut self) {
        if self.bounding_box.is_none() {
            self.compute_bounding_box();
        }
        if self.bounding_sphere.is_none() {
            self.compute_bounding_sphere();
        }
    }

    /// Cached box, if computed and not invalidated since
    pub fn bounding_box(&self) -> Option<&Aabb> {
        self.bounding_box.as_ref()
    }

    pub fn bounding_sphere(&self) -> Option<&Sphere> {
        self.bounding_sphere.as_ref()
    }

    // ===== VALIDATION =====

    /// Full draw-time check of the structural rules
    ///
    /// Catches corruption introduced through `attribute_mut`/`index_mut`.
    ///
    /// # Errors
    ///
    /// `StructuralError` describing the first violation found.
    pub fn validate(&self) -> Result<()> {
        let vertices = self.vertex_count();
        for (name, attribute) in &self.attributes {
            if attribute.count() != vertices {
                return Err(Error::StructuralError(format!(
                    "'{}': attribute '{}' has {} items, expected {}",
                    self.name, name, attribute.count(), vertices
                )));
            }
        }
        if let Some(index) = &self.index {
            if let Some(bad) = first_out_of_range_index(index, vertices) {
                return Err(Error::StructuralError(format!(
                    "'{}': index {} references a vertex past {}", self.name, bad, vertices
                )));
            }
        }
        Ok(())
    }
}

fn first_out_of_range_index(index: &BufferAttribute, vertex_count: usize) -> Option<u32> {
    let data = index.data();
    (0..data.len())
        .filter_map(|i| data.get_index(i))
        .find(|&v| v as usize >= vertex_count)
}

#[cfg(test)]
#[path = "geometry_tests.rs"]
mod tests;
