//! Typed vertex/index attribute buffers.
//!
//! A `BufferAttribute` holds a typed element array interpreted as
//! `count` items of `item_size` components. Its `version` counter drives
//! GPU re-uploads: replacing the data through `set_data` or calling
//! `needs_update` bumps it, component edits (`set_x`, `set_xyz`, ...) do not.
//! After in-place edits the owner must call `needs_update` explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use glam::Vec3;
use crate::error::{Error, Result};

/// Identity source for attributes (stands in for object identity)
static NEXT_ATTRIBUTE_ID: AtomicU64 = AtomicU64::new(1);

fn next_attribute_id() -> u64 {
    NEXT_ATTRIBUTE_ID.fetch_add(1, Ordering::Relaxed)
}

// ============================================================================
// ATTRIBUTE DATA
// ============================================================================

/// Typed element storage
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    F32(Vec<f32>),
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
}

impl AttributeData {
    /// Number of scalar elements
    pub fn len(&self) -> usize {
        match self {
            AttributeData::F32(v) => v.len(),
            AttributeData::U8(v) => v.len(),
            AttributeData::U16(v) => v.len(),
            AttributeData::U32(v) => v.len(),
            AttributeData::I8(v) => v.len(),
            AttributeData::I16(v) => v.len(),
            AttributeData::I32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bytes_per_element(&self) -> usize {
        match self {
            AttributeData::U8(_) | AttributeData::I8(_) => 1,
            AttributeData::U16(_) | AttributeData::I16(_) => 2,
            AttributeData::F32(_) | AttributeData::U32(_) | AttributeData::I32(_) => 4,
        }
    }

    /// Raw bytes (native endianness)
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AttributeData::F32(v) => bytemuck::cast_slice(v),
            AttributeData::U8(v) => v,
            AttributeData::U16(v) => bytemuck::cast_slice(v),
            AttributeData::U32(v) => bytemuck::cast_slice(v),
            AttributeData::I8(v) => bytemuck::cast_slice(v),
            AttributeData::I16(v) => bytemuck::cast_slice(v),
            AttributeData::I32(v) => bytemuck::cast_slice(v),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeData::F32(_) => "f32",
            AttributeData::U8(_) => "u8",
            AttributeData::U16(_) => "u16",
            AttributeData::U32(_) => "u32",
            AttributeData::I8(_) => "i8",
            AttributeData::I16(_) => "i16",
            AttributeData::I32(_) => "i32",
        }
    }

    /// Only unsigned 16/32-bit arrays can be used as an index
    pub fn is_index_type(&self) -> bool {
        matches!(self, AttributeData::U16(_) | AttributeData::U32(_))
    }

    /// Element as f32 (integer types are converted without normalization)
    pub fn get(&self, i: usize) -> Option<f32> {
        match self {
            AttributeData::F32(v) => v.get(i).copied(),
            AttributeData::U8(v) => v.get(i).map(|&x| x as f32),
            AttributeData::U16(v) => v.get(i).map(|&x| x as f32),
            AttributeData::U32(v) => v.get(i).map(|&x| x as f32),
            AttributeData::I8(v) => v.get(i).map(|&x| x as f32),
            AttributeData::I16(v) => v.get(i).map(|&x| x as f32),
            AttributeData::I32(v) => v.get(i).map(|&x| x as f32),
        }
    }

    /// Element as u32, for index arrays
    pub fn get_index(&self, i: usize) -> Option<u32> {
        match self {
            AttributeData::U16(v) => v.get(i).map(|&x| x as u32),
            AttributeData::U32(v) => v.get(i).copied(),
            _ => None,
        }
    }

    /// Store an f32 into element `i` (integer types truncate)
    fn set(&mut self, i: usize, value: f32) -> bool {
        macro_rules! store {
            ($v:expr, $t:ty) => {
                match $v.get_mut(i) {
                    Some(slot) => { *slot = value as $t; true }
                    None => false,
                }
            };
        }
        match self {
            AttributeData::F32(v) => store!(v, f32),
            AttributeData::U8(v) => store!(v, u8),
            AttributeData::U16(v) => store!(v, u16),
            AttributeData::U32(v) => store!(v, u32),
            AttributeData::I8(v) => store!(v, i8),
            AttributeData::I16(v) => store!(v, i16),
            AttributeData::I32(v) => store!(v, i32),
        }
    }
}

// ============================================================================
// USAGE / UPDATE RANGES
// ============================================================================

/// Expected update frequency, forwarded to the backend as a buffer hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeUsage {
    #[default]
    Static,
    Dynamic,
    Stream,
}

/// Range of scalar elements to re-upload (not items)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateRange {
    pub start: usize,
    pub count: usize,
}

// ============================================================================
// BUFFER ATTRIBUTE
// ============================================================================

/// Typed attribute buffer with a content version
#[derive(Debug)]
pub struct BufferAttribute {
    id: u64,
    data: AttributeData,
    item_size: usize,
    normalized: bool,
    usage: AttributeUsage,
    version: u64,
    update_ranges: Vec<UpdateRange>,
}

impl Clone for BufferAttribute {
    /// A clone is a distinct attribute with its own identity
    fn clone(&self) -> Self {
        Self {
            id: next_attribute_id(),
            data: self.data.clone(),
            item_size: self.item_size,
            normalized: self.normalized,
            usage: self.usage,
            version: self.version,
            update_ranges: self.update_ranges.clone(),
        }
    }
}

impl BufferAttribute {
    /// Create an attribute of `data.len() / item_size` items
    ///
    /// # Errors
    ///
    /// `StructuralError` if `item_size` is zero or does not divide the
    /// element count.
    pub fn new(data: AttributeData, item_size: usize) -> Result<Self> {
        Self::check_layout(&data, item_size)?;
        Ok(Self {
            id: next_attribute_id(),
            data,
            item_size,
            normalized: false,
            usage: AttributeUsage::Static,
            version: 0,
            update_ranges: Vec::new(),
        })
    }

    fn check_layout(data: &AttributeData, item_size: usize) -> Result<()> {
        if item_size == 0 || data.len() % item_size != 0 {
            return Err(Error::StructuralError(format!(
                "{} elements cannot be split into items of size {}", data.len(), item_size
            )));
        }
        Ok(())
    }

    /// Float attribute (`positions`, `normals`, `uvs`, ...)
    pub fn from_f32(data: Vec<f32>, item_size: usize) -> Result<Self> {
        Self::new(AttributeData::F32(data), item_size)
    }

    /// 3-component float attribute from vectors
    pub fn from_vec3(values: &[Vec3]) -> Self {
        let data: Vec<f32> = values.iter().flat_map(|v| v.to_array()).collect();
        Self {
            id: next_attribute_id(),
            data: AttributeData::F32(data),
            item_size: 3,
            normalized: false,
            usage: AttributeUsage::Static,
            version: 0,
            update_ranges: Vec::new(),
        }
    }

    pub fn index_u16(indices: Vec<u16>) -> Self {
        Self {
            id: next_attribute_id(),
            data: AttributeData::U16(indices),
            item_size: 1,
            normalized: false,
            usage: AttributeUsage::Static,
            version: 0,
            update_ranges: Vec::new(),
        }
    }

    pub fn index_u32(indices: Vec<u32>) -> Self {
        Self {
            id: next_attribute_id(),
            data: AttributeData::U32(indices),
            item_size: 1,
            normalized: false,
            usage: AttributeUsage::Static,
            version: 0,
            update_ranges: Vec::new(),
        }
    }

    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    pub fn with_usage(mut self, usage: AttributeUsage) -> Self {
        self.usage = usage;
        self
    }

    // ===== ACCESSORS =====

    /// Process-unique identity of this attribute
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn data(&self) -> &AttributeData {
        &self.data
    }

    pub fn item_size(&self) -> usize {
        self.item_size
    }

    pub fn normalized(&self) -> bool {
        self.normalized
    }

    pub fn usage(&self) -> AttributeUsage {
        self.usage
    }

    /// Number of items (vertices for vertex attributes, indices for an index)
    pub fn count(&self) -> usize {
        self.data.len() / self.item_size
    }

    pub fn bytes_per_element(&self) -> usize {
        self.data.bytes_per_element()
    }

    pub fn byte_len(&self) -> usize {
        self.data.len() * self.data.bytes_per_element()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    // ===== VERSIONING =====

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Flag the content as changed; the next cache validation re-uploads it
    pub fn needs_update(&mut self) {
        self.version += 1;
    }

    /// Replace the whole content (bumps the version, drops pending ranges)
    ///
    /// # Errors
    ///
    /// `StructuralError` (attribute unchanged) if the new data does not fit
    /// the item size.
    pub fn set_data(&mut self, data: AttributeData) -> Result<()> {
        Self::check_layout(&data, self.item_size)?;
        self.data = data;
        self.update_ranges.clear();
        self.version += 1;
        Ok(())
    }

    /// Restrict the next re-upload to a range of scalar elements
    ///
    /// Ranges are honoured only if the byte size did not change since the
    /// previous upload; they are cleared once uploaded.
    pub fn add_update_range(&mut self, start: usize, count: usize) {
        self.update_ranges.push(UpdateRange { start, count });
    }

    pub fn update_ranges(&self) -> &[UpdateRange] {
        &self.update_ranges
    }

    pub fn clear_update_ranges(&mut self) {
        self.update_ranges.clear();
    }

    // ===== COMPONENT ACCESS =====

    /// Component `component` of item `index`
    pub fn get_component(&self, index: usize, component: usize) -> Option<f32> {
        if component >= self.item_size || index >= self.count() {
            return None;
        }
        self.data.get(index * self.item_size + component)
    }

    pub fn get_x(&self, index: usize) -> Option<f32> {
        self.get_component(index, 0)
    }

    pub fn get_y(&self, index: usize) -> Option<f32> {
        self.get_component(index, 1)
    }

    pub fn get_z(&self, index: usize) -> Option<f32> {
        self.get_component(index, 2)
    }

    /// Item as a Vec3 (missing components read as 0)
    pub fn get_vec3(&self, index: usize) -> Option<Vec3> {
        if index >= self.count() {
            return None;
        }
        Some(Vec3::new(
            self.get_component(index, 0).unwrap_or(0.0),
            self.get_component(index, 1).unwrap_or(0.0),
            self.get_component(index, 2).unwrap_or(0.0),
        ))
    }

    /// In-place component write. Does NOT bump the version.
    ///
    /// # Errors
    ///
    /// `ContractViolation` if the item or component is out of range.
    pub fn set_component(&mut self, index: usize, component: usize, value: f32) -> Result<()> {
        if component >= self.item_size || index >= self.count() {
            return Err(Error::ContractViolation(format!(
                "component {} of item {} is out of range ({} items of size {})",
                component, index, self.count(), self.item_size
            )));
        }
        self.data.set(index * self.item_size + component, value);
        Ok(())
    }

    pub fn set_x(&mut self, index: usize, value: f32) -> Result<()> {
        self.set_component(index, 0, value)
    }

    pub fn set_y(&mut self, index: usize, value: f32) -> Result<()> {
        self.set_component(index, 1, value)
    }

    pub fn set_z(&mut self, index: usize, value: f32) -> Result<()> {
        self.set_component(index, 2, value)
    }

    pub fn set_xyz(&mut self, index: usize, x: f32, y: f32, z: f32) -> Result<()> {
        if self.item_size < 3 {
            return Err(Error::ContractViolation(format!(
                "set_xyz on an attribute of item size {}", self.item_size
            )));
        }
        self.set_component(index, 0, x)?;
        self.set_component(index, 1, y)?;
        self.set_component(index, 2, z)
    }

    /// Iterate items as Vec3 (missing components read as 0)
    pub fn iter_vec3(&self) -> impl Iterator<Item = Vec3> + '_ {
        (0..self.count()).filter_map(move |i| self.get_vec3(i))
    }
}

#[cfg(test)]
#[path = "attribute_tests.rs"]
mod tests;
