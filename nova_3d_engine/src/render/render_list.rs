/// Per-frame render list.
///
/// Draw commands are bucketed (opaque, transmissive, transparent) and
/// sorted with packed `u128` keys:
///
/// ```text
/// 127          96 95          64 63          32 31           0
/// | render order | depth        | sequence     | slot         |
/// ```
///
/// Render order is biased to unsigned, depth is an order-preserving f32
/// encoding (inverted for back-to-front buckets), and the sequence makes
/// every key unique so the result is deterministic.

use glam::Mat4;
use rdst::RadixSort;
use crate::resource::{GeometryGroup, GeometryKey, MaterialKey, RenderBucket};
use crate::scene::NodeKey;

/// One (node, geometry, material, group) draw for this frame
#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub node: NodeKey,
    pub geometry: GeometryKey,
    pub material: MaterialKey,
    /// Group of a multi-material renderable
    pub group: Option<GeometryGroup>,
    pub world_matrix: Mat4,
    /// View-space depth (positive in front of the camera)
    pub z: f32,
    pub render_order: i32,
    /// Traversal order within the frame
    pub sequence: u32,
    pub instance_count: Option<u32>,
    /// Geometry carries a colour attribute the material wants to use
    pub vertex_colors: bool,
}

/// Bucketed draw commands, rebuilt every frame
#[derive(Debug, Default)]
pub struct RenderList {
    opaque: Vec<DrawCommand>,
    transmissive: Vec<DrawCommand>,
    transparent: Vec<DrawCommand>,
    keys: Vec<u128>,
    scratch: Vec<DrawCommand>,
}

impl RenderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty all buckets, keeping capacity
    pub fn clear(&mut self) {
        self.opaque.clear();
        self.transmissive.clear();
        self.transparent.clear();
    }

    pub fn push(&mut self, bucket: RenderBucket, command: DrawCommand) {
        self.bucket_vec(bucket).push(command);
    }

    fn bucket_vec(&mut self, bucket: RenderBucket) -> &mut Vec<DrawCommand> {
        match bucket {
            RenderBucket::Opaque => &mut self.opaque,
            RenderBucket::Transmissive => &mut self.transmissive,
            RenderBucket::Transparent => &mut self.transparent,
        }
    }

    pub fn bucket(&self, bucket: RenderBucket) -> &[DrawCommand] {
        match bucket {
            RenderBucket::Opaque => &self.opaque,
            RenderBucket::Transmissive => &self.transmissive,
            RenderBucket::Transparent => &self.transparent,
        }
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.transmissive.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Commands in dispatch order: opaque, transmissive, transparent
    pub fn iter(&self) -> impl Iterator<Item = &DrawCommand> {
        self.opaque.iter().chain(self.transmissive.iter()).chain(self.transparent.iter())
    }

    /// Sort every bucket
    ///
    /// Opaque front-to-back, transmissive and transparent back-to-front,
    /// render order first in all buckets. A no-op when `enabled` is false.
    pub fn sort(&mut self, enabled: bool) {
        if !enabled {
            return;
        }
        for bucket in [RenderBucket::Opaque, RenderBucket::Transmissive, RenderBucket::Transparent] {
            self.sort_bucket(bucket);
        }
    }

    fn sort_bucket(&mut self, bucket: RenderBucket) {
        let back_to_front = bucket != RenderBucket::Opaque;
        let mut keys = std::mem::take(&mut self.keys);
        let mut scratch = std::mem::take(&mut self.scratch);
        let commands = self.bucket_vec(bucket);

        if commands.len() > 1 {
            keys.clear();
            keys.extend(commands.iter().enumerate().map(|(slot, c)| sort_key(c, slot as u32, back_to_front)));
            keys.radix_sort_unstable();

            scratch.clear();
            scratch.extend(keys.iter().map(|&k| commands[(k as u32) as usize].clone()));
            std::mem::swap(commands, &mut scratch);
        }

        self.keys = keys;
        self.scratch = scratch;
    }
}

/// Order-preserving bit pattern of an f32 (NaN sorts last)
fn orderable_f32(value: f32) -> u32 {
    let value = if value.is_nan() { f32::INFINITY } else { value };
    let bits = value.to_bits();
    if bits & 0x8000_0000 != 0 { !bits } else { bits | 0x8000_0000 }
}

fn sort_key(command: &DrawCommand, slot: u32, back_to_front: bool) -> u128 {
    let order = (command.render_order as i64 - i32::MIN as i64) as u32;
    let depth = orderable_f32(command.z);
    let depth = if back_to_front { !depth } else { depth };
    (order as u128) << 96 | (depth as u128) << 64 | (command.sequence as u128) << 32 | slot as u128
}

#[cfg(test)]
#[path = "render_list_tests.rs"]
mod tests;
