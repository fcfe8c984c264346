/// Resource-level material type.
///
/// A Material is a pure data description of a surface: a shader source,
/// named uniforms (scalars, vectors, matrices, texture references), user
/// defines and fixed-function render state. No GPU resources are created
/// at this level.
///
/// Two counters track changes:
/// - `version`: anything that selects a different compiled program
///   (uniform type or texture presence, defines, shader, side,
///   transmission on/off, alpha test on/off, vertex colours)
/// - `uniforms_version`: any uniform write, including plain value changes
///
/// Pure pipeline state (blending, depth, colour write, transparency) is
/// applied at draw time and bumps neither.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::mem::discriminant;
use bitflags::bitflags;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use rustc_hash::{FxHashMap, FxHasher};
use crate::graphics_device::{
    BlendFactor, BlendState, CompareOp, CullMode, DepthState, UniformData,
};
use super::TextureKey;

// ===== SHADER SOURCE =====

/// Program family: vertex and fragment source sharing one name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderSource {
    pub name: String,
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSource {
    pub fn new(name: impl Into<String>, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self { name: name.into(), vertex: vertex.into(), fragment: fragment.into() }
    }

    /// Hash of both stages, part of the program key
    pub fn source_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.vertex.hash(&mut hasher);
        self.fragment.hash(&mut hasher);
        hasher.finish()
    }
}

// ===== UNIFORM VALUES =====

/// A typed uniform value for the material
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    UInt(u32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    /// Linear RGB
    Color(Vec3),
    Mat3(Mat3),
    Mat4(Mat4),
    /// Sampler; `None` leaves the slot unbound
    Texture(Option<TextureKey>),
}

impl UniformValue {
    /// Plain GPU value (textures are bound separately and yield `None`)
    pub fn to_uniform_data(&self) -> Option<UniformData> {
        Some(match *self {
            UniformValue::Float(v) => UniformData::Float(v),
            UniformValue::Int(v) => UniformData::Int(v),
            UniformValue::UInt(v) => UniformData::UInt(v),
            UniformValue::Vec2(v) => UniformData::Vec2(v),
            UniformValue::Vec3(v) | UniformValue::Color(v) => UniformData::Vec3(v),
            UniformValue::Vec4(v) => UniformData::Vec4(v),
            UniformValue::Mat3(v) => UniformData::Mat3(v),
            UniformValue::Mat4(v) => UniformData::Mat4(v),
            UniformValue::Texture(_) => return None,
        })
    }

    fn texture_present(&self) -> Option<bool> {
        match self {
            UniformValue::Texture(t) => Some(t.is_some()),
            _ => None,
        }
    }
}

// ===== RENDER STATE =====

bitflags! {
    /// Material render-state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        const TRANSPARENT   = 1 << 0;
        const VISIBLE       = 1 << 1;
        const DEPTH_TEST    = 1 << 2;
        const DEPTH_WRITE   = 1 << 3;
        const COLOR_WRITE   = 1 << 4;
        const VERTEX_COLORS = 1 << 5;
    }
}

impl Default for MaterialFlags {
    fn default() -> Self {
        MaterialFlags::VISIBLE | MaterialFlags::DEPTH_TEST
            | MaterialFlags::DEPTH_WRITE | MaterialFlags::COLOR_WRITE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Blending {
    None,
    #[default]
    Normal,
    Additive,
    Subtractive,
    Multiply,
}

/// Which faces are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Render list bucket, drawn in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderBucket {
    Opaque,
    Transmissive,
    Transparent,
}

// ===== MATERIAL =====

/// Material resource: visual description of a surface
#[derive(Debug, Clone)]
pub struct Material {
    name: String,
    shader: ShaderSource,
    uniforms: Vec<(String, UniformValue)>,
    uniform_names: FxHashMap<String, usize>,
    defines: BTreeMap<String, String>,
    flags: MaterialFlags,
    blending: Blending,
    depth_func: CompareOp,
    side: Side,
    transmission: f32,
    alpha_test: f32,
    version: u64,
    uniforms_version: u64,
}

impl Material {
    pub fn new(name: impl Into<String>, shader: ShaderSource) -> Self {
        Self {
            name: name.into(),
            shader,
            uniforms: Vec::new(),
            uniform_names: FxHashMap::default(),
            defines: BTreeMap::new(),
            flags: MaterialFlags::default(),
            blending: Blending::Normal,
            depth_func: CompareOp::LessEqual,
            side: Side::Front,
            transmission: 0.0,
            alpha_test: 0.0,
            version: 0,
            uniforms_version: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ===== VERSIONING =====

    /// Program-affecting change counter
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Uniform value change counter
    pub fn uniforms_version(&self) -> u64 {
        self.uniforms_version
    }

    /// Force program re-selection on next use
    pub fn needs_update(&mut self) {
        self.version += 1;
    }

    // ===== SHADER =====

    pub fn shader(&self) -> &ShaderSource {
        &self.shader
    }

    pub fn set_shader(&mut self, shader: ShaderSource) {
        if shader != self.shader {
            self.shader = shader;
            self.version += 1;
        }
    }

    // ===== UNIFORMS =====

    /// Set a uniform, inserting it if absent
    ///
    /// Bumps `version` when the uniform changes type, is a texture
    /// switching between bound and unbound, or is a new bound texture.
    pub fn set_uniform(&mut self, name: impl Into<String>, value: UniformValue) {
        let name = name.into();
        self.uniforms_version += 1;
        match self.uniform_names.get(&name) {
            Some(&idx) => {
                let slot = &mut self.uniforms[idx].1;
                if discriminant(slot) != discriminant(&value)
                    || slot.texture_present() != value.texture_present()
                {
                    self.version += 1;
                }
                *slot = value;
            }
            None => {
                self.uniform_names.insert(name.clone(), self.uniforms.len());
                if value.texture_present() == Some(true) {
                    self.version += 1;
                }
                self.uniforms.push((name, value));
            }
        }
    }

    pub fn remove_uniform(&mut self, name: &str) -> Option<UniformValue> {
        let idx = self.uniform_names.remove(name)?;
        let (_, value) = self.uniforms.remove(idx);
        for slot in self.uniform_names.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        if value.texture_present() == Some(true) {
            self.version += 1;
        }
        self.uniforms_version += 1;
        Some(value)
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        let idx = self.uniform_names.get(name)?;
        self.uniforms.get(*idx).map(|(_, v)| v)
    }

    /// Uniforms in insertion order
    pub fn uniforms(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.uniforms.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn uniform_count(&self) -> usize {
        self.uniforms.len()
    }

    /// Texture uniforms in insertion order (bound or not)
    pub fn textures(&self) -> impl Iterator<Item = (&str, Option<TextureKey>)> {
        self.uniforms.iter().filter_map(|(n, v)| match v {
            UniformValue::Texture(t) => Some((n.as_str(), *t)),
            _ => None,
        })
    }

    // ===== DEFINES =====

    /// Set a user define (`value` may be empty)
    pub fn set_define(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if self.defines.get(&name) != Some(&value) {
            self.defines.insert(name, value);
            self.version += 1;
        }
    }

    pub fn remove_define(&mut self, name: &str) -> bool {
        let removed = self.defines.remove(name).is_some();
        if removed {
            self.version += 1;
        }
        removed
    }

    pub fn defines(&self) -> &BTreeMap<String, String> {
        &self.defines
    }

    /// Every define the program variant depends on, sorted
    ///
    /// Derived defines: `USE_<UNIFORM>` for bound textures, `DOUBLE_SIDED`,
    /// `FLIP_SIDED`, `USE_TRANSMISSION`, `USE_ALPHATEST`, `USE_COLOR`.
    /// User defines render as `NAME` or `NAME VALUE`.
    pub fn program_defines(&self) -> Vec<String> {
        let mut out = BTreeSet::new();
        for (name, texture) in self.textures() {
            if texture.is_some() {
                out.insert(format!("USE_{}", name.to_uppercase()));
            }
        }
        match self.side {
            Side::Double => { out.insert("DOUBLE_SIDED".to_string()); }
            Side::Back => { out.insert("FLIP_SIDED".to_string()); }
            Side::Front => {}
        }
        if self.transmission > 0.0 {
            out.insert("USE_TRANSMISSION".to_string());
        }
        if self.alpha_test > 0.0 {
            out.insert("USE_ALPHATEST".to_string());
        }
        if self.flags.contains(MaterialFlags::VERTEX_COLORS) {
            out.insert("USE_COLOR".to_string());
        }
        for (name, value) in &self.defines {
            if value.is_empty() {
                out.insert(name.clone());
            } else {
                out.insert(format!("{} {}", name, value));
            }
        }
        out.into_iter().collect()
    }

    // ===== FLAGS =====

    pub fn flags(&self) -> MaterialFlags {
        self.flags
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(MaterialFlags::VISIBLE)
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.flags.set(MaterialFlags::VISIBLE, visible);
    }

    pub fn is_transparent(&self) -> bool {
        self.flags.contains(MaterialFlags::TRANSPARENT)
    }

    pub fn set_transparent(&mut self, transparent: bool) {
        self.flags.set(MaterialFlags::TRANSPARENT, transparent);
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        self.flags.set(MaterialFlags::DEPTH_TEST, enabled);
    }

    pub fn set_depth_write(&mut self, enabled: bool) {
        self.flags.set(MaterialFlags::DEPTH_WRITE, enabled);
    }

    pub fn set_color_write(&mut self, enabled: bool) {
        self.flags.set(MaterialFlags::COLOR_WRITE, enabled);
    }

    pub fn vertex_colors(&self) -> bool {
        self.flags.contains(MaterialFlags::VERTEX_COLORS)
    }

    pub fn set_vertex_colors(&mut self, enabled: bool) {
        if self.vertex_colors() != enabled {
            self.flags.set(MaterialFlags::VERTEX_COLORS, enabled);
            self.version += 1;
        }
    }

    // ===== PIPELINE STATE =====

    pub fn blending(&self) -> Blending {
        self.blending
    }

    pub fn set_blending(&mut self, blending: Blending) {
        self.blending = blending;
    }

    pub fn depth_func(&self) -> CompareOp {
        self.depth_func
    }

    pub fn set_depth_func(&mut self, depth_func: CompareOp) {
        self.depth_func = depth_func;
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn set_side(&mut self, side: Side) {
        if self.side != side {
            self.side = side;
            self.version += 1;
        }
    }

    pub fn transmission(&self) -> f32 {
        self.transmission
    }

    pub fn set_transmission(&mut self, transmission: f32) {
        if (self.transmission > 0.0) != (transmission > 0.0) {
            self.version += 1;
        }
        self.transmission = transmission;
    }

    pub fn alpha_test(&self) -> f32 {
        self.alpha_test
    }

    pub fn set_alpha_test(&mut self, alpha_test: f32) {
        if (self.alpha_test > 0.0) != (alpha_test > 0.0) {
            self.version += 1;
        }
        self.alpha_test = alpha_test;
    }

    /// Bucket the material is drawn in
    pub fn render_bucket(&self) -> RenderBucket {
        if self.transmission > 0.0 {
            RenderBucket::Transmissive
        } else if self.is_transparent() {
            RenderBucket::Transparent
        } else {
            RenderBucket::Opaque
        }
    }

    /// Blend state for drawing; opaque materials with normal blending draw
    /// without blending
    pub fn blend_state(&self) -> BlendState {
        let color_write = self.flags.contains(MaterialFlags::COLOR_WRITE);
        let state = match self.blending {
            Blending::None => BlendState::disabled(),
            Blending::Normal if !self.is_transparent() => BlendState::disabled(),
            Blending::Normal => BlendState::separate(
                BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha,
                BlendFactor::One, BlendFactor::OneMinusSrcAlpha,
            ),
            Blending::Additive => BlendState::separate(
                BlendFactor::SrcAlpha, BlendFactor::One,
                BlendFactor::SrcAlpha, BlendFactor::One,
            ),
            Blending::Subtractive => BlendState::separate(
                BlendFactor::Zero, BlendFactor::OneMinusSrcColor,
                BlendFactor::Zero, BlendFactor::One,
            ),
            Blending::Multiply => BlendState::separate(
                BlendFactor::Zero, BlendFactor::SrcColor,
                BlendFactor::Zero, BlendFactor::SrcAlpha,
            ),
        };
        state.with_color_write(color_write)
    }

    pub fn depth_state(&self) -> DepthState {
        DepthState {
            test: self.flags.contains(MaterialFlags::DEPTH_TEST),
            write: self.flags.contains(MaterialFlags::DEPTH_WRITE),
            compare: self.depth_func,
        }
    }

    /// Face culling implied by `side`
    pub fn cull_mode(&self) -> CullMode {
        match self.side {
            Side::Front => CullMode::Back,
            Side::Back => CullMode::Front,
            Side::Double => CullMode::None,
        }
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
