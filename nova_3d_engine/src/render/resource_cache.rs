/// GPU resource cache.
///
/// Maps CPU-side resources to backend objects and keeps them current:
///
/// - attribute buffers per (geometry, attribute name), index buffers per
///   geometry: uploaded on first use, re-uploaded only when the
///   attribute's version or identity changed, through its update ranges
///   when the byte size is unchanged, reallocated when it changed
/// - textures: same version rule
/// - programs: one compiled variant per program key, shared between
///   materials and reference counted; a material version change releases
///   the variants it used
///
/// Nothing is collected implicitly. GPU objects are released through
/// `process_events` or the explicit `release_*` calls, and freed when the
/// last `Arc` to them drops.

use std::collections::BTreeSet;
use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::{engine_debug, engine_warn};
use crate::graphics_device::{
    GraphicsDevice, Buffer, BufferDesc, BufferUsage, BufferUpdateHint,
    Texture as GpuTexture, TextureDesc, Program, ProgramDesc,
    VertexAttributeLayout, ComponentType, IndexType,
};
use crate::resource::{
    AttributeData, AttributeUsage, BufferAttribute, Geometry, GeometryKey,
    Material, MaterialKey, ResourceEvent, Texture, TextureKey,
};
use crate::scene::LightSummary;

// ============================================================================
// PROGRAM PARAMETERS
// ============================================================================

/// Per-draw inputs to program selection besides the material itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProgramParameters {
    pub lights: LightSummary,
    pub shadows: bool,
    pub instancing: bool,
    pub vertex_colors: bool,
}

impl ProgramParameters {
    /// Defines contributed by the frame and the object
    pub fn defines(&self) -> Vec<String> {
        let mut defines = vec![
            format!("NUM_AMBIENT_LIGHTS {}", self.lights.ambient),
            format!("NUM_DIR_LIGHTS {}", self.lights.directional),
            format!("NUM_POINT_LIGHTS {}", self.lights.point),
            format!("NUM_SPOT_LIGHTS {}", self.lights.spot),
            format!("NUM_HEMI_LIGHTS {}", self.lights.hemisphere),
        ];
        if self.shadows && self.lights.shadow_casters > 0 {
            defines.push("USE_SHADOWMAP".to_string());
        }
        if self.instancing {
            defines.push("USE_INSTANCING".to_string());
        }
        if self.vertex_colors {
            defines.push("USE_VERTEX_COLOR".to_string());
        }
        defines
    }
}

/// Program key: shader identity, material defines, lights, shadows and
/// per-object features
pub fn program_key(material: &Material, params: &ProgramParameters) -> String {
    let shader = material.shader();
    format!(
        "{}#{:016x}|{}|{}|sh{}|in{}|vc{}",
        shader.name,
        shader.source_hash(),
        material.program_defines().join(","),
        params.lights.key_fragment(),
        params.shadows as u8,
        params.instancing as u8,
        params.vertex_colors as u8,
    )
}

/// Compiled program plus the key it is cached under
#[derive(Clone)]
pub struct ProgramHandle {
    pub key: Arc<str>,
    pub program: Arc<dyn Program>,
}

// ============================================================================
// INSTRUMENTATION
// ============================================================================

/// Cumulative cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Buffers created (first upload or size change)
    pub buffers_allocated: u64,
    /// Whole-buffer uploads
    pub buffer_uploads: u64,
    /// Range uploads
    pub partial_uploads: u64,
    pub bytes_uploaded: u64,
    pub texture_uploads: u64,
    pub upload_failures: u64,
    pub programs_compiled: u64,
    pub programs_released: u64,
    pub compile_failures: u64,
}

impl CacheStats {
    /// Counter increase since an earlier snapshot
    pub fn since(&self, earlier: &CacheStats) -> CacheStats {
        CacheStats {
            buffers_allocated: self.buffers_allocated - earlier.buffers_allocated,
            buffer_uploads: self.buffer_uploads - earlier.buffer_uploads,
            partial_uploads: self.partial_uploads - earlier.partial_uploads,
            bytes_uploaded: self.bytes_uploaded - earlier.bytes_uploaded,
            texture_uploads: self.texture_uploads - earlier.texture_uploads,
            upload_failures: self.upload_failures - earlier.upload_failures,
            programs_compiled: self.programs_compiled - earlier.programs_compiled,
            programs_released: self.programs_released - earlier.programs_released,
            compile_failures: self.compile_failures - earlier.compile_failures,
        }
    }
}

/// Live GPU objects held by the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub buffers: usize,
    pub textures: usize,
    pub programs: usize,
    pub buffer_bytes: u64,
}

// ============================================================================
// ENTRIES
// ============================================================================

struct BufferEntry {
    buffer: Arc<dyn Buffer>,
    attribute_id: u64,
    version: u64,
    byte_len: usize,
}

struct VertexEntry {
    buffer: BufferEntry,
    layout: VertexAttributeLayout,
}

struct IndexEntry {
    buffer: BufferEntry,
    index_type: IndexType,
}

#[derive(Default)]
struct GeometryEntry {
    layout_version: Option<u64>,
    attributes: FxHashMap<String, VertexEntry>,
    index: Option<IndexEntry>,
}

struct TextureEntry {
    texture: Arc<dyn GpuTexture>,
    version: u64,
}

struct ProgramEntry {
    program: Arc<dyn Program>,
    ref_count: usize,
}

/// Program variants used by one material at one version
struct MaterialPrograms {
    version: u64,
    by_params: FxHashMap<ProgramParameters, Arc<str>>,
    /// Compilation failures, kept until the material version changes
    failed: FxHashMap<ProgramParameters, Error>,
}

// ============================================================================
// RESOURCE CACHE
// ============================================================================

/// Per-device GPU resource cache
#[derive(Default)]
pub struct ResourceCache {
    geometries: FxHashMap<GeometryKey, GeometryEntry>,
    textures: FxHashMap<TextureKey, TextureEntry>,
    failed_textures: FxHashMap<TextureKey, u64>,
    programs: FxHashMap<Arc<str>, ProgramEntry>,
    material_programs: FxHashMap<MaterialKey, MaterialPrograms>,
    stats: CacheStats,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== BUFFERS =====

    /// Buffer for a vertex attribute, uploading it if new or changed
    pub fn get_or_create_attribute(
        &mut self,
        device: &mut dyn GraphicsDevice,
        geometry: GeometryKey,
        name: &str,
        attribute: &mut BufferAttribute,
    ) -> Result<Arc<dyn Buffer>> {
        let entry = self.geometries.entry(geometry).or_default();
        let slot = entry.attributes.get_mut(name).map(|v| &mut v.buffer);
        let updated = sync_buffer(device, &mut self.stats, slot, attribute, BufferUsage::Vertex, name)?;
        if let Some(buffer) = updated {
            entry.attributes.insert(name.to_string(), VertexEntry {
                buffer,
                layout: vertex_layout(attribute),
            });
        }
        match entry.attributes.get_mut(name) {
            Some(vertex) => {
                vertex.layout = vertex_layout(attribute);
                Ok(Arc::clone(&vertex.buffer.buffer))
            }
            None => Err(Error::InvalidResource(format!("attribute '{}' has no buffer", name))),
        }
    }

    /// Buffer for a geometry index, uploading it if new or changed
    ///
    /// # Errors
    ///
    /// `StructuralError` for non-u16/u32 data, or the upload error.
    pub fn get_or_create_index(
        &mut self,
        device: &mut dyn GraphicsDevice,
        geometry: GeometryKey,
        index: &mut BufferAttribute,
    ) -> Result<Arc<dyn Buffer>> {
        let index_type = match index.data() {
            AttributeData::U16(_) => IndexType::U16,
            AttributeData::U32(_) => IndexType::U32,
            other => {
                return Err(Error::StructuralError(format!("{} index data", other.type_name())));
            }
        };
        let entry = self.geometries.entry(geometry).or_default();
        let slot = entry.index.as_mut().map(|i| &mut i.buffer);
        if let Some(buffer) = sync_buffer(device, &mut self.stats, slot, index, BufferUsage::Index, "index")? {
            entry.index = Some(IndexEntry { buffer, index_type });
        }
        match entry.index.as_mut() {
            Some(cached) => {
                cached.index_type = index_type;
                Ok(Arc::clone(&cached.buffer.buffer))
            }
            None => Err(Error::InvalidResource("index has no buffer".to_string())),
        }
    }

    /// Validate a geometry and make every attribute and its index current
    ///
    /// Entries of attributes removed since the last call are dropped.
    pub fn validate_geometry(
        &mut self,
        device: &mut dyn GraphicsDevice,
        key: GeometryKey,
        geometry: &mut Geometry,
    ) -> Result<()> {
        geometry.validate()?;

        let entry = self.geometries.entry(key).or_default();
        if entry.layout_version != Some(geometry.layout_version()) {
            entry.attributes.retain(|name, _| geometry.has_attribute(name));
            entry.layout_version = Some(geometry.layout_version());
        }

        for (name, attribute) in geometry.attributes_mut() {
            self.get_or_create_attribute(device, key, name, attribute)?;
        }
        match geometry.index_mut() {
            Some(index) => {
                self.get_or_create_index(device, key, index)?;
            }
            None => {
                if let Some(entry) = self.geometries.get_mut(&key) {
                    entry.index = None;
                }
            }
        }
        Ok(())
    }

    /// Cached buffer of an attribute (no upload)
    pub fn attribute_buffer(&self, geometry: GeometryKey, name: &str) -> Option<(&Arc<dyn Buffer>, VertexAttributeLayout)> {
        let vertex = self.geometries.get(&geometry)?.attributes.get(name)?;
        Some((&vertex.buffer.buffer, vertex.layout))
    }

    /// Cached index buffer (no upload)
    pub fn index_buffer(&self, geometry: GeometryKey) -> Option<(&Arc<dyn Buffer>, IndexType)> {
        let index = self.geometries.get(&geometry)?.index.as_ref()?;
        Some((&index.buffer.buffer, index.index_type))
    }

    // ===== TEXTURES =====

    /// GPU texture, uploaded if new or its version changed
    ///
    /// A failed upload is not retried until the texture version changes.
    pub fn get_or_create_texture(
        &mut self,
        device: &mut dyn GraphicsDevice,
        key: TextureKey,
        texture: &Texture,
    ) -> Result<Arc<dyn GpuTexture>> {
        if let Some(entry) = self.textures.get(&key) {
            if entry.version == texture.version() {
                return Ok(Arc::clone(&entry.texture));
            }
        }
        if self.failed_textures.get(&key) == Some(&texture.version()) {
            return Err(Error::InvalidResource(format!(
                "texture '{}' failed to upload at version {}", texture.name(), texture.version()
            )));
        }

        let reusable = self.textures.get(&key).and_then(|entry| {
            let info = entry.texture.info();
            (info.width == texture.width() && info.height == texture.height() && info.format == texture.format())
                .then(|| Arc::clone(&entry.texture))
        });
        let gpu = match reusable {
            Some(gpu) => gpu,
            None => device.create_texture(TextureDesc {
                name: texture.name().to_string(),
                width: texture.width(),
                height: texture.height(),
                format: texture.format(),
            })?,
        };

        if let Err(e) = gpu.update(texture.data()) {
            self.stats.upload_failures += 1;
            self.failed_textures.insert(key, texture.version());
            engine_warn!("nova3d::ResourceCache", "Texture '{}' upload failed: {}", texture.name(), e);
            return Err(e);
        }
        self.failed_textures.remove(&key);
        self.stats.texture_uploads += 1;
        self.textures.insert(key, TextureEntry { texture: Arc::clone(&gpu), version: texture.version() });
        Ok(gpu)
    }

    // ===== PROGRAMS =====

    /// Compiled program for a material under the given parameters
    ///
    /// # Errors
    ///
    /// `ShaderCompilationFailed` from the device; the failure is returned
    /// again without recompiling until the material version changes.
    pub fn get_or_create_program(
        &mut self,
        device: &mut dyn GraphicsDevice,
        material_key: MaterialKey,
        material: &Material,
        params: &ProgramParameters,
    ) -> Result<ProgramHandle> {
        let version = material.version();
        let set = self.material_programs.entry(material_key).or_insert_with(|| MaterialPrograms {
            version,
            by_params: FxHashMap::default(),
            failed: FxHashMap::default(),
        });

        // previous variants are released only after the new one is acquired,
        // so a key that survives the version change keeps its program
        let stale: Vec<Arc<str>> = if set.version != version {
            set.failed.clear();
            set.version = version;
            set.by_params.drain().map(|(_, key)| key).collect()
        } else {
            Vec::new()
        };

        let acquired = 'acquire: {
            if let Some(key) = set.by_params.get(params) {
                if let Some(entry) = self.programs.get(key) {
                    break 'acquire Ok(ProgramHandle { key: Arc::clone(key), program: Arc::clone(&entry.program) });
                }
            }
            if let Some(error) = set.failed.get(params) {
                break 'acquire Err(error.clone());
            }

            let key: Arc<str> = program_key(material, params).into();
            if let Some(entry) = self.programs.get_mut(&key) {
                entry.ref_count += 1;
                let program = Arc::clone(&entry.program);
                set.by_params.insert(*params, Arc::clone(&key));
                break 'acquire Ok(ProgramHandle { key, program });
            }

            let mut defines: BTreeSet<String> = material.program_defines().into_iter().collect();
            defines.extend(params.defines());
            let desc = ProgramDesc {
                name: key.to_string(),
                vertex_source: material.shader().vertex.clone(),
                fragment_source: material.shader().fragment.clone(),
                defines: defines.into_iter().collect(),
            };
            match device.create_program(desc) {
                Ok(program) => {
                    self.stats.programs_compiled += 1;
                    engine_debug!("nova3d::ResourceCache", "Compiled program '{}'", key);
                    self.programs.insert(Arc::clone(&key), ProgramEntry {
                        program: Arc::clone(&program),
                        ref_count: 1,
                    });
                    set.by_params.insert(*params, Arc::clone(&key));
                    Ok(ProgramHandle { key, program })
                }
                Err(e) => {
                    self.stats.compile_failures += 1;
                    engine_warn!("nova3d::ResourceCache",
                        "Program for material '{}' failed: {}", material.name(), e);
                    set.failed.insert(*params, e.clone());
                    Err(e)
                }
            }
        };

        for key in &stale {
            release_program(&mut self.programs, &mut self.stats, key);
        }
        acquired
    }

    /// References held on a program key (0 if not cached)
    pub fn program_ref_count(&self, key: &str) -> usize {
        self.programs.get(key).map_or(0, |e| e.ref_count)
    }

    // ===== RELEASE =====

    /// Apply disposal events from the resource manager
    pub fn process_events(&mut self, events: &[ResourceEvent]) {
        for event in events {
            match *event {
                ResourceEvent::GeometryDisposed(key) => self.release_geometry(key),
                ResourceEvent::MaterialDisposed(key) => self.release_material(key),
                ResourceEvent::TextureDisposed(key) => self.release_texture(key),
            }
        }
    }

    pub fn release_geometry(&mut self, key: GeometryKey) {
        self.geometries.remove(&key);
    }

    /// Drop the material's program references; unused programs are destroyed
    pub fn release_material(&mut self, key: MaterialKey) {
        if let Some(set) = self.material_programs.remove(&key) {
            for program_key in set.by_params.values() {
                release_program(&mut self.programs, &mut self.stats, program_key);
            }
        }
    }

    pub fn release_texture(&mut self, key: TextureKey) {
        self.textures.remove(&key);
        self.failed_textures.remove(&key);
    }

    // ===== INSTRUMENTATION =====

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn memory(&self) -> MemoryInfo {
        let mut info = MemoryInfo {
            textures: self.textures.len(),
            programs: self.programs.len(),
            ..Default::default()
        };
        for entry in self.geometries.values() {
            let buffers = entry.attributes.values().map(|v| &v.buffer)
                .chain(entry.index.as_ref().map(|i| &i.buffer));
            for buffer in buffers {
                info.buffers += 1;
                info.buffer_bytes += buffer.byte_len as u64;
            }
        }
        info
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Bring a cached buffer in line with its attribute
///
/// Returns a new entry when one had to be allocated, None when `slot` was
/// reused (or already current).
fn sync_buffer(
    device: &mut dyn GraphicsDevice,
    stats: &mut CacheStats,
    slot: Option<&mut BufferEntry>,
    attribute: &mut BufferAttribute,
    usage: BufferUsage,
    label: &str,
) -> Result<Option<BufferEntry>> {
    let byte_len = attribute.byte_len();

    if let Some(entry) = slot {
        if entry.attribute_id == attribute.id() && entry.version == attribute.version() {
            return Ok(None);
        }
        if entry.byte_len == byte_len {
            let bytes = attribute.as_bytes();
            let ranged = entry.attribute_id == attribute.id() && !attribute.update_ranges().is_empty();
            if ranged {
                let element = attribute.bytes_per_element();
                for range in attribute.update_ranges() {
                    let start = range.start.saturating_mul(element).min(byte_len);
                    let end = range.start.saturating_add(range.count).saturating_mul(element).min(byte_len);
                    if end > start {
                        entry.buffer.update(start as u64, &bytes[start..end])?;
                        stats.partial_uploads += 1;
                        stats.bytes_uploaded += (end - start) as u64;
                    }
                }
            } else {
                if byte_len > 0 {
                    entry.buffer.update(0, bytes)?;
                }
                stats.buffer_uploads += 1;
                stats.bytes_uploaded += byte_len as u64;
            }
            entry.attribute_id = attribute.id();
            entry.version = attribute.version();
            attribute.clear_update_ranges();
            return Ok(None);
        }
    }

    let buffer = device.create_buffer(BufferDesc {
        name: label.to_string(),
        size: byte_len as u64,
        usage,
        hint: match attribute.usage() {
            AttributeUsage::Static => BufferUpdateHint::Static,
            AttributeUsage::Dynamic => BufferUpdateHint::Dynamic,
            AttributeUsage::Stream => BufferUpdateHint::Stream,
        },
    })?;
    if byte_len > 0 {
        buffer.update(0, attribute.as_bytes())?;
    }
    stats.buffers_allocated += 1;
    stats.buffer_uploads += 1;
    stats.bytes_uploaded += byte_len as u64;
    attribute.clear_update_ranges();

    Ok(Some(BufferEntry {
        buffer,
        attribute_id: attribute.id(),
        version: attribute.version(),
        byte_len,
    }))
}

fn vertex_layout(attribute: &BufferAttribute) -> VertexAttributeLayout {
    let component_type = match attribute.data() {
        AttributeData::F32(_) => ComponentType::F32,
        AttributeData::U8(_) => ComponentType::U8,
        AttributeData::U16(_) => ComponentType::U16,
        AttributeData::U32(_) => ComponentType::U32,
        AttributeData::I8(_) => ComponentType::I8,
        AttributeData::I16(_) => ComponentType::I16,
        AttributeData::I32(_) => ComponentType::I32,
    };
    VertexAttributeLayout {
        component_type,
        components: attribute.item_size() as u32,
        normalized: attribute.normalized(),
    }
}

fn release_program(programs: &mut FxHashMap<Arc<str>, ProgramEntry>, stats: &mut CacheStats, key: &str) {
    let Some(entry) = programs.get_mut(key) else { return };
    entry.ref_count = entry.ref_count.saturating_sub(1);
    if entry.ref_count == 0 {
        programs.remove(key);
        stats.programs_released += 1;
        engine_debug!("nova3d::ResourceCache", "Released program '{}'", key);
    }
}

#[cfg(test)]
#[path = "resource_cache_tests.rs"]
mod tests;
