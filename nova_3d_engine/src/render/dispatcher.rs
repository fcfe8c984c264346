/// Draw command dispatch.
///
/// Turns the sorted render list into backend calls. A shadow copy of the
/// pipeline state (program, buffers, textures, blend/depth/raster state,
/// last material uniforms) suppresses redundant calls. It is reset at the
/// start of every frame.
///
/// Each command goes through a fixed sequence:
/// 1. program
/// 2. vertex and index buffers (uploaded through the cache)
/// 3. uniforms: engine matrices every draw, material uniforms only when
///    the program, material or uniform version changed
/// 4. blend, depth and raster state
/// 5. draw
///
/// A failing step abandons that command only.

use std::sync::Arc;
use glam::Mat3;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::engine_warn;
use crate::graphics_device::{
    GraphicsDevice, CommandList, Buffer, Texture,
    BlendState, DepthState, RasterState, FrontFace, UniformData,
};
use crate::math;
use crate::resource::{MaterialKey, ResourceManager, UniformValue};
use crate::scene::{CameraView, LightSummary};
use super::config::RenderConfig;
use super::render_list::{DrawCommand, RenderList};
use super::resource_cache::{ProgramParameters, ResourceCache};

/// Everything a dispatch borrows for one frame
pub struct DispatchContext<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub cache: &'a mut ResourceCache,
    pub resources: &'a mut ResourceManager,
    pub view: &'a CameraView,
    pub lights: &'a LightSummary,
    pub config: &'a RenderConfig,
}

/// Counters of the last dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub draw_calls: u32,
    /// Commands abandoned because a step failed
    pub skipped: u32,
    /// Commands whose clipped range was empty
    pub empty: u32,
    pub program_binds: u32,
    pub buffer_binds: u32,
    pub texture_binds: u32,
    pub state_changes: u32,
    pub uniform_uploads: u32,
}

#[derive(Default)]
struct ShadowState {
    program: Option<Arc<str>>,
    /// (material, version, uniforms_version) of the last material upload
    material: Option<(MaterialKey, u64, u64)>,
    vertex_buffers: FxHashMap<String, Arc<dyn Buffer>>,
    index_buffer: Option<Arc<dyn Buffer>>,
    textures: FxHashMap<u32, Arc<dyn Texture>>,
    blend: Option<BlendState>,
    depth: Option<DepthState>,
    raster: Option<RasterState>,
}

/// Records draw commands with minimal state changes
#[derive(Default)]
pub struct Dispatcher {
    state: ShadowState,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all tracked state (the command list starts from scratch)
    pub fn begin_frame(&mut self) {
        self.state = ShadowState::default();
        self.stats = DispatchStats::default();
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Record every command of the list
    pub fn dispatch(
        &mut self,
        list: &RenderList,
        ctx: &mut DispatchContext<'_>,
        cmd: &mut dyn CommandList,
    ) -> DispatchStats {
        for command in list.iter() {
            match self.dispatch_command(command, ctx, cmd) {
                Ok(true) => self.stats.draw_calls += 1,
                Ok(false) => self.stats.empty += 1,
                Err(e) => {
                    engine_warn!("nova3d::Dispatcher",
                        "Draw of node {:?} skipped: {}", command.node, e);
                    self.stats.skipped += 1;
                }
            }
        }
        // release GPU objects held for comparison
        self.state = ShadowState::default();
        self.stats
    }

    /// Record one command; Ok(false) if there was nothing to draw
    fn dispatch_command(
        &mut self,
        command: &DrawCommand,
        ctx: &mut DispatchContext<'_>,
        cmd: &mut dyn CommandList,
    ) -> Result<bool> {
        // ===== 1. PROGRAM =====
        let material = ctx.resources.material(command.material).ok_or_else(|| {
            Error::ContractViolation(format!("material {:?} was disposed", command.material))
        })?;
        let params = ProgramParameters {
            lights: *ctx.lights,
            shadows: ctx.config.shadows_enabled,
            instancing: command.instance_count.is_some(),
            vertex_colors: command.vertex_colors,
        };
        let program = ctx.cache.get_or_create_program(&mut *ctx.device, command.material, material, &params)?;
        if self.state.program.as_deref() != Some(&*program.key) {
            cmd.bind_program(&program.program)?;
            self.state.program = Some(program.key);
            self.state.material = None;
            self.stats.program_binds += 1;
        }

        // ===== 2. BUFFERS =====
        let geometry = ctx.resources.geometry_mut(command.geometry).ok_or_else(|| {
            Error::ContractViolation(format!("geometry {:?} was disposed", command.geometry))
        })?;
        ctx.cache.validate_geometry(&mut *ctx.device, command.geometry, geometry)?;

        let total = match geometry.index() {
            Some(index) => index.count(),
            None => geometry.vertex_count(),
        };
        let total = u32::try_from(total).unwrap_or(u32::MAX);
        let range = geometry.draw_range();
        let mut start = range.start;
        let mut end = range.end().min(total);
        if let Some(group) = command.group {
            start = start.max(group.start);
            end = end.min(group.end());
        }
        let instances = command.instance_count.unwrap_or(1);
        if end <= start || instances == 0 {
            return Ok(false);
        }

        for (name, _) in geometry.attributes() {
            let (buffer, layout) = ctx.cache.attribute_buffer(command.geometry, name).ok_or_else(|| {
                Error::InvalidResource(format!("attribute '{}' was not uploaded", name))
            })?;
            let bound = self.state.vertex_buffers.get(name).is_some_and(|b| Arc::ptr_eq(b, buffer));
            if !bound {
                cmd.bind_vertex_buffer(name, buffer, layout)?;
                self.state.vertex_buffers.insert(name.to_string(), Arc::clone(buffer));
                self.stats.buffer_binds += 1;
            }
        }
        let indexed = geometry.index().is_some();
        if indexed {
            let (buffer, index_type) = ctx.cache.index_buffer(command.geometry).ok_or_else(|| {
                Error::InvalidResource("index was not uploaded".to_string())
            })?;
            let bound = self.state.index_buffer.as_ref().is_some_and(|b| Arc::ptr_eq(b, buffer));
            if !bound {
                cmd.bind_index_buffer(buffer, index_type)?;
                self.state.index_buffer = Some(Arc::clone(buffer));
                self.stats.buffer_binds += 1;
            }
        }

        // ===== 3. UNIFORMS =====
        let view = ctx.view;
        let model_view = view.view_matrix * command.world_matrix;
        // collapsed transforms have no normal matrix, shading falls back to identity
        let normal = match math::normal_matrix(&model_view) {
            Ok(normal) => normal,
            Err(e) => {
                engine_warn!("nova3d::Dispatcher",
                    "Normal matrix for draw {} unavailable ({}), using identity", command.sequence, e);
                Mat3::IDENTITY
            }
        };
        let engine_uniforms = [
            ("modelMatrix", UniformData::Mat4(command.world_matrix)),
            ("viewMatrix", UniformData::Mat4(view.view_matrix)),
            ("projectionMatrix", UniformData::Mat4(view.projection_matrix)),
            ("modelViewMatrix", UniformData::Mat4(model_view)),
            ("normalMatrix", UniformData::Mat3(normal)),
            ("cameraPosition", UniformData::Vec3(view.position)),
        ];
        for (name, value) in &engine_uniforms {
            cmd.set_uniform(name, value)?;
            self.stats.uniform_uploads += 1;
        }

        let material = ctx.resources.material(command.material).ok_or_else(|| {
            Error::ContractViolation(format!("material {:?} was disposed", command.material))
        })?;
        let material_state = (command.material, material.version(), material.uniforms_version());
        let refresh = self.state.material != Some(material_state);
        let mut unit = 0u32;
        for (name, value) in material.uniforms() {
            match value {
                UniformValue::Texture(Some(key)) => {
                    let texture = ctx.resources.texture(*key).ok_or_else(|| {
                        Error::ContractViolation(format!("texture '{}' was disposed", name))
                    })?;
                    let gpu = ctx.cache.get_or_create_texture(&mut *ctx.device, *key, texture)?;
                    let bound = self.state.textures.get(&unit).is_some_and(|t| Arc::ptr_eq(t, &gpu));
                    if !bound {
                        cmd.bind_texture(unit, &gpu)?;
                        self.state.textures.insert(unit, gpu);
                        self.stats.texture_binds += 1;
                    }
                    if refresh {
                        cmd.set_uniform(name, &UniformData::Int(unit as i32))?;
                        self.stats.uniform_uploads += 1;
                    }
                    unit += 1;
                }
                UniformValue::Texture(None) => {}
                other => {
                    if refresh {
                        if let Some(data) = other.to_uniform_data() {
                            cmd.set_uniform(name, &data)?;
                            self.stats.uniform_uploads += 1;
                        }
                    }
                }
            }
        }
        if refresh {
            self.state.material = Some(material_state);
        }

        // ===== 4. PIPELINE STATE =====
        let blend = material.blend_state();
        if self.state.blend != Some(blend) {
            cmd.set_blend_state(blend)?;
            self.state.blend = Some(blend);
            self.stats.state_changes += 1;
        }
        let depth = material.depth_state();
        if self.state.depth != Some(depth) {
            cmd.set_depth_state(depth)?;
            self.state.depth = Some(depth);
            self.stats.state_changes += 1;
        }
        let front_face = if command.world_matrix.determinant() < 0.0 {
            FrontFace::Clockwise
        } else {
            FrontFace::CounterClockwise
        };
        let raster = RasterState { cull_mode: material.cull_mode(), front_face };
        if self.state.raster != Some(raster) {
            cmd.set_raster_state(raster)?;
            self.state.raster = Some(raster);
            self.stats.state_changes += 1;
        }

        // ===== 5. DRAW =====
        let count = end - start;
        if indexed {
            cmd.draw_indexed(count, start, instances)?;
        } else {
            cmd.draw(count, start, instances)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
