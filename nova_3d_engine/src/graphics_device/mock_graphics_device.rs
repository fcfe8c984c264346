/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// Every created resource, upload and recorded command is appended to a
/// shared `MockState` so tests can assert on the exact backend traffic.
/// Texture uploads and program compilation can be made to fail.

use std::sync::{Arc, Mutex};
use crate::error::{Error, Result};
use crate::graphics_device::{
    GraphicsDevice, Buffer, Texture, Program, CommandList, DeviceStats,
    BufferDesc, TextureDesc, TextureInfo, ProgramDesc,
    VertexAttributeLayout, IndexType,
    BlendState, DepthState, RasterState, Viewport, UniformData,
};
use crate::engine_bail;

// ============================================================================
// Shared state
// ============================================================================

/// Everything the mock backend has observed
#[derive(Debug, Default)]
pub struct MockState {
    /// Recorded commands, one entry per call (`"draw 3 0 1"`, ...)
    pub commands: Vec<String>,
    /// `(name, size)` of every created buffer
    pub created_buffers: Vec<(String, u64)>,
    pub created_textures: Vec<String>,
    /// Program descriptors in compilation order
    pub compiled_programs: Vec<ProgramDesc>,
    /// `(buffer name, offset, byte length)` of every buffer update
    pub buffer_updates: Vec<(String, u64, usize)>,
    pub texture_updates: Vec<String>,
    pub live_buffers: usize,
    pub live_textures: usize,
    pub live_programs: usize,
    pub submits: u64,
    /// Fail every texture upload
    pub fail_texture_upload: bool,
    /// Fail compilation of programs whose name contains this string
    pub fail_program_matching: Option<String>,
}

pub type SharedMockState = Arc<Mutex<MockState>>;

impl MockState {
    /// Commands recorded since the last `clear_commands`, matching a prefix
    pub fn commands_starting_with(&self, prefix: &str) -> Vec<String> {
        self.commands.iter().filter(|c| c.starts_with(prefix)).cloned().collect()
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub size: u64,
    pub name: String,
    state: SharedMockState,
}

impl MockBuffer {
    pub fn new(size: u64, name: String, state: SharedMockState) -> Self {
        state.lock().unwrap().live_buffers += 1;
        Self { size, name, state }
    }
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        if offset + data.len() as u64 > self.size {
            engine_bail!("nova3d::MockBuffer",
                "update of {} bytes at {} overflows '{}' ({} bytes)",
                data.len(), offset, self.name, self.size);
        }
        self.state.lock().unwrap().buffer_updates.push((self.name.clone(), offset, data.len()));
        Ok(())
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.live_buffers -= 1;
        }
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub info: TextureInfo,
    pub name: String,
    state: SharedMockState,
}

impl MockTexture {
    pub fn new(info: TextureInfo, name: String, state: SharedMockState) -> Self {
        state.lock().unwrap().live_textures += 1;
        Self { info, name, state }
    }
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn update(&self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_texture_upload {
            return Err(Error::InvalidResource(format!("upload of '{}' rejected", self.name)));
        }
        if data.len() != self.info.byte_len() {
            return Err(Error::InvalidResource(format!(
                "'{}' expects {} bytes, got {}", self.name, self.info.byte_len(), data.len()
            )));
        }
        state.texture_updates.push(self.name.clone());
        Ok(())
    }
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.live_textures -= 1;
        }
    }
}

// ============================================================================
// Mock Program
// ============================================================================

#[derive(Debug)]
pub struct MockProgram {
    pub name: String,
    state: SharedMockState,
}

impl MockProgram {
    pub fn new(name: String, state: SharedMockState) -> Self {
        state.lock().unwrap().live_programs += 1;
        Self { name, state }
    }
}

impl Program for MockProgram {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for MockProgram {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.live_programs -= 1;
        }
    }
}

// ============================================================================
// Mock CommandList
// ============================================================================

#[derive(Debug)]
pub struct MockCommandList {
    state: SharedMockState,
    recording: bool,
}

impl MockCommandList {
    pub fn new(state: SharedMockState) -> Self {
        Self { state, recording: false }
    }

    fn record(&mut self, command: String) -> Result<()> {
        if !self.recording {
            engine_bail!("nova3d::MockCommandList", "'{}' recorded outside begin/end", command);
        }
        self.state.lock().unwrap().commands.push(command);
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        self.recording = true;
        self.record("begin".to_string())
    }

    fn end(&mut self) -> Result<()> {
        self.record("end".to_string())?;
        self.recording = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(format!("set_viewport {} {}", viewport.width, viewport.height))
    }

    fn bind_program(&mut self, program: &Arc<dyn Program>) -> Result<()> {
        self.record(format!("bind_program {}", program.name()))
    }

    fn bind_vertex_buffer(
        &mut self,
        name: &str,
        buffer: &Arc<dyn Buffer>,
        layout: VertexAttributeLayout,
    ) -> Result<()> {
        self.record(format!("bind_vertex_buffer {} {} x{}", name, buffer.size(), layout.components))
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, index_type: IndexType) -> Result<()> {
        self.record(format!("bind_index_buffer {} {:?}", buffer.size(), index_type))
    }

    fn bind_texture(&mut self, unit: u32, texture: &Arc<dyn Texture>) -> Result<()> {
        self.record(format!("bind_texture {} {}x{}", unit, texture.info().width, texture.info().height))
    }

    fn set_uniform(&mut self, name: &str, _value: &UniformData) -> Result<()> {
        self.record(format!("set_uniform {}", name))
    }

    fn set_blend_state(&mut self, state: BlendState) -> Result<()> {
        self.record(format!("set_blend_state {}", state.enabled))
    }

    fn set_depth_state(&mut self, state: DepthState) -> Result<()> {
        self.record(format!("set_depth_state {} {}", state.test, state.write))
    }

    fn set_raster_state(&mut self, state: RasterState) -> Result<()> {
        self.record(format!("set_raster_state {:?} {:?}", state.cull_mode, state.front_face))
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32, instance_count: u32) -> Result<()> {
        self.record(format!("draw {} {} {}", vertex_count, first_vertex, instance_count))
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, instance_count: u32) -> Result<()> {
        self.record(format!("draw_indexed {} {} {}", index_count, first_index, instance_count))
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Mock GraphicsDevice that tracks created resources without GPU
#[derive(Debug)]
pub struct MockGraphicsDevice {
    state: SharedMockState,
    stats: DeviceStats,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            stats: DeviceStats::default(),
        }
    }

    /// Handle on the shared state, valid after the device moves into a renderer
    pub fn state(&self) -> SharedMockState {
        Arc::clone(&self.state)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        self.stats.buffers_created += 1;
        self.state.lock().unwrap().created_buffers.push((desc.name.clone(), desc.size));
        Ok(Arc::new(MockBuffer::new(desc.size, desc.name, Arc::clone(&self.state))))
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        self.stats.textures_created += 1;
        self.state.lock().unwrap().created_textures.push(desc.name.clone());
        let info = TextureInfo { width: desc.width, height: desc.height, format: desc.format };
        Ok(Arc::new(MockTexture::new(info, desc.name, Arc::clone(&self.state))))
    }

    fn create_program(&mut self, desc: ProgramDesc) -> Result<Arc<dyn Program>> {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(pattern) = &state.fail_program_matching {
                if desc.name.contains(pattern.as_str()) {
                    return Err(Error::ShaderCompilationFailed(format!("'{}': mock failure", desc.name)));
                }
            }
            state.compiled_programs.push(desc.clone());
        }
        self.stats.programs_created += 1;
        Ok(Arc::new(MockProgram::new(desc.name, Arc::clone(&self.state))))
    }

    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(MockCommandList::new(Arc::clone(&self.state))))
    }

    fn submit(&mut self, _commands: &dyn CommandList) -> Result<()> {
        self.stats.submits += 1;
        self.state.lock().unwrap().submits += 1;
        Ok(())
    }

    fn default_viewport(&self) -> Viewport {
        Viewport::new(800.0, 600.0)
    }

    fn stats(&self) -> DeviceStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
