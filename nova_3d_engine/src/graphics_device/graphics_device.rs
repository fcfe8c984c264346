/// GraphicsDevice trait - resource factory and submission interface

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, Texture, TextureDesc, Program, ProgramDesc,
    CommandList, Viewport,
};

/// Backend statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Buffers created since device creation
    pub buffers_created: u64,
    /// Textures created since device creation
    pub textures_created: u64,
    /// Programs compiled since device creation
    pub programs_created: u64,
    /// Command lists submitted
    pub submits: u64,
}

/// Main backend trait
///
/// This is the central factory interface for creating GPU resources.
/// Implemented by backend-specific devices.
pub trait GraphicsDevice: Send + Sync {
    /// Create a buffer of `desc.size` bytes (content undefined until updated)
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a texture (content undefined until updated)
    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Compile a program variant
    ///
    /// # Errors
    ///
    /// `ShaderCompilationFailed` with the backend's diagnostics.
    fn create_program(&mut self, desc: ProgramDesc) -> Result<Arc<dyn Program>>;

    /// Create an empty command list
    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>>;

    /// Submit a recorded command list for execution
    fn submit(&mut self, commands: &dyn CommandList) -> Result<()>;

    /// Viewport covering the current default target
    fn default_viewport(&self) -> Viewport;

    fn stats(&self) -> DeviceStats;
}
