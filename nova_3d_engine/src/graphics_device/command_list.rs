/// CommandList trait - for recording rendering commands

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, Texture, Program,
    VertexAttributeLayout, IndexType,
    BlendState, DepthState, RasterState, Viewport, UniformData,
};

/// Command list for recording rendering commands
///
/// Commands are recorded and later submitted via `GraphicsDevice::submit()`.
/// State set on the list persists until it is set again.
pub trait CommandList: Send + Sync {
    /// Begin recording commands
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Bind a compiled program
    fn bind_program(&mut self, program: &Arc<dyn Program>) -> Result<()>;

    /// Bind a vertex buffer to the named program attribute
    ///
    /// # Arguments
    ///
    /// * `name` - Attribute name as declared by the program (e.g. "position")
    /// * `buffer` - Buffer to bind
    /// * `layout` - How the buffer content is interpreted
    fn bind_vertex_buffer(
        &mut self,
        name: &str,
        buffer: &Arc<dyn Buffer>,
        layout: VertexAttributeLayout,
    ) -> Result<()>;

    /// Bind an index buffer
    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, index_type: IndexType) -> Result<()>;

    /// Bind a texture to a sampler unit
    fn bind_texture(&mut self, unit: u32, texture: &Arc<dyn Texture>) -> Result<()>;

    /// Upload a uniform of the bound program
    fn set_uniform(&mut self, name: &str, value: &UniformData) -> Result<()>;

    fn set_blend_state(&mut self, state: BlendState) -> Result<()>;

    fn set_depth_state(&mut self, state: DepthState) -> Result<()>;

    fn set_raster_state(&mut self, state: RasterState) -> Result<()>;

    /// Draw vertices
    ///
    /// # Arguments
    ///
    /// * `vertex_count` - Number of vertices to draw
    /// * `first_vertex` - Index of first vertex
    /// * `instance_count` - Number of instances (1 for a plain draw)
    fn draw(&mut self, vertex_count: u32, first_vertex: u32, instance_count: u32) -> Result<()>;

    /// Draw indexed vertices
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `first_index` - Index of first index
    /// * `instance_count` - Number of instances (1 for a plain draw)
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, instance_count: u32) -> Result<()>;
}
