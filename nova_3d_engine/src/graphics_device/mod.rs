/// Graphics device module - backend contract consumed by the renderer
///
/// Concrete GPU backends implement these traits. The engine core never
/// talks to a GPU API directly.

pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod program;
pub mod command_list;
pub mod pipeline_state;

pub use graphics_device::*;
pub use buffer::*;
pub use texture::*;
pub use program::*;
pub use command_list::*;
pub use pipeline_state::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
