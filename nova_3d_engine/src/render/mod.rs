/// Rendering: GPU resource cache, render list construction, draw dispatch
/// and the per-frame driver.

pub mod config;
pub mod render_list;
pub mod culler;
pub mod render_list_builder;
pub mod resource_cache;
pub mod dispatcher;
pub mod renderer;

pub use config::{CullPolicy, RenderConfig};
pub use render_list::{DrawCommand, RenderList};
pub use culler::{CameraCuller, FrustumCuller, NoCuller, WorldBounds};
pub use render_list_builder::{RenderListBuilder, BuildStats, COLOR_ATTRIBUTE};
pub use resource_cache::{
    ResourceCache, CacheStats, MemoryInfo, ProgramParameters, ProgramHandle, program_key,
};
pub use dispatcher::{Dispatcher, DispatchContext, DispatchStats};
pub use renderer::{Renderer, FrameInfo};
