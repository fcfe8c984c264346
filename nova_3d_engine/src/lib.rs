/*!
# Nova 3D Engine

Retained-mode scene graph with a version-driven GPU resource cache.

Callers build a tree of transformable nodes that reference shared geometry,
material and texture data. Every frame the engine propagates transforms,
builds a sorted render list and dispatches the minimal sequence of state
changes and draw calls to a backend implementing the `GraphicsDevice` trait.

## Architecture

- **math**: Euler angles, compose/decompose, bounding volumes, frustum
- **scene**: Node arena, hierarchy operations, transform propagation, cameras, lights
- **resource**: CPU-side geometry, material and texture registry with version counters
- **graphics_device**: Abstract backend contract (buffers, textures, programs, command lists)
- **render**: Resource cache, render list builder, dispatcher and frame driver

Backend implementations provide concrete types that implement the
`graphics_device` traits.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod math;
pub mod scene;
pub mod resource;
pub mod graphics_device;
pub mod render;

// Main nova3d namespace module
pub mod nova3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine facade (logging)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, macros are exported at crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, format_entry};
    }

    // Math sub-module
    pub mod math {
        pub use crate::math::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Backend contract sub-module
    pub mod graphics_device {
        pub use crate::graphics_device::*;
    }

    // Render sub-module
    pub mod render {
        pub use crate::render::*;
    }
}

// Re-export math library at crate root
pub use glam;
