//! Resource management module
//!
//! CPU-side geometry, material and texture data with the version counters
//! the render resource cache uses to decide when to re-upload.

use slotmap::new_key_type;

new_key_type! {
    /// Stable handle to a geometry in the `ResourceManager`
    pub struct GeometryKey;
    /// Stable handle to a material in the `ResourceManager`
    pub struct MaterialKey;
    /// Stable handle to a texture in the `ResourceManager`
    pub struct TextureKey;
}

pub mod attribute;
pub mod geometry;
pub mod material;
pub mod texture;
mod resource_manager;

pub use attribute::{AttributeData, AttributeUsage, BufferAttribute, UpdateRange};
pub use geometry::{Geometry, GeometryGroup, DrawRange, POSITION};
pub use material::{
    Material, MaterialFlags, ShaderSource, UniformValue,
    Blending, Side, RenderBucket,
};
pub use texture::{Texture, TextureFormat};
pub use resource_manager::{ResourceManager, ResourceEvent, EventSubscription};
