/// Texture trait and texture descriptor

use crate::error::Result;

/// Texel formats understood by every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8,
    Rg8,
    Rgba8,
    Rgba16F,
    Rgba32F,
}

impl TextureFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rg8 => 2,
            TextureFormat::Rgba8 => 4,
            TextureFormat::Rgba16F => 8,
            TextureFormat::Rgba32F => 16,
        }
    }
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Texture properties reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureInfo {
    /// Byte length of a full upload
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Texture resource trait
///
/// Implemented by backend-specific texture types.
/// The texture is destroyed when its last reference is dropped.
pub trait Texture: Send + Sync {
    /// Get texture properties
    fn info(&self) -> &TextureInfo;

    /// Replace the full texel content
    ///
    /// # Errors
    ///
    /// Backend failure or a byte length that does not match `info()`.
    fn update(&self, data: &[u8]) -> Result<()>;
}
