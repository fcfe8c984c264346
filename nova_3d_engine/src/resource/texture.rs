/// Resource-level texture type.
///
/// Holds CPU-side texel data and a version counter. The GPU copy is created
/// and refreshed by the render resource cache.

use crate::error::{Error, Result};
use crate::engine_warn;
pub use crate::graphics_device::TextureFormat;

/// 2D texture with tightly packed rows
#[derive(Debug, Clone)]
pub struct Texture {
    name: String,
    width: u32,
    height: u32,
    format: TextureFormat,
    data: Vec<u8>,
    version: u64,
}

impl Texture {
    /// Create a texture from texel data
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the size is zero or the byte length does not
    /// match `width * height * bytes_per_pixel`.
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: Vec<u8>,
    ) -> Result<Self> {
        let name = name.into();
        if width == 0 || height == 0 {
            return Err(Error::InvalidResource(format!("texture '{}' has zero size", name)));
        }
        check_len(&name, width, height, format, data.len())?;
        Ok(Self { name, width, height, format, data, version: 0 })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the texels (same size and format); bumps the version
    pub fn set_data(&mut self, data: Vec<u8>) -> Result<()> {
        check_len(&self.name, self.width, self.height, self.format, data.len())?;
        self.data = data;
        self.version += 1;
        Ok(())
    }

    /// Mutable texel access; call `needs_update` afterwards
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn needs_update(&mut self) {
        self.version += 1;
    }
}

fn check_len(name: &str, width: u32, height: u32, format: TextureFormat, len: usize) -> Result<()> {
    let expected = width as usize * height as usize * format.bytes_per_pixel();
    if len != expected {
        engine_warn!("nova3d::Texture",
            "'{}': {} bytes given, {}x{} {:?} needs {}", name, len, width, height, format, expected);
        return Err(Error::InvalidResource(format!(
            "texture '{}' expects {} bytes, got {}", name, expected, len
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
