//! Error types for the Nova3D engine
//!
//! This module defines the error type used throughout the engine:
//! structural errors raised by the scene graph and geometry validation,
//! resource errors raised by the GPU backend, and programmer-contract
//! violations surfaced at the offending call.

use std::fmt;

/// Result type for Nova3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Nova3D engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (device, driver, command recording)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, program, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, device, subsystems)
    InitializationFailed(String),

    /// Unknown or stale arena handle (node, geometry, material, texture)
    InvalidHandle(String),

    /// Operation would break a structural invariant
    /// (cycle, duplicate child, malformed geometry)
    StructuralError(String),

    /// Shader program failed to compile or link
    ShaderCompilationFailed(String),

    /// Caller broke a documented usage contract
    /// (e.g. world matrix read before any update pass)
    ContractViolation(String),

    /// Matrix could not be inverted or decomposed
    DegenerateMatrix,
}

impl Error {
    /// Whether the error concerns a single GPU resource.
    ///
    /// Resource errors degrade one draw command; every other kind
    /// aborts the call that produced it.
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            Error::BackendError(_)
                | Error::OutOfMemory
                | Error::InvalidResource(_)
                | Error::ShaderCompilationFailed(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Error::StructuralError(msg) => write!(f, "Structural error: {}", msg),
            Error::ShaderCompilationFailed(msg) => write!(f, "Shader compilation failed: {}", msg),
            Error::ContractViolation(msg) => write!(f, "Contract violation: {}", msg),
            Error::DegenerateMatrix => write!(f, "Degenerate matrix"),
        }
    }
}

impl std::error::Error for Error {}

/// Log an error message and build an `Error::BackendError` from it
///
/// # Example
///
/// ```ignore
/// let buffer = buffers.get(0)
///     .ok_or_else(|| engine_err!("nova3d::Device", "Buffer {} missing", 0))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::nova3d::Error::BackendError(message)
    }};
}

/// Log an error message and return early with an `Error::BackendError`
///
/// # Example
///
/// ```ignore
/// if size == 0 {
///     engine_bail!("nova3d::Device", "Buffer size must be non-zero");
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
