/// Program trait and program descriptor

/// Descriptor for compiling a shader program variant
#[derive(Debug, Clone)]
pub struct ProgramDesc {
    /// Program key the variant was derived from
    pub name: String,
    pub vertex_source: String,
    pub fragment_source: String,
    /// Preprocessor defines, `NAME` or `NAME VALUE`, in deterministic order
    pub defines: Vec<String>,
}

/// Compiled program trait
///
/// The program is destroyed when its last reference is dropped.
pub trait Program: Send + Sync {
    fn name(&self) -> &str;
}
