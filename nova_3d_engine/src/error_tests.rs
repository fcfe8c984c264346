//! Unit tests for error.rs
//!
//! Tests Error variants, their Display output and classification.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("device lost".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("device lost"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_structural_error_display() {
    let err = Error::StructuralError("cycle".to_string());
    assert_eq!(format!("{}", err), "Structural error: cycle");
}

#[test]
fn test_contract_violation_display() {
    let err = Error::ContractViolation("world matrix never computed".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("Contract violation"));
    assert!(display.contains("never computed"));
}

#[test]
fn test_degenerate_matrix_display() {
    assert_eq!(format!("{}", Error::DegenerateMatrix), "Degenerate matrix");
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[test]
fn test_resource_errors_are_classified() {
    assert!(Error::OutOfMemory.is_resource_error());
    assert!(Error::ShaderCompilationFailed("x".into()).is_resource_error());
    assert!(Error::InvalidResource("x".into()).is_resource_error());
    assert!(Error::BackendError("x".into()).is_resource_error());
}

#[test]
fn test_structural_and_contract_errors_are_not_resource_errors() {
    assert!(!Error::StructuralError("x".into()).is_resource_error());
    assert!(!Error::ContractViolation("x".into()).is_resource_error());
    assert!(!Error::InvalidHandle("x".into()).is_resource_error());
    assert!(!Error::DegenerateMatrix.is_resource_error());
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::InvalidHandle("node".to_string());
    assert_eq!(err.clone(), err);
}

#[test]
fn test_result_question_mark_propagation() {
    fn inner() -> Result<u32> {
        Err(Error::StructuralError("inner".to_string()))
    }
    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }
    assert!(matches!(outer(), Err(Error::StructuralError(_))));
}

#[test]
fn test_engine_err_macro_builds_backend_error() {
    let err = crate::engine_err!("nova3d::test", "value {} rejected", 7);
    assert_eq!(err, Error::BackendError("value 7 rejected".to_string()));
}
