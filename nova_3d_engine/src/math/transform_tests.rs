use glam::{Mat3, Mat4, Quat, Vec3};
use crate::error::Error;
use super::*;

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}

// ============================================================================
// compose / decompose
// ============================================================================

#[test]
fn test_compose_translation_only() {
    let m = compose(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::ONE);
    assert!(approx_vec(m.transform_point3(Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn test_compose_applies_scale_before_rotation() {
    let m = compose(
        Vec3::ZERO,
        Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        Vec3::new(2.0, 1.0, 1.0),
    );
    // Scale X by 2, then rotate X onto Y
    assert!(approx_vec(m.transform_point3(Vec3::X), Vec3::new(0.0, 2.0, 0.0)));
}

#[test]
fn test_compose_decompose_round_trip() {
    let position = Vec3::new(-3.0, 0.5, 12.0);
    let rotation = Quat::from_euler(glam::EulerRot::XYZ, 0.3, 1.2, -0.7);
    let scale = Vec3::new(0.5, 2.0, 3.5);

    let (p, r, s) = decompose(&compose(position, rotation, scale)).unwrap();

    assert!(approx_vec(p, position));
    assert!(approx_vec(s, scale));
    assert!(r.dot(rotation).abs() > 1.0 - 1e-5);
}

#[test]
fn test_decompose_negative_determinant_flips_x() {
    let m = compose(Vec3::ZERO, Quat::IDENTITY, Vec3::new(-2.0, 1.0, 1.0));
    let (_, rotation, scale) = decompose(&m).unwrap();
    assert!((scale.x + 2.0).abs() < 1e-5);
    assert!(rotation.dot(Quat::IDENTITY).abs() > 1.0 - 1e-5);

    // Recomposing must give the same matrix back
    let back = compose(Vec3::ZERO, rotation, scale);
    assert!(back.abs_diff_eq(m, 1e-5));
}

#[test]
fn test_decompose_zero_scale_is_degenerate() {
    let m = compose(Vec3::ONE, Quat::IDENTITY, Vec3::new(1.0, 0.0, 1.0));
    assert_eq!(decompose(&m), Err(Error::DegenerateMatrix));
}

// ============================================================================
// try_inverse / normal_matrix
// ============================================================================

#[test]
fn test_try_inverse_regular_matrix() {
    let m = compose(Vec3::new(4.0, -1.0, 2.0), Quat::from_rotation_y(0.8), Vec3::splat(2.0));
    let inv = try_inverse(&m).unwrap();
    assert!((m * inv).abs_diff_eq(Mat4::IDENTITY, 1e-5));
}

#[test]
fn test_try_inverse_singular_matrix_fails() {
    let m = Mat4::from_scale(Vec3::new(1.0, 1.0, 0.0));
    assert_eq!(try_inverse(&m), Err(Error::DegenerateMatrix));
    assert_eq!(try_inverse(&Mat4::ZERO), Err(Error::DegenerateMatrix));
}

#[test]
fn test_normal_matrix_of_uniform_scale_is_scaled_rotation() {
    let m = compose(Vec3::new(9.0, 9.0, 9.0), Quat::IDENTITY, Vec3::splat(2.0));
    let n = normal_matrix(&m).unwrap();
    assert!(n.abs_diff_eq(Mat3::from_diagonal(Vec3::splat(0.5)), 1e-6));
}

#[test]
fn test_normal_matrix_keeps_normals_perpendicular() {
    let m = compose(Vec3::ZERO, Quat::IDENTITY, Vec3::new(4.0, 1.0, 1.0));
    // Surface x = y, normal (1, -1, 0), tangent (1, 1, 0)
    let tangent = m.transform_vector3(Vec3::new(1.0, 1.0, 0.0));
    let normal = normal_matrix(&m).unwrap() * Vec3::new(1.0, -1.0, 0.0);
    assert!(tangent.dot(normal).abs() < 1e-5);
}

#[test]
fn test_normal_matrix_singular_fails() {
    let m = Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0));
    assert_eq!(normal_matrix(&m), Err(Error::DegenerateMatrix));
}

#[test]
fn test_max_scale_on_axis() {
    let m = compose(Vec3::ONE, Quat::from_rotation_x(1.0), Vec3::new(1.0, 3.0, 2.0));
    assert!((max_scale_on_axis(&m) - 3.0).abs() < 1e-5);
}

#[test]
fn test_zero_vector_normalizes_to_zero() {
    assert_eq!(Vec3::ZERO.normalize_or_zero(), Vec3::ZERO);
}
