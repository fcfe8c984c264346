/// Transform helpers: TRS composition/decomposition and checked inversion.
///
/// `glam` inverts singular matrices into NaN/inf without complaint. These
/// helpers check the determinant first and return `Error::DegenerateMatrix`.

use glam::{Mat3, Mat4, Quat, Vec3};
use crate::error::{Error, Result};

/// Determinants at or below this magnitude are treated as singular
const SINGULAR_EPSILON: f32 = 1e-12;

/// Scale components at or below this magnitude cannot be decomposed
const SCALE_EPSILON: f32 = 1e-8;

/// Build a local matrix from position, rotation and scale (T * R * S)
pub fn compose(position: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, position)
}

/// Split an affine matrix into position, rotation and scale.
///
/// A negative determinant is attributed to the x axis (scale.x < 0).
///
/// # Errors
///
/// Returns `Error::DegenerateMatrix` when any axis has zero length.
pub fn decompose(matrix: &Mat4) -> Result<(Vec3, Quat, Vec3)> {
    let x_axis = matrix.x_axis.truncate();
    let y_axis = matrix.y_axis.truncate();
    let z_axis = matrix.z_axis.truncate();

    let mut sx = x_axis.length();
    let sy = y_axis.length();
    let sz = z_axis.length();

    if sx <= SCALE_EPSILON || sy <= SCALE_EPSILON || sz <= SCALE_EPSILON
        || !(sx.is_finite() && sy.is_finite() && sz.is_finite())
    {
        return Err(Error::DegenerateMatrix);
    }

    if matrix.determinant() < 0.0 {
        sx = -sx;
    }

    let rotation_matrix = Mat3::from_cols(x_axis / sx, y_axis / sy, z_axis / sz);
    let rotation = Quat::from_mat3(&rotation_matrix).normalize();
    let position = matrix.w_axis.truncate();

    Ok((position, rotation, Vec3::new(sx, sy, sz)))
}

/// Invert a matrix, failing instead of producing NaN/inf
///
/// # Errors
///
/// Returns `Error::DegenerateMatrix` when the determinant is (near) zero.
pub fn try_inverse(matrix: &Mat4) -> Result<Mat4> {
    let det = matrix.determinant();
    if !det.is_finite() || det.abs() <= SINGULAR_EPSILON {
        return Err(Error::DegenerateMatrix);
    }
    Ok(matrix.inverse())
}

/// Inverse transpose of the upper 3x3, used to transform normals
///
/// # Errors
///
/// Returns `Error::DegenerateMatrix` when the upper 3x3 is singular.
pub fn normal_matrix(matrix: &Mat4) -> Result<Mat3> {
    let upper = Mat3::from_mat4(*matrix);
    let det = upper.determinant();
    if !det.is_finite() || det.abs() <= SINGULAR_EPSILON {
        return Err(Error::DegenerateMatrix);
    }
    Ok(upper.inverse().transpose())
}

/// Largest axis scale of a matrix (used to scale bounding sphere radii)
pub fn max_scale_on_axis(matrix: &Mat4) -> f32 {
    let sx = matrix.x_axis.truncate().length_squared();
    let sy = matrix.y_axis.truncate().length_squared();
    let sz = matrix.z_axis.truncate().length_squared();
    sx.max(sy).max(sz).sqrt()
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
