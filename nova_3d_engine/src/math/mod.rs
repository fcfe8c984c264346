//! Math module: Euler angles, transform composition, bounding volumes and frustum.
//!
//! Vectors, matrices and quaternions are plain `glam` types. This module
//! adds the operations the scene graph and render list builder need on top
//! of them, with explicit errors where `glam` would silently return garbage.

mod euler;
mod transform;
mod bounds;
mod frustum;

pub use euler::{Euler, EulerOrder};
pub use transform::{compose, decompose, try_inverse, normal_matrix, max_scale_on_axis};
pub use bounds::{Aabb, Sphere};
pub use frustum::{
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
