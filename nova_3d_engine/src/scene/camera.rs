/// Camera payload and per-frame camera snapshot.
///
/// A Camera node stores its projection parameters and caches the projection
/// matrix. Its view matrix is the inverse of the node's world matrix and is
/// captured, together with the frustum, in a `CameraView` each frame.

use glam::{Mat4, Vec3};
use crate::error::{Error, Result};
use crate::math::{self, Frustum};
use super::node::{Layers, NodeKey};

// ===== PROJECTION =====

/// Projection parameters (angles in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        /// Vertical field of view
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub fn near(&self) -> f32 {
        match *self {
            Projection::Perspective { near, .. } | Projection::Orthographic { near, .. } => near,
        }
    }

    pub fn far(&self) -> f32 {
        match *self {
            Projection::Perspective { far, .. } | Projection::Orthographic { far, .. } => far,
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            Projection::Perspective { fov_y, aspect, near, far } => {
                if !(fov_y > 0.0 && fov_y < std::f32::consts::PI) {
                    return Err(Error::ContractViolation(format!("invalid field of view {}", fov_y)));
                }
                if !(aspect > 0.0) {
                    return Err(Error::ContractViolation(format!("invalid aspect ratio {}", aspect)));
                }
                if !(near > 0.0 && far > near) {
                    return Err(Error::ContractViolation(format!(
                        "invalid clip range near={} far={}", near, far
                    )));
                }
            }
            Projection::Orthographic { left, right, bottom, top, near, far } => {
                if left == right || bottom == top || near == far {
                    return Err(Error::ContractViolation(
                        "orthographic volume has zero extent".to_string()
                    ));
                }
            }
        }
        Ok(())
    }
}

// ===== CAMERA =====

/// Camera payload of a `NodeKind::Camera` node
///
/// Cameras look down their local -Z axis with +Y up. Clip depth follows
/// the OpenGL convention (-1..1).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    projection: Projection,
    zoom: f32,
    projection_matrix: Mat4,
    projection_matrix_inverse: Mat4,
}

impl Camera {
    /// Create a perspective camera
    ///
    /// # Errors
    ///
    /// Returns `Error::ContractViolation` for a non-positive aspect ratio,
    /// an out-of-range field of view or an invalid clip range.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Result<Self> {
        Self::new(Projection::Perspective { fov_y, aspect, near, far })
    }

    /// Create an orthographic camera
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Result<Self> {
        Self::new(Projection::Orthographic { left, right, bottom, top, near, far })
    }

    fn new(projection: Projection) -> Result<Self> {
        let mut camera = Self {
            projection,
            zoom: 1.0,
            projection_matrix: Mat4::IDENTITY,
            projection_matrix_inverse: Mat4::IDENTITY,
        };
        camera.update_projection_matrix()?;
        Ok(camera)
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Replace the projection and recompute the matrix
    ///
    /// The camera is left unchanged on error.
    pub fn set_projection(&mut self, projection: Projection) -> Result<()> {
        let previous = self.projection;
        self.projection = projection;
        if let Err(e) = self.update_projection_matrix() {
            self.projection = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Change the aspect ratio of a perspective camera (no-op for orthographic)
    pub fn set_aspect(&mut self, new_aspect: f32) -> Result<()> {
        match self.projection {
            Projection::Perspective { fov_y, near, far, .. } => self.set_projection(
                Projection::Perspective { fov_y, aspect: new_aspect, near, far }
            ),
            Projection::Orthographic { .. } => Ok(()),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Zoom factor (narrows the field of view / the orthographic volume)
    pub fn set_zoom(&mut self, zoom: f32) -> Result<()> {
        if !(zoom > 0.0) {
            return Err(Error::ContractViolation(format!("invalid zoom {}", zoom)));
        }
        self.zoom = zoom;
        self.update_projection_matrix()
    }

    pub fn near(&self) -> f32 {
        self.projection.near()
    }

    pub fn far(&self) -> f32 {
        self.projection.far()
    }

    /// Recompute the cached projection matrix and its inverse
    pub fn update_projection_matrix(&mut self) -> Result<()> {
        self.projection.validate()?;

        let matrix = match self.projection {
            Projection::Perspective { fov_y, aspect, near, far } => {
                let fov = 2.0 * ((fov_y * 0.5).tan() / self.zoom).atan();
                Mat4::perspective_rh_gl(fov, aspect, near, far)
            }
            Projection::Orthographic { left, right, bottom, top, near, far } => {
                let dx = (right - left) / (2.0 * self.zoom);
                let dy = (top - bottom) / (2.0 * self.zoom);
                let cx = (right + left) * 0.5;
                let cy = (top + bottom) * 0.5;
                Mat4::orthographic_rh_gl(cx - dx, cx + dx, cy - dy, cy + dy, near, far)
            }
        };

        self.projection_matrix_inverse = math::try_inverse(&matrix)?;
        self.projection_matrix = matrix;
        Ok(())
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    pub fn projection_matrix_inverse(&self) -> &Mat4 {
        &self.projection_matrix_inverse
    }
}

// ===== CAMERA VIEW =====

/// Snapshot of a camera for one frame.
///
/// Created by `Scene::camera_view()` after the transform pass. Ephemeral:
/// lives for one frame.
#[derive(Debug, Clone)]
pub struct CameraView {
    pub camera: NodeKey,
    /// Inverse of the camera's world matrix
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
    /// projection * view
    pub view_projection_matrix: Mat4,
    /// Camera position in world space
    pub position: Vec3,
    pub frustum: Frustum,
    pub layers: Layers,
    pub near: f32,
    pub far: f32,
}

impl CameraView {
    pub(crate) fn new(camera_key: NodeKey, camera: &Camera, world_matrix: &Mat4, layers: Layers) -> Result<Self> {
        let view_matrix = math::try_inverse(world_matrix)?;
        let projection_matrix = *camera.projection_matrix();
        let view_projection_matrix = projection_matrix * view_matrix;

        Ok(Self {
            camera: camera_key,
            view_matrix,
            projection_matrix,
            view_projection_matrix,
            position: world_matrix.w_axis.truncate(),
            frustum: Frustum::from_view_projection(&view_projection_matrix),
            layers,
            near: camera.near(),
            far: camera.far(),
        })
    }

    /// Depth of a world-space point along the view direction (positive in front)
    pub fn view_depth(&self, world_point: Vec3) -> f32 {
        -self.view_matrix.transform_point3(world_point).z
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
