/// Euler angles with an explicit rotation order.
///
/// Orders are intrinsic: `EulerOrder::XYZ` rotates about X, then the new Y,
/// then the new Z, which gives the matrix `Rx * Ry * Rz`.

use glam::{EulerRot, Quat};

/// Axis order for Euler angle composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EulerOrder {
    #[default]
    XYZ,
    XZY,
    YXZ,
    YZX,
    ZXY,
    ZYX,
}

impl EulerOrder {
    /// Matching glam rotation sequence
    fn to_glam(self) -> EulerRot {
        match self {
            EulerOrder::XYZ => EulerRot::XYZ,
            EulerOrder::XZY => EulerRot::XZY,
            EulerOrder::YXZ => EulerRot::YXZ,
            EulerOrder::YZX => EulerRot::YZX,
            EulerOrder::ZXY => EulerRot::ZXY,
            EulerOrder::ZYX => EulerRot::ZYX,
        }
    }
}

/// Rotation expressed as three angles (radians) and an order
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Euler {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub order: EulerOrder,
}

impl Euler {
    pub fn new(x: f32, y: f32, z: f32, order: EulerOrder) -> Self {
        Self { x, y, z, order }
    }

    /// Angles reordered to follow the rotation sequence
    fn ordered_angles(&self) -> (f32, f32, f32) {
        match self.order {
            EulerOrder::XYZ => (self.x, self.y, self.z),
            EulerOrder::XZY => (self.x, self.z, self.y),
            EulerOrder::YXZ => (self.y, self.x, self.z),
            EulerOrder::YZX => (self.y, self.z, self.x),
            EulerOrder::ZXY => (self.z, self.x, self.y),
            EulerOrder::ZYX => (self.z, self.y, self.x),
        }
    }

    /// Convert to a unit quaternion
    pub fn to_quat(&self) -> Quat {
        let (a, b, c) = self.ordered_angles();
        Quat::from_euler(self.order.to_glam(), a, b, c)
    }

    /// Extract angles from a quaternion for the given order
    ///
    /// Near gimbal lock the split between the first and last angle is
    /// arbitrary, but `to_quat` of the result reproduces the rotation.
    pub fn from_quat(rotation: Quat, order: EulerOrder) -> Self {
        let (a, b, c) = rotation.normalize().to_euler(order.to_glam());
        let (x, y, z) = match order {
            EulerOrder::XYZ => (a, b, c),
            EulerOrder::XZY => (a, c, b),
            EulerOrder::YXZ => (b, a, c),
            EulerOrder::YZX => (c, a, b),
            EulerOrder::ZXY => (b, c, a),
            EulerOrder::ZYX => (c, b, a),
        };
        Self { x, y, z, order }
    }

    /// Same rotation expressed in another order
    pub fn reorder(&self, order: EulerOrder) -> Self {
        Self::from_quat(self.to_quat(), order)
    }
}

#[cfg(test)]
#[path = "euler_tests.rs"]
mod tests;
