/// Light payload and per-frame light summary.
///
/// Lighting math lives in shaders; the core only needs light kinds and
/// counts, which select the compiled program variant.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    /// Shines along the node's -Z axis
    Directional,
    Point {
        /// 0 = infinite range
        distance: f32,
        decay: f32,
    },
    Spot {
        /// Cone half-angle in radians
        angle: f32,
        penumbra: f32,
        distance: f32,
        decay: f32,
    },
    Hemisphere {
        ground_color: Vec3,
    },
}

/// Light payload of a `NodeKind::Light` node
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    /// Linear RGB
    pub color: Vec3,
    pub intensity: f32,
    /// Ignored for ambient and hemisphere lights
    pub cast_shadow: bool,
}

impl Light {
    pub fn new(kind: LightKind, color: Vec3, intensity: f32) -> Self {
        Self { kind, color, intensity, cast_shadow: false }
    }

    pub fn ambient(color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Ambient, color, intensity)
    }

    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Directional, color, intensity)
    }

    pub fn point(color: Vec3, intensity: f32, distance: f32, decay: f32) -> Self {
        Self::new(LightKind::Point { distance, decay }, color, intensity)
    }

    pub fn spot(color: Vec3, intensity: f32, distance: f32, angle: f32, penumbra: f32, decay: f32) -> Self {
        Self::new(LightKind::Spot { angle, penumbra, distance, decay }, color, intensity)
    }

    pub fn hemisphere(sky_color: Vec3, ground_color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Hemisphere { ground_color }, sky_color, intensity)
    }

    pub fn with_shadow(mut self, cast_shadow: bool) -> Self {
        self.cast_shadow = cast_shadow;
        self
    }

    /// Whether the light can cast shadows at all
    pub fn supports_shadow(&self) -> bool {
        matches!(
            self.kind,
            LightKind::Directional | LightKind::Point { .. } | LightKind::Spot { .. }
        )
    }
}

// ===== LIGHT SUMMARY =====

/// Light counts of the visible scene for one frame
///
/// Part of every program key: adding a light changes the compiled variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LightSummary {
    pub ambient: u32,
    pub directional: u32,
    pub point: u32,
    pub spot: u32,
    pub hemisphere: u32,
    pub shadow_casters: u32,
}

impl LightSummary {
    pub fn add(&mut self, light: &Light) {
        match light.kind {
            LightKind::Ambient => self.ambient += 1,
            LightKind::Directional => self.directional += 1,
            LightKind::Point { .. } => self.point += 1,
            LightKind::Spot { .. } => self.spot += 1,
            LightKind::Hemisphere { .. } => self.hemisphere += 1,
        }
        if light.cast_shadow && light.supports_shadow() {
            self.shadow_casters += 1;
        }
    }

    pub fn total(&self) -> u32 {
        self.ambient + self.directional + self.point + self.spot + self.hemisphere
    }

    /// Stable textual form used inside program keys
    pub fn key_fragment(&self) -> String {
        format!(
            "a{}d{}p{}s{}h{}c{}",
            self.ambient, self.directional, self.point, self.spot, self.hemisphere, self.shadow_casters
        )
    }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
