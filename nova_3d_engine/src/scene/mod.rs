//! Scene graph module
//!
//! Provides the node arena, hierarchy operations, transform propagation,
//! and the camera and light payloads carried by nodes.

mod node;
mod scene;
mod camera;
mod light;

pub use node::{
    Node, NodeKey, NodeKind, Layers,
    Renderable, MaterialBinding,
};
pub use scene::Scene;
pub use camera::{Camera, CameraView, Projection};
pub use light::{Light, LightKind, LightSummary};
