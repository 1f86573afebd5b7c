//! Falling snow rendered as a GPU point cloud.
//!
//! [`SnowfallEffect`] owns the particle rest pose and the shader parameters,
//! [`SnowRenderer`] turns it into wgpu draw calls.

pub mod camera;
pub mod config;
pub mod error;
pub mod material;
pub mod particle;
pub mod render;
pub mod snowfall;
pub mod texture;
pub mod viewport;

pub use config::{Appearance, SnowfallConfig};
pub use error::SnowfallError;
pub use particle::BoundingSphere;
pub use render::SnowRenderer;
pub use snowfall::SnowfallEffect;
pub use texture::{AsyncTextureLoader, TextureLoader};
pub use viewport::{Viewport, ViewportMetrics};
