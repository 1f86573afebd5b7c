use std::sync::Arc;

use glam::Mat4;

use crate::{
    config::Appearance,
    particle::{BoundingSphere, ParticleSet},
    texture::SnowflakeTexture,
};

pub const SNOW_SHADER: &str = include_str!("snow.wgsl");

/// Uniform block shared by both shader stages, laid out to match `SnowUniforms` in `snow.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SnowUniforms {
    pub color: [f32; 3],
    pub opacity: f32,
    pub height: f32,
    pub speed_v: f32,
    pub speed_h: f32,
    pub elapsed_time: f32,
    pub radius: f32,
    pub scale: f32,
    pub size: f32,
    _padding: f32,
}

impl SnowUniforms {
    pub fn new(appearance: &Appearance, height: f32, size: f32) -> Self {
        Self {
            color: appearance.color.to_array(),
            opacity: appearance.opacity,
            height,
            speed_v: appearance.speed_v,
            speed_h: appearance.speed_h,
            elapsed_time: 0.0,
            radius: appearance.radius,
            scale: appearance.scale,
            size,
            _padding: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blending {
    Normal,
    Additive,
}

#[derive(Debug, Clone)]
pub struct SnowMaterial {
    pub uniforms: SnowUniforms,
    /// `None` until the sprite finishes loading.
    pub texture: Option<Arc<SnowflakeTexture>>,

    pub blending: Blending,
    pub depth_test: bool,
    pub transparent: bool,
}

impl SnowMaterial {
    pub fn new(uniforms: SnowUniforms) -> Self {
        Self {
            uniforms,
            texture: None,

            blending: Blending::Additive,
            depth_test: false,
            transparent: true,
        }
    }

    pub fn shader_source(&self) -> &'static str {
        SNOW_SHADER
    }
}

/// The renderable handed to the host: geometry, material and draw hints.
#[derive(Debug, Clone)]
pub struct PointCloud {
    pub geometry: ParticleSet,
    pub material: SnowMaterial,
    pub transform: Mat4,
    /// Model space, covers the drift and wrap of every flake
    pub bounding_sphere: BoundingSphere,

    /// Draw after transparent scene geometry
    pub render_order: i32,
    pub sort_points: bool,
}

impl PointCloud {
    pub fn new(geometry: ParticleSet, material: SnowMaterial) -> Self {
        let bounding_sphere = geometry.swept_bounding_sphere(&material.uniforms);

        Self {
            geometry,
            material,
            transform: Mat4::IDENTITY,
            bounding_sphere,

            render_order: 1,
            sort_points: true,
        }
    }
}
