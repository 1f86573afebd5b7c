use std::path::PathBuf;

use glam::Vec3;

use crate::error::{Result, SnowfallError};

pub const SNOWFLAKE_TEXTURE: &str = "assets/textures/snowflake.png";

/// Everything needed to build a [`SnowfallEffect`](crate::SnowfallEffect).
#[derive(Debug, Clone, PartialEq)]
pub struct SnowfallConfig {
    pub num_particles: usize,

    /// Bounding volume. Particles spawn in `[-width/2, width/2] x [0, height) x [-depth/2, depth/2]`.
    pub height: f32,
    pub width: f32,
    pub depth: f32,

    pub texture_path: PathBuf,
    pub appearance: Appearance,
}

/// Fixed shader parameters, set once when the material is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub color: Vec3,
    /// Falling speed in units per second
    pub speed_v: f32,
    /// Angular frequency of the horizontal drift
    pub speed_h: f32,
    /// Horizontal drift amplitude
    pub radius: f32,
    pub scale: f32,
    pub opacity: f32,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            speed_v: 0.4,
            speed_h: 2.0,
            radius: 0.02,
            scale: 2.0,
            opacity: 0.1,
        }
    }
}

impl Default for SnowfallConfig {
    fn default() -> Self {
        Self {
            num_particles: 1000,
            height: 10.0,
            width: 10.0,
            depth: 10.0,
            texture_path: SNOWFLAKE_TEXTURE.into(),
            appearance: Appearance::default(),
        }
    }
}

impl SnowfallConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_particles == 0 {
            return Err(SnowfallError::InvalidArgument(
                "num_particles must be positive".into(),
            ));
        }

        check_volume(self.height, self.width, self.depth)
    }
}

/// Fails unless every dimension of the spawn volume is positive and finite.
pub(crate) fn check_volume(height: f32, width: f32, depth: f32) -> Result<()> {
    for (name, value) in [("height", height), ("width", width), ("depth", depth)] {
        if !(value > 0.0 && value.is_finite()) {
            return Err(SnowfallError::InvalidArgument(format!(
                "{name} must be a positive finite number, got {value}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SnowfallConfig::default();
        assert_eq!(config.num_particles, 1000);
        assert_eq!((config.height, config.width, config.depth), (10.0, 10.0, 10.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_volumes() {
        let cases = [
            SnowfallConfig {
                num_particles: 0,
                ..Default::default()
            },
            SnowfallConfig {
                height: 0.0,
                ..Default::default()
            },
            SnowfallConfig {
                width: -1.0,
                ..Default::default()
            },
            SnowfallConfig {
                depth: f32::NAN,
                ..Default::default()
            },
            SnowfallConfig {
                height: f32::INFINITY,
                ..Default::default()
            },
        ];

        for config in cases {
            assert!(matches!(
                config.validate(),
                Err(SnowfallError::InvalidArgument(_))
            ));
        }
    }
}
