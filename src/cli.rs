use std::path::PathBuf;

use clap::Parser;
use snowfall::{config::SNOWFLAKE_TEXTURE, SnowfallConfig};

/// Falling snow rendered as a GPU point cloud
#[derive(Parser)]
#[command()]
pub struct Args {
    /// Number of snowflakes
    #[arg(short, long, default_value_t = 1000)]
    pub particles: usize,

    /// Height of the snow volume
    #[arg(long, default_value_t = 10.0)]
    pub height: f32,

    /// Width of the snow volume
    #[arg(long, default_value_t = 10.0)]
    pub width: f32,

    /// Depth of the snow volume
    #[arg(long, default_value_t = 10.0)]
    pub depth: f32,

    /// The framerate the effect will run at
    ///
    /// `0` runs as fast as possible
    #[arg(short, long, default_value_t = 60)]
    pub framerate: u32,

    /// Snowflake sprite
    #[arg(short, long, default_value = SNOWFLAKE_TEXTURE)]
    pub texture: PathBuf,
}

impl Args {
    pub fn config(&self) -> SnowfallConfig {
        SnowfallConfig {
            num_particles: self.particles,
            height: self.height,
            width: self.width,
            depth: self.depth,
            texture_path: self.texture.clone(),
            ..Default::default()
        }
    }
}
