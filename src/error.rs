use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnowfallError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to read texture {}: {source}", path.display())]
    TextureRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode texture: {0}")]
    TextureDecode(#[from] image::ImageError),

    /// The loader dropped the completion callback without calling it.
    #[error("texture load was abandoned before completing")]
    TextureCancelled,
}

pub type Result<T, E = SnowfallError> = std::result::Result<T, E>;
