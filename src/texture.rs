use std::path::{Path, PathBuf};

use crate::error::{Result, SnowfallError};

/// Decoded RGBA8 sprite, ready for upload.
#[derive(Clone, PartialEq)]
pub struct SnowflakeTexture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for SnowflakeTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeTexture")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl SnowflakeTexture {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?.into_rgba8();

        Ok(Self {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        })
    }
}

pub type TextureCallback = Box<dyn FnOnce(Result<SnowflakeTexture>) + Send>;

/// Fire-and-forget texture loading.
pub trait TextureLoader {
    /// Starts loading `path`; `on_complete` runs once, on whatever thread finishes the load.
    fn load(&self, path: &Path, on_complete: TextureCallback);
}

/// Reads and decodes textures on a tokio runtime.
pub struct AsyncTextureLoader {
    runtime: tokio::runtime::Handle,
}

impl AsyncTextureLoader {
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }
}

impl TextureLoader for AsyncTextureLoader {
    fn load(&self, path: &Path, on_complete: TextureCallback) {
        let path = path.to_path_buf();
        self.runtime.spawn(async move {
            on_complete(read_texture(path).await);
        });
    }
}

async fn read_texture(path: PathBuf) -> Result<SnowflakeTexture> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| SnowfallError::TextureRead { path, source })?;

    SnowflakeTexture::decode(&bytes)
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, sync::mpsc, time::Duration};

    use super::*;

    fn encoded_png(width: u32, height: u32) -> Vec<u8> {
        let image =
            image::RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 128]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_png_to_rgba() {
        let texture = SnowflakeTexture::decode(&encoded_png(4, 2)).unwrap();
        assert_eq!((texture.width, texture.height), (4, 2));
        assert_eq!(texture.rgba.len(), 4 * 2 * 4);
        assert_eq!(&texture.rgba[..4], &[255, 255, 255, 128]);
    }

    #[test]
    fn bundled_snowflake_decodes() {
        let texture =
            SnowflakeTexture::decode(include_bytes!("../assets/textures/snowflake.png")).unwrap();
        assert_eq!((texture.width, texture.height), (32, 32));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            SnowflakeTexture::decode(b"not a png"),
            Err(SnowfallError::TextureDecode(_))
        ));
    }

    fn load_with_runtime(path: &Path) -> Result<SnowflakeTexture> {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let loader = AsyncTextureLoader::new(runtime.handle().clone());

        let (tx, rx) = mpsc::channel();
        loader.load(
            path,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );

        rx.recv_timeout(Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn async_loader_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snowflake.png");
        std::fs::write(&path, encoded_png(8, 8)).unwrap();

        let texture = load_with_runtime(&path).unwrap();
        assert_eq!((texture.width, texture.height), (8, 8));
    }

    #[test]
    fn async_loader_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");

        match load_with_runtime(&path) {
            Err(SnowfallError::TextureRead { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected a read error, got {other:?}"),
        }
    }
}
