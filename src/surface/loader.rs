use std::path::Path;

use tokio::task;
use tracing::{debug, info, warn};

use crate::error::AssetError;
use crate::surface::texture::Texture;
use crate::surface::types::Color;

/// Where the source image is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatus {
    /// Not delivered yet; frames are cleared but not drawn
    Pending,
    /// Texture uploaded; frames are drawn
    Ready,
    /// Loading failed; frames keep being cleared and never drawn
    Failed,
}

/// Loads and decodes the source image into a [`Texture`]
#[derive(Debug, Clone)]
pub struct AssetLoader {
    background: Color,
}

impl AssetLoader {
    /// `background` is the colour transparent pixels are flattened onto
    pub fn new(background: Color) -> Self {
        Self { background }
    }

    /// Read and decode an image file.
    ///
    /// The file is read asynchronously and decoded on a blocking task.
    pub async fn load<P: AsRef<Path>>(&self, path: P) -> Result<Texture, AssetError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        debug!("Loading image from: {:?}", path);
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            warn!("Failed to read {}: {}", path_str, e);
            AssetError::LoadFailed { path: path_str.clone() }
        })?;

        let background = self.background;
        let name = path_str.clone();
        let texture = task::spawn_blocking(move || Self::decode(&bytes, &name, background))
            .await
            .map_err(|e| AssetError::DecodeFailed { path: path_str.clone(), reason: e.to_string() })??;

        let dims = texture.dimensions();
        info!("Loaded image {} ({}x{})", path_str, dims.width, dims.height);
        Ok(texture)
    }

    /// Decode an in-memory PNG or JPEG
    pub fn decode(bytes: &[u8], name: &str, background: Color) -> Result<Texture, AssetError> {
        let image = image::load_from_memory(bytes).map_err(|e| AssetError::DecodeFailed {
            path: name.to_string(),
            reason: e.to_string(),
        })?;

        if image.width() == 0 || image.height() == 0 {
            return Err(AssetError::EmptyImage { path: name.to_string() });
        }

        Ok(Texture::from_image(&image, background))
    }
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new(Color::WHITE)
    }
}
