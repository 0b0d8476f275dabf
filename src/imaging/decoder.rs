//! Image decoding into a drawable surface.
//!
//! Decoding is CPU-bound, so it runs on tokio's blocking pool; the caller
//! just awaits it. Formats are whatever the `image` crate was built with
//! (JPEG, PNG, TIFF, WebP).

use crate::fetch::Blob;
use image::DynamicImage;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("{0}")]
    Image(#[from] image::ImageError),
    #[error("decode task failed: {0}")]
    Task(String),
}

/// How texture coordinates outside `[0, 1]` are treated by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureWrap {
    #[default]
    ClampToEdge,
    Repeat,
}

/// A decoded image plus the display state the renderer needs.
///
/// `rotation` and `wrap` describe how the surface is drawn; they never
/// touch the pixel buffer or the reported dimensions.
pub struct DecodedImage {
    surface: DynamicImage,
    rotation: f64,
    wrap: TextureWrap,
}

/// Serializable summary of a [`DecodedImage`] (no pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    /// Display rotation in radians.
    pub rotation: f64,
    pub wrap: TextureWrap,
}

impl DecodedImage {
    pub fn new(surface: DynamicImage) -> Self {
        Self {
            surface,
            rotation: 0.0,
            wrap: TextureWrap::default(),
        }
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// The drawable surface handed to the renderer.
    pub fn surface(&self) -> &DynamicImage {
        &self.surface
    }

    pub fn into_surface(self) -> DynamicImage {
        self.surface
    }

    /// Display rotation in radians.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn wrap(&self) -> TextureWrap {
        self.wrap
    }

    pub(crate) fn set_rotation(&mut self, radians: f64) {
        self.rotation = radians;
    }

    pub(crate) fn set_wrap(&mut self, wrap: TextureWrap) {
        self.wrap = wrap;
    }

    pub fn descriptor(&self) -> TextureDescriptor {
        TextureDescriptor {
            width: self.width(),
            height: self.height(),
            rotation: self.rotation,
            wrap: self.wrap,
        }
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("rotation", &self.rotation)
            .field("wrap", &self.wrap)
            .finish()
    }
}

/// Decode a blob into a [`DecodedImage`].
pub async fn decode(blob: &Blob) -> Result<DecodedImage, DecodeError> {
    let blob = blob.clone();
    let surface = tokio::task::spawn_blocking(move || image::load_from_memory(blob.as_bytes()))
        .await
        .map_err(|e| DecodeError::Task(e.to_string()))??;
    tracing::debug!(
        width = surface.width(),
        height = surface.height(),
        "decoded"
    );
    Ok(DecodedImage::new(surface))
}
