//! Request and result types shared by the loader, the gallery and the CLI.
//!
//! [`LoadResult`] serializes to the record the rendering layer consumes:
//!
//! ```json
//! { "sphere": false, "width": 4.0, "height": 2.0,
//!   "texture": { "width": 4000, "height": 2000, "rotation": 0.0, "wrap": "clamp_to_edge" },
//!   "stereo": false, "image": "photo.jpg" }
//! ```
//!
//! Sphere results carry `repeat_x`, `repeat_y`, `offset_x`, `offset_y` in
//! place of `width`/`height`; stereo results carry `texture: {left, right}`.

use crate::imaging::{DecodedImage, RequestedSize};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// One image URL, or a left/right stereo pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    Mono(String),
    Stereo { left: String, right: String },
}

/// What to load, with an optional explicit plane size in scene units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageRequest {
    pub image: ImageSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl ImageRequest {
    pub fn mono(url: impl Into<String>) -> Self {
        Self {
            image: ImageSource::Mono(url.into()),
            width: None,
            height: None,
        }
    }

    pub fn stereo(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            image: ImageSource::Stereo {
                left: left.into(),
                right: right.into(),
            },
            width: None,
            height: None,
        }
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn requested_size(&self) -> RequestedSize {
        RequestedSize::new(self.width, self.height)
    }
}

/// How the image is mapped onto a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Flat rectangle, size in scene units. Both sides are strictly positive.
    Plane { width: f64, height: f64 },
    /// Equirectangular panorama; texture repeat/offset onto the full sphere.
    Sphere {
        repeat_x: f64,
        repeat_y: f64,
        offset_x: f64,
        offset_y: f64,
    },
}

impl Projection {
    pub fn is_sphere(&self) -> bool {
        matches!(self, Projection::Sphere { .. })
    }

    /// `(name, value)` pairs as they appear in the serialized record.
    fn fields(&self) -> Vec<(&'static str, f64)> {
        match *self {
            Projection::Plane { width, height } => vec![("width", width), ("height", height)],
            Projection::Sphere {
                repeat_x,
                repeat_y,
                offset_x,
                offset_y,
            } => vec![
                ("repeat_x", repeat_x),
                ("repeat_y", repeat_y),
                ("offset_x", offset_x),
                ("offset_y", offset_y),
            ],
        }
    }
}

/// Decoded texture(s) owned by a [`LoadResult`].
#[derive(Debug)]
pub enum Textures {
    Mono(DecodedImage),
    /// Both halves have the same native pixel size.
    Stereo {
        left: DecodedImage,
        right: DecodedImage,
    },
}

impl Serialize for Textures {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Textures::Mono(image) => image.descriptor().serialize(serializer),
            Textures::Stereo { left, right } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("left", &left.descriptor())?;
                map.serialize_entry("right", &right.descriptor())?;
                map.end()
            }
        }
    }
}

/// Everything the renderer needs for one image (or stereo pair).
///
/// Created fresh by each load; owns its textures.
#[derive(Debug)]
pub struct LoadResult {
    pub projection: Projection,
    pub textures: Textures,
    /// The request this result was loaded from.
    pub source: ImageRequest,
}

impl LoadResult {
    pub fn is_stereo(&self) -> bool {
        matches!(self.textures, Textures::Stereo { .. })
    }
}

impl Serialize for LoadResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.projection.fields();
        let mut map = serializer.serialize_map(Some(fields.len() + 4))?;
        map.serialize_entry("sphere", &self.projection.is_sphere())?;
        for (name, value) in fields {
            map.serialize_entry(name, &value)?;
        }
        map.serialize_entry("texture", &self.textures)?;
        map.serialize_entry("stereo", &self.is_stereo())?;
        map.serialize_entry("image", &self.source.image)?;
        map.end()
    }
}
