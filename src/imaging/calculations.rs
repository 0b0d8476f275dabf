//! Projection classification and geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! An image is a sphere iff its `ProjectionType` tag is `"equirectangular"`;
//! everything else is a flat plane.
//!
//! ## Sphere
//!
//! The six GPano tags map the cropped panorama onto the full sphere:
//!
//! ```text
//! repeat_x = FullPanoWidthPixels  / CroppedAreaImageWidthPixels
//! repeat_y = FullPanoHeightPixels / CroppedAreaImageHeightPixels
//! offset_x = -(CroppedAreaLeftPixels / FullPanoWidthPixels)
//! offset_y = -((FullPanoHeightPixels - CroppedAreaTopPixels) / FullPanoHeightPixels)
//! ```
//!
//! ## Plane
//!
//! Requested width and height are used as-is. With only one of them, the
//! other follows from the EXIF pixel aspect ratio, inverted when the
//! orientation is 5 or above (turned 90°).

use crate::types::Projection;
use super::tags::TagSet;
use std::fmt;
use thiserror::Error;

/// Why a plane could not be sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingDimensions {
    /// Neither width nor height was requested.
    NoRequestedSize,
    /// Only one side was requested and the EXIF pixel size is unknown.
    NoPixelDimensions,
}

impl fmt::Display for MissingDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingDimensions::NoRequestedSize => f.write_str("neither width nor height provided"),
            MissingDimensions::NoPixelDimensions => {
                f.write_str("no pixel dimensions in EXIF tags")
            }
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("panorama tag {0} is missing")]
    MissingPanoramaTag(&'static str),
    #[error("{0}")]
    MissingDimensions(MissingDimensions),
}

/// Explicit plane size from the request, in scene units.
///
/// Zero, negative and non-finite values count as not supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RequestedSize {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl RequestedSize {
    pub fn new(width: Option<f64>, height: Option<f64>) -> Self {
        Self { width, height }
    }

    fn usable(value: Option<f64>) -> Option<f64> {
        value.filter(|v| v.is_finite() && *v > 0.0)
    }

    pub fn width(&self) -> Option<f64> {
        Self::usable(self.width)
    }

    pub fn height(&self) -> Option<f64> {
        Self::usable(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width().is_none() && self.height().is_none()
    }
}

const PROJECTION_TYPE: &str = "ProjectionType";
const EQUIRECTANGULAR: &str = "equirectangular";

/// True when the tags describe a full-sphere equirectangular panorama.
pub fn is_equirectangular(tags: &TagSet) -> bool {
    tags.text(PROJECTION_TYPE) == Some(EQUIRECTANGULAR)
}

/// Decide the projection and compute its parameters.
pub fn classify(tags: &TagSet, requested: RequestedSize) -> Result<Projection, GeometryError> {
    if is_equirectangular(tags) {
        sphere_params(tags)
    } else {
        plane_size(tags, requested)
    }
}

fn gpano(tags: &TagSet, name: &'static str) -> Result<f64, GeometryError> {
    tags.integer(name)
        .map(|v| v as f64)
        .ok_or(GeometryError::MissingPanoramaTag(name))
}

/// Like [`gpano`], for tags that end up as divisors.
fn gpano_extent(tags: &TagSet, name: &'static str) -> Result<f64, GeometryError> {
    gpano(tags, name).and_then(|v| {
        if v > 0.0 {
            Ok(v)
        } else {
            Err(GeometryError::MissingPanoramaTag(name))
        }
    })
}

/// Texture repeat/offset that place a cropped panorama on the full sphere.
pub fn sphere_params(tags: &TagSet) -> Result<Projection, GeometryError> {
    let left = gpano(tags, "CroppedAreaLeftPixels")?;
    let top = gpano(tags, "CroppedAreaTopPixels")?;
    let cropped_width = gpano_extent(tags, "CroppedAreaImageWidthPixels")?;
    let cropped_height = gpano_extent(tags, "CroppedAreaImageHeightPixels")?;
    let full_width = gpano_extent(tags, "FullPanoWidthPixels")?;
    let full_height = gpano_extent(tags, "FullPanoHeightPixels")?;

    Ok(Projection::Sphere {
        repeat_x: full_width / cropped_width,
        repeat_y: full_height / cropped_height,
        offset_x: -(left / full_width),
        offset_y: -((full_height - top) / full_height),
    })
}

/// Intrinsic width/height ratio of the displayed image.
///
/// Orientations 5–8 are captured turned by 90°, so the stored pixel axes are
/// swapped relative to what is displayed. Any value from 5 up is treated the
/// same way.
pub fn aspect_ratio(pixels: (u32, u32), orientation: Option<i64>) -> f64 {
    let (w, h) = (pixels.0 as f64, pixels.1 as f64);
    match orientation {
        Some(o) if o >= 5 => h / w,
        _ => w / h,
    }
}

fn intrinsic_ratio(tags: &TagSet) -> Result<f64, GeometryError> {
    let pixels = tags
        .pixel_dimensions()
        .ok_or(GeometryError::MissingDimensions(
            MissingDimensions::NoPixelDimensions,
        ))?;
    Ok(aspect_ratio(pixels, tags.orientation()))
}

/// Physical plane size from the request, filling a missing side from EXIF.
pub fn plane_size(tags: &TagSet, requested: RequestedSize) -> Result<Projection, GeometryError> {
    let (width, height) = match (requested.width(), requested.height()) {
        (Some(width), Some(height)) => (width, height),
        (Some(width), None) => (width, width / intrinsic_ratio(tags)?),
        (None, Some(height)) => (height * intrinsic_ratio(tags)?, height),
        (None, None) => {
            return Err(GeometryError::MissingDimensions(
                MissingDimensions::NoRequestedSize,
            ));
        }
    };
    Ok(Projection::Plane { width, height })
}
