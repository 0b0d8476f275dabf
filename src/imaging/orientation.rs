//! EXIF orientation → display rotation.
//!
//! | Orientation | Rotation |
//! |---|---|
//! | 3 | π |
//! | 6 | −π/2 |
//! | 8 | −3π/2 |
//! | anything else | none |
//!
//! The mirrored orientations (2, 4, 5, 7) get no rotation and no flip.

use super::decoder::{DecodedImage, TextureWrap};
use super::tags::TagSet;
use std::f64::consts::{FRAC_PI_2, PI};

/// Rotation in radians for an orientation value, if it is one we rotate.
pub fn rotation_for(orientation: i64) -> Option<f64> {
    match orientation {
        3 => Some(PI),
        6 => Some(-FRAC_PI_2),
        8 => Some(-3.0 * FRAC_PI_2),
        _ => None,
    }
}

/// Apply the `Orientation` tag to the image's display state.
///
/// No tag: nothing changes. Any tag: the texture switches to repeat
/// wrapping, and the rotation from [`rotation_for`] is applied (zero for
/// values it does not handle).
pub fn normalize(image: &mut DecodedImage, tags: &TagSet) {
    let Some(orientation) = tags.orientation() else {
        return;
    };
    image.set_wrap(TextureWrap::Repeat);
    image.set_rotation(rotation_for(orientation).unwrap_or(0.0));
}
