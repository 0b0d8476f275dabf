//! Per-image processing: metadata, decoding, orientation, geometry.
//!
//! | Step | Module / crate |
//! |---|---|
//! | **Metadata** | container walk + `exif` crate (EXIF) + XMP GPano |
//! | **Decode** | `image::load_from_memory` on the blocking pool |
//! | **Orientation** | EXIF orientation → display rotation |
//! | **Geometry** | plane size or panorama repeat/offset |
//!
//! The module is split into:
//! - **Tags**: the typed tag set every other step reads
//! - **Parser**: bytes → tags
//! - **Decoder**: bytes → [`DecodedImage`]
//! - **Calculations**: pure functions from tags + request to a projection

mod calculations;
mod decoder;
pub(crate) mod exif_parser;
mod orientation;
mod tags;

pub use calculations::{
    GeometryError, MissingDimensions, RequestedSize, aspect_ratio, classify, is_equirectangular,
};
pub use decoder::{DecodeError, DecodedImage, TextureDescriptor, TextureWrap, decode};
pub use exif_parser::{DEFAULT_PREFIX_BYTES, MetadataError, read_tags};
pub use orientation::{normalize, rotation_for};
pub use tags::{TagSet, TagValue};
