//! Minimal EXIF + XMP reader for JPEG, TIFF, PNG and WebP files.
//!
//! Only a bounded prefix of the file is examined (128 KiB by default).
//! Metadata blocks for every supported container live at the front of the
//! file, so the pixel payload is never touched.
//!
//! Two sources feed the resulting [`TagSet`]:
//! - **EXIF**: a TIFF structure, parsed by the `exif` crate. Only primary
//!   image tags with a known name are kept (`Orientation`,
//!   `PixelXDimension`, ...); thumbnail (IFD1) tags are dropped.
//! - **XMP**: the GPano panorama properties (`ProjectionType`,
//!   `CroppedArea*`, `FullPano*`), read from attributes or elements.
//!
//! | Container | EXIF | XMP |
//! |---|---|---|
//! | JPEG | APP1 `Exif\0\0` | APP1 `http://ns.adobe.com/xap/1.0/\0` |
//! | TIFF | the file itself | - |
//! | PNG  | `eXIf` chunk | `iTXt` keyword `XML:com.adobe.xmp` |
//! | WebP | `EXIF` chunk | `XMP ` chunk |
//!
//! An image without any metadata block yields an empty tag set. A block cut
//! off by the prefix is skipped. Bytes that are not one of the containers
//! above, or an EXIF block whose directory is malformed, are an error.

use super::tags::{TagSet, TagValue};
use exif::{In, Tag, Value};
use thiserror::Error;

/// Number of leading bytes handed to the extractor.
pub const DEFAULT_PREFIX_BYTES: usize = 128 * 1024;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("unrecognized image container")]
    UnknownFormat,
    #[error("malformed EXIF block: {0}")]
    Exif(#[from] exif::Error),
}

/// Read metadata tags from the first `prefix_len` bytes of `data`.
pub fn read_tags(data: &[u8], prefix_len: usize) -> Result<TagSet, MetadataError> {
    let data = &data[..data.len().min(prefix_len)];

    if data.starts_with(&[0xFF, 0xD8]) {
        read_jpeg(data)
    } else if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        let mut tags = TagSet::new();
        read_tiff_into(data, &mut tags)?;
        Ok(tags)
    } else if data.starts_with(PNG_SIGNATURE) {
        read_png(data)
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        read_webp(data)
    } else {
        Err(MetadataError::UnknownFormat)
    }
}

// ---------------------------------------------------------------------------
// JPEG: walk marker segments up to the start of scan
// ---------------------------------------------------------------------------

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const XMP_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

fn read_jpeg(data: &[u8]) -> Result<TagSet, MetadataError> {
    let mut tags = TagSet::new();
    let mut xmp = None;
    let mut pos = 2;

    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            break;
        }
        let marker = data[pos + 1];
        // Fill bytes before a marker
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // Markers without length field
        if marker == 0xD8 || marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }
        // SOS (0xDA) means image data starts
        if marker == 0xDA || marker == 0xD9 {
            break;
        }

        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let seg_end = pos + 2 + seg_len;
        if seg_len < 2 || seg_end > data.len() {
            break;
        }
        let segment = &data[pos + 4..seg_end];

        if marker == 0xE1 {
            if let Some(tiff) = segment.strip_prefix(EXIF_HEADER) {
                read_tiff_into(tiff, &mut tags)?;
            } else if let Some(packet) = segment.strip_prefix(XMP_HEADER) {
                xmp = Some(packet);
            }
        }

        pos = seg_end;
    }

    if let Some(packet) = xmp {
        read_xmp_into(packet, &mut tags);
    }
    Ok(tags)
}

// ---------------------------------------------------------------------------
// PNG: eXIf and iTXt chunks before the first IDAT
// ---------------------------------------------------------------------------

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const PNG_XMP_KEYWORD: &[u8] = b"XML:com.adobe.xmp";

fn read_png(data: &[u8]) -> Result<TagSet, MetadataError> {
    let mut tags = TagSet::new();
    let mut xmp = None;
    let mut pos = PNG_SIGNATURE.len();

    while pos + 8 <= data.len() {
        let len =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let kind = &data[pos + 4..pos + 8];
        let start = pos + 8;
        let end = start + len;
        if end > data.len() {
            break;
        }
        let chunk = &data[start..end];

        match kind {
            b"eXIf" => read_tiff_into(chunk, &mut tags)?,
            b"iTXt" => {
                if let Some(packet) = png_itxt_xmp(chunk) {
                    xmp = Some(packet);
                }
            }
            b"IDAT" | b"IEND" => break,
            _ => {}
        }

        // Skip CRC
        pos = end + 4;
    }

    if let Some(packet) = xmp {
        read_xmp_into(packet, &mut tags);
    }
    Ok(tags)
}

/// Uncompressed XMP text from an `iTXt` chunk, if that is what it holds.
///
/// Layout: keyword \0, compression flag, compression method,
/// language tag \0, translated keyword \0, text.
fn png_itxt_xmp(chunk: &[u8]) -> Option<&[u8]> {
    let keyword_end = chunk.iter().position(|&b| b == 0)?;
    if &chunk[..keyword_end] != PNG_XMP_KEYWORD {
        return None;
    }
    let rest = chunk.get(keyword_end + 1..)?;
    let (&compressed, rest) = rest.split_first()?;
    if compressed != 0 {
        return None;
    }
    let rest = rest.get(1..)?;
    let lang_end = rest.iter().position(|&b| b == 0)?;
    let rest = &rest[lang_end + 1..];
    let translated_end = rest.iter().position(|&b| b == 0)?;
    Some(&rest[translated_end + 1..])
}

// ---------------------------------------------------------------------------
// WebP: RIFF chunks
// ---------------------------------------------------------------------------

fn read_webp(data: &[u8]) -> Result<TagSet, MetadataError> {
    let mut tags = TagSet::new();
    let mut xmp = None;
    let mut pos = 12;

    while pos + 8 <= data.len() {
        let fourcc = &data[pos..pos + 4];
        let len = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
            as usize;
        let start = pos + 8;
        let end = start + len;
        if end > data.len() {
            break;
        }
        let chunk = &data[start..end];

        match fourcc {
            b"EXIF" => {
                let tiff = chunk.strip_prefix(EXIF_HEADER).unwrap_or(chunk);
                read_tiff_into(tiff, &mut tags)?;
            }
            b"XMP " => xmp = Some(chunk),
            _ => {}
        }

        // Chunks are padded to even length
        pos = end + (len % 2);
    }

    if let Some(packet) = xmp {
        read_xmp_into(packet, &mut tags);
    }
    Ok(tags)
}

// ---------------------------------------------------------------------------
// TIFF / EXIF: primary image IFDs via the `exif` crate
// ---------------------------------------------------------------------------

/// Tags kept in the resulting set.
const TAG_NAMES: &[(Tag, &str)] = &[
    (Tag::ImageWidth, "ImageWidth"),
    (Tag::ImageLength, "ImageLength"),
    (Tag::Make, "Make"),
    (Tag::Model, "Model"),
    (Tag::Orientation, "Orientation"),
    (Tag::XResolution, "XResolution"),
    (Tag::YResolution, "YResolution"),
    (Tag::ResolutionUnit, "ResolutionUnit"),
    (Tag::Software, "Software"),
    (Tag::DateTime, "DateTime"),
    (Tag::ExposureTime, "ExposureTime"),
    (Tag::FNumber, "FNumber"),
    (Tag::PhotographicSensitivity, "ISOSpeedRatings"),
    (Tag::DateTimeOriginal, "DateTimeOriginal"),
    (Tag::FocalLength, "FocalLength"),
    (Tag::ColorSpace, "ColorSpace"),
    (Tag::PixelXDimension, "PixelXDimension"),
    (Tag::PixelYDimension, "PixelYDimension"),
];

fn tag_name(tag: Tag) -> Option<&'static str> {
    TAG_NAMES
        .iter()
        .find(|(known, _)| *known == tag)
        .map(|(_, name)| *name)
}

/// First value of a field. None of the tags we name are arrays.
fn tag_value(value: &Value) -> Option<TagValue> {
    let value = match value {
        Value::Byte(_) | Value::Short(_) | Value::Long(_) => {
            TagValue::Integer(value.get_uint(0)? as i64)
        }
        Value::SByte(v) => TagValue::Integer(*v.first()? as i64),
        Value::SShort(v) => TagValue::Integer(*v.first()? as i64),
        Value::SLong(v) => TagValue::Integer(*v.first()? as i64),
        Value::Ascii(v) => {
            TagValue::Text(String::from_utf8_lossy(v.first()?).trim().to_string())
        }
        Value::Rational(v) => {
            let r = v.first()?;
            if r.denom == 0 {
                return None;
            }
            TagValue::Float(r.to_f64())
        }
        Value::SRational(v) => {
            let r = v.first()?;
            if r.denom == 0 {
                return None;
            }
            TagValue::Float(r.to_f64())
        }
        Value::Float(v) => TagValue::Float(*v.first()? as f64),
        Value::Double(v) => TagValue::Float(*v.first()?),
        // UNDEFINED blobs (ExifVersion, MakerNote, ...) are not kept
        _ => return None,
    };
    Some(value)
}

/// Parse a TIFF structure (EXIF payload) into `tags`.
fn read_tiff_into(data: &[u8], tags: &mut TagSet) -> Result<(), MetadataError> {
    let exif = exif::Reader::new().read_raw(data.to_vec())?;

    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let Some(name) = tag_name(field.tag) else {
            continue;
        };
        if let Some(value) = tag_value(&field.value) {
            tags.insert(name, value);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// XMP: GPano panorama properties
// ---------------------------------------------------------------------------

const GPANO_NAMESPACE: &str = "http://ns.google.com/photos/1.0/panorama/";

const GPANO_TAGS: &[&str] = &[
    "ProjectionType",
    "UsePanoramaViewer",
    "CroppedAreaImageWidthPixels",
    "CroppedAreaImageHeightPixels",
    "FullPanoWidthPixels",
    "FullPanoHeightPixels",
    "CroppedAreaLeftPixels",
    "CroppedAreaTopPixels",
    "PoseHeadingDegrees",
    "InitialViewHeadingDegrees",
];

fn read_xmp_into(packet: &[u8], tags: &mut TagSet) {
    let xmp = String::from_utf8_lossy(packet);
    let prefix = namespace_prefix(&xmp, GPANO_NAMESPACE).unwrap_or("GPano");

    for name in GPANO_TAGS {
        if let Some(raw) = xmp_property(&xmp, &format!("{prefix}:{name}")) {
            tags.insert(*name, TagValue::from_xmp(raw));
        }
    }
}

/// Find the prefix bound to `uri` by an `xmlns:prefix="uri"` declaration.
fn namespace_prefix<'a>(xmp: &'a str, uri: &str) -> Option<&'a str> {
    let uri_pos = xmp.find(uri)?;
    let decl = &xmp[..uri_pos];
    let start = decl.rfind("xmlns:")? + "xmlns:".len();
    let end = start + decl[start..].find('=')?;
    let prefix = decl[start..end].trim();
    (!prefix.is_empty()).then_some(prefix)
}

/// Value of a qualified property, written either as an attribute
/// (`GPano:Name="v"`) or as an element (`<GPano:Name>v</GPano:Name>`).
fn xmp_property<'a>(xmp: &'a str, qualified: &str) -> Option<&'a str> {
    for quote in ['"', '\''] {
        let pattern = format!("{qualified}={quote}");
        if let Some(start) = xmp.find(&pattern) {
            let value_start = start + pattern.len();
            if let Some(end) = xmp[value_start..].find(quote) {
                return Some(&xmp[value_start..value_start + end]);
            }
        }
    }

    let open_tag = format!("<{qualified}>");
    let close_tag = format!("</{qualified}>");
    let start = xmp.find(&open_tag)? + open_tag.len();
    let end = xmp[start..].find(&close_tag)?;
    Some(xmp[start..start + end].trim())
}
