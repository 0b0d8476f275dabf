//! Shared test utilities for the vr-gal test suite.
//!
//! Builds real image files in memory (JPEG/PNG via the `image` crate, with
//! EXIF and XMP blocks spliced in) and provides a [`MockFetcher`] that
//! serves them by URL and records every request.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let fetcher = MockFetcher::new()
//!     .with("photo.jpg", camera_jpeg(Some(6), Some((4000, 2000))))
//!     .with("pano.jpg", pano_jpeg((4096, 2048), (2048, 1024), (512, 256)));
//!
//! let result = load_with_fetcher(&fetcher, &request, &config).await.unwrap();
//! assert_eq!(fetcher.requested(), vec!["photo.jpg"]);
//! ```

use crate::fetch::{Blob, ByteFetcher, FetchError};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;

// =========================================================================
// TIFF / EXIF blocks
// =========================================================================

struct Entry {
    tag: u16,
    typ: u16,
    count: u32,
    data: Vec<u8>,
}

/// Builds a TIFF structure with an IFD0 and an optional Exif sub-IFD.
///
/// ```rust
/// let tiff = TiffBuilder::new(false)
///     .short(0x0112, 6)           // Orientation
///     .exif_long(0xA002, 4000)    // PixelXDimension
///     .build();
/// ```
pub struct TiffBuilder {
    big_endian: bool,
    ifd0: Vec<Entry>,
    exif: Vec<Entry>,
}

impl TiffBuilder {
    pub fn new(big_endian: bool) -> Self {
        Self {
            big_endian,
            ifd0: Vec::new(),
            exif: Vec::new(),
        }
    }

    fn u16_bytes(&self, v: u16) -> [u8; 2] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn u32_bytes(&self, v: u32) -> [u8; 4] {
        if self.big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    }

    fn rational_bytes(&self, num: u32, den: u32) -> Vec<u8> {
        let mut data = self.u32_bytes(num).to_vec();
        data.extend_from_slice(&self.u32_bytes(den));
        data
    }

    pub fn ascii(mut self, tag: u16, text: &str) -> Self {
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        self.ifd0.push(Entry {
            tag,
            typ: 2,
            count: data.len() as u32,
            data,
        });
        self
    }

    pub fn short(mut self, tag: u16, value: u16) -> Self {
        let data = self.u16_bytes(value).to_vec();
        self.ifd0.push(Entry {
            tag,
            typ: 3,
            count: 1,
            data,
        });
        self
    }

    pub fn rational(mut self, tag: u16, num: u32, den: u32) -> Self {
        let data = self.rational_bytes(num, den);
        self.ifd0.push(Entry {
            tag,
            typ: 5,
            count: 1,
            data,
        });
        self
    }

    pub fn exif_long(mut self, tag: u16, value: u32) -> Self {
        let data = self.u32_bytes(value).to_vec();
        self.exif.push(Entry {
            tag,
            typ: 4,
            count: 1,
            data,
        });
        self
    }

    pub fn exif_rational(mut self, tag: u16, num: u32, den: u32) -> Self {
        let data = self.rational_bytes(num, den);
        self.exif.push(Entry {
            tag,
            typ: 5,
            count: 1,
            data,
        });
        self
    }

    /// Directory entries, with values longer than 4 bytes placed in `data`.
    fn write_ifd(
        &self,
        out: &mut Vec<u8>,
        data: &mut Vec<u8>,
        data_start: usize,
        entries: &[Entry],
    ) {
        out.extend_from_slice(&self.u16_bytes(entries.len() as u16));
        for entry in entries {
            out.extend_from_slice(&self.u16_bytes(entry.tag));
            out.extend_from_slice(&self.u16_bytes(entry.typ));
            out.extend_from_slice(&self.u32_bytes(entry.count));
            if entry.data.len() <= 4 {
                let mut inline = entry.data.clone();
                inline.resize(4, 0);
                out.extend_from_slice(&inline);
            } else {
                let offset = (data_start + data.len()) as u32;
                out.extend_from_slice(&self.u32_bytes(offset));
                data.extend_from_slice(&entry.data);
                if data.len() % 2 == 1 {
                    data.push(0);
                }
            }
        }
        // No next IFD
        out.extend_from_slice(&[0, 0, 0, 0]);
    }

    pub fn build(mut self) -> Vec<u8> {
        let exif = std::mem::take(&mut self.exif);
        let mut ifd0 = std::mem::take(&mut self.ifd0);

        let ifd0_count = ifd0.len() + usize::from(!exif.is_empty());
        let exif_offset = 8 + 2 + 12 * ifd0_count + 4;
        let exif_len = if exif.is_empty() {
            0
        } else {
            2 + 12 * exif.len() + 4
        };
        let data_start = exif_offset + exif_len;

        if !exif.is_empty() {
            ifd0.push(Entry {
                tag: 0x8769,
                typ: 4,
                count: 1,
                data: self.u32_bytes(exif_offset as u32).to_vec(),
            });
        }

        let mut out = Vec::new();
        out.extend_from_slice(if self.big_endian { b"MM\0*" } else { b"II*\0" });
        out.extend_from_slice(&self.u32_bytes(8));

        let mut data = Vec::new();
        self.write_ifd(&mut out, &mut data, data_start, &ifd0);
        if !exif.is_empty() {
            self.write_ifd(&mut out, &mut data, data_start, &exif);
        }
        out.extend_from_slice(&data);
        out
    }
}

// =========================================================================
// JPEG segments
// =========================================================================

fn app1(payload: &[u8]) -> Vec<u8> {
    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(payload);
    segment
}

/// Full APP1 segment (marker + length) carrying an EXIF TIFF block.
pub fn exif_app1(tiff: &[u8]) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(tiff);
    app1(&payload)
}

/// Full APP1 segment carrying an XMP packet.
pub fn xmp_app1(xmp: &str) -> Vec<u8> {
    let mut payload = b"http://ns.adobe.com/xap/1.0/\0".to_vec();
    payload.extend_from_slice(xmp.as_bytes());
    app1(&payload)
}

/// XMP packet with GPano panorama properties written as attributes.
pub fn gpano_xmp(full: (u32, u32), cropped: (u32, u32), offset: (u32, u32)) -> String {
    format!(
        r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="" xmlns:GPano="http://ns.google.com/photos/1.0/panorama/" GPano:ProjectionType="equirectangular" GPano:UsePanoramaViewer="True" GPano:CroppedAreaImageWidthPixels="{}" GPano:CroppedAreaImageHeightPixels="{}" GPano:FullPanoWidthPixels="{}" GPano:FullPanoHeightPixels="{}" GPano:CroppedAreaLeftPixels="{}" GPano:CroppedAreaTopPixels="{}"/></rdf:RDF></x:xmpmeta>"#,
        cropped.0, cropped.1, full.0, full.1, offset.0, offset.1
    )
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

/// A real `width`×`height` JPEG with `segments` inserted right after SOI.
pub fn jpeg_with_segments(segments: &[Vec<u8>], width: u32, height: u32) -> Vec<u8> {
    let encoded = encode(width, height, ImageFormat::Jpeg);
    let mut out = encoded[..2].to_vec();
    for segment in segments {
        out.extend_from_slice(segment);
    }
    out.extend_from_slice(&encoded[2..]);
    out
}

/// 8×4 JPEG with optional orientation and EXIF pixel dimensions.
pub fn camera_jpeg(orientation: Option<u16>, pixels: Option<(u32, u32)>) -> Vec<u8> {
    if orientation.is_none() && pixels.is_none() {
        return jpeg_with_segments(&[], 8, 4);
    }
    let mut tiff = TiffBuilder::new(false).ascii(0x010F, "Acme VR");
    if let Some(orientation) = orientation {
        tiff = tiff.short(0x0112, orientation);
    }
    if let Some((x, y)) = pixels {
        tiff = tiff.exif_long(0xA002, x).exif_long(0xA003, y);
    }
    jpeg_with_segments(&[exif_app1(&tiff.build())], 8, 4)
}

/// 8×4 JPEG tagged as an equirectangular panorama.
pub fn pano_jpeg(full: (u32, u32), cropped: (u32, u32), offset: (u32, u32)) -> Vec<u8> {
    jpeg_with_segments(&[xmp_app1(&gpano_xmp(full, cropped, offset))], 8, 4)
}

// =========================================================================
// PNG chunks
// =========================================================================

/// A real PNG with extra chunks inserted after IHDR.
pub fn png_with_chunks(chunks: &[([u8; 4], Vec<u8>)], width: u32, height: u32) -> Vec<u8> {
    let encoded = encode(width, height, ImageFormat::Png);
    // Signature (8) + IHDR (4 length + 4 type + 13 data + 4 CRC)
    let ihdr_end = 8 + 25;
    let mut out = encoded[..ihdr_end].to_vec();
    for (kind, data) in chunks {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        let mut typed = kind.to_vec();
        typed.extend_from_slice(data);
        out.extend_from_slice(&typed);
        out.extend_from_slice(&crc32fast::hash(&typed).to_be_bytes());
    }
    out.extend_from_slice(&encoded[ihdr_end..]);
    out
}

// =========================================================================
// Mock fetcher
// =========================================================================

/// Serves canned bytes by URL; unknown URLs answer HTTP 404.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, Vec<u8>>,
    requested: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), bytes);
        self
    }

    /// Every URL fetched so far, in request order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ByteFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Blob, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .map(|bytes| Blob::from(bytes.clone()))
            .ok_or(FetchError::Status(404))
    }
}
