//! # VR Gal
//!
//! Image acquisition and projection derivation for a stereoscopic VR photo
//! viewer. Given an image URL (or a left/right pair) and an optional
//! physical size, the loader produces a decoded, correctly oriented texture
//! and the geometry parameters needed to place it in a scene: either a flat
//! plane of known size, or a full sphere for equirectangular panoramas.
//!
//! # Architecture: One Pipeline per Image
//!
//! ```text
//! fetch  →  read_tags (128 KiB prefix)  →  decode  →  orient  →  classify
//!  url        EXIF + XMP GPano              pixels     rotation   plane / sphere
//! ```
//!
//! A stereo pair runs two of these concurrently, checks that both halves
//! have the same pixel size, and merges them into one result.
//!
//! Every stage is independent of the others:
//!
//! - **Fetching** sits behind the [`fetch::ByteFetcher`] trait, so tests run
//!   the whole pipeline against in-memory bytes.
//! - **Geometry** is a set of pure functions from tags and a requested size
//!   to a [`types::Projection`].
//! - **Failures** are terminal: each load returns the first error with the
//!   URL it concerns and never caches or retries.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`fetch`] | `ByteFetcher` trait, HTTP/file implementation |
//! | [`imaging`] | EXIF/XMP parsing, decoding, orientation, projection math |
//! | [`load`] | Mono and stereo orchestration, `LoadError` taxonomy |
//! | [`gallery`] | Manifest of requests loaded into a navigable sequence |
//! | [`config`] | `config.toml` loading, validation, stock defaults |
//! | [`types`] | Requests and results shared by every module |
//! | [`output`] | CLI output formatting |

pub mod config;
pub mod fetch;
pub mod gallery;
pub mod imaging;
pub mod load;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
