//! The loading pipeline: request → [`LoadResult`].
//!
//! ```text
//! load(request)
//!   ├─ mono:   load_texture(url) → classify
//!   └─ stereo: load_texture(left) ┐
//!              load_texture(right)┴─ join → size check → classify both → pick one
//!
//! load_texture(url) = fetch → read_tags(prefix) → decode → normalize
//! ```
//!
//! Every step is terminal on failure: the first error ends the load and is
//! returned with the URL it concerns. Nothing is retried, cached or logged
//! and dropped.
//!
//! ## Stereo pairs
//!
//! Both halves load concurrently and must both succeed. Their native pixel
//! size (EXIF `PixelXDimension`/`PixelYDimension`, or the decoded size when a
//! half carries no such tags) must match, and so must their decoded sizes.
//! Geometry is computed for both halves, and [`StereoGeometrySource`] decides
//! which one the result carries.

use crate::config::{LoaderConfig, StereoGeometrySource};
use crate::fetch::{ByteFetcher, FetchError, HttpFetcher};
use crate::imaging::{
    DecodeError, DecodedImage, GeometryError, MetadataError, MissingDimensions, RequestedSize,
    TagSet, classify, decode, normalize, read_tags,
};
use crate::types::{ImageRequest, ImageSource, LoadResult, Projection, Textures};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to fetch {url}: {cause}")]
    Network {
        url: String,
        #[source]
        cause: FetchError,
    },
    #[error("failed to read metadata from {url}: {cause}")]
    MetadataParse {
        url: String,
        #[source]
        cause: MetadataError,
    },
    #[error("failed to decode {url}: {cause}")]
    Decode {
        url: String,
        #[source]
        cause: DecodeError,
    },
    #[error("{url} is an equirectangular panorama but has no usable {tag} tag")]
    MissingPanoramaMetadata { url: String, tag: &'static str },
    #[error("cannot size plane for {url}: {reason}")]
    MissingDimensions {
        url: String,
        reason: MissingDimensions,
    },
    #[error("mismatching stereo pair sizes: left {left}, right {right}")]
    DimensionMismatch { left: PairSide, right: PairSide },
}

/// Category of a [`LoadError`], for callers deciding whether to skip or halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    MetadataParse,
    Decode,
    MissingPanoramaMetadata,
    MissingDimensions,
    DimensionMismatch,
}

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::Network { .. } => ErrorKind::Network,
            LoadError::MetadataParse { .. } => ErrorKind::MetadataParse,
            LoadError::Decode { .. } => ErrorKind::Decode,
            LoadError::MissingPanoramaMetadata { .. } => ErrorKind::MissingPanoramaMetadata,
            LoadError::MissingDimensions { .. } => ErrorKind::MissingDimensions,
            LoadError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
        }
    }

    fn geometry(url: &str, err: GeometryError) -> Self {
        match err {
            GeometryError::MissingPanoramaTag(tag) => LoadError::MissingPanoramaMetadata {
                url: url.to_string(),
                tag,
            },
            GeometryError::MissingDimensions(reason) => LoadError::MissingDimensions {
                url: url.to_string(),
                reason,
            },
        }
    }
}

/// One half of a stereo pair, as reported in a size mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSide {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for PairSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}x{})", self.url, self.width, self.height)
    }
}

/// A fetched, decoded and oriented image with its tags.
struct LoadedTexture {
    url: String,
    texture: DecodedImage,
    tags: TagSet,
}

impl LoadedTexture {
    /// Native pixel size: EXIF tags first, decoded size as fallback.
    fn pixel_size(&self) -> (u32, u32) {
        self.tags
            .pixel_dimensions()
            .unwrap_or_else(|| self.texture.dimensions())
    }

    fn side(&self, (width, height): (u32, u32)) -> PairSide {
        PairSide {
            url: self.url.clone(),
            width,
            height,
        }
    }

    fn geometry(&self, size: RequestedSize) -> Result<Projection, LoadError> {
        classify(&self.tags, size).map_err(|e| LoadError::geometry(&self.url, e))
    }
}

async fn load_texture<F: ByteFetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    config: &LoaderConfig,
) -> Result<LoadedTexture, LoadError> {
    let blob = fetcher
        .fetch(url)
        .await
        .map_err(|cause| LoadError::Network {
            url: url.to_string(),
            cause,
        })?;

    let tags = read_tags(blob.as_bytes(), config.metadata.prefix_bytes).map_err(|cause| {
        LoadError::MetadataParse {
            url: url.to_string(),
            cause,
        }
    })?;
    tracing::debug!(url, tags = tags.len(), "metadata read");

    let mut texture = decode(&blob).await.map_err(|cause| LoadError::Decode {
        url: url.to_string(),
        cause,
    })?;
    normalize(&mut texture, &tags);

    Ok(LoadedTexture {
        url: url.to_string(),
        texture,
        tags,
    })
}

/// Load a single image.
pub async fn load_mono<F: ByteFetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    size: RequestedSize,
    config: &LoaderConfig,
) -> Result<LoadResult, LoadError> {
    let loaded = load_texture(fetcher, url, config).await?;
    let projection = loaded.geometry(size)?;

    Ok(LoadResult {
        projection,
        textures: Textures::Mono(loaded.texture),
        source: ImageRequest {
            image: ImageSource::Mono(url.to_string()),
            width: size.width,
            height: size.height,
        },
    })
}

/// Load a stereo pair.
///
/// Both halves are fetched and decoded concurrently; if either fails, that
/// error is returned and the other half is dropped.
pub async fn load_stereo<F: ByteFetcher + ?Sized>(
    fetcher: &F,
    left_url: &str,
    right_url: &str,
    size: RequestedSize,
    config: &LoaderConfig,
) -> Result<LoadResult, LoadError> {
    let (left, right) = tokio::try_join!(
        load_texture(fetcher, left_url, config),
        load_texture(fetcher, right_url, config),
    )?;

    check_pair_sizes(&left, &right)?;

    let left_projection = left.geometry(size)?;
    let right_projection = right.geometry(size)?;
    let projection = match config.stereo.geometry_source {
        StereoGeometrySource::Left => left_projection,
        StereoGeometrySource::Right => right_projection,
    };

    Ok(LoadResult {
        projection,
        textures: Textures::Stereo {
            left: left.texture,
            right: right.texture,
        },
        source: ImageRequest {
            image: ImageSource::Stereo {
                left: left_url.to_string(),
                right: right_url.to_string(),
            },
            width: size.width,
            height: size.height,
        },
    })
}

/// Tagged sizes are compared first, then the decoded surfaces. A mismatch
/// reports the sizes that disagree.
fn check_pair_sizes(left: &LoadedTexture, right: &LoadedTexture) -> Result<(), LoadError> {
    let tagged = (left.pixel_size(), right.pixel_size());
    let decoded = (left.texture.dimensions(), right.texture.dimensions());
    let mismatch = [tagged, decoded].into_iter().find(|(l, r)| l != r);

    match mismatch {
        Some((l, r)) => Err(LoadError::DimensionMismatch {
            left: left.side(l),
            right: right.side(r),
        }),
        None => Ok(()),
    }
}

/// Load a request with a specific fetcher (allows testing with a mock).
#[tracing::instrument(
    skip_all,
    fields(stereo = matches!(request.image, ImageSource::Stereo { .. }))
)]
pub async fn load_with_fetcher<F: ByteFetcher + ?Sized>(
    fetcher: &F,
    request: &ImageRequest,
    config: &LoaderConfig,
) -> Result<LoadResult, LoadError> {
    let size = request.requested_size();
    match &request.image {
        ImageSource::Mono(url) => load_mono(fetcher, url, size, config).await,
        ImageSource::Stereo { left, right } => {
            load_stereo(fetcher, left, right, size, config).await
        }
    }
}

/// Load a request over HTTP / the local filesystem.
pub async fn load(request: &ImageRequest, config: &LoaderConfig) -> Result<LoadResult, LoadError> {
    let fetcher = HttpFetcher::from_config(&config.fetch);
    load_with_fetcher(&fetcher, request, config).await
}
