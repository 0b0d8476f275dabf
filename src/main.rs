use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vr_gal::fetch::HttpFetcher;
use vr_gal::types::ImageRequest;
use vr_gal::{config, gallery, load, output};

/// Explicit plane size flags shared by `load` and `stereo`.
#[derive(clap::Args, Clone)]
struct SizeArgs {
    /// Plane width in scene units
    #[arg(long)]
    width: Option<f64>,

    /// Plane height in scene units
    #[arg(long)]
    height: Option<f64>,

    /// Print the result record as JSON
    #[arg(long)]
    json: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "vr-gal")]
#[command(about = "Load photos and panoramas for a VR viewer")]
#[command(long_about = "\
Load photos and panoramas for a VR viewer

Each image is fetched (http(s) URL, file:// URL or local path), its EXIF and
XMP metadata is read from the first 128 KiB, the pixels are decoded and the
EXIF orientation is applied. The result is either:

  plane    a flat rectangle; give --width and/or --height in scene units,
           a missing side follows the EXIF pixel aspect ratio
  sphere   an equirectangular panorama (XMP GPano:ProjectionType), mapped
           onto the full sphere from its GPano crop tags

Stereo pairs load both halves concurrently; their pixel sizes must match.

Gallery manifests are JSON arrays of requests:

  [
    { \"image\": \"harbour.jpg\", \"height\": 2.0 },
    { \"image\": { \"left\": \"l.jpg\", \"right\": \"r.jpg\" } }
  ]

Run 'vr-gal gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Log pipeline steps to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a single image
    Load {
        /// Image URL or path
        image: String,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Load a left/right stereo pair
    Stereo {
        /// Left-eye image URL or path
        left: String,
        /// Right-eye image URL or path
        right: String,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Load every entry of a gallery manifest
    Gallery {
        /// Path to the JSON manifest
        manifest: PathBuf,
        /// Print the result records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "vr_gal=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn with_size(mut request: ImageRequest, size: &SizeArgs) -> ImageRequest {
    request.width = size.width;
    request.height = size.height;
    request
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Load { image, size } => {
            let config = config::load_config(&cli.config_dir)?;
            let request = with_size(ImageRequest::mono(image), &size);
            let result = load::load(&request, &config).await?;
            if size.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::print_load_result(&result);
            }
        }
        Command::Stereo { left, right, size } => {
            let config = config::load_config(&cli.config_dir)?;
            let request = with_size(ImageRequest::stereo(left, right), &size);
            let result = load::load(&request, &config).await?;
            if size.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                output::print_load_result(&result);
            }
        }
        Command::Gallery { manifest, json } => {
            let config = config::load_config(&cli.config_dir)?;
            let requests = gallery::read_manifest(&manifest)?;
            let fetcher = Arc::new(HttpFetcher::from_config(&config.fetch));
            let loaded = gallery::load_gallery(fetcher, requests, &config).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(loaded.entries())?);
            } else {
                output::print_gallery(&loaded);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
