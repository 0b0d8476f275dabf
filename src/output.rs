//! CLI output formatting for load results and galleries.
//!
//! # Output Format
//!
//! ## Single image
//!
//! ```text
//! photos/harbour.jpg
//!     Plane: 4.000 x 2.000
//!     Texture: 4000x2000, rotation 0.000, clamp_to_edge
//! ```
//!
//! ## Stereo pair
//!
//! ```text
//! left.jpg | right.jpg
//!     Sphere: repeat 2.000 x 2.000, offset -0.125, -0.875
//!     Left: 4096x2048, rotation 0.000, clamp_to_edge
//!     Right: 4096x2048, rotation 0.000, clamp_to_edge
//! ```
//!
//! ## Gallery
//!
//! ```text
//! 001 photos/harbour.jpg
//!     Plane: 4.000 x 2.000
//!     Texture: 4000x2000, rotation 0.000, clamp_to_edge
//! 002 left.jpg | right.jpg
//!     ...
//!
//! Loaded 2 entries (1 stereo, 1 sphere)
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::gallery::Gallery;
use crate::imaging::{TextureDescriptor, TextureWrap};
use crate::types::{ImageSource, LoadResult, Projection, Textures};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn source_line(source: &ImageSource) -> String {
    match source {
        ImageSource::Mono(url) => url.clone(),
        ImageSource::Stereo { left, right } => format!("{} | {}", left, right),
    }
}

fn projection_line(projection: &Projection) -> String {
    match *projection {
        Projection::Plane { width, height } => format!("Plane: {:.3} x {:.3}", width, height),
        Projection::Sphere {
            repeat_x,
            repeat_y,
            offset_x,
            offset_y,
        } => format!(
            "Sphere: repeat {:.3} x {:.3}, offset {:.3}, {:.3}",
            repeat_x, repeat_y, offset_x, offset_y
        ),
    }
}

fn texture_line(label: &str, texture: &TextureDescriptor) -> String {
    let wrap = match texture.wrap {
        TextureWrap::ClampToEdge => "clamp_to_edge",
        TextureWrap::Repeat => "repeat",
    };
    format!(
        "{}: {}x{}, rotation {:.3}, {}",
        label, texture.width, texture.height, texture.rotation, wrap
    )
}

/// Detail lines for one result, indented one level.
fn result_details(result: &LoadResult) -> Vec<String> {
    let mut lines = vec![format!("    {}", projection_line(&result.projection))];
    match &result.textures {
        Textures::Mono(texture) => {
            lines.push(format!("    {}", texture_line("Texture", &texture.descriptor())));
        }
        Textures::Stereo { left, right } => {
            lines.push(format!("    {}", texture_line("Left", &left.descriptor())));
            lines.push(format!("    {}", texture_line("Right", &right.descriptor())));
        }
    }
    lines
}

// ============================================================================
// Single result
// ============================================================================

/// Format a single load result as display lines.
pub fn format_load_result(result: &LoadResult) -> Vec<String> {
    let mut lines = vec![source_line(&result.source.image)];
    lines.extend(result_details(result));
    lines
}

/// Print a single load result to stdout.
pub fn print_load_result(result: &LoadResult) {
    for line in format_load_result(result) {
        println!("{}", line);
    }
}

// ============================================================================
// Gallery
// ============================================================================

/// Format every gallery entry in order, followed by a summary line.
pub fn format_gallery(gallery: &Gallery) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, entry) in gallery.entries().iter().enumerate() {
        lines.push(format!(
            "{} {}",
            format_index(i + 1),
            source_line(&entry.source.image)
        ));
        lines.extend(result_details(entry));
    }

    let stereo = gallery.entries().iter().filter(|e| e.is_stereo()).count();
    let sphere = gallery
        .entries()
        .iter()
        .filter(|e| e.projection.is_sphere())
        .count();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Loaded {} entries ({} stereo, {} sphere)",
        gallery.len(),
        stereo,
        sphere
    ));
    lines
}

/// Print a gallery to stdout.
pub fn print_gallery(gallery: &Gallery) {
    for line in format_gallery(gallery) {
        println!("{}", line);
    }
}
