//! Typed metadata tag set.
//!
//! Tags are keyed by their conventional name (`Orientation`, `PixelXDimension`,
//! `ProjectionType`, ...) regardless of which block they came from, so EXIF
//! and XMP values land in one flat map. When both blocks carry the same name
//! the one inserted last wins; the parser inserts XMP after EXIF.

use std::collections::BTreeMap;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl TagValue {
    /// Integer view of the value.
    ///
    /// Floats convert only when they are whole numbers; text converts when it
    /// parses as an integer (XMP stores everything as text).
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TagValue::Integer(v) => Some(*v),
            TagValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            TagValue::Float(_) => None,
            TagValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret an XMP attribute or element body as the narrowest type.
    pub fn from_xmp(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            TagValue::Integer(v)
        } else if let Ok(v) = trimmed.parse::<f64>() {
            TagValue::Float(v)
        } else {
            TagValue::Text(trimmed.to_string())
        }
    }
}

/// Mapping from tag name to typed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSet {
    tags: BTreeMap<String, TagValue>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: TagValue) {
        self.tags.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&TagValue> {
        self.tags.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(TagValue::as_integer)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(TagValue::as_text)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// EXIF orientation (1–8 by convention, other values passed through).
    pub fn orientation(&self) -> Option<i64> {
        self.integer("Orientation")
    }

    /// Native pixel size from `PixelXDimension` / `PixelYDimension`.
    ///
    /// Both tags must be present and non-zero.
    pub fn pixel_dimensions(&self) -> Option<(u32, u32)> {
        let w = self.integer("PixelXDimension")?;
        let h = self.integer("PixelYDimension")?;
        let w = u32::try_from(w).ok().filter(|&w| w > 0)?;
        let h = u32::try_from(h).ok().filter(|&h| h > 0)?;
        Some((w, h))
    }
}

impl FromIterator<(String, TagValue)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (String, TagValue)>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}
