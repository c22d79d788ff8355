//! Raw API records and the row shapes they normalize into
//!
//! One raw record produces:
//! - one `ArtifactRow` (artifact_metadata)
//! - one `MediaRow` (artifact_media)
//! - zero or more `ColorRow`s (artifact_colors)
//!
//! Normalization is a straight field rename. Nothing is validated, folded
//! or deduplicated here. A field whose JSON type does not match decodes as
//! `None` instead of rejecting the record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// One object as returned by the collection API.
///
/// Only the fields that end up in a table are modeled; everything else in
/// the payload is ignored during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    #[serde(deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub culture: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub period: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub century: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub medium: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub dimensions: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub department: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub classification: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub accessionyear: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub accessionmethod: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub imagecount: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub mediacount: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub colorcount: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub rank: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub datebegin: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub dateend: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub colors: Option<Vec<RawColor>>,
}

/// A color annotation nested inside a raw record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawColor {
    #[serde(deserialize_with = "lenient")]
    pub color: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub spectrum: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub hue: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub percent: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub css3: Option<String>,
}

/// Decode a field, treating a value of the wrong type like a missing one
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Row for `artifact_metadata`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRow {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub culture: Option<String>,
    pub period: Option<String>,
    pub century: Option<String>,
    pub medium: Option<String>,
    pub dimensions: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub classification: Option<String>,
    pub accessionyear: Option<i64>,
    pub accessionmethod: Option<String>,
}

/// Row for `artifact_media`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRow {
    pub objectid: Option<i64>,
    pub imagecount: Option<i64>,
    pub mediacount: Option<i64>,
    pub colorcount: Option<i64>,
    pub rank: Option<f64>,
    pub datebegin: Option<i64>,
    pub dateend: Option<i64>,
}

/// Row for `artifact_colors`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRow {
    pub objectid: Option<i64>,
    pub color: Option<String>,
    pub spectrum: Option<String>,
    pub hue: Option<String>,
    pub percent: Option<f64>,
    pub css3: Option<String>,
}

impl RawRecord {
    /// Decode one element of a page's `records` array.
    ///
    /// Never fails: anything that is not an object becomes an empty record.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::warn!("Record is not an object, keeping it empty: {}", e);
            Self::default()
        })
    }

    /// Map the top-level attributes into a metadata row
    pub fn artifact_row(&self) -> ArtifactRow {
        ArtifactRow {
            id: self.id,
            title: self.title.clone(),
            culture: self.culture.clone(),
            period: self.period.clone(),
            century: self.century.clone(),
            medium: self.medium.clone(),
            dimensions: self.dimensions.clone(),
            description: self.description.clone(),
            department: self.department.clone(),
            classification: self.classification.clone(),
            accessionyear: self.accessionyear,
            accessionmethod: self.accessionmethod.clone(),
        }
    }

    /// Map the media statistics into a media row
    pub fn media_row(&self) -> MediaRow {
        MediaRow {
            objectid: self.id,
            imagecount: self.imagecount,
            mediacount: self.mediacount,
            colorcount: self.colorcount,
            rank: self.rank,
            datebegin: self.datebegin,
            dateend: self.dateend,
        }
    }

    /// One row per nested color entry, in payload order
    pub fn color_rows(&self) -> Vec<ColorRow> {
        self.colors
            .iter()
            .flatten()
            .map(|c| ColorRow {
                objectid: self.id,
                color: c.color.clone(),
                spectrum: c.spectrum.clone(),
                hue: c.hue.clone(),
                percent: c.percent,
                css3: c.css3.clone(),
            })
            .collect()
    }
}
