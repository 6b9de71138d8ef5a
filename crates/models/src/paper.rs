use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::species::{Citation, PaperInfo};

/// One ingested paper and the labelling state of its plate image.
///
/// The canonical papers document in the JSON bucket is an array of these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paper {
    pub pdf_file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_256_hash: Option<String>,
    #[serde(default)]
    pub pdf_text_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_two_pages_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_info: Option<PaperInfo>,
    #[serde(default, deserialize_with = "diatoms_data_lenient")]
    pub diatoms_data: DiatomsData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub processed: bool,
}

/// The labelling record set for a single plate image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiatomsData {
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub image_width: String,
    #[serde(default)]
    pub image_height: String,
    #[serde(default)]
    pub info: Vec<LabelRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segmentation_indices_array: Vec<SegmentationRecord>,
}

/// One labelled specimen on a plate image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LabelRecord {
    #[serde(default)]
    pub label: Vec<String>,
    #[serde(default)]
    pub index: i64,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub bbox: String,
    #[serde(default)]
    pub yolo_bbox: String,
    #[serde(default)]
    pub segmentation: String,
    #[serde(default)]
    pub embeddings: String,
}

impl LabelRecord {
    /// Display label in the `"<index> <Formatted_species>"` convention.
    pub fn display_label(index: i64, formatted_species: &str) -> String {
        format!("{} {}", index, formatted_species)
    }
}

/// One segmentation polygon aligned (or pending alignment) with a label.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SegmentationRecord {
    pub index: i64,
    /// Class id in the segmentation file (0..4, see `atlas-segmentation`).
    pub label: i64,
    /// Normalized coordinates, space separated: "x0 y0 x1 y1 ...".
    #[serde(default)]
    pub segmentation_points: String,
    #[serde(default)]
    pub points_count: usize,
    #[serde(default)]
    pub denormalized_segmentation_points: String,
    #[serde(default)]
    pub denorm_points_bbox: String,
    #[serde(default)]
    pub bbox: String,
    #[serde(default)]
    pub yolo_bbox: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub overlap_ratio: f64,
}

/// Accepts `diatoms_data` both as an object and as a JSON-encoded string.
/// Older documents double-encode the field; we decode either form and
/// always serialize the object form back.
fn diatoms_data_lenient<'de, D>(deserializer: D) -> Result<DiatomsData, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Object(DiatomsData),
        Encoded(String),
    }

    match Lenient::deserialize(deserializer)? {
        Lenient::Object(data) => Ok(data),
        Lenient::Encoded(raw) => serde_json::from_str(&raw).map_err(serde::de::Error::custom),
    }
}

/// Listing entry for an object in a storage bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredObject {
    pub name: String,
    pub blob_name: String,
    /// Human readable size, e.g. "1.25 MB".
    pub size: String,
    pub updated: String,
    pub public_url: String,
}
