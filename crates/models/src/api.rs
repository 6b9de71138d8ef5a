use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::paper::{DiatomsData, LabelRecord};
use crate::species::Species;

/// One page of the labelling interface: the image at `current_index`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiatomsPage {
    pub current_index: usize,
    pub total_images: usize,
    pub data: DiatomsData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveLabelsRequest {
    #[serde(default)]
    pub image_index: usize,
    #[serde(default)]
    pub info: Vec<LabelRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveLabelsResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub saved_index: usize,
    pub document_url: String,
}

/// Request to ingest a paper by URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct IngestPaperRequest {
    pub pdf_url: String,
}

/// A label record proposed by the missing-species assistant, together
/// with the full species metadata it was derived from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProposedLabel {
    #[serde(flatten)]
    pub record: LabelRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_species_info: Option<Species>,
}

/// Parsed stage-3 assistant response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MissingSpeciesFindings {
    #[serde(default)]
    pub species_data: Vec<ProposedLabel>,
    #[serde(default)]
    pub labels_retrieved: Vec<String>,
    #[serde(default)]
    pub message: String,
}

/// Body served by `/api/diatom_list_assistant`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantFindingsResponse {
    pub labels: Vec<String>,
    pub pdf_text_content: String,
    pub species_data: Vec<ProposedLabel>,
    pub labels_retrieved: Vec<String>,
    pub message: String,
    pub data_saved: bool,
}
