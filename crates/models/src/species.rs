use serde::{Deserialize, Serialize};

/// Structured paper metadata extracted by the assistant (stage 1).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaperInfo {
    #[serde(default)]
    pub figure_caption: String,
    #[serde(default)]
    pub source_material_location: String,
    #[serde(default)]
    pub source_material_coordinates: String,
    #[serde(default)]
    pub source_material_description: String,
    #[serde(default)]
    pub source_material_date_collected: String,
    #[serde(default)]
    pub source_material_received_from: String,
    #[serde(default)]
    pub source_material_date_received: String,
    #[serde(default)]
    pub source_material_note: String,
    #[serde(default)]
    pub paper_image_urls: Vec<String>,
    #[serde(default)]
    pub diatom_species_array: Vec<Species>,
}

/// One diatom species mention with its plate references.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Species {
    #[serde(default)]
    pub species_index: i64,
    #[serde(default)]
    pub species_name: String,
    #[serde(default)]
    pub species_authors: Vec<String>,
    #[serde(default)]
    pub species_year: Option<i64>,
    #[serde(default)]
    pub species_references: Vec<SpeciesReference>,
    #[serde(default)]
    pub formatted_species_name: String,
    #[serde(default)]
    pub genus: String,
    #[serde(default)]
    pub species_magnification: String,
    #[serde(default)]
    pub species_scale_bar_microns: String,
    #[serde(default)]
    pub species_note: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpeciesReference {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub figure: String,
}

/// Bibliographic citation for a source paper.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub journal_name: String,
    #[serde(default)]
    pub journal_volume: String,
    #[serde(default)]
    pub journal_issue: String,
    #[serde(default)]
    pub journal_pages: String,
    #[serde(default)]
    pub org_name: String,
    #[serde(default)]
    pub org_report_number: String,
    #[serde(default)]
    pub digital_doi: String,
    #[serde(default)]
    pub digital_url: String,
    #[serde(default)]
    pub formatted_citation: String,
}

impl Citation {
    /// Fallback citation used when no per-paper citation was extracted:
    /// the Stidolph Diatom Atlas, the corpus most papers come from.
    pub fn default_citation() -> Self {
        Citation {
            authors: vec![
                "S.R. Stidolph".to_string(),
                "F.A.S. Sterrenburg".to_string(),
                "K.E.L. Smith".to_string(),
                "A. Kraberg".to_string(),
            ],
            year: "2012".to_string(),
            title: "Stuart R. Stidolph Diatom Atlas".to_string(),
            kind: "report".to_string(),
            journal_name: String::new(),
            journal_volume: String::new(),
            journal_issue: String::new(),
            journal_pages: "199".to_string(),
            org_name: "U.S. Geological Survey".to_string(),
            org_report_number: "Open-File Report 2012-1163".to_string(),
            digital_doi: String::new(),
            digital_url: "http://pubs.usgs.gov/of/2012/1163/".to_string(),
            formatted_citation: "Stidolph, S.R., Sterrenburg, F.A.S., Smith, K.E.L., Kraberg, A., \
                2012, Stuart R. Stidolph Diatom Atlas: U.S. Geological Survey Open-File Report \
                2012-1163, 199 p., available at http://pubs.usgs.gov/of/2012/1163/"
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_tolerates_missing_fields() {
        let json = r#"{"species_index": 65, "species_name": "Diploneis bombus"}"#;
        let species: Species = serde_json::from_str(json).unwrap();
        assert_eq!(species.species_index, 65);
        assert!(species.species_references.is_empty());
        assert!(species.species_year.is_none());
    }

    #[test]
    fn citation_type_field_renames() {
        let citation = Citation::default_citation();
        let json = serde_json::to_value(&citation).unwrap();
        assert_eq!(json["type"], "report");
    }
}
