//! Prompt construction for the three extraction stages. Every stage
//! demands a pure-JSON reply; parsing is strict on the client side.

use serde::Serialize;
use serde_json::json;

/// One message in a Messages API request.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: &'static str,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text",
            text: text.into(),
        }
    }
}

fn user_message(blocks: Vec<ContentBlock>) -> Vec<Message> {
    vec![Message {
        role: "user",
        content: blocks,
    }]
}

/// Stage 0: citation extraction from the first pages of a paper.
pub fn citation_prompt() -> String {
    r#"Please analyze the provided paper information to extract citation details.
Return the data in the following JSON structure, maintaining strict adherence to the schema:

{
    "authors": ["List of authors in citation format"],
    "year": "Publication year as string",
    "title": "Full title of the work",
    "type": "article/report/book/chapter",
    "journal_name": "Full journal name",
    "journal_volume": "Volume number as string",
    "journal_issue": "Issue number as string",
    "journal_pages": "Page range or total pages as string",
    "org_name": "Publishing institution/organization",
    "org_report_number": "Report ID/number",
    "digital_doi": "Digital Object Identifier if available",
    "digital_url": "Direct URL to publication",
    "formatted_citation": "Complete formatted citation string"
}

Important instructions:
1. Extract all information exactly as presented in the source text
2. Use proper citation formatting for author names (Last, First M.)
3. Leave empty strings for missing information rather than omitting fields
4. Ensure all JSON fields are properly quoted and formatted
5. Verify URLs are complete and valid
6. Follow standard citation formatting guidelines

Parse the provided information and return only the JSON object without any additional text or explanation."#
        .to_string()
}

/// Stage 1: paper metadata and the complete species list from PDF text.
pub fn paper_info_prompt() -> String {
    r#"Please analyze the provided text in detail and extract ALL information about marine diatoms.
Pay special attention to extracting every single diatom species mentioned.
Return the data in the following JSON structure, maintaining strict adherence to the schema:

{
    "figure_caption": "Plate 3: Marine Diatoms from the Azores",
    "source_material_location": "South East coast of Faial, Caldeira Inferno",
    "source_material_coordinates": "38° 31' N; 28° 38' W",
    "source_material_description": "An open crater of a small volcano, shallow and sandy. Gathered from Pinna (molluscs) and stones.",
    "source_material_date_collected": "June 1st, 1981",
    "source_material_received_from": "Hans van den Heuvel, Leiden",
    "source_material_date_received": "March 17th, 1988",
    "source_material_note": "Material also deposited in Rijksherbarium Leiden, the Netherlands.",
    "paper_image_urls": ["Array of image URLs from the paper"],
    "diatom_species_array": [
        {
            "species_index": 65,
            "species_name": "Diploneis bombus",
            "species_authors": ["Cleve-Euler", "Backman"],
            "species_year": 1922,
            "species_references": [
                {
                    "author": "Hendey",
                    "year": 1964,
                    "figure": "pl. 32, fig. 2"
                }
            ],
            "formatted_species_name": "Diploneis_bombus",
            "genus": "Diploneis",
            "species_magnification": "1000",
            "species_scale_bar_microns": "30",
            "species_note": ""
        }
    ]
}

CRITICAL INSTRUCTIONS:
1. Extract EVERY SINGLE diatom species mentioned in the text
2. Do not skip any species even if they seem similar or repeated
3. Include all species details including indices, names, authors, and references
4. Maintain proper formatting for scientific names
5. Process the entire text thoroughly to find all species mentions
6. Generate formatted_species_name by replacing spaces with underscores
7. Leave empty strings for missing information rather than omitting fields
8. Parse numbers as integers where appropriate (species_index, year, etc.)
9. Look for species information in figures, plates, descriptions, and footnotes

Review the text multiple times to ensure no species are missed. Parse the provided text and return only the JSON object without any additional text or explanation."#
        .to_string()
}

/// Stage 2: per-image diatoms_data construction from paper info.
pub fn diatoms_data_prompt() -> String {
    r#"Please analyze the provided paper information and image URLs to extract information about diatoms.
Return the data in the following JSON structure, maintaining strict adherence to the schema:

{
    "diatoms_data": [
        {
            "image_url": "URL from paper_image_urls",
            "image_width": "",
            "image_height": "",
            "info": [
                {
                    "label": ["39 Amphora_obtusa_var_oceanica"],
                    "index": 39,
                    "species": "Amphora_obtusa_var_oceanica",
                    "bbox": "",
                    "yolo_bbox": "",
                    "segmentation": "",
                    "embeddings": ""
                }
            ]
        }
    ]
}

Important instructions:
1. Create a diatoms_data entry for each image URL in paper_image_urls
2. For each image, include ALL species from the diatom_species_array
3. Use species_index and formatted_species_name to create the label and species fields
4. Ensure image_url is properly set from paper_image_urls
5. Leave empty strings for missing information rather than omitting fields
6. Ensure all JSON fields are properly quoted and formatted

Parse the provided information and return only the JSON object without any additional text or explanation."#
        .to_string()
}

/// Messages for stage 0/1: the raw text followed by the instructions.
pub fn text_with_prompt_messages(text: &str, prompt: &str) -> Vec<Message> {
    user_message(vec![
        ContentBlock::text(text),
        ContentBlock::text(prompt),
    ])
}

/// Messages for stage 2: paper info and image URLs as JSON, then the
/// instructions.
pub fn diatoms_data_messages(
    paper_info: &atlas_models::PaperInfo,
    image_urls: &[String],
) -> Vec<Message> {
    let info_json = serde_json::to_string_pretty(paper_info).unwrap_or_default();
    let urls_json = serde_json::to_string_pretty(image_urls).unwrap_or_default();
    user_message(vec![
        ContentBlock::text(format!("Paper Information: {info_json}")),
        ContentBlock::text(format!("Image URLs: {urls_json}")),
        ContentBlock::text(diatoms_data_prompt()),
    ])
}

/// Stage 3: find species present in the paper text but absent from the
/// current label list.
pub fn missing_species_messages(pdf_text_content: &str, labels: &[String]) -> Vec<Message> {
    let labels_json = serde_json::to_string(labels).unwrap_or_else(|_| "[]".to_string());
    let prompt = format!(
        r#"You are a JSON API that can only respond with valid JSON. Never include explanations or text outside the JSON structure.

TASK:
Analyze the provided PDF text content and identify species that are NOT in the current labels list.

CURRENT LABELS:
{labels_json}

REQUIRED RESPONSE FORMAT:
Return ONLY a JSON object with this exact structure - no other text or explanation:
{{
    "species_data": [
        {{
            "label": ["<index> <formatted_species_name> eg 10 Lyrella_spectabilis"],
            "index": <number>,
            "species": "<formatted_species_name> eg Lyrella_spectabilis",
            "bbox": "",
            "yolo_bbox": "",
            "segmentation": "",
            "embeddings": "",
            "full_species_info": {{
                "species_index": <number>,
                "species_name": "<name> eg Lyrella spectabilis",
                "species_authors": ["<author1>", "<author2>"],
                "species_year": <year>,
                "species_references": [
                    {{
                        "author": "<author>",
                        "year": <year>,
                        "figure": "<figure>"
                    }}
                ],
                "formatted_species_name": "<name_with_underscores> eg Lyrella_spectabilis",
                "genus": "<genus>",
                "species_magnification": "<magnification> eg 1000",
                "species_scale_bar_microns": "<scale> eg 10",
                "species_note": "<success/failure message>"
            }}
        }}
    ],
    "labels_retrieved": ["<index> <formatted_species_name>","<index> <formatted_species_name>"],
    "message": "<success_or_failure_message>"
}}

RULES:
1. Return ONLY valid JSON - no markdown, no explanation, no other text
2. Include ONLY species NOT present in current labels
3. Format species names with underscores instead of spaces
4. Include ALL fields in the structure, using empty strings for missing data
5. If no new species found, return empty arrays with appropriate message
6. Species index must match the index in the original text
7. Label format must be exactly: "<index> <formatted_species_name>"

YOUR RESPONSE MUST BE PURE JSON"#
    );

    user_message(vec![ContentBlock::text(format!(
        "{pdf_text_content}\n\n{prompt}"
    ))])
}

/// JSON view of a message array, for request bodies and assertions.
pub fn messages_to_json(messages: &[Message]) -> serde_json::Value {
    json!(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage1_messages_carry_text_then_prompt() {
        let messages = text_with_prompt_messages("PDF TEXT HERE", &paper_info_prompt());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content.len(), 2);
        assert_eq!(messages[0].content[0].text, "PDF TEXT HERE");
        assert!(messages[0].content[1].text.contains("diatom_species_array"));
    }

    #[test]
    fn stage3_embeds_current_labels() {
        let labels = vec!["14 Lyrella spectabilis".to_string()];
        let messages = missing_species_messages("text body", &labels);
        let text = &messages[0].content[0].text;
        assert!(text.starts_with("text body"));
        assert!(text.contains("14 Lyrella spectabilis"));
        assert!(text.contains("species_data"));
        assert!(text.contains("full_species_info"));
    }

    #[test]
    fn stage2_serializes_paper_info() {
        let mut info = atlas_models::PaperInfo::default();
        info.figure_caption = "Plate 3".to_string();
        let messages =
            diatoms_data_messages(&info, &["https://x/img1.jpeg".to_string()]);
        assert_eq!(messages[0].content.len(), 3);
        assert!(messages[0].content[0].text.contains("Plate 3"));
        assert!(messages[0].content[1].text.contains("img1.jpeg"));
    }

    #[test]
    fn message_json_shape() {
        let value = messages_to_json(&text_with_prompt_messages("t", "p"));
        assert_eq!(value[0]["role"], "user");
        assert_eq!(value[0]["content"][0]["type"], "text");
    }
}
