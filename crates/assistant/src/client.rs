use async_trait::async_trait;
use atlas_models::{
    AssistantConfig, AtlasError, Citation, DiatomsData, MissingSpeciesFindings, PaperInfo,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::prompts::{
    citation_prompt, diatoms_data_messages, missing_species_messages, paper_info_prompt,
    text_with_prompt_messages, Message,
};

/// Transport seam for the Messages API: takes a message array, returns
/// the assistant's raw text reply. Tests swap in a canned transport.
#[async_trait]
pub trait AssistantTransport: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, AtlasError>;
}

/// HTTP transport against the Anthropic Messages API.
pub struct AnthropicTransport {
    client: reqwest::Client,
    config: AssistantConfig,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicTransport {
    pub fn new(client: reqwest::Client, config: AssistantConfig) -> Result<Self, AtlasError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| AtlasError::ConfigError {
            reason: format!("assistant API key env var {} is not set", config.api_key_env),
        })?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

#[async_trait]
impl AssistantTransport for AnthropicTransport {
    #[instrument(skip(self, messages))]
    async fn complete(&self, messages: &[Message]) -> Result<String, AtlasError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": messages,
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.config.anthropic_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| AtlasError::AssistantError {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(AtlasError::AssistantError {
                reason: format!("messages API returned {}", response.status()),
            });
        }

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| AtlasError::AssistantError {
                reason: format!("undecodable messages API response: {e}"),
            })?;

        let first = parsed
            .content
            .into_iter()
            .next()
            .ok_or_else(|| AtlasError::AssistantResponseInvalid {
                reason: "response carried no content blocks".to_string(),
            })?;
        debug!(chars = first.text.len(), "Assistant reply received");
        Ok(first.text)
    }
}

/// How to obtain a citation for an ingested paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationMethod {
    /// The built-in Stidolph Atlas citation.
    Default,
    /// Ask the assistant to read it off the first two pages.
    FromAssistant,
}

/// High level assistant operations over any transport.
pub struct Assistant {
    transport: Box<dyn AssistantTransport>,
}

impl Assistant {
    pub fn new(transport: Box<dyn AssistantTransport>) -> Self {
        Self { transport }
    }

    /// Runs a message exchange and parses the reply as strict JSON.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        messages: &[Message],
    ) -> Result<T, AtlasError> {
        let text = self.transport.complete(messages).await?;
        serde_json::from_str(&text).map_err(|e| AtlasError::AssistantResponseInvalid {
            reason: format!("reply is not the requested JSON shape: {e}"),
        })
    }

    /// Stage 1: paper metadata and species list from the paper text.
    #[instrument(skip(self, pdf_text_content))]
    pub async fn extract_paper_info(&self, pdf_text_content: &str) -> Result<PaperInfo, AtlasError> {
        let messages = text_with_prompt_messages(pdf_text_content, &paper_info_prompt());
        self.complete_json(&messages).await
    }

    /// Stage 2: per-image labelling records from paper info. The ingest
    /// pipeline builds these deterministically; this path exists for
    /// re-deriving records through the assistant.
    #[instrument(skip(self, paper_info, image_urls))]
    pub async fn extract_diatoms_data(
        &self,
        paper_info: &PaperInfo,
        image_urls: &[String],
    ) -> Result<Vec<DiatomsData>, AtlasError> {
        #[derive(Deserialize)]
        struct Reply {
            #[serde(default)]
            diatoms_data: Vec<DiatomsData>,
        }

        let messages = diatoms_data_messages(paper_info, image_urls);
        let reply: Reply = self.complete_json(&messages).await?;
        Ok(reply.diatoms_data)
    }

    /// Stage 3: species mentioned in the text but missing from `labels`.
    #[instrument(skip(self, pdf_text_content, labels))]
    pub async fn find_missing_species(
        &self,
        pdf_text_content: &str,
        labels: &[String],
    ) -> Result<MissingSpeciesFindings, AtlasError> {
        let messages = missing_species_messages(pdf_text_content, labels);
        self.complete_json(&messages).await
    }

    /// Stage 0: citation for a paper. The assistant path falls back to
    /// the default citation when the exchange fails.
    #[instrument(skip(self, first_two_pages))]
    pub async fn extract_citation(
        &self,
        first_two_pages: &str,
        method: CitationMethod,
    ) -> Citation {
        match method {
            CitationMethod::Default => Citation::default_citation(),
            CitationMethod::FromAssistant => {
                let messages = text_with_prompt_messages(first_two_pages, &citation_prompt());
                match self.complete_json::<Citation>(&messages).await {
                    Ok(citation) => citation,
                    Err(e) => {
                        warn!("Citation extraction failed, using default: {e}");
                        Citation::default_citation()
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(&'static str);

    #[async_trait]
    impl AssistantTransport for Canned {
        async fn complete(&self, _messages: &[Message]) -> Result<String, AtlasError> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl AssistantTransport for Failing {
        async fn complete(&self, _messages: &[Message]) -> Result<String, AtlasError> {
            Err(AtlasError::AssistantError {
                reason: "offline".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn paper_info_parses_from_reply() {
        let reply = r#"{
            "figure_caption": "Plate 3",
            "diatom_species_array": [
                {"species_index": 65, "species_name": "Diploneis bombus",
                 "formatted_species_name": "Diploneis_bombus", "genus": "Diploneis"}
            ]
        }"#;
        let assistant = Assistant::new(Box::new(Canned(reply)));
        let info = assistant.extract_paper_info("text").await.unwrap();
        assert_eq!(info.diatom_species_array.len(), 1);
        assert_eq!(
            info.diatom_species_array[0].formatted_species_name,
            "Diploneis_bombus"
        );
    }

    #[tokio::test]
    async fn non_json_reply_is_invalid_response() {
        let assistant = Assistant::new(Box::new(Canned("Sure! Here's the JSON you asked for")));
        let result = assistant.extract_paper_info("text").await;
        assert!(matches!(
            result,
            Err(AtlasError::AssistantResponseInvalid { .. })
        ));
    }

    #[tokio::test]
    async fn missing_species_parses_findings() {
        let reply = r#"{
            "species_data": [{
                "label": ["10 Lyrella_spectabilis"],
                "index": 10,
                "species": "Lyrella_spectabilis",
                "bbox": "", "yolo_bbox": "", "segmentation": "", "embeddings": "",
                "full_species_info": {"species_index": 10, "species_name": "Lyrella spectabilis"}
            }],
            "labels_retrieved": ["10 Lyrella_spectabilis"],
            "message": "found one missing species"
        }"#;
        let assistant = Assistant::new(Box::new(Canned(reply)));
        let findings = assistant
            .find_missing_species("text", &["1 Diploneis_bombus".to_string()])
            .await
            .unwrap();
        assert_eq!(findings.species_data.len(), 1);
        assert_eq!(findings.species_data[0].record.index, 10);
    }

    #[tokio::test]
    async fn diatoms_data_parses_per_image_records() {
        let reply = r#"{
            "diatoms_data": [{
                "image_url": "https://img/abc_image_0.jpeg",
                "image_width": "",
                "image_height": "",
                "info": [{
                    "label": ["39 Amphora_obtusa_var_oceanica"],
                    "index": 39,
                    "species": "Amphora_obtusa_var_oceanica",
                    "bbox": "", "yolo_bbox": "", "segmentation": "", "embeddings": ""
                }]
            }]
        }"#;
        let assistant = Assistant::new(Box::new(Canned(reply)));
        let data = assistant
            .extract_diatoms_data(
                &PaperInfo::default(),
                &["https://img/abc_image_0.jpeg".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].info[0].index, 39);
    }

    #[tokio::test]
    async fn citation_default_method_skips_transport() {
        let assistant = Assistant::new(Box::new(Failing));
        let citation = assistant.extract_citation("", CitationMethod::Default).await;
        assert_eq!(citation.year, "2012");
    }

    #[tokio::test]
    async fn citation_assistant_failure_falls_back() {
        let assistant = Assistant::new(Box::new(Failing));
        let citation = assistant
            .extract_citation("page text", CitationMethod::FromAssistant)
            .await;
        assert!(citation.formatted_citation.contains("Stidolph"));
    }
}
