use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub assistant: AssistantConfig,
    pub data: DataConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Base URL of the object storage HTTP surface.
    pub base_url: String,
    /// Session identifier scoping all bucket paths for this deployment.
    pub session_id: String,
    pub papers_bucket: String,
    pub papers_json_bucket: String,
    pub extracted_images_bucket: String,
    pub segmentation_bucket: String,
    /// Name of the env var holding the bearer token used for uploads.
    pub upload_token_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AssistantConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Name of the env var holding the API key.
    pub api_key_env: String,
    pub anthropic_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub dir: String,
    pub db_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_pdf_size_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://storage.googleapis.com".to_string(),
            session_id: "eb9db0ca54e94dbc82cffdab497cde13".to_string(),
            papers_bucket: "papers-diatoms".to_string(),
            papers_json_bucket: "papers-diatoms-jsons".to_string(),
            extracted_images_bucket: "papers-extracted-images-bucket-mmm".to_string(),
            segmentation_bucket: "papers-diatoms-segmentation".to_string(),
            upload_token_env: "STORAGE_UPLOAD_TOKEN".to_string(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 8092,
            api_key_env: "CLAUDE_API_KEY".to_string(),
            anthropic_version: "2023-06-01".to_string(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: "data".to_string(),
            db_url: "sqlite://data/atlas.db".to_string(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_pdf_size_mb: 100,
        }
    }
}

impl StorageConfig {
    /// Public URL of the canonical papers document for this session.
    pub fn papers_document_url(&self) -> String {
        format!(
            "{}/{}/jsons_from_pdfs/{}/{}.json",
            self.base_url, self.papers_json_bucket, self.session_id, self.session_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_url_layout() {
        let storage = StorageConfig::default();
        assert_eq!(
            storage.papers_document_url(),
            "https://storage.googleapis.com/papers-diatoms-jsons/jsons_from_pdfs/\
             eb9db0ca54e94dbc82cffdab497cde13/eb9db0ca54e94dbc82cffdab497cde13.json"
        );
    }

    #[test]
    fn config_defaults_fill_missing_sections() {
        let config: Config = toml::from_str("[server]\nbind = \"127.0.0.1\"\nport = 9000\n")
            .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.limits.max_pdf_size_mb, 100);
    }
}
