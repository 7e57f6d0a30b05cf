use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorServiceConfig {
    pub base_url: String,
    pub token: String,
    pub metric_type: String,
    pub database: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Upper bound, in characters, on the assembled context string.
    pub max_context_length: usize,
    /// Documents fetched for the initial (raw-question) search phase.
    pub default_top_k: usize,
    /// Documents fetched for the refined (draft-as-query) search phase.
    pub refine_top_k: usize,
    /// Documents kept after reranking.
    pub rerank_top_n: usize,
    /// Whether a relevance scorer is attached to the reranker at all.
    pub enable_reranker: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub draft_max_tokens: usize,
    pub answer_max_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    pub max_input_length: usize,
    pub sensitive_words: Vec<String>,
    /// Third defense layer over the model's raw reply.
    pub validate_output: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Retries after the first malformed structured-output attempt.
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub batch_size: usize,
    pub workers: usize,
    pub settle_delay_secs: u64,
    pub max_batch_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub vector: VectorServiceConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub guard: GuardConfig,
    pub evaluation: EvaluationConfig,
    pub ingest: IngestConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from the default config file path.
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            println!(
                "Warning: Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Override individual settings from the environment. Every knob of the
    /// external-service surface can be set without touching the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("VECTOR_DB_BASE_URL") {
            self.vector.base_url = value;
        }
        if let Ok(value) = std::env::var("VECTOR_DB_TOKEN") {
            self.vector.token = value;
        }
        if let Ok(value) = std::env::var("VECTOR_DB_NAME") {
            self.vector.database = value;
        }
        if let Ok(value) = std::env::var("DEFAULT_METRIC_TYPE") {
            self.vector.metric_type = value;
        }
        if let Ok(value) = std::env::var("MAX_CONTEXT_LENGTH") {
            if let Ok(parsed) = value.parse() {
                self.retrieval.max_context_length = parsed;
            }
        }
        if let Ok(value) = std::env::var("DEFAULT_TOP_K") {
            if let Ok(parsed) = value.parse() {
                self.retrieval.default_top_k = parsed;
            }
        }
        if let Ok(value) = std::env::var("RERANK_TOP_N") {
            if let Ok(parsed) = value.parse() {
                self.retrieval.rerank_top_n = parsed;
            }
        }
        if let Ok(value) = std::env::var("INGEST_SETTLE_SECS") {
            if let Ok(parsed) = value.parse() {
                self.ingest.settle_delay_secs = parsed;
            }
        }
        if let Ok(value) = std::env::var("INGEST_BATCH_SIZE") {
            if let Ok(parsed) = value.parse() {
                self.ingest.batch_size = parsed;
            }
        }
        if let Ok(value) = std::env::var("INGEST_WORKERS") {
            if let Ok(parsed) = value.parse() {
                self.ingest.workers = parsed;
            }
        }
    }

    /// Get the vector service base URL
    pub fn vector_base_url(&self) -> &str {
        &self.vector.base_url
    }

    /// Get the vector service database name
    pub fn vector_database(&self) -> &str {
        &self.vector.database
    }

    /// Get the similarity metric sent with search requests
    pub fn metric_type(&self) -> &str {
        &self.vector.metric_type
    }

    /// Get the per-request timeout for outbound calls, in seconds
    pub fn request_timeout_secs(&self) -> u64 {
        self.vector.request_timeout_secs
    }

    /// Get the maximum assembled-context length in characters
    pub fn max_context_length(&self) -> usize {
        self.retrieval.max_context_length
    }

    /// Get the initial-phase search result count
    pub fn default_top_k(&self) -> usize {
        self.retrieval.default_top_k
    }

    /// Get the refined-phase search result count
    pub fn refine_top_k(&self) -> usize {
        self.retrieval.refine_top_k
    }

    /// Get the reranker result count
    pub fn rerank_top_n(&self) -> usize {
        self.retrieval.rerank_top_n
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vector: VectorServiceConfig {
                base_url: "http://localhost:9002/api".to_string(),
                token: "dev-token".to_string(),
                metric_type: "cosine".to_string(),
                database: "guardrag".to_string(),
                request_timeout_secs: 30,
            },
            retrieval: RetrievalConfig {
                max_context_length: 2000,
                default_top_k: 3,
                refine_top_k: 5,
                rerank_top_n: 5,
                enable_reranker: true,
            },
            generation: GenerationConfig {
                draft_max_tokens: 256,
                answer_max_tokens: 1024,
            },
            guard: GuardConfig {
                max_input_length: 500,
                sensitive_words: vec![
                    "password".to_string(),
                    "secret key".to_string(),
                    "root".to_string(),
                    "admin".to_string(),
                    "drop database".to_string(),
                ],
                validate_output: true,
            },
            evaluation: EvaluationConfig { max_retries: 2 },
            ingest: IngestConfig {
                batch_size: 32,
                workers: 4,
                settle_delay_secs: 2,
                max_batch_retries: 2,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                backtrace: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.max_context_length(), 2000);
        assert_eq!(config.default_top_k(), 3);
        assert_eq!(config.refine_top_k(), 5);
        assert_eq!(config.guard.max_input_length, 500);
        assert!(!config.guard.sensitive_words.is_empty());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = AppConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.vector.base_url, config.vector.base_url);
        assert_eq!(parsed.retrieval.rerank_top_n, config.retrieval.rerank_top_n);
    }

    #[test]
    fn test_env_override_base_url() {
        std::env::set_var("VECTOR_DB_BASE_URL", "http://override:9100/api");
        let mut config = AppConfig::default();
        config.apply_env_overrides();
        std::env::remove_var("VECTOR_DB_BASE_URL");
        assert_eq!(config.vector.base_url, "http://override:9100/api");
    }
}
