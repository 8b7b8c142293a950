use serde::Deserialize;

use crate::domain::corpus::ChunkingConfig;
use crate::domain::retrieval::RetrievalConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub corpus: CorpusConfig,
    pub retrieval: RetrievalConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Knowledge corpus location and chunking
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl CorpusConfig {
    pub fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig::new(self.chunk_size, self.chunk_overlap)
    }
}

/// Model provider wiring. Every field is optional in spirit: with no API
/// key the service runs fully degraded (lexical retrieval, snippet answers,
/// fail-open validation).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// API key for the OpenAI-compatible endpoint; absent means no
    /// generation, embedding or classification capability
    pub api_key: Option<String>,
    pub base_url: String,
    /// Default chat model; per-role overrides below
    pub chat_model: String,
    pub embedding_model: String,
    pub guardrail_model: Option<String>,
    pub judge_model: Option<String>,
    pub router_model: Option<String>,
    /// Alternative models tried in order when a validation model is
    /// unavailable
    pub fallback_models: Vec<String>,
    /// Bound on every external model call, in seconds
    pub timeout_secs: u64,
}

impl ProvidersConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    pub fn guardrail_model(&self) -> &str {
        self.guardrail_model.as_deref().unwrap_or(&self.chat_model)
    }

    pub fn judge_model(&self) -> &str {
        self.judge_model.as_deref().unwrap_or(&self.chat_model)
    }

    pub fn router_model(&self) -> &str {
        self.router_model.as_deref().unwrap_or(&self.chat_model)
    }

    /// Ordered, de-duplicated candidate list for one validator role:
    /// the preferred model first, then the configured alternatives
    pub fn validation_candidates(&self, preferred: &str) -> Vec<String> {
        let mut candidates = vec![preferred.to_string()];
        for model in &self.fallback_models {
            if !candidates.iter().any(|c| c == model) {
                candidates.push(model.clone());
            }
        }
        candidates
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: "data/corpus.json".to_string(),
            chunk_size: 700,
            chunk_overlap: 150,
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            guardrail_model: None,
            judge_model: None,
            router_model: None,
            fallback_models: vec!["gpt-4o-mini".to_string(), "gpt-4o".to_string()],
            timeout_secs: 20,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
