//! Configuration management for Veye.
//!
//! This module handles loading and merging configuration from multiple
//! sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (veye.yaml)
//!
//! Precedence: CLI flags > environment variables > YAML file > defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// behavior across commands: the event store location, the external
/// LLM endpoint, and the model identifiers used for extraction,
/// generation, and embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite event store
    pub db_path: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Base URL of the OpenAI-compatible inference endpoint
    pub api_base: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Model used for query-parameter extraction and message preprocessing
    pub extraction_model: String,

    /// Model used for grounded answer generation
    pub generation_model: String,

    /// Embedding model identifiers, tried in order until one succeeds
    pub embedding_models: Vec<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    store: Option<StoreSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
    #[serde(rename = "extractionModel")]
    extraction_model: Option<String>,
    #[serde(rename = "generationModel")]
    generation_model: Option<String>,
    #[serde(rename = "embeddingModels")]
    embedding_models: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("veye.db"),
            config_file: None,
            api_base: "https://router.huggingface.co/v1".to_string(),
            api_key_env: "HF_TOKEN".to_string(),
            extraction_model: "deepseek-ai/DeepSeek-V3".to_string(),
            generation_model: "openai/gpt-oss-120b".to_string(),
            embedding_models: vec![
                "BAAI/bge-m3".to_string(),
                "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            ],
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `VEYE_DB`: Path to the event store
    /// - `VEYE_CONFIG`: Path to config file
    /// - `VEYE_API_BASE`: Inference endpoint base URL
    /// - `VEYE_EXTRACTION_MODEL` / `VEYE_GENERATION_MODEL`: Model ids
    /// - `VEYE_EMBEDDING_MODELS`: Comma-separated embedding model ids
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(config_file) = std::env::var("VEYE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Load from YAML config file if it exists
        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("veye.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(db) = std::env::var("VEYE_DB") {
            config.db_path = PathBuf::from(db);
        }

        if let Ok(base) = std::env::var("VEYE_API_BASE") {
            config.api_base = base;
        }

        if let Ok(model) = std::env::var("VEYE_EXTRACTION_MODEL") {
            config.extraction_model = model;
        }

        if let Ok(model) = std::env::var("VEYE_GENERATION_MODEL") {
            config.generation_model = model;
        }

        if let Ok(models) = std::env::var("VEYE_EMBEDDING_MODELS") {
            let parsed: Vec<String> = models
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            if !parsed.is_empty() {
                config.embedding_models = parsed;
            }
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(store) = config_file.store {
            if let Some(path) = store.path {
                result.db_path = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(endpoint) = llm.endpoint {
                result.api_base = endpoint;
            }
            if let Some(env) = llm.api_key_env {
                result.api_key_env = env;
            }
            if let Some(model) = llm.extraction_model {
                result.extraction_model = model;
            }
            if let Some(model) = llm.generation_model {
                result.generation_model = model;
            }
            if let Some(models) = llm.embedding_models {
                if !models.is_empty() {
                    result.embedding_models = models;
                }
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded
    /// configuration, giving precedence to CLI flags over environment
    /// variables.
    pub fn with_overrides(
        mut self,
        db_path: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(db_path) = db_path {
            self.db_path = db_path;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve the API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> AppResult<String> {
        std::env::var(&self.api_key_env).map_err(|_| {
            AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.api_key_env
            ))
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AppResult<()> {
        if self.api_base.is_empty() {
            return Err(AppError::Config("api_base must not be empty".to_string()));
        }

        if self.embedding_models.is_empty() {
            return Err(AppError::Config(
                "at least one embedding model must be configured".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api_key_env, "HF_TOKEN");
        assert_eq!(config.extraction_model, "deepseek-ai/DeepSeek-V3");
        assert_eq!(config.generation_model, "openai/gpt-oss-120b");
        assert!(!config.embedding_models.is_empty());
        assert!(!config.verbose);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some(PathBuf::from("/tmp/test.db")),
            None,
            None,
            true,
            false,
        );

        assert_eq!(overridden.db_path, PathBuf::from("/tmp/test.db"));
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_empty_embedding_models() {
        let mut config = AppConfig::default();
        config.embedding_models.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("veye.yaml");
        std::fs::write(
            &path,
            "llm:\n  extractionModel: test-model\nstore:\n  path: /tmp/events.db\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        let merged = config.merge_yaml(&path).unwrap();
        assert_eq!(merged.extraction_model, "test-model");
        assert_eq!(merged.db_path, PathBuf::from("/tmp/events.db"));
    }
}
