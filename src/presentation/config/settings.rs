use std::time::Duration;

use config::{Config, File};
use serde::Deserialize;

use crate::domain::AnalysisStage;

use super::Environment;

const GEMINI_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const SERPER_SEARCH_URL: &str = "https://google.serper.dev/search";
const MAX_RESULT_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub jobs: JobSettings,
    pub database: DatabaseSettings,
    pub llm: LlmSettings,
    pub search: SearchSettings,
    pub analysis: AnalysisSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub upload_dir: String,
    pub max_upload_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            upload_dir: "data".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
            allowed_content_types: vec![
                "application/pdf".to_string(),
                "application/octet-stream".to_string(),
                "text/plain".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStoreSetting {
    #[default]
    Memory,
    Postgres,
}

/// What `GET /status/{id}` answers for ids the store does not know, either
/// because they never existed or because their retention elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownJobPolicy {
    #[default]
    NotFound,
    Pending,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    pub store: JobStoreSetting,
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub result_ttl_secs: u64,
    /// `0` disables the limit.
    pub engine_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    pub unknown_job_policy: UnknownJobPolicy,
    pub delete_document_after_processing: bool,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            store: JobStoreSetting::Memory,
            worker_count: 2,
            queue_capacity: 256,
            result_ttl_secs: 3600,
            engine_timeout_secs: 900,
            sweep_interval_secs: 60,
            unknown_job_policy: UnknownJobPolicy::NotFound,
            delete_document_after_processing: false,
        }
    }
}

impl JobSettings {
    pub fn result_ttl(&self) -> chrono::Duration {
        i64::try_from(self.result_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn engine_timeout(&self) -> Option<Duration> {
        (self.engine_timeout_secs > 0).then(|| Duration::from_secs(self.engine_timeout_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderSetting {
    #[default]
    OpenaiCompatible,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProviderSetting,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProviderSetting::OpenaiCompatible,
            base_url: GEMINI_OPENAI_BASE_URL.to_string(),
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            max_tokens: 2048,
            temperature: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            endpoint: SERPER_SEARCH_URL.to_string(),
            max_results: 5,
        }
    }
}

impl SearchSettings {
    /// The key to use when search is switched on and a key is present.
    pub fn active_key(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub max_document_chars: usize,
    pub stages: Option<Vec<AnalysisStage>>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_document_chars: 60_000,
            stages: None,
        }
    }
}

impl AnalysisSettings {
    pub fn pipeline(&self) -> Vec<AnalysisStage> {
        self.stages
            .clone()
            .unwrap_or_else(AnalysisStage::default_pipeline)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info,findoc_analyzer=debug,tower_http=debug".to_string(),
            json_format: false,
        }
    }
}

impl Settings {
    /// Layers `appsettings.<env>.toml` (optional) under `APP_*` environment
    /// variables, `__` separating nested keys (`APP_JOBS__WORKER_COUNT=4`).
    /// Provider keys fall back to `GOOGLE_API_KEY` and `SERPER_API_KEY`.
    pub fn load(environment: Environment) -> Result<Self, SettingsError> {
        let configuration = Config::builder()
            .add_source(File::with_name(&environment.config_file()).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("storage.allowed_content_types")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = configuration.try_deserialize()?;
        settings.apply_key_fallbacks(
            std::env::var("GOOGLE_API_KEY").ok(),
            std::env::var("SERPER_API_KEY").ok(),
        );
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply_key_fallbacks(&mut self, llm_key: Option<String>, search_key: Option<String>) {
        if self.llm.api_key.is_empty() {
            if let Some(key) = llm_key {
                self.llm.api_key = key;
            }
        }
        if self.search.api_key.is_none() {
            self.search.api_key = search_key;
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.jobs.worker_count == 0 {
            return Err(SettingsError::Invalid(
                "jobs.worker_count must be at least 1".to_string(),
            ));
        }
        if self.jobs.queue_capacity == 0 {
            return Err(SettingsError::Invalid(
                "jobs.queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.jobs.result_ttl_secs == 0 {
            return Err(SettingsError::Invalid(
                "jobs.result_ttl_secs must be positive".to_string(),
            ));
        }
        if self.jobs.result_ttl_secs > MAX_RESULT_TTL_SECS {
            return Err(SettingsError::Invalid(format!(
                "jobs.result_ttl_secs must be at most {MAX_RESULT_TTL_SECS}"
            )));
        }
        if self.storage.max_upload_bytes == 0 {
            return Err(SettingsError::Invalid(
                "storage.max_upload_bytes must be positive".to_string(),
            ));
        }
        if self.analysis.stages.as_ref().is_some_and(Vec::is_empty) {
            return Err(SettingsError::Invalid(
                "analysis.stages must not be empty when set".to_string(),
            ));
        }
        if self.jobs.store == JobStoreSetting::Postgres && self.database.url.is_none() {
            return Err(SettingsError::Invalid(
                "database.url is required for the postgres job store".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
