mod environment;
mod settings;

pub use environment::{ENVIRONMENT_VAR, Environment};
pub use settings::{
    AnalysisSettings, DatabaseSettings, JobSettings, JobStoreSetting, LlmProviderSetting,
    LlmSettings, LoggingSettings, SearchSettings, ServerSettings, Settings, SettingsError,
    StorageSettings, UnknownJobPolicy,
};
