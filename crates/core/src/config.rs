//! Configuration management for docchat.
//!
//! Configuration is assembled from several sources, later ones winning:
//! - Built-in defaults
//! - The workspace config file (`.docchat/config.yaml`)
//! - Environment variables (`DOCCHAT_*`)
//! - Command-line flags
//!
//! The configuration is workspace-centric: indexes, per-dataset settings and
//! prompt overrides all live under `<workspace>/.docchat/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".docchat";

const KNOWN_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docchat/ and datasets/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Language model provider ("openai" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// API key for the language model provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    /// Provider endpoints and request limits
    pub llm: LlmSettings,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Query pipeline settings
    pub chat: ChatConfig,
}

/// Language model settings from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    pub providers: HashMap<String, ProviderConfig>,

    /// Deadline for a single model call. Calls are never retried.
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            request_timeout_secs: 60,
        }
    }
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        endpoint: Option<String>,
        model: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: Option<String>,
    },
}

impl ProviderConfig {
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAI { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAI { model, .. } | ProviderConfig::Ollama { model, .. } => {
                model.as_deref()
            }
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,

    /// Optional directory of static assets served next to the built-in UI
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            static_dir: None,
        }
    }
}

/// Settings for the question answering pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatConfig {
    /// Dataset whose index answers questions
    pub dataset: String,

    /// Number of chunks retrieved per question
    pub top_k: usize,

    /// Base URL relative documentation links are resolved against
    pub docs_base_url: String,

    /// Product name the model must not use
    pub avoid_term: Option<String>,

    /// Replacement for `avoid_term`
    pub preferred_term: Option<String>,

    /// Deadline for a single link reachability probe
    pub probe_timeout_ms: u64,

    /// Deadline for the whole link validation pass
    pub validation_deadline_ms: u64,

    /// Idle time after which a conversation is evicted
    pub session_ttl_secs: u64,

    /// Maximum number of live conversations
    pub max_sessions: usize,

    /// Oldest turns beyond this count are dropped from a conversation
    pub max_history_turns: Option<usize>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            dataset: "commerce-webapi".to_string(),
            top_k: 4,
            docs_base_url: "https://developer.adobe.com/commerce/webapi/".to_string(),
            avoid_term: Some("Magento".to_string()),
            preferred_term: Some("Adobe Commerce".to_string()),
            probe_timeout_ms: 5_000,
            validation_deadline_ms: 15_000,
            session_ttl_secs: 3_600,
            max_sessions: 1_000,
            max_history_turns: None,
        }
    }
}

impl ChatConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn validation_deadline(&self) -> Duration {
        Duration::from_millis(self.validation_deadline_ms)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConfigFile {
    provider: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    llm: Option<LlmSettings>,
    server: Option<ServerConfig>,
    chat: Option<ChatConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            llm: LlmSettings::default(),
            server: ServerConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `DOCCHAT_WORKSPACE`: Override workspace path
    /// - `DOCCHAT_CONFIG`: Path to config file
    /// - `DOCCHAT_PROVIDER`: Language model provider
    /// - `DOCCHAT_MODEL`: Model identifier
    /// - `DOCCHAT_API_KEY`: API key
    /// - `DOCCHAT_DATASET`: Dataset to answer from
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], but an explicit workspace or config file
    /// (from CLI flags) wins over the environment and decides which YAML
    /// file is merged.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace =
            workspace.or_else(|| std::env::var_os("DOCCHAT_WORKSPACE").map(PathBuf::from));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var_os("DOCCHAT_CONFIG").map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        match config.config_file.clone() {
            Some(path) if !path.exists() => {
                return Err(AppError::Config(format!("Config file not found: {:?}", path)));
            }
            Some(path) => config = config.merge_yaml(&path)?,
            None => {
                let default_path = config.state_dir().join("config.yaml");
                if default_path.exists() {
                    config = config.merge_yaml(&default_path)?;
                }
            }
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("DOCCHAT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("DOCCHAT_MODEL") {
            config.model = model;
        }

        if let Ok(dataset) = std::env::var("DOCCHAT_DATASET") {
            config.chat.dataset = dataset;
        }

        if let Ok(key) = std::env::var("DOCCHAT_API_KEY") {
            config.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self;

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(provider) = config_file.provider {
            result.provider = provider;
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }

        // An explicit top-level model wins over the provider entry's model
        match config_file.model {
            Some(model) => result.model = model,
            None => {
                if let Some(model) = result
                    .llm
                    .providers
                    .get(&result.provider)
                    .and_then(ProviderConfig::model)
                {
                    result.model = model.to_string();
                }
            }
        }

        if let Some(key) = config_file.api_key {
            result.api_key = Some(key);
        }

        if let Some(server) = config_file.server {
            result.server = server;
        }

        if let Some(chat) = config_file.chat {
            result.chat = chat;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over everything else.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        log_json: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if log_json {
            self.log_json = true;
        }

        self
    }

    /// Get the path to the .docchat directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .docchat directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Get a provider's configuration entry, if any.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.providers.get(provider)
    }

    /// Endpoint configured for a provider, if any.
    pub fn provider_endpoint(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(ProviderConfig::endpoint)
            .map(str::to_string)
    }

    /// Resolve the API key for a provider.
    ///
    /// Order: explicit key, the provider's `apiKeyEnv`, then `OPENAI_API_KEY`
    /// for the openai provider.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        if let Some(ProviderConfig::OpenAI { api_key_env, .. }) = self.get_provider_config(provider)
        {
            if let Ok(key) = std::env::var(api_key_env) {
                return Some(key);
            }
        }

        if provider == "openai" {
            return std::env::var("OPENAI_API_KEY").ok();
        }

        None
    }

    /// Deadline applied to every language model call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.request_timeout_secs)
    }

    /// Validate configuration before serving queries.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();

        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "openai" && self.resolve_api_key(provider).is_none() {
            return Err(AppError::Config(
                "No API key for provider openai. Set OPENAI_API_KEY or DOCCHAT_API_KEY"
                    .to_string(),
            ));
        }

        if self.chat.top_k == 0 {
            return Err(AppError::Config("chat.topK must be at least 1".to_string()));
        }

        if self.chat.probe_timeout_ms == 0 || self.chat.validation_deadline_ms == 0 {
            return Err(AppError::Config(
                "Link validation timeouts must be greater than zero".to_string(),
            ));
        }

        if self.llm.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "llm.requestTimeoutSecs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
