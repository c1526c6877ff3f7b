//! Multi-tier TOML configuration for Seedbot.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > `~/.seedbot/config.toml` > defaults

use seedbot_types::{ConfigError, KnowledgeBase};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use seedbot_api::DEFAULT_BASE_URL as DEFAULT_API_BASE_URL;
pub use seedbot_retrieval::{DEFAULT_EMBEDDING_MODEL, DEFAULT_TOP_K};

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 15;
pub const DEFAULT_PINECONE_INDEX: &str = "seedworld-whitepaper-rag";
pub const DEFAULT_DOCUMENTS_DIR: &str = "./documents";
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// File name of the orders dataset inside the documents directory.
pub const ORDERS_FILE: &str = "order_details.csv";

/// Resolved configuration for a Seedbot process.
#[derive(Debug, Clone)]
pub struct SeedbotConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub knowledge: KnowledgeConfig,
    pub history: HistoryConfig,
    pub max_tool_iterations: usize,
    pub config_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    pub base: KnowledgeBase,
    pub embedding_model: String,
    pub top_k: usize,
    pub pinecone_host: Option<String>,
    pub pinecone_api_key: Option<String>,
    pub pinecone_index: String,
    pub documents_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl KnowledgeConfig {
    pub fn orders_path(&self) -> PathBuf {
        self.documents_dir.join(ORDERS_FILE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryConfig {
    pub max_sessions: Option<usize>,
    pub idle_ttl: Option<Duration>,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub knowledge: KnowledgeSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub agent: AgentSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_retries: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    pub base: Option<KnowledgeBase>,
    pub embedding_model: Option<String>,
    pub top_k: Option<usize>,
    pub pinecone_host: Option<String>,
    pub pinecone_api_key: Option<String>,
    pub pinecone_index: Option<String>,
    pub documents_dir: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySettings {
    pub max_sessions: Option<usize>,
    pub idle_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSettings {
    pub max_tool_iterations: Option<usize>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub knowledge_base: Option<KnowledgeBase>,
}

impl SeedbotConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Config file (~/.seedbot/config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join("config.toml"));
        Self::resolve(overrides, |key| std::env::var(key).ok(), settings, config_dir)
    }

    /// Resolve a configuration from explicit sources. `env` looks up
    /// environment variables.
    pub fn resolve(
        overrides: CliOverrides,
        env: impl Fn(&str) -> Option<String>,
        settings: SettingsFile,
        config_dir: PathBuf,
    ) -> Result<Self, ConfigError> {
        let SettingsFile {
            api,
            knowledge,
            history,
            agent,
        } = settings;

        let api_key = overrides
            .api_key
            .or_else(|| env("OPENAI_API_KEY"))
            .or(api.api_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingKey {
                key: "api_key (set OPENAI_API_KEY or add to ~/.seedbot/config.toml)".into(),
            })?;

        let api_base_url = env("OPENAI_BASE_URL")
            .or(api.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let model = overrides
            .model
            .or_else(|| env("SEEDBOT_MODEL"))
            .or(api.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let temperature = overrides
            .temperature
            .or(api.temperature)
            .unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: "temperature".into(),
                message: format!("{temperature} is outside 0.0..=2.0"),
            });
        }

        let request_timeout_secs = api
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs".into(),
                message: "must be greater than zero".into(),
            });
        }

        let base = match overrides.knowledge_base {
            Some(kb) => kb,
            None => match env("SEEDBOT_KNOWLEDGE_BASE") {
                Some(raw) => raw
                    .parse()
                    .map_err(|message| ConfigError::InvalidValue {
                        key: "knowledge.base".into(),
                        message,
                    })?,
                None => knowledge.base.unwrap_or_default(),
            },
        };

        let chunk_size = positive(
            "knowledge.chunk_size",
            knowledge.chunk_size,
            DEFAULT_CHUNK_SIZE,
        )?;
        // An unset overlap follows a small chunk_size down; an explicit one is validated.
        let chunk_overlap = knowledge
            .chunk_overlap
            .unwrap_or_else(|| DEFAULT_CHUNK_OVERLAP.min(chunk_size - 1));
        let knowledge = KnowledgeConfig {
            base,
            embedding_model: knowledge
                .embedding_model
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            top_k: positive("knowledge.top_k", knowledge.top_k, DEFAULT_TOP_K)?,
            pinecone_host: env("PINECONE_HOST").or(knowledge.pinecone_host),
            pinecone_api_key: env("PINECONE_API_KEY").or(knowledge.pinecone_api_key),
            pinecone_index: knowledge
                .pinecone_index
                .unwrap_or_else(|| DEFAULT_PINECONE_INDEX.to_string()),
            documents_dir: knowledge
                .documents_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENTS_DIR)),
            chunk_size,
            chunk_overlap,
        };
        if knowledge.chunk_overlap >= knowledge.chunk_size {
            return Err(ConfigError::InvalidValue {
                key: "knowledge.chunk_overlap".into(),
                message: "must be smaller than chunk_size".into(),
            });
        }
        if knowledge.base == KnowledgeBase::Whitepaper {
            if knowledge.pinecone_host.is_none() {
                return Err(ConfigError::MissingKey {
                    key: "knowledge.pinecone_host (set PINECONE_HOST)".into(),
                });
            }
            if knowledge.pinecone_api_key.is_none() {
                return Err(ConfigError::MissingKey {
                    key: "knowledge.pinecone_api_key (set PINECONE_API_KEY)".into(),
                });
            }
        }

        let history = HistoryConfig {
            max_sessions: match history.max_sessions {
                Some(0) => {
                    return Err(ConfigError::InvalidValue {
                        key: "history.max_sessions".into(),
                        message: "must be greater than zero".into(),
                    });
                }
                other => other,
            },
            idle_ttl: history.idle_ttl_secs.map(Duration::from_secs),
        };

        Ok(SeedbotConfig {
            api_key,
            api_base_url,
            model,
            temperature,
            max_tokens: api.max_tokens,
            max_retries: api.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            request_timeout: Duration::from_secs(request_timeout_secs),
            knowledge,
            history,
            max_tool_iterations: positive(
                "agent.max_tool_iterations",
                agent.max_tool_iterations,
                DEFAULT_MAX_TOOL_ITERATIONS,
            )?,
            config_dir,
        })
    }
}

fn positive(key: &str, value: Option<usize>, default: usize) -> Result<usize, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: "must be greater than zero".into(),
        }),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

/// Get the Seedbot config directory path (~/.seedbot/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SEEDBOT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".seedbot")
}

/// Read a settings file. A missing file is `Ok(None)`.
pub fn read_settings_file(path: &Path) -> Result<Option<SettingsFile>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            });
        }
    };
    toml::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Load and parse a TOML settings file, returning defaults on any error.
fn load_settings_file(path: &Path) -> SettingsFile {
    match read_settings_file(path) {
        Ok(settings) => settings.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("{e}; using defaults");
            SettingsFile::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn base_env() -> impl Fn(&str) -> Option<String> {
        env_of(&[
            ("OPENAI_API_KEY", "sk-env"),
            ("PINECONE_HOST", "idx.svc.pinecone.io"),
            ("PINECONE_API_KEY", "pc-env"),
        ])
    }

    fn resolve(
        overrides: CliOverrides,
        env: impl Fn(&str) -> Option<String>,
        settings: SettingsFile,
    ) -> Result<SeedbotConfig, ConfigError> {
        SeedbotConfig::resolve(overrides, env, settings, PathBuf::from("/tmp/seedbot"))
    }

    #[test]
    fn test_defaults() {
        let config = resolve(CliOverrides::default(), base_env(), SettingsFile::default()).unwrap();
        assert_eq!(config.api_key, "sk-env");
        assert_eq!(config.api_base_url, "https://api.openai.com");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.max_tool_iterations, 15);
        assert_eq!(config.knowledge.base, KnowledgeBase::Whitepaper);
        assert_eq!(config.knowledge.top_k, 4);
        assert_eq!(config.knowledge.pinecone_index, "seedworld-whitepaper-rag");
        assert_eq!(config.knowledge.embedding_model, "text-embedding-ada-002");
        assert_eq!(config.knowledge.chunk_size, 100_000);
        assert_eq!(config.knowledge.chunk_overlap, 200);
        assert_eq!(config.history, HistoryConfig::default());
    }

    #[test]
    fn test_settings_toml_parse() {
        let toml_str = r#"
[api]
model = "gpt-4o-mini"
temperature = 0.2

[knowledge]
base = "orders"
documents_dir = "/data/docs"

[history]
max_sessions = 100
idle_ttl_secs = 3600

[agent]
max_tool_iterations = 5
"#;
        let settings: SettingsFile = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.api.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(settings.knowledge.base, Some(KnowledgeBase::Orders));
        assert_eq!(settings.history.max_sessions, Some(100));

        let config = resolve(
            CliOverrides::default(),
            env_of(&[("OPENAI_API_KEY", "sk")]),
            settings,
        )
        .unwrap();
        assert_eq!(config.temperature, 0.2);
        assert_eq!(
            config.knowledge.orders_path(),
            PathBuf::from("/data/docs/order_details.csv")
        );
        assert_eq!(config.history.idle_ttl, Some(Duration::from_secs(3600)));
        assert_eq!(config.max_tool_iterations, 5);
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let mut settings = SettingsFile::default();
        settings.api.model = Some("file-model".into());
        settings.api.api_key = Some("sk-file".into());

        let config = resolve(CliOverrides::default(), base_env(), settings.clone()).unwrap();
        assert_eq!(config.api_key, "sk-env");
        assert_eq!(config.model, "file-model");

        let env = env_of(&[
            ("OPENAI_API_KEY", "sk-env"),
            ("SEEDBOT_MODEL", "env-model"),
            ("PINECONE_HOST", "h"),
            ("PINECONE_API_KEY", "k"),
        ]);
        let overrides = CliOverrides {
            api_key: Some("sk-cli".into()),
            ..Default::default()
        };
        let config = resolve(overrides, env, settings).unwrap();
        assert_eq!(config.api_key, "sk-cli");
        assert_eq!(config.model, "env-model");
    }

    #[test]
    fn test_missing_api_key() {
        let err = resolve(
            CliOverrides::default(),
            env_of(&[("PINECONE_HOST", "h"), ("PINECONE_API_KEY", "k")]),
            SettingsFile::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { ref key } if key.starts_with("api_key")));
    }

    #[test]
    fn test_whitepaper_requires_pinecone() {
        let err = resolve(
            CliOverrides::default(),
            env_of(&[("OPENAI_API_KEY", "sk")]),
            SettingsFile::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { ref key } if key.contains("pinecone_host")));

        // Orders mode needs no Pinecone credentials.
        let overrides = CliOverrides {
            knowledge_base: Some(KnowledgeBase::Orders),
            ..Default::default()
        };
        assert!(resolve(overrides, env_of(&[("OPENAI_API_KEY", "sk")]), SettingsFile::default()).is_ok());
    }

    #[test]
    fn test_temperature_out_of_range() {
        let overrides = CliOverrides {
            temperature: Some(2.5),
            ..Default::default()
        };
        let err = resolve(overrides, base_env(), SettingsFile::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "temperature"));
    }

    #[test]
    fn test_invalid_knowledge_base_env() {
        let env = env_of(&[("OPENAI_API_KEY", "sk"), ("SEEDBOT_KNOWLEDGE_BASE", "wiki")]);
        let err = resolve(CliOverrides::default(), env, SettingsFile::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "knowledge.base"));
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut settings = SettingsFile::default();
        settings.knowledge.top_k = Some(0);
        assert!(resolve(CliOverrides::default(), base_env(), settings).is_err());

        let mut settings = SettingsFile::default();
        settings.history.max_sessions = Some(0);
        assert!(resolve(CliOverrides::default(), base_env(), settings).is_err());

        let mut settings = SettingsFile::default();
        settings.knowledge.chunk_size = Some(100);
        settings.knowledge.chunk_overlap = Some(100);
        assert!(resolve(CliOverrides::default(), base_env(), settings).is_err());
    }

    #[test]
    fn test_small_chunk_size_clamps_default_overlap() {
        let mut settings = SettingsFile::default();
        settings.knowledge.chunk_size = Some(150);
        let config = resolve(CliOverrides::default(), base_env(), settings).unwrap();
        assert_eq!(config.knowledge.chunk_size, 150);
        assert_eq!(config.knowledge.chunk_overlap, 149);

        let mut settings = SettingsFile::default();
        settings.knowledge.chunk_size = Some(1);
        let config = resolve(CliOverrides::default(), base_env(), settings).unwrap();
        assert_eq!(config.knowledge.chunk_overlap, 0);

        let mut settings = SettingsFile::default();
        settings.knowledge.chunk_size = Some(1000);
        let config = resolve(CliOverrides::default(), base_env(), settings).unwrap();
        assert_eq!(config.knowledge.chunk_overlap, 200);
    }

    #[test]
    fn test_read_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(read_settings_file(&path).unwrap().is_none());

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[api]\nmax_tokens = 512").unwrap();
        let settings = read_settings_file(&path).unwrap().unwrap();
        assert_eq!(settings.api.max_tokens, Some(512));
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\nmodel = ").unwrap();

        assert!(matches!(
            read_settings_file(&path),
            Err(ConfigError::Parse { .. })
        ));
        let settings = load_settings_file(&path);
        assert!(settings.api.model.is_none());
    }
}
