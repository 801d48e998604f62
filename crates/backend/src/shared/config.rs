use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub assistant: AssistantConfig,
    pub auth: AuthConfig,
    pub dataset: DatasetConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AssistantConfig {
    /// API key удалённого сервиса; перекрывается OPENAI_API_KEY
    #[serde(default)]
    pub api_key: String,
    /// ID ассистента; перекрывается ASSISTANT_ID
    #[serde(default)]
    pub assistant_id: String,
    /// ID заранее загруженного файла с датасетом; перекрывается FILE_ID
    #[serde(default)]
    pub file_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub username: String,
    /// PHC-строка argon2; для разработки допустим `password` открытым
    /// текстом (сверяется как есть)
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    pub path: String,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_run_timeout() -> u64 {
    120
}

fn default_preview_rows() -> usize {
    10
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 3000

[assistant]
api_base = "https://api.openai.com/v1"
run_timeout_secs = 120

[auth]
username = "etrading"

[dataset]
path = "assets/etrading_synthetic_data.csv"
preview_rows = 10
"#;

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// Secrets are then overridden from the environment (OPENAI_API_KEY,
/// ASSISTANT_ID, FILE_ID) and validated: missing remote credentials are a
/// fatal startup error, never a silent one.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = read_config_file()?;

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        config.assistant.api_key = key;
    }
    if let Ok(id) = std::env::var("ASSISTANT_ID") {
        config.assistant.assistant_id = id;
    }
    if let Ok(id) = std::env::var("FILE_ID") {
        config.assistant.file_id = id;
    }

    // Пустая PHC-строка — то же, что её отсутствие
    if matches!(&config.auth.password_hash, Some(h) if h.trim().is_empty()) {
        config.auth.password_hash = None;
    }

    validate(&config)?;
    Ok(config)
}

fn read_config_file() -> anyhow::Result<Config> {
    // Try to find config.toml next to the executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    // Fall back to default config
    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

fn validate(config: &Config) -> anyhow::Result<()> {
    if config.assistant.api_key.trim().is_empty() {
        anyhow::bail!("assistant.api_key is not set (config.toml or OPENAI_API_KEY)");
    }
    if config.assistant.assistant_id.trim().is_empty() {
        anyhow::bail!("assistant.assistant_id is not set (config.toml or ASSISTANT_ID)");
    }
    if config.assistant.file_id.trim().is_empty() {
        anyhow::bail!("assistant.file_id is not set (config.toml or FILE_ID)");
    }
    if config.auth.password_hash.is_none() && config.auth.password.is_none() {
        anyhow::bail!("auth.password_hash (or dev-only auth.password) is required");
    }
    if !Path::new(&config.dataset.path).exists() {
        // Не фатально: предпросмотр покажет встроенную ошибку, остальная
        // страница остаётся рабочей
        tracing::warn!("dataset file not found at: {}", config.dataset.path);
    }
    Ok(())
}

/// Store the validated config in the process-wide cell
pub fn set_config(config: Config) -> anyhow::Result<()> {
    CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("config already initialized"))
}

/// Get the process-wide config (must be set at startup)
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("config not initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Result<Config, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.assistant.run_timeout_secs, 120);
        assert_eq!(config.dataset.preview_rows, 10);
    }

    #[test]
    fn test_missing_secrets_are_fatal() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_validate_accepts_full_config() {
        let mut config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        config.assistant.api_key = "sk-test".into();
        config.assistant.assistant_id = "asst_123".into();
        config.assistant.file_id = "file-123".into();
        config.auth.password = Some("hello new world".into());
        assert!(validate(&config).is_ok());
    }
}
