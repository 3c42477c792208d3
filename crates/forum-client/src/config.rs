use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5500/api/v1";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// AI generation is much slower than CRUD calls.
pub const DEFAULT_AI_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TOKEN_PATH: &str = ".forum-token.json";
pub const DEFAULT_PAGE_SIZE: u32 = 6;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub ai_timeout: Duration,
    pub token_path: PathBuf,
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            ai_timeout: Duration::from_millis(DEFAULT_AI_TIMEOUT_MS),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

impl ClientConfig {
    /// Read `FORUM_*` variables, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let api_url = std::env::var("FORUM_API_URL").unwrap_or(defaults.api_url);
        let timeout = env_millis("FORUM_TIMEOUT_MS")?.unwrap_or(defaults.timeout);
        let ai_timeout = env_millis("FORUM_AI_TIMEOUT_MS")?.unwrap_or(defaults.ai_timeout);
        let token_path = std::env::var("FORUM_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.token_path);
        let page_size = match env_positive("FORUM_PAGE_SIZE")? {
            Some(n) => u32::try_from(n).map_err(|_| ConfigError::InvalidNumber {
                name: "FORUM_PAGE_SIZE",
                value: n.to_string(),
            })?,
            None => defaults.page_size,
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout,
            ai_timeout,
            token_path,
            page_size,
        })
    }
}

fn env_millis(name: &'static str) -> Result<Option<Duration>, ConfigError> {
    Ok(env_positive(name)?.map(Duration::from_millis))
}

fn env_positive(name: &'static str) -> Result<Option<u64>, ConfigError> {
    let Ok(value) = std::env::var(name) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber { name, value }),
    }
}
