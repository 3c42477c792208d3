use std::time::Duration;

use anyhow::{Context, bail};

use forum_api::completion::{CompletionConfig, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your_jwt_secret",
];

/// Upper bound on one upstream call (completion or backend save).
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub completion: CompletionConfig,
    pub backend_url: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = get("FORUM_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("FORUM_JWT_SECRET is unset or still a placeholder; it must match the backend's secret");
        }

        let port = match get("FORUM_PORT") {
            Some(v) => v.parse().with_context(|| format!("FORUM_PORT={}", v))?,
            None => 5500,
        };
        let max_tokens = match get("AI_MAX_TOKENS") {
            Some(v) => v.parse().with_context(|| format!("AI_MAX_TOKENS={}", v))?,
            None => DEFAULT_MAX_TOKENS,
        };

        Ok(Self {
            jwt_secret,
            host: get("FORUM_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            completion: CompletionConfig {
                base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
                api_key: get("OPENAI_API_KEY").unwrap_or_default(),
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
                max_tokens,
            },
            backend_url: get("FORUM_BACKEND_URL").filter(|v| !v.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn refuses_placeholder_secret() {
        assert!(ServerConfig::from_lookup(lookup(&[])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("FORUM_JWT_SECRET", "dev-secret-change-me")])).is_err());
    }

    #[test]
    fn defaults() {
        let cfg = ServerConfig::from_lookup(lookup(&[("FORUM_JWT_SECRET", "s3cr3t-value")])).unwrap();
        assert_eq!(cfg.port, 5500);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.completion.max_tokens, 150);
        assert_eq!(cfg.completion.model, "gpt-4o-mini");
        assert!(cfg.backend_url.is_none());
    }

    #[test]
    fn rejects_bad_port() {
        let vars = [("FORUM_JWT_SECRET", "s3cr3t-value"), ("FORUM_PORT", "http")];
        assert!(ServerConfig::from_lookup(lookup(&vars)).is_err());
    }
}
