// src/config/mod.rs
// Environment-based configuration, loaded once at startup and passed explicitly

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Grok with X search enabled via the `:online` suffix
pub const DEFAULT_MODEL: &str = "x-ai/grok-4.1-fast:online";

pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_APP_TITLE: &str = "CopyCat Detector";

#[derive(Debug, Clone)]
pub struct CopycatConfig {
    // ── Completion provider
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub model: String,
    /// Sent as `HTTP-Referer` for attribution
    pub site_url: String,
    /// Sent as `X-Title` for attribution
    pub app_title: String,

    // ── Server
    pub host: String,
    pub port: u16,
    pub request_deadline_secs: u64,
    pub connect_timeout_secs: u64,

    // ── History store (disabled when unset)
    pub database_url: Option<String>,

    // ── Logging
    pub log_level: String,
}

/// A setting that was present but unusable and fell back to its default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub key: String,
    pub value: String,
}

/// Configuration plus what happened while loading it.
///
/// Loading runs before the tracing subscriber exists, so nothing is logged
/// there. Call [`ConfigLoad::report`] once logging is set up.
#[derive(Debug)]
pub struct ConfigLoad {
    pub config: CopycatConfig,
    /// `.env` file that was applied, if any
    pub env_file: Option<PathBuf>,
    pub issues: Vec<ConfigIssue>,
}

impl ConfigLoad {
    pub fn report(&self) {
        match &self.env_file {
            Some(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
            None => tracing::debug!(".env file not found, using process environment"),
        }
        for issue in &self.issues {
            tracing::warn!(key = %issue.key, value = %issue.value, "Config value failed to parse, using default");
        }
    }
}

/// Parse a value, ignoring trailing `# comments` and surrounding whitespace.
/// Falls back to `default` when the key is missing or does not parse; the
/// latter is recorded in `issues`.
fn env_var_or<T, F>(lookup: &F, issues: &mut Vec<ConfigIssue>, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    issues.push(ConfigIssue {
                        key: key.to_string(),
                        value: val,
                    });
                    default
                }
            }
        }
        None => default,
    }
}

/// Read an optional string, treating blank values as unset
fn env_opt<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CopycatConfig {
    /// Load from `.env` (if present) and the process environment
    pub fn from_env() -> ConfigLoad {
        let env_file = dotenvy::dotenv().ok();
        let (config, issues) = Self::from_lookup_checked(|key| std::env::var(key).ok());
        ConfigLoad {
            config,
            env_file,
            issues,
        }
    }

    /// Build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_checked(lookup).0
    }

    /// Like [`from_lookup`](Self::from_lookup), also returning the values
    /// that were replaced by defaults
    pub fn from_lookup_checked<F>(lookup: F) -> (Self, Vec<ConfigIssue>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut issues = Vec::new();
        let site_url = env_opt(&lookup, "COPYCAT_SITE_URL")
            .or_else(|| env_opt(&lookup, "NEXT_PUBLIC_WEBSITE_URL"))
            .unwrap_or_else(|| DEFAULT_SITE_URL.to_string());

        let config = Self {
            openrouter_api_key: env_opt(&lookup, "OPENROUTER_API_KEY"),
            openrouter_base_url: env_var_or(&lookup, &mut issues, "OPENROUTER_BASE_URL", DEFAULT_BASE_URL.to_string()),
            model: env_var_or(&lookup, &mut issues, "COPYCAT_MODEL", DEFAULT_MODEL.to_string()),
            site_url,
            app_title: env_opt(&lookup, "COPYCAT_APP_TITLE")
                .unwrap_or_else(|| DEFAULT_APP_TITLE.to_string()),
            host: env_var_or(&lookup, &mut issues, "COPYCAT_HOST", "0.0.0.0".to_string()),
            port: env_var_or(&lookup, &mut issues, "COPYCAT_PORT", 3000),
            request_deadline_secs: env_var_or(&lookup, &mut issues, "COPYCAT_REQUEST_DEADLINE_SECS", 60),
            connect_timeout_secs: env_var_or(&lookup, &mut issues, "COPYCAT_CONNECT_TIMEOUT_SECS", 30),
            database_url: env_opt(&lookup, "COPYCAT_DATABASE_URL"),
            log_level: env_var_or(&lookup, &mut issues, "COPYCAT_LOG_LEVEL", "info".to_string()),
        };

        if config.log_level.parse::<tracing::Level>().is_err() {
            issues.push(ConfigIssue {
                key: "COPYCAT_LOG_LEVEL".to_string(),
                value: config.log_level.clone(),
            });
        }

        (config, issues)
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn has_completion_key(&self) -> bool {
        self.openrouter_api_key.is_some()
    }

    /// Parsed log level, defaulting to INFO for unknown values
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

impl Default for CopycatConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CopycatConfig::default();
        assert!(config.openrouter_api_key.is_none());
        assert_eq!(config.openrouter_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.site_url, DEFAULT_SITE_URL);
        assert_eq!(config.app_title, DEFAULT_APP_TITLE);
        assert_eq!(config.port, 3000);
        assert_eq!(config.request_deadline(), Duration::from_secs(60));
        assert!(config.database_url.is_none());
        assert_eq!(config.tracing_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_overrides() {
        let config = CopycatConfig::from_lookup(lookup_from(&[
            ("OPENROUTER_API_KEY", "sk-or-test"),
            ("COPYCAT_MODEL", "openai/gpt-4o"),
            ("COPYCAT_PORT", "8080"),
            ("COPYCAT_REQUEST_DEADLINE_SECS", "5"),
            ("COPYCAT_DATABASE_URL", "sqlite::memory:"),
            ("COPYCAT_LOG_LEVEL", "debug"),
        ]));
        assert_eq!(config.openrouter_api_key.as_deref(), Some("sk-or-test"));
        assert!(config.has_completion_key());
        assert_eq!(config.model, "openai/gpt-4o");
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.request_deadline(), Duration::from_secs(5));
        assert_eq!(config.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.tracing_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_blank_key_is_unset() {
        let config = CopycatConfig::from_lookup(lookup_from(&[("OPENROUTER_API_KEY", "   ")]));
        assert!(config.openrouter_api_key.is_none());
        assert!(!config.has_completion_key());
    }

    #[test]
    fn test_comment_stripping_and_bad_values() {
        let config = CopycatConfig::from_lookup(lookup_from(&[
            ("COPYCAT_PORT", "4000 # local dev"),
            ("COPYCAT_REQUEST_DEADLINE_SECS", "soon"),
        ]));
        assert_eq!(config.port, 4000);
        assert_eq!(config.request_deadline_secs, 60);
    }

    #[test]
    fn test_unparseable_values_are_collected() {
        let (config, issues) = CopycatConfig::from_lookup_checked(lookup_from(&[
            ("COPYCAT_PORT", "not-a-port"),
            ("COPYCAT_REQUEST_DEADLINE_SECS", "30"),
            ("COPYCAT_LOG_LEVEL", "chatty"),
        ]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.tracing_level(), tracing::Level::INFO);
        assert_eq!(
            issues,
            vec![
                ConfigIssue {
                    key: "COPYCAT_PORT".into(),
                    value: "not-a-port".into(),
                },
                ConfigIssue {
                    key: "COPYCAT_LOG_LEVEL".into(),
                    value: "chatty".into(),
                },
            ]
        );

        let (_, clean) = CopycatConfig::from_lookup_checked(lookup_from(&[("COPYCAT_PORT", "8080")]));
        assert!(clean.is_empty());
    }

    #[test]
    fn test_site_url_prefers_copycat_var() {
        let config = CopycatConfig::from_lookup(lookup_from(&[
            ("NEXT_PUBLIC_WEBSITE_URL", "https://legacy.example"),
            ("COPYCAT_SITE_URL", "https://copycat.example"),
        ]));
        assert_eq!(config.site_url, "https://copycat.example");

        let legacy = CopycatConfig::from_lookup(lookup_from(&[(
            "NEXT_PUBLIC_WEBSITE_URL",
            "https://legacy.example",
        )]));
        assert_eq!(legacy.site_url, "https://legacy.example");
    }
}
