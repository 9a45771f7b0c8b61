/// Process configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    /// Hex encoded credentials blob. Wins over `credentials_base64` when both are set.
    pub credentials_hex: Option<String>,
    pub credentials_base64: Option<String>,
    pub credentials_path: PathBuf,
    pub port: u16,
    pub workers: u16,
    pub server_command: String,
    pub server_args: Vec<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:qbank.db".to_string(),
            credentials_hex: None,
            credentials_base64: None,
            credentials_path: PathBuf::from("credentials.json"),
            port: 8000,
            workers: 3,
            server_command: "gunicorn".to_string(),
            server_args: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let default = Self::default();

        Self {
            database_url: get("DATABASE_URL").unwrap_or(default.database_url),
            credentials_hex: get("CREDENTIALS_HEX"),
            credentials_base64: get("CREDENTIALS_BASE64"),
            credentials_path: get("CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.credentials_path),
            port: parse_or("PORT", get("PORT"), default.port),
            workers: parse_or("WEB_CONCURRENCY", get("WEB_CONCURRENCY"), default.workers),
            server_command: get("SERVER_COMMAND").unwrap_or(default.server_command),
            server_args: get("SERVER_ARGS")
                .map(|args| args.split_whitespace().map(str::to_string).collect())
                .unwrap_or(default.server_args),
            log_level: get("LOG_LEVEL").unwrap_or(default.log_level),
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match raw {
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
        Some(value) => value.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {value:?} ({e}), using default: {default}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.database_url, "sqlite:qbank.db");
        assert_eq!(config.port, 8000);
        assert_eq!(config.workers, 3);
        assert_eq!(config.server_command, "gunicorn");
        assert!(config.credentials_hex.is_none());
        assert!(config.credentials_base64.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite:/data/bank.db"),
            ("PORT", "9090"),
            ("WEB_CONCURRENCY", "8"),
            ("CREDENTIALS_PATH", "/secrets/creds.json"),
            ("SERVER_ARGS", "app.wsgi:application  --timeout 60"),
        ]);
        assert_eq!(config.database_url, "sqlite:/data/bank.db");
        assert_eq!(config.port, 9090);
        assert_eq!(config.workers, 8);
        assert_eq!(config.credentials_path, PathBuf::from("/secrets/creds.json"));
        assert_eq!(
            config.server_args,
            vec!["app.wsgi:application", "--timeout", "60"]
        );
    }

    #[test]
    fn bad_numbers_fall_back_to_defaults() {
        let config = config_from(&[("PORT", "eighty"), ("WEB_CONCURRENCY", "-1")]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.workers, 3);
    }

    #[test]
    fn blank_credentials_count_as_unset() {
        let config = config_from(&[("CREDENTIALS_HEX", "  "), ("CREDENTIALS_BASE64", "e30=")]);
        assert!(config.credentials_hex.is_none());
        assert_eq!(config.credentials_base64.as_deref(), Some("e30="));
    }
}

use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::{info, warn};
