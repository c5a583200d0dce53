use std::time::Duration;

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "app.db";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POOL_SIZE: u32 = 8;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Process settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Path of the SQLite database file, or `:memory:`.
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pool_size: u32,
    pub busy_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let database_url = lookup("DATABASE_URL")
            .map(|url| normalize_database_url(&url))
            .unwrap_or(defaults.database_url);
        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = parse_var(&lookup, "PORT", "a port number", defaults.port)?;
        let pool_size = parse_var(&lookup, "DATABASE_POOL_SIZE", "a positive integer", defaults.pool_size)?;
        if pool_size == 0 {
            return Err(ConfigError::Invalid {
                var: "DATABASE_POOL_SIZE",
                expected: "a positive integer",
                value: pool_size.to_string(),
            });
        }
        let busy_timeout_ms = parse_var(
            &lookup,
            "DATABASE_BUSY_TIMEOUT_MS",
            "a number of milliseconds",
            DEFAULT_BUSY_TIMEOUT_MS,
        )?;

        Ok(Settings {
            database_url,
            host,
            port,
            pool_size,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url == ":memory:"
    }
}

// sqlite:///./app.db -> ./app.db, sqlite:////var/app.db -> /var/app.db
fn normalize_database_url(url: &str) -> String {
    let url = url.trim();
    url.strip_prefix("sqlite:///")
        .or_else(|| url.strip_prefix("sqlite://"))
        .unwrap_or(url)
        .to_string()
}

fn parse_var<F, T>(lookup: &F, var: &'static str, expected: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            expected,
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_local_file_store() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.database_url, "app.db");
        assert!(!settings.is_in_memory());
    }

    #[test]
    fn strips_sqlite_url_scheme() {
        let settings = settings_from(&[("DATABASE_URL", "sqlite:///./app.db")]).unwrap();
        assert_eq!(settings.database_url, "./app.db");

        let settings = settings_from(&[("DATABASE_URL", "sqlite:////var/lib/app.db")]).unwrap();
        assert_eq!(settings.database_url, "/var/lib/app.db");

        let settings = settings_from(&[("DATABASE_URL", "/tmp/plain.db")]).unwrap();
        assert_eq!(settings.database_url, "/tmp/plain.db");
    }

    #[test]
    fn reads_numeric_overrides() {
        let settings = settings_from(&[
            ("PORT", "9000"),
            ("DATABASE_POOL_SIZE", "2"),
            ("DATABASE_BUSY_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.pool_size, 2);
        assert_eq!(settings.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = settings_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        assert!(settings_from(&[("DATABASE_POOL_SIZE", "0")]).is_err());
    }
}
