//! Runtime configuration.
//!
//! Values come from an optional TOML file and are then overridden by the
//! environment, so `DATABASE_URL=... diveboard` works without any file.

use std::{net::SocketAddr, path::Path};

use axum_extra::extract::cookie::Key;
use serde::Deserialize;
use tracing::warn;

pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    /// Key material for the private cookie jar. Must be at least 64 bytes.
    pub secret_key: Option<String>,
    pub bind_address: SocketAddr,
    /// How often (in seconds) the live pages re-fetch their fragments.
    pub live_poll_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: IN_MEMORY_DB.to_string(),
            secret_key: None,
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            live_poll_seconds: 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{var} has an invalid value: {value}")]
    BadVar { var: &'static str, value: String },
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let settings = match path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => Settings::default(),
        };

        settings.with_env(|var| std::env::var(var).ok())
    }

    fn with_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(key) = lookup("SECRET_KEY") {
            self.secret_key = Some(key);
        }
        if let Some(addr) = lookup("BIND_ADDRESS") {
            self.bind_address =
                addr.parse().map_err(|_| SettingsError::BadVar {
                    var: "BIND_ADDRESS",
                    value: addr.clone(),
                })?;
        }
        if let Some(secs) = lookup("LIVE_POLL_SECONDS") {
            self.live_poll_seconds = secs
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(SettingsError::BadVar {
                    var: "LIVE_POLL_SECONDS",
                    value: secs.clone(),
                })?;
        }
        Ok(self)
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url == IN_MEMORY_DB
    }

    pub fn pool_size(&self) -> u32 {
        if self.is_in_memory() { 1 } else { 10 }
    }

    /// Falls back to a random key (and therefore logs everybody out on
    /// restart) when no usable secret is configured.
    pub fn cookie_key(&self) -> Key {
        match &self.secret_key {
            Some(secret) if secret.len() >= 64 => Key::from(secret.as_bytes()),
            Some(_) => {
                warn!("SECRET_KEY is shorter than 64 bytes, generating one");
                Key::generate()
            }
            None => {
                warn!("no SECRET_KEY set, generating one for this run");
                Key::generate()
            }
        }
    }

    /// Settings used by the HTTP tests.
    pub fn for_tests() -> Self {
        Settings {
            secret_key: Some("0".repeat(64)),
            ..Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_use_an_in_memory_database() {
        let settings = Settings::default().with_env(env(&[])).unwrap();
        assert!(settings.is_in_memory());
        assert_eq!(settings.pool_size(), 1);
        assert_eq!(settings.live_poll_seconds, 2);
    }

    #[test]
    fn environment_overrides_file() {
        let file: Settings = toml::from_str(
            r#"
            database_url = "file.db"
            live_poll_seconds = 5
            "#,
        )
        .unwrap();
        let settings = file
            .with_env(env(&[
                ("DATABASE_URL", "env.db"),
                ("BIND_ADDRESS", "0.0.0.0:8080"),
            ]))
            .unwrap();

        assert_eq!(settings.database_url, "env.db");
        assert_eq!(settings.pool_size(), 10);
        assert_eq!(settings.live_poll_seconds, 5);
        assert_eq!(settings.bind_address.port(), 8080);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        assert!(
            Settings::default()
                .with_env(env(&[("LIVE_POLL_SECONDS", "0")]))
                .is_err()
        );
    }
}
