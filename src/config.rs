use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(String),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub secret: String,
    pub token_lifetime_hours: i64,
    pub media_root: PathBuf,
    pub media_url: String,
    pub max_connections: u32,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut media_url: String = try_load(&lookup, "FOODGRAM_MEDIA_URL", "/media/")?;
        if !media_url.ends_with('/') {
            media_url.push('/');
        }

        Ok(Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            port: try_load(&lookup, "FOODGRAM_PORT", "8000")?,
            secret: required(&lookup, "FOODGRAM_SECRET")?,
            token_lifetime_hours: try_load(&lookup, "FOODGRAM_TOKEN_HOURS", "24")?,
            media_root: try_load(&lookup, "FOODGRAM_MEDIA_ROOT", "media")?,
            media_url,
            max_connections: try_load(&lookup, "FOODGRAM_MAX_CONNECTIONS", "10")?,
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            log::info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/foodgram"),
            ("FOODGRAM_SECRET", "kitchen"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.token_lifetime_hours, 24);
        assert_eq!(config.media_root, PathBuf::from("media"));
        assert_eq!(config.media_url, "/media/");
    }

    #[test]
    fn secrets_are_required() {
        let error = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/foodgram")]))
            .unwrap_err();

        assert_eq!(error, ConfigError::Missing("FOODGRAM_SECRET".to_string()));
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let error = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/foodgram"),
            ("FOODGRAM_SECRET", "kitchen"),
            ("FOODGRAM_PORT", "eighty"),
        ]))
        .unwrap_err();

        assert!(matches!(error, ConfigError::Invalid { key, .. } if key == "FOODGRAM_PORT"));
    }

    #[test]
    fn media_url_gets_a_trailing_slash() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/foodgram"),
            ("FOODGRAM_SECRET", "kitchen"),
            ("FOODGRAM_MEDIA_URL", "https://cdn.example.com/media"),
        ]))
        .unwrap();

        assert_eq!(config.media_url, "https://cdn.example.com/media/");
    }
}
