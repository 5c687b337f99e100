// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "despachante.yaml";
pub const DEFAULT_TABLE: &str = "services";

/// Backend connection settings.
///
/// Read from an optional YAML file, then overridden by environment variables:
///
/// | env var                 | field          |
/// |-------------------------|----------------|
/// | `SUPABASE_URL`          | `base_url`     |
/// | `SUPABASE_ANON_KEY`     | `api_key`      |
/// | `SUPABASE_ACCESS_TOKEN` | `access_token` |
/// | `DESPACHANTE_USER_ID`   | `user_id`      |
/// | `DESPACHANTE_TABLE`     | `table`        |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub user_id: Option<String>,
    pub table: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            access_token: None,
            user_id: None,
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl Config {
    /// `.env` (if any), then the YAML file named by `DESPACHANTE_CONFIG`
    /// (or `despachante.yaml` when present), then the environment.
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }

        let explicit = env::var("DESPACHANTE_CONFIG").ok().map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_yaml_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_yaml_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };

        config.apply_env();
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| env::var(key).ok());
    }

    /// Override fields from `lookup`; blank values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SUPABASE_URL") {
            self.base_url = Some(v);
        }
        if let Some(v) = get("SUPABASE_ANON_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = get("SUPABASE_ACCESS_TOKEN") {
            self.access_token = Some(v);
        }
        if let Some(v) = get("DESPACHANTE_USER_ID") {
            self.user_id = Some(v);
        }
        if let Some(v) = get("DESPACHANTE_TABLE") {
            self.table = v;
        }
    }

    /// Base URL and API key, both required to talk to the backend.
    pub fn rest_credentials(&self) -> Result<(&str, &str)> {
        let base_url = self
            .base_url
            .as_deref()
            .context("missing backend url (set SUPABASE_URL or `base_url`)")?;
        let api_key = self
            .api_key
            .as_deref()
            .context("missing API key (set SUPABASE_ANON_KEY or `api_key`)")?;
        Ok((base_url, api_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn yaml_file_with_defaults() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "base_url: https://abc.supabase.co")?;
        writeln!(tmp, "api_key: anon")?;

        let config = Config::from_yaml_file(tmp.path())?;
        assert_eq!(config.base_url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(config.api_key.as_deref(), Some("anon"));
        assert_eq!(config.table, DEFAULT_TABLE);
        assert_eq!(config.user_id, None);
        Ok(())
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("SUPABASE_URL", "http://localhost:54321"),
            ("DESPACHANTE_USER_ID", "abc-123"),
            ("DESPACHANTE_TABLE", "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config {
            base_url: Some("https://old".into()),
            api_key: Some("anon".into()),
            ..Config::default()
        };
        config.apply_env_with(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.base_url.as_deref(), Some("http://localhost:54321"));
        assert_eq!(config.api_key.as_deref(), Some("anon"));
        assert_eq!(config.user_id.as_deref(), Some("abc-123"));
        assert_eq!(config.table, DEFAULT_TABLE);
    }

    #[test]
    fn credentials_are_required() {
        let config = Config::default();
        assert!(config.rest_credentials().is_err());

        let config = Config {
            base_url: Some("http://x".into()),
            api_key: Some("k".into()),
            ..Config::default()
        };
        assert_eq!(config.rest_credentials().unwrap(), ("http://x", "k"));
    }

    #[test]
    fn malformed_yaml_is_an_error() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "table: [unclosed")?;
        assert!(Config::from_yaml_file(tmp.path()).is_err());
        Ok(())
    }
}
