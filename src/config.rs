//! Runtime configuration read from the environment (and `.env` when present).

use crate::storage::{JsonFileStore, Store, StoreError, SupabaseStore};
use std::{env, path::PathBuf, sync::Arc};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/state.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Local { data_path: PathBuf },
    Supabase { url: String, anon_key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub backend: Backend,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value '{value}' for {var}")]
    Invalid { var: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let backend = match lookup("STORE_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("local") => Backend::Local {
                data_path: lookup("APP_DATA_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH)),
            },
            Some("supabase") => Backend::Supabase {
                url: lookup("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                anon_key: lookup("SUPABASE_ANON_KEY")
                    .ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self { port, backend })
    }

    pub async fn open_store(&self) -> Result<Arc<dyn Store>, StoreError> {
        let store: Arc<dyn Store> = match &self.backend {
            Backend::Local { data_path } => Arc::new(JsonFileStore::open(data_path.clone()).await?),
            Backend::Supabase { url, anon_key } => Arc::new(SupabaseStore::new(url, anon_key.clone())?),
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_to_local_store() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(
            config.backend,
            Backend::Local {
                data_path: PathBuf::from(DEFAULT_DATA_PATH)
            }
        );
    }

    #[test]
    fn reads_port_and_data_path() {
        let config = config(&[("PORT", "3000"), ("APP_DATA_PATH", "/tmp/runs.json")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(
            config.backend,
            Backend::Local {
                data_path: PathBuf::from("/tmp/runs.json")
            }
        );
    }

    #[test]
    fn supabase_requires_credentials() {
        let err = config(&[("STORE_BACKEND", "supabase"), ("SUPABASE_URL", "https://x.supabase.co")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SUPABASE_ANON_KEY")));

        let config = config(&[
            ("STORE_BACKEND", "supabase"),
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ])
        .unwrap();
        assert_eq!(
            config.backend,
            Backend::Supabase {
                url: "https://x.supabase.co".to_string(),
                anon_key: "anon".to_string()
            }
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("STORE_BACKEND", "redis")]),
            Err(ConfigError::Invalid { var: "STORE_BACKEND", .. })
        ));
    }
}
