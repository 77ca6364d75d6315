use std::{
    env,
    fmt::{self, Display},
    fs::read_to_string,
    io::ErrorKind,
    str::FromStr,
    time::Duration,
};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("Failed to read secret {name}: {source}")]
    Secret {
        name: &'static str,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Redis,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "redis" => Ok(StorageBackend::Redis),
            other => Err(format!("unknown storage backend '{other}'")),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => f.write_str("memory"),
            StorageBackend::Redis => f.write_str("redis"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub storage: StorageBackend,
    pub redis_url: String,
    pub seed_sample_data: bool,
    pub cors_max_age: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            storage: StorageBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            seed_sample_data: true,
            cors_max_age: Duration::from_secs(60 * 60),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(|key| env::var(key).ok(), read_secret)
    }

    fn from_sources<V, S>(var: V, secret: S) -> Result<Self, ConfigError>
    where
        V: Fn(&str) -> Option<String>,
        S: Fn(&'static str) -> Result<Option<String>, ConfigError>,
    {
        let storage: StorageBackend = try_load(&var, "STORAGE", "memory")?;
        let redis_url: String = try_load(&var, "REDIS_URL", "redis://127.0.0.1:6379")?;

        let redis_url = match storage {
            StorageBackend::Redis => match secret("REDIS_PASSWORD")? {
                Some(password) => with_password(&redis_url, &password),
                None => redis_url,
            },
            StorageBackend::Memory => redis_url,
        };

        Ok(Self {
            port: try_load(&var, "RUST_PORT", "5000")?,
            storage,
            redis_url,
            seed_sample_data: try_load(&var, "SEED_SAMPLE_DATA", "true")?,
            cors_max_age: Duration::from_secs(try_load(&var, "CORS_MAX_AGE_SECS", "3600")?),
        })
    }
}

fn try_load<T, V>(var: &V, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    V: Fn(&str) -> Option<String>,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                message: e.to_string(),
            }
        })
}

/// Reads `/run/secrets/<name>`, `None` when the secret is not mounted.
fn read_secret(secret_name: &'static str) -> Result<Option<String>, ConfigError> {
    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(secret) => Ok(Some(secret.trim().to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("{secret_name} not mounted, connecting without it");
            Ok(None)
        }
        Err(source) => {
            warn!("Failed to read {secret_name} from file: {source}");
            Err(ConfigError::Secret {
                name: secret_name,
                source,
            })
        }
    }
}

fn with_password(redis_url: &str, password: &str) -> String {
    match redis_url.split_once("://") {
        Some((scheme, rest)) => format!("{scheme}://:{password}@{rest}"),
        None => redis_url.to_string(),
    }
}
