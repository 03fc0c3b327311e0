//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml`, then overridden by `WALLET__*` environment
//! variables (e.g. `WALLET__SERVER__PORT=9001`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    /// Emit JSON log lines instead of the human readable format.
    pub json: bool,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 9001,
            shutdown_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Database {
    /// `sqlite:` or `postgres:` connection URL.
    pub url: String,
    pub run_migrations: bool,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: "sqlite:./wallet.db?mode=rwc".to_string(),
            run_migrations: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Cache {
    pub balance_ttl_secs: u64,
    pub rate_ttl_secs: u64,
    pub capacity: u64,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            balance_ttl_secs: engine::DEFAULT_BALANCE_TTL.as_secs(),
            rate_ttl_secs: engine::DEFAULT_RATE_TTL.as_secs(),
            capacity: 100_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Rates {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            url: "https://api.exchangeratesapi.io/latest?base=RUB".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub max_conflict_retries: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_conflict_retries: engine::DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub database: Database,
    pub cache: Cache,
    pub rates: Rates,
    pub engine: EngineSettings,
}

impl Settings {
    /// `path` is a file name without extension; a missing file is not an error.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("WALLET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
