use anyhow::Result;
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub scheduling: SchedulingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Materialization and horizon-sweep tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    /// Lookahead applied to open-ended series that carry no explicit
    /// `lookahead_weeks` of their own.
    pub default_lookahead_weeks: u32,
    /// Seconds between horizon sweep runs.
    pub sweep_interval_secs: u64,
    /// Upper bound on instances expanded in a single materialization pass.
    pub max_instances_per_call: u16,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8712)?
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "debug")?
            .set_default("scheduling.default_lookahead_weeks", 4)?
            .set_default("scheduling.sweep_interval_secs", 3600)?
            .set_default("scheduling.max_instances_per_call", 500)?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
