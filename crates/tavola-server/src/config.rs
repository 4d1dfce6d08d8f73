use serde::Deserialize;

/// Runtime configuration. Loaded from environment variables with the
/// prefix `TAVOLA__`, e.g. `TAVOLA__ENGINE__LOOKAHEAD_DAYS=21`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Days scanned ahead when computing the next status change.
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_database_url() -> String {
    "sqlite://tavola.db?mode=rwc".to_string()
}
fn default_lookahead_days() -> u32 {
    tavola_core::availability::DEFAULT_LOOKAHEAD_DAYS
}
fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            engine: EngineConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookahead_days: default_lookahead_days(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("TAVOLA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config: AppConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.database_url, "sqlite://tavola.db?mode=rwc");
        assert_eq!(config.engine.lookahead_days, 14);
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn nested_values_override_defaults() {
        let config: AppConfig = config::Config::builder()
            .set_override("engine.lookahead_days", 30)
            .unwrap()
            .set_override("log.format", "json")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.engine.lookahead_days, 30);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.database_url, default_database_url());
    }
}
