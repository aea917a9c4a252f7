//! Scoreboard Configuration Settings
//!
//! Configuration types for the scoreboard, loaded from environment variables.

use std::time::Duration;

/// Server port settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// API and SSE port.
    pub http_port: u16,
    /// Health check and metrics HTTP port.
    pub health_port: u16,
    /// Attach a permissive CORS layer to the API router.
    pub enable_cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_port: 5000,
            health_port: 8083,
            enable_cors: true,
        }
    }
}

/// Subscriber stream settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Frames buffered per subscriber before new frames are dropped.
    pub sink_capacity: usize,
    /// Interval between SSE keep-alive comments.
    pub keep_alive_interval: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            sink_capacity: 64,
            keep_alive_interval: Duration::from_secs(15),
        }
    }
}

/// Complete scoreboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreboardConfig {
    /// Server port settings.
    pub server: ServerSettings,
    /// Subscriber stream settings.
    pub stream: StreamSettings,
}

impl ScoreboardConfig {
    /// Create configuration from environment variables.
    ///
    /// Unparseable values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a value parses but is unusable (zero capacity or
    /// interval, or both servers on the same port).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ScoreboardConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_defaults = ServerSettings::default();
        let stream_defaults = StreamSettings::default();

        let server = ServerSettings {
            http_port: parse_or(&lookup, "SCOREBOARD_HTTP_PORT", server_defaults.http_port),
            health_port: parse_or(
                &lookup,
                "SCOREBOARD_HEALTH_PORT",
                server_defaults.health_port,
            ),
            enable_cors: lookup("SCOREBOARD_ENABLE_CORS")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(server_defaults.enable_cors),
        };

        let stream = StreamSettings {
            sink_capacity: parse_or(
                &lookup,
                "SCOREBOARD_SINK_CAPACITY",
                stream_defaults.sink_capacity,
            ),
            keep_alive_interval: Duration::from_secs(parse_or(
                &lookup,
                "SCOREBOARD_KEEP_ALIVE_SECS",
                stream_defaults.keep_alive_interval.as_secs(),
            )),
        };

        let config = Self { server, stream };
        config.validate()?;
        Ok(config)
    }

    /// Check semantic constraints.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream.sink_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SCOREBOARD_SINK_CAPACITY",
                reason: "must be greater than zero",
            });
        }

        if self.stream.keep_alive_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "SCOREBOARD_KEEP_ALIVE_SECS",
                reason: "must be greater than zero",
            });
        }

        if self.server.http_port == self.server.health_port {
            return Err(ConfigError::PortConflict(self.server.http_port));
        }

        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Value parsed but is not usable.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Environment variable name.
        key: &'static str,
        /// Violated constraint.
        reason: &'static str,
    },
    /// API and health servers configured on the same port.
    #[error("API and health servers cannot share port {0}")]
    PortConflict(u16),
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use test_case::test_case;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ScoreboardConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ScoreboardConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config, ScoreboardConfig::default());
        assert_eq!(config.server.http_port, 5000);
        assert_eq!(config.server.health_port, 8083);
        assert!(config.server.enable_cors);
        assert_eq!(config.stream.sink_capacity, 64);
        assert_eq!(config.stream.keep_alive_interval, Duration::from_secs(15));
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("SCOREBOARD_HTTP_PORT", "8080"),
            ("SCOREBOARD_HEALTH_PORT", "9090"),
            ("SCOREBOARD_ENABLE_CORS", "false"),
            ("SCOREBOARD_SINK_CAPACITY", " 8 "),
            ("SCOREBOARD_KEEP_ALIVE_SECS", "30"),
        ])
        .unwrap();

        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.server.health_port, 9090);
        assert!(!config.server.enable_cors);
        assert_eq!(config.stream.sink_capacity, 8);
        assert_eq!(config.stream.keep_alive_interval, Duration::from_secs(30));
    }

    #[test]
    fn unparseable_values_fall_back() {
        let config = load(&[
            ("SCOREBOARD_HTTP_PORT", "not-a-port"),
            ("SCOREBOARD_SINK_CAPACITY", "-3"),
            ("SCOREBOARD_ENABLE_CORS", "maybe"),
        ])
        .unwrap();

        assert_eq!(config, ScoreboardConfig::default());
    }

    #[test_case("SCOREBOARD_SINK_CAPACITY" ; "zero capacity")]
    #[test_case("SCOREBOARD_KEEP_ALIVE_SECS" ; "zero keep alive")]
    fn zero_is_rejected(key: &str) {
        assert!(matches!(
            load(&[(key, "0")]),
            Err(ConfigError::InvalidValue { key: k, .. }) if k == key
        ));
    }

    #[test]
    fn port_conflict_rejected() {
        assert_eq!(
            load(&[
                ("SCOREBOARD_HTTP_PORT", "7000"),
                ("SCOREBOARD_HEALTH_PORT", "7000"),
            ]),
            Err(ConfigError::PortConflict(7000))
        );
    }

    #[test_case("TRUE", Some(true))]
    #[test_case("on", Some(true))]
    #[test_case("0", Some(false))]
    #[test_case("No", Some(false))]
    #[test_case("", None)]
    fn bool_parsing(input: &str, expected: Option<bool>) {
        assert_eq!(parse_bool(input), expected);
    }
}
