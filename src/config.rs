// src/config.rs
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

use crate::models::{DEFAULT_TIME_LIMIT_SECS, MAX_TIME_LIMIT_SECS, MIN_TIME_LIMIT_SECS};
use crate::session::SessionConfig;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("{var} must be between {min} and {max}, got {value}")]
    OutOfRange {
        var: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// How often the background ticker fires
    pub tick_interval: Duration,
    /// `None` allows any origin
    pub cors_allow_origin: Option<String>,
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 3030,
            tick_interval: Duration::from_millis(1000),
            cors_allow_origin: None,
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// - `HOST` (default `0.0.0.0`)
    /// - `PORT` (default `3030`)
    /// - `TICK_INTERVAL_MS` (default `1000`)
    /// - `DEFAULT_TIME_LIMIT_SECS` (default `60`)
    /// - `ARCHIVE_ON_REPLACE` (default `true`)
    /// - `CORS_ALLOW_ORIGIN` (default: any origin)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host = parse_var(&lookup, "HOST", "IP address")?.unwrap_or(defaults.host);
        let port = parse_var(&lookup, "PORT", "port number")?.unwrap_or(defaults.port);
        let tick_ms: Option<u64> = parse_var(&lookup, "TICK_INTERVAL_MS", "millisecond count")?;
        let tick_interval = tick_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick_interval);
        let default_time_limit_seconds =
            parse_var(&lookup, "DEFAULT_TIME_LIMIT_SECS", "second count")?
                .unwrap_or(DEFAULT_TIME_LIMIT_SECS);
        if !(MIN_TIME_LIMIT_SECS..=MAX_TIME_LIMIT_SECS).contains(&default_time_limit_seconds) {
            return Err(ConfigError::OutOfRange {
                var: "DEFAULT_TIME_LIMIT_SECS",
                min: MIN_TIME_LIMIT_SECS,
                max: MAX_TIME_LIMIT_SECS,
                value: default_time_limit_seconds,
            });
        }
        let archive_on_replace = lookup("ARCHIVE_ON_REPLACE")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(defaults.session.archive_on_replace);
        let cors_allow_origin = lookup("CORS_ALLOW_ORIGIN").filter(|v| !v.is_empty() && v != "*");

        Ok(Self {
            host,
            port,
            tick_interval,
            cors_allow_origin,
            session: SessionConfig {
                default_time_limit_seconds,
                archive_on_replace,
            },
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var,
                expected,
                value,
            }),
    }
}
