use std::env;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::adherence::CalendarZone;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub adherence: AdherenceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&env_or("APP_ENV", "development"));

        let host = env_or("APP_HOST", "127.0.0.1");
        let port = env_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env_or("APP_LOG_LEVEL", "info");
        let format = LogFormat::parse(&env_or("APP_LOG_FORMAT", "compact"))?;

        let adherence = AdherenceConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, format },
            adherence,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing output controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Scoring and reporting knobs for the adherence workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdherenceConfig {
    /// Clinic offset used to decide which calendar day a check-in belongs to.
    pub calendar: CalendarZone,
    pub summary_window_days: u32,
    pub max_write_attempts: u32,
}

impl AdherenceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let offset_raw = env_or("APP_UTC_OFFSET_MINUTES", "0");
        let calendar = offset_raw
            .trim()
            .parse::<i32>()
            .ok()
            .and_then(CalendarZone::from_offset_minutes)
            .ok_or(ConfigError::InvalidUtcOffset(offset_raw))?;

        let window_raw = env_or("APP_SUMMARY_WINDOW_DAYS", "30");
        let summary_window_days = parse_positive(&window_raw)
            .ok_or(ConfigError::InvalidSummaryWindow(window_raw))?;

        let attempts_raw = env_or("APP_MAX_WRITE_ATTEMPTS", "3");
        let max_write_attempts = parse_positive(&attempts_raw)
            .ok_or(ConfigError::InvalidWriteAttempts(attempts_raw))?;

        Ok(Self {
            calendar,
            summary_window_days,
            max_write_attempts,
        })
    }
}

impl Default for AdherenceConfig {
    fn default() -> Self {
        Self {
            calendar: CalendarZone::utc(),
            summary_window_days: 30,
            max_write_attempts: 3,
        }
    }
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|value| *value > 0)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("APP_LOG_FORMAT must be 'compact' or 'json' (got '{0}')")]
    InvalidLogFormat(String),
    #[error("APP_UTC_OFFSET_MINUTES must be whole minutes within +/-1439 (got '{0}')")]
    InvalidUtcOffset(String),
    #[error("APP_SUMMARY_WINDOW_DAYS must be a positive integer (got '{0}')")]
    InvalidSummaryWindow(String),
    #[error("APP_MAX_WRITE_ATTEMPTS must be a positive integer (got '{0}')")]
    InvalidWriteAttempts(String),
}
