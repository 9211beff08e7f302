//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

use crate::service::OfficiatingSettings;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Base URL of the tournament backend.
    pub backend_url: String,

    /// Timeout in seconds for one backend request.
    pub backend_timeout_secs: u64,

    /// Timeout in seconds for one gateway request.
    pub request_timeout_secs: u64,

    /// Default real minutes per half.
    pub half_duration_minutes: u32,

    /// Milliseconds between clock ticks.
    pub clock_tick_ms: u64,

    /// Milliseconds a goal celebration stays up.
    pub celebration_ms: u64,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Emit logs as JSON lines.
    pub log_json: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            backend_url: "http://localhost:8080".to_string(),
            backend_timeout_secs: 10,
            request_timeout_secs: 30,
            half_duration_minutes: 45,
            clock_tick_ms: 1000,
            celebration_ms: 3000,
            event_bus_capacity: 10_000,
            log_json: false,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(addr) => addr.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let backend_url = std::env::var("BACKEND_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.backend_url);

        Ok(Self {
            listen_addr,
            backend_url,
            backend_timeout_secs: parse_env("BACKEND_TIMEOUT_SECS", defaults.backend_timeout_secs),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            half_duration_minutes: parse_env("HALF_DURATION_MINUTES", defaults.half_duration_minutes)
                .max(1),
            clock_tick_ms: parse_env("CLOCK_TICK_MS", defaults.clock_tick_ms).max(1),
            celebration_ms: parse_env("CELEBRATION_MS", defaults.celebration_ms),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity),
            log_json: parse_env_bool("LOG_JSON", defaults.log_json),
        })
    }

    /// Backend request timeout.
    #[must_use]
    pub const fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }

    /// Gateway request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Timing settings handed to the officiating service.
    #[must_use]
    pub const fn officiating(&self) -> OfficiatingSettings {
        OfficiatingSettings {
            half_duration_minutes: self.half_duration_minutes,
            tick_interval: Duration::from_millis(self.clock_tick_ms),
            celebration: Duration::from_millis(self.celebration_ms),
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr.port(), 3000);
        assert_eq!(config.backend_url, "http://localhost:8080");
        assert_eq!(config.backend_timeout(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.event_bus_capacity, 10_000);
    }

    #[test]
    fn officiating_settings_follow_config() {
        let config = GatewayConfig {
            half_duration_minutes: 6,
            clock_tick_ms: 250,
            celebration_ms: 1500,
            ..GatewayConfig::default()
        };
        let settings = config.officiating();
        assert_eq!(settings.half_duration_minutes, 6);
        assert_eq!(settings.tick_interval, Duration::from_millis(250));
        assert_eq!(settings.celebration, Duration::from_millis(1500));
    }

    #[test]
    fn missing_variables_fall_back() {
        assert_eq!(parse_env("KNOCKOUT_GATEWAY_TEST_UNSET_NUMBER", 7_u32), 7);
        assert!(parse_env_bool("KNOCKOUT_GATEWAY_TEST_UNSET_FLAG", true));
    }
}
