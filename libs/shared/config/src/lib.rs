use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_SESSION_FEE: f64 = 5000.0;
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 3000;
pub const DEFAULT_UNREAD_POLL_SECS: u64 = 30;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const MAX_DISPLAY_DAY_OFFSET: i64 = 365;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub session_file: PathBuf,
    pub default_session_fee: f64,
    pub payment_redirect_delay_ms: u64,
    pub unread_poll_interval_secs: u64,
    /// Days added to slot dates when they are rendered. Never applied to booking identity.
    pub slot_display_day_offset: i64,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            session_file: default_session_file(),
            default_session_fee: DEFAULT_SESSION_FEE,
            payment_redirect_delay_ms: DEFAULT_REDIRECT_DELAY_MS,
            unread_poll_interval_secs: DEFAULT_UNREAD_POLL_SECS,
            slot_display_day_offset: 0,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_base_url: env::var("THERAPY_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("THERAPY_API_URL not set, using {}", DEFAULT_API_URL);
                    DEFAULT_API_URL.to_string()
                }),
            session_file: env::var("THERAPY_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_session_file()),
            default_session_fee: parse_var("DEFAULT_SESSION_FEE", DEFAULT_SESSION_FEE),
            payment_redirect_delay_ms: parse_var("PAYMENT_REDIRECT_DELAY_MS", DEFAULT_REDIRECT_DELAY_MS),
            unread_poll_interval_secs: parse_in_range(
                "UNREAD_POLL_INTERVAL_SECS",
                DEFAULT_UNREAD_POLL_SECS,
                1..=u64::MAX,
            ),
            slot_display_day_offset: parse_in_range(
                "SLOT_DISPLAY_DAY_OFFSET",
                0,
                -MAX_DISPLAY_DAY_OFFSET..=MAX_DISPLAY_DAY_OFFSET,
            ),
            http_timeout_secs: parse_in_range("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS, 1..=u64::MAX),
        };

        if !config.is_configured() {
            warn!("Client not fully configured - check THERAPY_API_URL");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
            && self.default_session_fee > 0.0
            && self.unread_poll_interval_secs > 0
    }

    pub fn payment_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.payment_redirect_delay_ms)
    }

    pub fn unread_poll_interval(&self) -> Duration {
        Duration::from_secs(self.unread_poll_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_in_range<T>(key: &str, default: T, range: RangeInclusive<T>) -> T
where
    T: FromStr + std::fmt::Display + PartialOrd + Copy,
{
    let value = parse_var(key, default);
    if range.contains(&value) {
        value
    } else {
        warn!(
            "{} must be between {} and {}, using default {}",
            key,
            range.start(),
            range.end(),
            default
        );
        default
    }
}

fn default_session_file() -> PathBuf {
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".therapy-booking").join("session.json"))
        .unwrap_or_else(|_| PathBuf::from(".therapy-session.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_configured() {
        let config = AppConfig::default();
        assert!(config.is_configured());
        assert_eq!(config.default_session_fee, 5000.0);
        assert_eq!(config.payment_redirect_delay(), Duration::from_millis(3000));
        assert_eq!(config.slot_display_day_offset, 0);
    }

    #[test]
    fn test_empty_url_is_not_configured() {
        let config = AppConfig {
            api_base_url: String::new(),
            ..AppConfig::default()
        };
        assert!(!config.is_configured());
    }

    #[test]
    fn test_parse_var_falls_back_on_garbage() {
        env::set_var("THERAPY_TEST_PARSE_VAR", "not-a-number");
        assert_eq!(parse_var("THERAPY_TEST_PARSE_VAR", 7u64), 7);
        env::set_var("THERAPY_TEST_PARSE_VAR", " 12 ");
        assert_eq!(parse_var("THERAPY_TEST_PARSE_VAR", 7u64), 12);
        env::remove_var("THERAPY_TEST_PARSE_VAR");
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        env::set_var("THERAPY_TEST_POLL_SECS", "0");
        assert_eq!(parse_in_range("THERAPY_TEST_POLL_SECS", 30u64, 1..=u64::MAX), 30);
        env::set_var("THERAPY_TEST_POLL_SECS", "5");
        assert_eq!(parse_in_range("THERAPY_TEST_POLL_SECS", 30u64, 1..=u64::MAX), 5);
        env::remove_var("THERAPY_TEST_POLL_SECS");

        env::set_var("THERAPY_TEST_DAY_OFFSET", "100000000");
        assert_eq!(
            parse_in_range("THERAPY_TEST_DAY_OFFSET", 0i64, -MAX_DISPLAY_DAY_OFFSET..=MAX_DISPLAY_DAY_OFFSET),
            0
        );
        env::set_var("THERAPY_TEST_DAY_OFFSET", "-1");
        assert_eq!(
            parse_in_range("THERAPY_TEST_DAY_OFFSET", 0i64, -MAX_DISPLAY_DAY_OFFSET..=MAX_DISPLAY_DAY_OFFSET),
            -1
        );
        env::remove_var("THERAPY_TEST_DAY_OFFSET");
    }
}
