//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `KANAK_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `KANAK_BASE_URL` - Public URL for the storefront
//! - `KANAK_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `KANAK_HOST` - Bind address (default: 127.0.0.1)
//! - `KANAK_PORT` - Listen port (default: 3000)
//! - `KANAK_SHIPPING_FEE` - Flat shipping fee in rupees (default: 99.00)
//! - `KANAK_FREE_SHIPPING_THRESHOLD` - Subtotal for free shipping (default: 5000.00)
//! - `KANAK_EXCHANGE_DEDUCTION_PERCENT` - Melting/testing deduction on exchange estimates (default: 10)
//! - `KANAK_LOW_STOCK_THRESHOLD` - Stock level flagged as low (default: 5)
//! - `KANAK_UTC_OFFSET_MINUTES` - Store-local offset for day boundaries (default: 330, IST)
//! - `ANTHROPIC_API_KEY` / `ANTHROPIC_MODEL` - Chat and styling assistant
//! - `OPENAI_API_KEY` / `OPENAI_TTS_VOICE` - Speech-to-text and text-to-speech
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use kanak_core::checkout::ShippingPolicy;
use kanak_core::pricing::MAX_DEDUCTION_PERCENT;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_TTS_VOICE: &str = "alloy";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Shop rules (shipping, exchange, stock, day boundaries)
    pub store: StoreRules,
    /// Chat and image-styling assistant (disabled when unset)
    pub claude: Option<ClaudeConfig>,
    /// Speech services (disabled when unset)
    pub speech: Option<SpeechConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Business rules that vary per deployment.
#[derive(Debug, Clone, Copy)]
pub struct StoreRules {
    pub shipping: ShippingPolicy,
    /// Deduction applied to exchange estimates, in percent.
    pub exchange_deduction_percent: u32,
    /// Products at or below this level are flagged as low stock.
    pub low_stock_threshold: i32,
    /// Store-local offset used to decide which day a sale belongs to.
    pub utc_offset: FixedOffset,
}

impl StoreRules {
    /// Today's date in the store's time zone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.utc_offset).date_naive()
    }

    /// The instant a store-local day begins, or `None` at the edge of the
    /// calendar.
    #[must_use]
    pub fn day_start(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        date.and_time(NaiveTime::MIN)
            .checked_sub_offset(self.utc_offset)
            .map(|utc| utc.and_utc())
    }

    /// Half-open instant range covering the store-local days `from..=to`.
    #[must_use]
    pub fn day_span(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let end = to.checked_add_days(Days::new(1))?;
        Some((self.day_start(from)?, self.day_start(end)?))
    }

    /// Store-local calendar day of an instant.
    #[must_use]
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.utc_offset).date_naive()
    }
}

impl Default for StoreRules {
    fn default() -> Self {
        Self {
            shipping: ShippingPolicy {
                flat_fee: Decimal::new(99, 0),
                free_threshold: Decimal::new(5000, 0),
            },
            exchange_deduction_percent: 10,
            low_stock_threshold: 5,
            utc_offset: FixedOffset::east_opt(330 * 60).unwrap_or_else(|| Utc.fix()),
        }
    }
}

/// Anthropic Messages API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ClaudeConfig {
    pub api_key: SecretString,
    pub model: String,
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// `OpenAI` audio API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct SpeechConfig {
    pub api_key: SecretString,
    pub voice: String,
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("api_key", &"[REDACTED]")
            .field("voice", &self.voice)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("KANAK_DATABASE_URL")?;
        let host = parse_env_or_default::<IpAddr>("KANAK_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("KANAK_PORT", "3000")?;
        let base_url = get_required_env("KANAK_BASE_URL")?;
        validate_base_url(&base_url, "KANAK_BASE_URL")?;
        let session_secret = get_validated_secret("KANAK_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "KANAK_SESSION_SECRET")?;

        let store = StoreRules::from_env()?;
        let claude = ClaudeConfig::from_env()?;
        let speech = SpeechConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            store,
            claude,
            speech,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl StoreRules {
    fn from_env() -> Result<Self, ConfigError> {
        let flat_fee = parse_env_or_default::<Decimal>("KANAK_SHIPPING_FEE", "99.00")?;
        let free_threshold =
            parse_env_or_default::<Decimal>("KANAK_FREE_SHIPPING_THRESHOLD", "5000.00")?;
        if flat_fee < Decimal::ZERO || free_threshold < Decimal::ZERO {
            return Err(ConfigError::InvalidEnvVar(
                "KANAK_SHIPPING_FEE".to_string(),
                "shipping amounts cannot be negative".to_string(),
            ));
        }

        let exchange_deduction_percent =
            parse_env_or_default::<u32>("KANAK_EXCHANGE_DEDUCTION_PERCENT", "10")?;
        if exchange_deduction_percent > MAX_DEDUCTION_PERCENT {
            return Err(ConfigError::InvalidEnvVar(
                "KANAK_EXCHANGE_DEDUCTION_PERCENT".to_string(),
                format!("must be at most {MAX_DEDUCTION_PERCENT}"),
            ));
        }

        let low_stock_threshold = parse_env_or_default::<i32>("KANAK_LOW_STOCK_THRESHOLD", "5")?;
        let offset_minutes = parse_env_or_default::<i32>("KANAK_UTC_OFFSET_MINUTES", "330")?;
        let utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "KANAK_UTC_OFFSET_MINUTES".to_string(),
                    format!("{offset_minutes} is not a valid offset"),
                )
            })?;

        Ok(Self {
            shipping: ShippingPolicy {
                flat_fee,
                free_threshold,
            },
            exchange_deduction_percent,
            low_stock_threshold,
            utc_offset,
        })
    }
}

impl ClaudeConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(key) = get_optional_env("ANTHROPIC_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&key, "ANTHROPIC_API_KEY")?;
        Ok(Some(Self {
            api_key: SecretString::from(key),
            model: get_env_or_default("ANTHROPIC_MODEL", DEFAULT_CLAUDE_MODEL),
        }))
    }
}

impl SpeechConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(key) = get_optional_env("OPENAI_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&key, "OPENAI_API_KEY")?;
        Ok(Some(Self {
            api_key: SecretString::from(key),
            voice: get_env_or_default("OPENAI_TTS_VOICE", DEFAULT_TTS_VOICE),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by managed Postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// The base URL must be an absolute http(s) URL.
fn validate_base_url(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be an http(s) URL with a host".to_string(),
        ));
    }
    Ok(())
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-session-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("abababababababababababababababab", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_validate_base_url() {
        assert!(validate_base_url("https://kanakjewels.in", "B").is_ok());
        assert!(validate_base_url("http://localhost:3000", "B").is_ok());
        assert!(validate_base_url("ftp://kanakjewels.in", "B").is_err());
        assert!(validate_base_url("kanakjewels.in", "B").is_err());
    }

    #[test]
    fn test_default_store_rules() {
        let rules = StoreRules::default();
        assert_eq!(rules.shipping.flat_fee, Decimal::new(99, 0));
        assert_eq!(rules.exchange_deduction_percent, 10);
        assert_eq!(rules.utc_offset.local_minus_utc(), 330 * 60);
    }

    #[test]
    fn test_store_local_day_boundaries() {
        let rules = StoreRules::default();
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();

        // Midnight IST is 18:30 UTC the previous day
        let start = rules.day_start(date).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-03-08T18:30:00+00:00");
        assert_eq!(rules.local_date(start), date);
        assert_eq!(
            rules.local_date(start - chrono::Duration::seconds(1)),
            NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()
        );
    }

    #[test]
    fn test_day_span() {
        let rules = StoreRules::default();
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let (start, end) = rules.day_span(date, date).unwrap();
        assert_eq!(end - start, chrono::Duration::days(1));
    }

    #[test]
    fn test_calendar_edges_have_no_span() {
        let rules = StoreRules::default();
        // Midnight IST on the first representable day is before the UTC minimum
        assert_eq!(rules.day_start(NaiveDate::MIN), None);
        assert_eq!(rules.day_span(NaiveDate::MIN, NaiveDate::MIN), None);
        assert_eq!(rules.day_span(NaiveDate::MAX, NaiveDate::MAX), None);
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            store: StoreRules::default(),
            claude: None,
            speech: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_api_configs_redact_keys() {
        let claude = ClaudeConfig {
            api_key: SecretString::from("sk-ant-very-private"),
            model: "claude-test".to_string(),
        };
        let speech = SpeechConfig {
            api_key: SecretString::from("sk-openai-very-private"),
            voice: "alloy".to_string(),
        };

        let output = format!("{claude:?} {speech:?}");
        assert!(output.contains("claude-test"));
        assert!(output.contains("alloy"));
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("very-private"));
    }
}
