//! Retry policy: the immutable configuration of one retry session.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default prefix for environment variables read by [`RetryPolicy::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "BACKSTOP_RETRY_";

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
const DEFAULT_EXPONENTIAL_BASE: f64 = 2.0;
const DEFAULT_JITTER: bool = true;

/// Exponential backoff configuration.
///
/// A policy allows `max_retries + 1` attempts in total. The delay before
/// retry `n` (zero-based) is `initial_delay * exponential_base^n`, capped at
/// `max_delay`, plus up to 25% random jitter when `jitter` is enabled.
///
/// Policies are validated once, when they are built, and are read-only
/// afterwards, so one policy can be shared by any number of concurrent
/// sessions.
///
/// # Examples
///
/// ```rust
/// use backstop_core::retry::RetryPolicy;
/// use std::time::Duration;
///
/// // max_retries=3, initial_delay=1s, max_delay=60s, exponential_base=2.0, jitter=true
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts(), 4);
///
/// let policy = RetryPolicy::builder()
///     .max_retries(5)
///     .initial_delay(Duration::from_millis(500))
///     .max_delay(Duration::from_secs(30))
///     .exponential_base(2.0)
///     .jitter(true)
///     .build()?;
/// assert_eq!(policy.max_retries(), 5);
/// # Ok::<(), backstop_core::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolicyDocument", into = "PolicyDocument")]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    exponential_base: f64,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            exponential_base: DEFAULT_EXPONENTIAL_BASE,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Create a validated policy from raw values, with delays in seconds.
    ///
    /// Negative or non-finite delays and an `exponential_base` below 1 are
    /// rejected.
    pub fn new(
        max_retries: u32,
        initial_delay_secs: f64,
        max_delay_secs: f64,
        exponential_base: f64,
        jitter: bool,
    ) -> Result<Self> {
        Self::builder()
            .max_retries(max_retries)
            .initial_delay(secs_to_duration("initial_delay", initial_delay_secs)?)
            .max_delay(secs_to_duration("max_delay", max_delay_secs)?)
            .exponential_base(exponential_base)
            .jitter(jitter)
            .build()
    }

    /// Create a new builder seeded with the default values.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// A policy that performs exactly one attempt and never sleeps.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            exponential_base: 1.0,
            jitter: false,
        }
    }

    /// Load a policy from `BACKSTOP_RETRY_*` environment variables.
    ///
    /// Unset variables keep their default value. See
    /// [`from_env_with_prefix`](Self::from_env_with_prefix).
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Load a policy from environment variables with a custom prefix.
    ///
    /// This will look for:
    /// - `<prefix>MAX_RETRIES` (non-negative integer)
    /// - `<prefix>INITIAL_DELAY` (seconds, may be fractional)
    /// - `<prefix>MAX_DELAY` (seconds, may be fractional)
    /// - `<prefix>EXPONENTIAL_BASE` (number, at least 1)
    /// - `<prefix>JITTER` (`true`/`false`, `1`/`0`, `yes`/`no`)
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        Self::from_lookup(prefix, |var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |suffix: &str| {
            let var = format!("{prefix}{suffix}");
            lookup(&var).map(|value| (var, value))
        };
        let mut builder = Self::builder();

        if let Some((var, value)) = read("MAX_RETRIES") {
            let retries = value
                .trim()
                .parse::<u32>()
                .map_err(|e| env_error(&var, &value, e.to_string()))?;
            builder = builder.max_retries(retries);
        }
        if let Some((var, value)) = read("INITIAL_DELAY") {
            builder = builder.initial_delay(parse_env_secs(&var, &value)?);
        }
        if let Some((var, value)) = read("MAX_DELAY") {
            builder = builder.max_delay(parse_env_secs(&var, &value)?);
        }
        if let Some((var, value)) = read("EXPONENTIAL_BASE") {
            let base = value
                .trim()
                .parse::<f64>()
                .map_err(|e| env_error(&var, &value, e.to_string()))?;
            builder = builder.exponential_base(base);
        }
        if let Some((var, value)) = read("JITTER") {
            let jitter = match value.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => return Err(env_error(&var, &value, "expected a boolean")),
            };
            builder = builder.jitter(jitter);
        }

        builder.build()
    }

    /// Maximum number of retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total number of attempts this policy allows (`max_retries + 1`).
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the first retry.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Upper bound on any computed delay, before jitter.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Growth factor applied per retry.
    pub fn exponential_base(&self) -> f64 {
        self.exponential_base
    }

    /// Whether computed delays are randomly perturbed.
    pub fn jitter(&self) -> bool {
        self.jitter
    }

    /// Backoff delay after the failure of attempt `attempt` (zero-based).
    ///
    /// Shorthand for [`calculate_delay`](super::calculate_delay).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        super::backoff::calculate_delay(attempt, self)
    }

    fn validate(self) -> Result<Self> {
        if !self.exponential_base.is_finite() || self.exponential_base < 1.0 {
            return Err(ConfigError::invalid(
                "exponential_base",
                format!(
                    "must be a finite number >= 1 (got {})",
                    self.exponential_base
                ),
            ));
        }
        Ok(self)
    }
}

/// Builder for [`RetryPolicy`].
///
/// Unset fields keep their defaults. [`build`](Self::build) validates the
/// result.
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    max_retries: Option<u32>,
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    exponential_base: Option<f64>,
    jitter: Option<bool>,
}

impl RetryPolicyBuilder {
    /// Set the maximum number of retries after the first attempt.
    ///
    /// Default: 3
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the delay before the first retry.
    ///
    /// Default: 1s
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set the cap applied to every computed delay.
    ///
    /// Default: 60s
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set the growth factor per retry. Must be at least 1.
    ///
    /// Default: 2.0
    pub fn exponential_base(mut self, base: f64) -> Self {
        self.exponential_base = Some(base);
        self
    }

    /// Enable or disable jitter (up to +25% of the computed delay).
    ///
    /// Default: true
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Build and validate the policy.
    pub fn build(self) -> Result<RetryPolicy> {
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            initial_delay: self.initial_delay.unwrap_or(DEFAULT_INITIAL_DELAY),
            max_delay: self.max_delay.unwrap_or(DEFAULT_MAX_DELAY),
            exponential_base: self.exponential_base.unwrap_or(DEFAULT_EXPONENTIAL_BASE),
            jitter: self.jitter.unwrap_or(DEFAULT_JITTER),
        }
        .validate()
    }
}

/// Flat document form of a policy, delays in seconds.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
struct PolicyDocument {
    max_retries: i64,
    initial_delay: f64,
    max_delay: f64,
    exponential_base: f64,
    jitter: bool,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        RetryPolicy::default().into()
    }
}

impl TryFrom<PolicyDocument> for RetryPolicy {
    type Error = ConfigError;

    fn try_from(doc: PolicyDocument) -> Result<Self> {
        let max_retries = u32::try_from(doc.max_retries).map_err(|_| {
            ConfigError::invalid(
                "max_retries",
                format!("must be a non-negative integer (got {})", doc.max_retries),
            )
        })?;
        RetryPolicy::new(
            max_retries,
            doc.initial_delay,
            doc.max_delay,
            doc.exponential_base,
            doc.jitter,
        )
    }
}

impl From<RetryPolicy> for PolicyDocument {
    fn from(policy: RetryPolicy) -> Self {
        Self {
            max_retries: i64::from(policy.max_retries),
            initial_delay: policy.initial_delay.as_secs_f64(),
            max_delay: policy.max_delay.as_secs_f64(),
            exponential_base: policy.exponential_base,
            jitter: policy.jitter,
        }
    }
}

fn secs_to_duration(field: &'static str, secs: f64) -> Result<Duration> {
    if secs.is_nan() {
        return Err(ConfigError::invalid(field, "must be a number (got NaN)"));
    }
    if secs < 0.0 {
        return Err(ConfigError::invalid(
            field,
            format!("must not be negative (got {secs})"),
        ));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| ConfigError::invalid(field, format!("{e} (got {secs})")))
}

fn parse_env_secs(var: &str, value: &str) -> Result<Duration> {
    let secs = value
        .trim()
        .parse::<f64>()
        .map_err(|e| env_error(var, value, e.to_string()))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(env_error(
            var,
            value,
            "expected a non-negative number of seconds",
        ));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| env_error(var, value, e.to_string()))
}

fn env_error(var: &str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Env {
        var: var.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}
