use std::env;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use tracing::{info, warn};

use crate::error::{ConfigResult, ConfigurationError};
use crate::policy::ClaimPolicy;

/// Upper bound for the leeway applied to `exp`/`nbf`.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(10 * 60);

const ENV_EXPECTED_ISSUER: &str = "JWT_EXPECTED_ISSUER";
const ENV_EXPECTED_SUBJECT: &str = "JWT_EXPECTED_SUBJECT";
const ENV_EXPECTED_AUDIENCE: &str = "JWT_EXPECTED_AUDIENCE";
const ENV_IGNORE_ISSUER: &str = "JWT_IGNORE_ISSUER";
const ENV_IGNORE_SUBJECT: &str = "JWT_IGNORE_SUBJECT";
const ENV_IGNORE_AUDIENCES: &str = "JWT_IGNORE_AUDIENCES";
const ENV_CLOCK_SKEW_SECONDS: &str = "JWT_CLOCK_SKEW_SECONDS";
const ENV_FIXED_NOW: &str = "JWT_FIXED_NOW";

/// Validation policy applied to already verified claim sets.
///
/// Built once through [`ValidatorConfig::builder`] or the environment loaders;
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    issuer: ClaimPolicy,
    subject: ClaimPolicy,
    audience: ClaimPolicy,
    clock_skew: Duration,
    skew: chrono::Duration,
    fixed_now: Option<DateTime<FixedOffset>>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            issuer: ClaimPolicy::Unspecified,
            subject: ClaimPolicy::Unspecified,
            audience: ClaimPolicy::Unspecified,
            clock_skew: Duration::ZERO,
            skew: chrono::Duration::zero(),
            fixed_now: None,
        }
    }
}

impl ValidatorConfig {
    pub fn builder() -> ValidatorConfigBuilder {
        ValidatorConfigBuilder::default()
    }

    /// Load the policy from `JWT_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ValidatorConfig::from_env`] with a caller-provided lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(issuer) = lookup(ENV_EXPECTED_ISSUER).and_then(|v| normalize_optional(&v)) {
            builder = builder.with_expected_issuer(issuer);
        }
        if let Some(subject) = lookup(ENV_EXPECTED_SUBJECT).and_then(|v| normalize_optional(&v)) {
            builder = builder.with_expected_subject(subject);
        }
        if let Some(audience) = lookup(ENV_EXPECTED_AUDIENCE).and_then(|v| normalize_optional(&v))
        {
            builder = builder.with_expected_audience(audience);
        }

        if lookup(ENV_IGNORE_ISSUER).is_some_and(|v| parse_flag(&v)) {
            builder = builder.ignore_issuer();
        }
        if lookup(ENV_IGNORE_SUBJECT).is_some_and(|v| parse_flag(&v)) {
            builder = builder.ignore_subject();
        }
        if lookup(ENV_IGNORE_AUDIENCES).is_some_and(|v| parse_flag(&v)) {
            builder = builder.ignore_audiences();
        }

        if let Some(value) = lookup(ENV_CLOCK_SKEW_SECONDS).and_then(|v| normalize_optional(&v)) {
            let seconds = value
                .parse::<u64>()
                .map_err(|_| ConfigurationError::InvalidEnv {
                    key: ENV_CLOCK_SKEW_SECONDS,
                    value: value.clone(),
                })?;
            builder = builder.with_clock_skew(Duration::from_secs(seconds));
        }

        if let Some(value) = lookup(ENV_FIXED_NOW).and_then(|v| normalize_optional(&v)) {
            warn!(fixed_now = %value, "JWT_FIXED_NOW is set; token time checks use a pinned clock");
            builder = builder.with_fixed_now_str(&value)?;
        }

        let config = builder.build()?;
        info!(
            expected_issuer = ?config.expected_issuer(),
            expected_subject = ?config.expected_subject(),
            expected_audience = ?config.expected_audience(),
            clock_skew_secs = config.clock_skew.as_secs(),
            "JWT validator configuration loaded"
        );
        Ok(config)
    }

    pub fn issuer_policy(&self) -> &ClaimPolicy {
        &self.issuer
    }

    pub fn subject_policy(&self) -> &ClaimPolicy {
        &self.subject
    }

    pub fn audience_policy(&self) -> &ClaimPolicy {
        &self.audience
    }

    pub fn has_expected_issuer(&self) -> bool {
        self.issuer.expected().is_some()
    }

    pub fn expected_issuer(&self) -> Option<&str> {
        self.issuer.expected()
    }

    pub fn has_expected_subject(&self) -> bool {
        self.subject.expected().is_some()
    }

    pub fn expected_subject(&self) -> Option<&str> {
        self.subject.expected()
    }

    pub fn has_expected_audience(&self) -> bool {
        self.audience.expected().is_some()
    }

    pub fn expected_audience(&self) -> Option<&str> {
        self.audience.expected()
    }

    pub fn ignore_issuer(&self) -> bool {
        self.issuer.is_ignored()
    }

    pub fn ignore_subject(&self) -> bool {
        self.subject.is_ignored()
    }

    pub fn ignore_audiences(&self) -> bool {
        self.audience.is_ignored()
    }

    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    pub(crate) fn skew(&self) -> chrono::Duration {
        self.skew
    }

    pub fn has_fixed_now(&self) -> bool {
        self.fixed_now.is_some()
    }

    pub fn fixed_now(&self) -> Option<DateTime<FixedOffset>> {
        self.fixed_now
    }

    /// `fixed_now` normalised to UTC.
    pub(crate) fn fixed_now_utc(&self) -> Option<DateTime<Utc>> {
        self.fixed_now.map(|now| now.with_timezone(&Utc))
    }
}

/// Collects the flat configuration options; [`ValidatorConfigBuilder::build`]
/// checks them against each other.
#[derive(Debug, Clone, Default)]
pub struct ValidatorConfigBuilder {
    expected_issuer: Option<String>,
    expected_subject: Option<String>,
    expected_audience: Option<String>,
    ignore_issuer: bool,
    ignore_subject: bool,
    ignore_audiences: bool,
    clock_skew: Duration,
    fixed_now: Option<DateTime<FixedOffset>>,
}

impl ValidatorConfigBuilder {
    pub fn with_expected_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.expected_issuer = Some(issuer.into());
        self
    }

    pub fn with_expected_subject(mut self, subject: impl Into<String>) -> Self {
        self.expected_subject = Some(subject.into());
        self
    }

    pub fn with_expected_audience(mut self, audience: impl Into<String>) -> Self {
        self.expected_audience = Some(audience.into());
        self
    }

    /// Accept tokens carrying an issuer even though none is expected.
    pub fn ignore_issuer(mut self) -> Self {
        self.ignore_issuer = true;
        self
    }

    pub fn ignore_subject(mut self) -> Self {
        self.ignore_subject = true;
        self
    }

    pub fn ignore_audiences(mut self) -> Self {
        self.ignore_audiences = true;
        self
    }

    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    pub fn with_fixed_now<Tz: TimeZone>(mut self, now: DateTime<Tz>) -> Self {
        let offset = now.offset().fix();
        self.fixed_now = Some(now.with_timezone(&offset));
        self
    }

    /// Pin "now" from RFC 3339 text. The timestamp must carry an offset.
    pub fn with_fixed_now_str(mut self, value: &str) -> ConfigResult<Self> {
        let value = value.trim();
        match DateTime::parse_from_rfc3339(value) {
            Ok(now) => {
                self.fixed_now = Some(now);
                Ok(self)
            }
            Err(_) if is_naive_timestamp(value) => {
                Err(ConfigurationError::FixedNowWithoutTimezone(value.to_owned()))
            }
            Err(err) => Err(ConfigurationError::InvalidFixedNow {
                value: value.to_owned(),
                reason: err.to_string(),
            }),
        }
    }

    pub fn build(self) -> ConfigResult<ValidatorConfig> {
        let issuer = ClaimPolicy::from_options(
            self.expected_issuer,
            self.ignore_issuer,
            ("expected_issuer", "ignore_issuer"),
        )?;
        let subject = ClaimPolicy::from_options(
            self.expected_subject,
            self.ignore_subject,
            ("expected_subject", "ignore_subject"),
        )?;
        let audience = ClaimPolicy::from_options(
            self.expected_audience,
            self.ignore_audiences,
            ("expected_audience", "ignore_audiences"),
        )?;

        let too_large = ConfigurationError::ClockSkewTooLarge {
            requested: self.clock_skew,
            max: MAX_CLOCK_SKEW,
        };
        if self.clock_skew > MAX_CLOCK_SKEW {
            return Err(too_large);
        }
        let skew = chrono::Duration::from_std(self.clock_skew).map_err(|_| too_large)?;

        Ok(ValidatorConfig {
            issuer,
            subject,
            audience,
            clock_skew: self.clock_skew,
            skew,
            fixed_now: self.fixed_now,
        })
    }
}

fn is_naive_timestamp(value: &str) -> bool {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
