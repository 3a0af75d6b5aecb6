use chrono::{DateTime, Utc};
use tracing::debug;

use crate::claims::ClaimSet;
use crate::clock::{Clock, SystemClock};
use crate::config::ValidatorConfig;
use crate::error::{ValidationError, ValidationResult};
use crate::policy::ClaimPolicy;

/// Inputs shared by every check of a single validation.
struct Evaluation<'a> {
    config: &'a ValidatorConfig,
    claims: &'a dyn ClaimSet,
    now: DateTime<Utc>,
}

type Check = fn(&Evaluation<'_>) -> ValidationResult<()>;

/// Evaluated in order; the first failure wins. Time bounds come first.
const CHECKS: [(&str, Check); 5] = [
    ("expiration", check_expiration),
    ("not_before", check_not_before),
    ("issuer", check_issuer),
    ("subject", check_subject),
    ("audience", check_audience),
];

/// Validates `claims` against `config` using the wall clock, unless the
/// config pins `fixed_now`.
///
/// The claim set must come from a token whose signature has already been
/// verified. Returns the first violated rule.
pub fn validate(config: &ValidatorConfig, claims: &dyn ClaimSet) -> ValidationResult<()> {
    validate_with_clock(config, claims, &SystemClock)
}

/// Like [`validate`], reading the current time from `clock`. A configured
/// `fixed_now` still takes precedence.
pub fn validate_with_clock<K>(
    config: &ValidatorConfig,
    claims: &dyn ClaimSet,
    clock: &K,
) -> ValidationResult<()>
where
    K: Clock + ?Sized,
{
    let now = config.fixed_now_utc().unwrap_or_else(|| clock.now());
    let evaluation = Evaluation {
        config,
        claims,
        now,
    };

    for (name, check) in CHECKS {
        if let Err(err) = check(&evaluation) {
            debug!(check = name, error = %err, "JWT claims rejected");
            return Err(err);
        }
    }

    debug!(%now, "JWT claims validated");
    Ok(())
}

fn check_expiration(eval: &Evaluation<'_>) -> ValidationResult<()> {
    let Some(exp) = eval.claims.expiration() else {
        return Ok(());
    };
    // An underflowing bound lies before every representable instant.
    match eval.now.checked_sub_signed(eval.config.skew()) {
        Some(threshold) if exp <= threshold => Err(ValidationError::Expired(exp)),
        _ => Ok(()),
    }
}

fn check_not_before(eval: &Evaluation<'_>) -> ValidationResult<()> {
    let Some(nbf) = eval.claims.not_before() else {
        return Ok(());
    };
    match eval.now.checked_add_signed(eval.config.skew()) {
        Some(threshold) if nbf > threshold => Err(ValidationError::NotYetValid(nbf)),
        _ => Ok(()),
    }
}

fn check_issuer(eval: &Evaluation<'_>) -> ValidationResult<()> {
    check_identity("issuer", eval.config.issuer_policy(), eval.claims.issuer())
}

fn check_subject(eval: &Evaluation<'_>) -> ValidationResult<()> {
    check_identity("subject", eval.config.subject_policy(), eval.claims.subject())
}

fn check_identity(
    claim: &'static str,
    policy: &ClaimPolicy,
    actual: Option<&str>,
) -> ValidationResult<()> {
    match (policy, actual) {
        (ClaimPolicy::Expect(expected), None) => Err(ValidationError::MissingClaim {
            claim,
            expected: expected.clone(),
        }),
        (ClaimPolicy::Expect(expected), Some(actual)) if actual != expected.as_str() => {
            Err(ValidationError::ClaimMismatch {
                claim,
                expected: expected.clone(),
                actual: actual.to_string(),
            })
        }
        (ClaimPolicy::Unspecified, Some(_)) => Err(ValidationError::UnexpectedClaim { claim }),
        _ => Ok(()),
    }
}

fn check_audience(eval: &Evaluation<'_>) -> ValidationResult<()> {
    let audiences = eval.claims.audiences();
    match eval.config.audience_policy() {
        ClaimPolicy::Expect(expected) => {
            let found = audiences.is_some_and(|list| list.iter().any(|aud| aud == expected));
            if found {
                Ok(())
            } else {
                Err(ValidationError::MissingClaim {
                    claim: "audience",
                    expected: expected.clone(),
                })
            }
        }
        ClaimPolicy::Unspecified if audiences.is_some() => {
            Err(ValidationError::UnexpectedClaim { claim: "audience" })
        }
        _ => Ok(()),
    }
}
