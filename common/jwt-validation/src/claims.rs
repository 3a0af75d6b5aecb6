use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ClaimsError, ClaimsResult};

/// Largest NumericDate accepted in a payload (9999-12-31T23:59:59Z).
pub const MAX_TIMESTAMP: i64 = 253_402_300_799;

/// Read-only view over the registered claims of a verified token.
///
/// Only the getters are required; the `has_*` predicates derive from them.
pub trait ClaimSet {
    fn issuer(&self) -> Option<&str>;
    fn subject(&self) -> Option<&str>;
    fn audiences(&self) -> Option<&[String]>;
    fn expiration(&self) -> Option<DateTime<Utc>>;
    fn not_before(&self) -> Option<DateTime<Utc>>;

    fn has_issuer(&self) -> bool {
        self.issuer().is_some()
    }

    fn has_subject(&self) -> bool {
        self.subject().is_some()
    }

    fn has_audiences(&self) -> bool {
        self.audiences().is_some()
    }

    fn has_expiration(&self) -> bool {
        self.expiration().is_some()
    }

    fn has_not_before(&self) -> bool {
        self.not_before().is_some()
    }
}

/// Claim set parsed from a JSON payload or assembled by hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawClaims {
    issuer: Option<String>,
    subject: Option<String>,
    audiences: Option<Vec<String>>,
    expiration: Option<DateTime<Utc>>,
    not_before: Option<DateTime<Utc>>,
    issued_at: Option<DateTime<Utc>>,
    jwt_id: Option<String>,
    raw: serde_json::Value,
}

impl RawClaims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(payload: &str) -> ClaimsResult<Self> {
        let value: serde_json::Value = serde_json::from_str(payload)?;
        Self::try_from(value)
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_audience(self, audience: impl Into<String>) -> Self {
        self.with_audiences([audience])
    }

    pub fn with_audiences<I, S>(mut self, audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audiences = Some(audiences.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn with_not_before(mut self, not_before: DateTime<Utc>) -> Self {
        self.not_before = Some(not_before);
        self
    }

    pub fn with_issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    pub fn with_jwt_id(mut self, jwt_id: impl Into<String>) -> Self {
        self.jwt_id = Some(jwt_id.into());
        self
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn jwt_id(&self) -> Option<&str> {
        self.jwt_id.as_deref()
    }

    /// The payload this claim set was parsed from, including private claims.
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }
}

impl ClaimSet for RawClaims {
    fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    fn audiences(&self) -> Option<&[String]> {
        self.audiences.as_deref()
    }

    fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    fn not_before(&self) -> Option<DateTime<Utc>> {
        self.not_before
    }
}

#[derive(Debug, Deserialize)]
struct ClaimsRepr {
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    aud: Option<AudienceRepr>,
    #[serde(default)]
    exp: Option<NumericDateRepr>,
    #[serde(default)]
    nbf: Option<NumericDateRepr>,
    #[serde(default)]
    iat: Option<NumericDateRepr>,
    #[serde(default)]
    jti: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AudienceRepr {
    Single(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum NumericDateRepr {
    Seconds(i64),
    Fractional(f64),
}

impl NumericDateRepr {
    fn to_datetime(self, claim: &'static str) -> ClaimsResult<DateTime<Utc>> {
        let invalid = |raw: String| ClaimsError::InvalidClaim(claim, raw);
        match self {
            NumericDateRepr::Seconds(secs) => {
                if !(0..=MAX_TIMESTAMP).contains(&secs) {
                    return Err(invalid(secs.to_string()));
                }
                Utc.timestamp_opt(secs, 0)
                    .single()
                    .ok_or_else(|| invalid(secs.to_string()))
            }
            NumericDateRepr::Fractional(secs) => {
                if !secs.is_finite() || secs < 0.0 || secs > MAX_TIMESTAMP as f64 {
                    return Err(invalid(secs.to_string()));
                }
                let millis = (secs * 1000.0).round() as i64;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .ok_or_else(|| invalid(secs.to_string()))
            }
        }
    }
}

fn to_datetime(
    value: Option<NumericDateRepr>,
    claim: &'static str,
) -> ClaimsResult<Option<DateTime<Utc>>> {
    value.map(|repr| repr.to_datetime(claim)).transpose()
}

impl TryFrom<ClaimsRepr> for RawClaims {
    type Error = ClaimsError;

    fn try_from(value: ClaimsRepr) -> ClaimsResult<Self> {
        let audiences = match value.aud {
            Some(AudienceRepr::Single(item)) => Some(vec![item]),
            Some(AudienceRepr::Many(items)) if items.is_empty() => {
                return Err(ClaimsError::InvalidClaim("aud", "[]".to_string()));
            }
            Some(AudienceRepr::Many(items)) => Some(items),
            None => None,
        };

        Ok(Self {
            issuer: value.iss,
            subject: value.sub,
            audiences,
            expiration: to_datetime(value.exp, "exp")?,
            not_before: to_datetime(value.nbf, "nbf")?,
            issued_at: to_datetime(value.iat, "iat")?,
            jwt_id: value.jti,
            raw: serde_json::Value::Null,
        })
    }
}

impl TryFrom<serde_json::Value> for RawClaims {
    type Error = ClaimsError;

    fn try_from(value: serde_json::Value) -> ClaimsResult<Self> {
        if !value.is_object() {
            return Err(ClaimsError::InvalidJson(
                "claim payload must be a JSON object".to_string(),
            ));
        }
        let repr: ClaimsRepr = serde_json::from_value(value.clone())?;
        let mut claims = RawClaims::try_from(repr)?;
        claims.raw = value;
        Ok(claims)
    }
}
