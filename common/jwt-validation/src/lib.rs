//! Claim validation for JWTs whose signature has already been verified.
//!
//! A [`ValidatorConfig`] captures the policy (expected issuer, subject and
//! audience, clock skew, optional pinned "now"); [`validate`] applies it to
//! any [`ClaimSet`].

pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod policy;
pub mod validator;

pub use claims::{ClaimSet, RawClaims, MAX_TIMESTAMP};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ValidatorConfig, ValidatorConfigBuilder, MAX_CLOCK_SKEW};
pub use error::{
    ClaimsError, ClaimsResult, ConfigResult, ConfigurationError, ValidationError,
    ValidationResult,
};
pub use policy::ClaimPolicy;
pub use validator::{validate, validate_with_clock};
