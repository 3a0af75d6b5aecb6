use crate::error::{ConfigResult, ConfigurationError};

/// How the validator treats one identity claim (issuer, subject or audience).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClaimPolicy {
    /// Nothing expected; a token carrying the claim is rejected.
    #[default]
    Unspecified,
    /// The claim must be present and match this value.
    Expect(String),
    /// The claim is not checked.
    Ignore,
}

impl ClaimPolicy {
    /// Folds the flat `expected_*` / `ignore_*` options into a single policy.
    pub(crate) fn from_options(
        expected: Option<String>,
        ignore: bool,
        names: (&'static str, &'static str),
    ) -> ConfigResult<Self> {
        match (expected, ignore) {
            (Some(_), true) => Err(ConfigurationError::ConflictingPolicy {
                expected: names.0,
                ignore: names.1,
            }),
            (Some(value), false) => Ok(Self::Expect(value)),
            (None, true) => Ok(Self::Ignore),
            (None, false) => Ok(Self::Unspecified),
        }
    }

    pub fn expected(&self) -> Option<&str> {
        match self {
            Self::Expect(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignore)
    }
}
