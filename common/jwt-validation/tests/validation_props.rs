use chrono::{DateTime, Duration, TimeZone, Utc};
use common_jwt_validation::{validate, RawClaims, ValidationError, ValidatorConfig};
use proptest::prelude::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn config_with_skew(skew_secs: u64) -> ValidatorConfig {
    ValidatorConfig::builder()
        .with_fixed_now(now())
        .with_clock_skew(std::time::Duration::from_secs(skew_secs))
        .ignore_issuer()
        .ignore_subject()
        .ignore_audiences()
        .build()
        .expect("skew within bounds")
}

proptest! {
    // exp is rejected exactly when exp <= now - skew.
    #[test]
    fn expiration_rejected_iff_at_or_past_skewed_now(skew in 0u64..=600, offset in -1_200i64..1_200) {
        let config = config_with_skew(skew);
        let exp = now() + Duration::seconds(offset);
        let result = validate(&config, &RawClaims::new().with_expiration(exp));
        if offset <= -(skew as i64) {
            prop_assert_eq!(result, Err(ValidationError::Expired(exp)));
        } else {
            prop_assert!(result.is_ok());
        }
    }

    // nbf is rejected exactly when nbf > now + skew.
    #[test]
    fn not_before_rejected_iff_past_skewed_now(skew in 0u64..=600, offset in -1_200i64..1_200) {
        let config = config_with_skew(skew);
        let nbf = now() + Duration::seconds(offset);
        let result = validate(&config, &RawClaims::new().with_not_before(nbf));
        if offset > skew as i64 {
            prop_assert_eq!(result, Err(ValidationError::NotYetValid(nbf)));
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn repeated_validation_is_identical(
        issuer in proptest::option::of("[a-c]{1,3}"),
        audiences in proptest::option::of(proptest::collection::vec("[a-c]{1,2}", 1..4)),
        exp_offset in proptest::option::of(-600i64..600),
        expected_issuer in proptest::option::of("[a-c]{1,3}"),
        expected_audience in proptest::option::of("[a-c]{1,2}"),
    ) {
        let mut builder = ValidatorConfig::builder().with_fixed_now(now());
        if let Some(value) = expected_issuer {
            builder = builder.with_expected_issuer(value);
        }
        if let Some(value) = expected_audience {
            builder = builder.with_expected_audience(value);
        }
        let config = builder.build().expect("no conflicting options");

        let mut claims = RawClaims::new();
        if let Some(value) = issuer {
            claims = claims.with_issuer(value);
        }
        if let Some(values) = audiences {
            claims = claims.with_audiences(values);
        }
        if let Some(offset) = exp_offset {
            claims = claims.with_expiration(now() + Duration::seconds(offset));
        }

        prop_assert_eq!(validate(&config, &claims), validate(&config, &claims));
    }

    #[test]
    fn unexpected_audiences_fail_unless_ignored(audiences in proptest::collection::vec("[a-z]{1,8}", 1..5)) {
        let claims = RawClaims::new().with_audiences(audiences);

        let strict = ValidatorConfig::builder().with_fixed_now(now()).build().expect("valid");
        prop_assert_eq!(
            validate(&strict, &claims),
            Err(ValidationError::UnexpectedClaim { claim: "audience" })
        );

        let lenient = ValidatorConfig::builder()
            .with_fixed_now(now())
            .ignore_audiences()
            .build()
            .expect("valid");
        prop_assert!(validate(&lenient, &claims).is_ok());
    }

    #[test]
    fn skew_above_ten_minutes_never_builds(extra in 1u64..100_000) {
        let result = ValidatorConfig::builder()
            .with_clock_skew(std::time::Duration::from_secs(600 + extra))
            .build();
        prop_assert!(result.is_err());
    }
}
