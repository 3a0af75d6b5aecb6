use chrono::{Duration, TimeZone, Utc};
use common_jwt_validation::{validate, RawClaims, ValidatorConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_validate(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let config = ValidatorConfig::builder()
        .with_expected_issuer("auth.example")
        .with_expected_audience("svc-A")
        .ignore_subject()
        .with_clock_skew(std::time::Duration::from_secs(120))
        .with_fixed_now(now)
        .build()
        .expect("valid config");

    let accepted = RawClaims::new()
        .with_issuer("auth.example")
        .with_subject("user-42")
        .with_audiences(["svc-B", "svc-C", "svc-D", "svc-A"])
        .with_expiration(now + Duration::minutes(5))
        .with_not_before(now - Duration::minutes(5));

    let expired = accepted.clone().with_expiration(now - Duration::hours(1));

    c.bench_function("validate_accepted", |b| {
        b.iter(|| validate(black_box(&config), black_box(&accepted)))
    });
    c.bench_function("validate_expired", |b| {
        b.iter(|| validate(black_box(&config), black_box(&expired)))
    });
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);
