use goldbach_tail::core::checker::{TailChecker, TailParams};
use goldbach_tail::utils::validation::Validate;
use goldbach_tail::{
    error_moduli_sum, EnvelopeModel, PrecisionMode, TailLedger, TargetN, Verdict,
};

fn canonical_params(q_cap: u64) -> TailParams {
    TailParams {
        n: TargetN::parse("4e18").unwrap(),
        q: 5253,
        k: 10.0,
        s_floor: 1.2,
        w_sup: 1.0,
        r_exp: 0.6,
        q_cap,
        c_w: None,
    }
}

fn assert_close(actual: f64, expected: f64, rel: f64, label: &str) {
    assert!(
        (actual / expected - 1.0).abs() < rel,
        "{}: got {}, expected {}",
        label,
        actual,
        expected
    );
}

#[test]
fn release_constant_matches_eleven_digit_fixture() {
    let sum = error_moduli_sum(5253, PrecisionMode::Exact).unwrap();
    assert_eq!(sum.to_decimal_string(11), "1.20348665358");
}

#[test]
fn release_ledger_is_consistent() {
    let ledger = TailLedger::release();
    ledger.validate().unwrap();
    let recomputed = ledger
        .verify_consistency(PrecisionMode::Decimal { digits: 50 })
        .unwrap();
    assert!((recomputed - 1.203486653584393).abs() < 1e-10);
}

#[test]
fn canonical_cutoff_is_the_exact_fifth_root() {
    let n = TargetN::parse("4000000000000000000").unwrap();
    assert_eq!(n.fifth_root_floor().unwrap(), TailLedger::release().q);
}

#[test]
fn canonical_checker_regression() {
    let result = TailChecker::new(
        canonical_params(1000),
        EnvelopeModel::Uniform,
        PrecisionMode::Decimal { digits: 50 },
    )
    .unwrap()
    .run()
    .unwrap();

    assert_eq!(result.verdict, Verdict::Pass);
    assert_eq!(result.q_effective, 1000);
    assert_close(result.harmonic_sum, 1.2019143833311225, 1e-12, "harmonic_sum");
    assert_close(result.major_bound, 9679.007193357163, 1e-9, "major_bound");
    assert_close(result.minor_bound, 35252346.679800764, 1e-9, "minor_bound");
    assert_close(result.threshold, 32703767884512.65, 1e-9, "threshold");
    assert_close(result.margin, 32703732622486.96, 1e-9, "margin");
}

#[test]
fn exact_and_decimal_margins_agree() {
    let run = |mode| {
        TailChecker::new(canonical_params(1000), EnvelopeModel::Uniform, mode)
            .unwrap()
            .run()
            .unwrap()
    };
    let exact = run(PrecisionMode::Exact);
    let decimal = run(PrecisionMode::Decimal { digits: 50 });
    assert_eq!(exact.verdict, Verdict::Pass);
    assert_eq!(decimal.verdict, Verdict::Pass);
    assert!(((exact.margin - decimal.margin) / exact.threshold).abs() < 1e-12);
}

#[test]
fn release_configuration_stays_inside_the_published_allowances() {
    // full cutoff, both envelopes; the original driver demanded the uniform
    // ratio below 1e-8 and the trivial ratio below 1e-3
    let uniform = TailChecker::new(
        canonical_params(5253),
        EnvelopeModel::Uniform,
        PrecisionMode::Decimal { digits: 50 },
    )
    .unwrap()
    .run()
    .unwrap();
    assert_eq!(uniform.verdict, Verdict::Pass);
    assert!(uniform.major_bound / uniform.threshold < 1e-8);
    assert_close(uniform.harmonic_sum, 1.203486653584393, 1e-12, "S(5253)");

    let trivial = TailChecker::new(
        canonical_params(5253),
        EnvelopeModel::Trivial,
        PrecisionMode::Decimal { digits: 50 },
    )
    .unwrap()
    .run()
    .unwrap();
    assert_eq!(trivial.verdict, Verdict::Pass);
    assert!(trivial.major_bound / trivial.threshold < 1e-3);
}

#[test]
fn starved_decimal_precision_reports_indeterminate_not_pass() {
    // With one decimal digit every harmonic term rounds up to 0.1 or worse,
    // and a safety factor tuned near the balance point lands the margin well
    // inside the unresolvable band.
    let params = TailParams {
        k: 9068844.0,
        ..canonical_params(1000)
    };
    let starved = TailChecker::new(
        params.clone(),
        EnvelopeModel::Uniform,
        PrecisionMode::Decimal { digits: 1 },
    )
    .unwrap()
    .run()
    .unwrap();
    assert_eq!(starved.verdict, Verdict::Indeterminate);

    // rerunning in exact mode resolves the same configuration
    let resolved = TailChecker::new(params, EnvelopeModel::Uniform, PrecisionMode::Exact)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(resolved.verdict, Verdict::Pass);
}

#[test]
fn oversized_safety_factor_fails_cleanly() {
    // an absurd K starves the allowed share until the minor arc alone
    // overruns it
    let params = TailParams {
        k: 1e12,
        ..canonical_params(1000)
    };
    let result = TailChecker::new(params, EnvelopeModel::Uniform, PrecisionMode::Exact)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(result.verdict, Verdict::Fail);
    assert!(result.margin < 0.0);
}

#[test]
fn json_rendition_round_trips() {
    let result = TailChecker::new(
        canonical_params(100),
        EnvelopeModel::Uniform,
        PrecisionMode::Exact,
    )
    .unwrap()
    .run()
    .unwrap();
    let body = serde_json::to_string(&result).unwrap();
    let back: goldbach_tail::VerificationResult = serde_json::from_str(&body).unwrap();
    assert_eq!(back.verdict, result.verdict);
    assert_eq!(back.margin.to_bits(), result.margin.to_bits());
}
