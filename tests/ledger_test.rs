use std::io::Write;

use tempfile::NamedTempFile;

use goldbach_tail::utils::validation::Validate;
use goldbach_tail::{PrecisionMode, TailError, TailLedger};

#[test]
fn ledger_loads_from_file_and_checks_out() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[constants]
Q = 200
K = 10.0
S_floor = 1.2
C_W = 2.0
cached_harmonic_sum = {}
"#,
        goldbach_tail::error_moduli_sum(200, PrecisionMode::Exact)
            .unwrap()
            .to_f64()
    )
    .unwrap();

    let ledger = TailLedger::from_file(file.path()).unwrap();
    ledger.validate().unwrap();
    ledger
        .verify_consistency(PrecisionMode::Decimal { digits: 50 })
        .unwrap();
}

#[test]
fn hand_edited_cache_is_rejected_on_load_check() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[constants]
Q = 200
K = 10.0
S_floor = 1.2
C_W = 2.0
cached_harmonic_sum = 0.9
tolerance = 1e-10
"#
    )
    .unwrap();

    let ledger = TailLedger::from_file(file.path()).unwrap();
    match ledger
        .verify_consistency(PrecisionMode::Decimal { digits: 50 })
        .unwrap_err()
    {
        TailError::ConsistencyError {
            cached, tolerance, ..
        } => {
            assert_eq!(cached, 0.9);
            assert_eq!(tolerance, 1e-10);
        }
        other => panic!("expected ConsistencyError, got {other}"),
    }
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = TailLedger::from_toml_str("[constants]\nQ = \"not a number\"").unwrap_err();
    assert!(matches!(err, TailError::ConfigError { .. }));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = TailLedger::from_file("/nonexistent/tail-constants.toml").unwrap_err();
    assert!(matches!(err, TailError::IoError(_)));
}

#[test]
fn a_loose_tolerance_accepts_a_rounded_cache() {
    // the published constant is recorded at 11 decimal places
    let ledger = TailLedger {
        q: 5253,
        cached_harmonic_sum: 1.20348665358,
        tolerance: 1e-10,
        ..TailLedger::release()
    };
    ledger
        .verify_consistency(PrecisionMode::Decimal { digits: 50 })
        .unwrap();
}
