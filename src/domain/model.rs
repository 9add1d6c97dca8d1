use num_bigint::BigUint;
use num_integer::Roots;
use num_traits::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::utils::error::{Result, TailError};

/// Arithmetic used for the harmonic accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrecisionMode {
    /// Reduced rationals, no precision loss.
    Exact,
    /// Fixed-point at `10^digits`, every term rounded up.
    Decimal { digits: u32 },
}

impl PrecisionMode {
    /// Smallest representable step of the accumulator, 0 for exact mode.
    pub fn resolution(&self) -> f64 {
        match self {
            PrecisionMode::Exact => 0.0,
            PrecisionMode::Decimal { digits } => 10f64.powi(-(*digits as i32)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail,
    Indeterminate,
}

impl Verdict {
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
            Verdict::Indeterminate => 2,
        }
    }

    /// The worse of two verdicts, for multi-envelope runs.
    /// Fail dominates Indeterminate dominates Pass.
    pub fn worst(self, other: Verdict) -> Verdict {
        use Verdict::*;
        match (self, other) {
            (Fail, _) | (_, Fail) => Fail,
            (Indeterminate, _) | (_, Indeterminate) => Indeterminate,
            _ => Pass,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail => write!(f, "FAIL"),
            Verdict::Indeterminate => write!(f, "INDETERMINATE"),
        }
    }
}

/// Everything the tail check produced for one configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub n: f64,
    pub log_n: f64,
    /// Configured harmonic cutoff.
    pub q: u64,
    /// min(Q, Qcap), the moduli actually summed.
    pub q_effective: u64,
    /// Major/minor arc split radius N^Rexp.
    pub r: f64,
    /// Error-moduli harmonic sum over 2 ≤ q ≤ q_effective.
    pub harmonic_sum: f64,
    pub major_bound: f64,
    pub minor_bound: f64,
    pub total_bound: f64,
    pub threshold: f64,
    pub margin: f64,
    pub verdict: Verdict,
    /// Moduli that fell back to the uniform envelope (per-modulus model).
    pub fallback_count: u64,
}

/// One row of the per-modulus stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub q: u64,
    pub phi_q: u64,
    pub term: String,
    pub cumulative_sum: String,
    pub envelope_q: Option<f64>,
    pub fallback_used: Option<bool>,
}

/// Target integer N.  Accepts a plain digit string (kept exact) or a
/// scientific-notation literal; the integer rendition backs the exact
/// fifth-root cutoff, the float rendition feeds the bound formulas.
#[derive(Debug, Clone)]
pub struct TargetN {
    int: BigUint,
    value: f64,
}

impl TargetN {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TailError::domain("N", input, "a non-empty number"));
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            let int = BigUint::parse_bytes(trimmed.as_bytes(), 10)
                .ok_or_else(|| TailError::domain("N", input, "a base-10 integer"))?;
            let value = int
                .to_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| TailError::domain("N", input, "a float-representable magnitude"))?;
            Ok(Self { int, value })
        } else {
            let value: f64 = trimmed
                .parse()
                .map_err(|_| TailError::domain("N", input, "an integer or scientific literal"))?;
            Self::from_f64(value)
        }
    }

    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(TailError::domain(
                "N",
                value,
                "a finite non-negative number",
            ));
        }
        let int = BigUint::from_f64(value)
            .ok_or_else(|| TailError::domain("N", value, "an integral magnitude"))?;
        Ok(Self { int, value })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// floor(N^{1/5}) on the exact integer, never on the float.
    pub fn fifth_root_floor(&self) -> Result<u64> {
        self.int.nth_root(5).to_u64().ok_or_else(|| {
            TailError::domain("Q", "floor(N^{1/5})", "a cutoff representable as u64")
        })
    }
}
