use num_bigint::{BigInt, BigUint};
use num_rational::BigRational;
use num_traits::{One, ToPrimitive, Zero};

use crate::core::totient::{totient, totients};
use crate::domain::model::PrecisionMode;
use crate::utils::error::{Result, TailError};
use crate::utils::validation::validate_precision_digits;

/// Σ 1/(q·φ(q)) in one of the two arithmetics.
///
/// The decimal variant is a fixed-point integer at `10^digits` scale whose
/// per-term divisions round UP, so it can only overstate the true sum.  The
/// sum feeds an upper bound, so overstatement is sound and understatement is
/// not; round-to-nearest must never be reintroduced here.
#[derive(Debug, Clone, PartialEq)]
pub enum HarmonicSum {
    Exact(BigRational),
    Decimal { scaled: BigUint, digits: u32 },
}

impl HarmonicSum {
    pub fn to_rational(&self) -> BigRational {
        match self {
            HarmonicSum::Exact(r) => r.clone(),
            HarmonicSum::Decimal { scaled, digits } => BigRational::new(
                BigInt::from(scaled.clone()),
                BigInt::from(BigUint::from(10u32).pow(*digits)),
            ),
        }
    }

    pub fn to_f64(&self) -> f64 {
        self.to_rational().to_f64().unwrap_or(f64::NAN)
    }

    /// Rendering for the row stream: decimal values print every digit of
    /// their fixed-point representation, exact values print the reduced
    /// fraction.
    pub fn render(&self) -> String {
        match self {
            HarmonicSum::Exact(r) => format!("{}/{}", r.numer(), r.denom()),
            HarmonicSum::Decimal { scaled, digits } => format_scaled(scaled, *digits),
        }
    }

    /// Value rounded half-up to `places` decimal places.
    pub fn to_decimal_string(&self, places: u32) -> String {
        match self {
            HarmonicSum::Exact(r) => {
                let scale = BigInt::from(BigUint::from(10u32).pow(places));
                let scaled = r * BigRational::from_integer(scale);
                let half = BigRational::new(BigInt::one(), BigInt::from(2));
                let rounded = (scaled + half).floor().to_integer();
                format_scaled(rounded.magnitude(), places)
            }
            HarmonicSum::Decimal { scaled, digits } => {
                if places >= *digits {
                    let padded = scaled * BigUint::from(10u32).pow(places - *digits);
                    format_scaled(&padded, places)
                } else {
                    let down = BigUint::from(10u32).pow(*digits - places);
                    let mut quot = scaled / &down;
                    let rem = scaled % &down;
                    if &rem * 2u32 >= down {
                        quot += 1u32;
                    }
                    format_scaled(&quot, places)
                }
            }
        }
    }
}

fn format_scaled(value: &BigUint, digits: u32) -> String {
    let raw = value.to_string();
    if digits == 0 {
        return raw;
    }
    let d = digits as usize;
    if raw.len() <= d {
        format!("0.{}{}", "0".repeat(d - raw.len()), raw)
    } else {
        let (int_part, frac_part) = raw.split_at(raw.len() - d);
        format!("{}.{}", int_part, frac_part)
    }
}

#[derive(Debug, Clone)]
enum Inner {
    Exact {
        sum: BigRational,
    },
    Decimal {
        sum: BigUint,
        scale: BigUint,
        digits: u32,
    },
}

/// Running Σ 1/(q·φ(q)).  Strictly ordered prefix-fold: terms must be pushed
/// with q ascending for the cumulative column to stay monotone.
#[derive(Debug, Clone)]
pub struct HarmonicAccumulator {
    inner: Inner,
}

impl HarmonicAccumulator {
    pub fn new(mode: PrecisionMode) -> Result<Self> {
        let inner = match mode {
            PrecisionMode::Exact => Inner::Exact {
                sum: BigRational::zero(),
            },
            PrecisionMode::Decimal { digits } => {
                validate_precision_digits(digits)?;
                Inner::Decimal {
                    sum: BigUint::zero(),
                    scale: BigUint::from(10u32).pow(digits),
                    digits,
                }
            }
        };
        Ok(Self { inner })
    }

    pub fn mode(&self) -> PrecisionMode {
        match &self.inner {
            Inner::Exact { .. } => PrecisionMode::Exact,
            Inner::Decimal { digits, .. } => PrecisionMode::Decimal { digits: *digits },
        }
    }

    /// Add 1/(q·φ(q)) and return the term in the accumulator's
    /// representation.
    pub fn push(&mut self, q: u64, phi_q: u64) -> HarmonicSum {
        let den = q as u128 * phi_q as u128;
        match &mut self.inner {
            Inner::Exact { sum } => {
                let term = BigRational::new(BigInt::one(), BigInt::from(den));
                *sum = &*sum + &term;
                HarmonicSum::Exact(term)
            }
            Inner::Decimal { sum, scale, digits } => {
                let den = BigUint::from(den);
                // ceil(scale / den): the one place rounding direction matters
                let term = (scale.clone() + &den - 1u32) / &den;
                *sum += &term;
                HarmonicSum::Decimal {
                    scaled: term,
                    digits: *digits,
                }
            }
        }
    }

    pub fn value(&self) -> HarmonicSum {
        match &self.inner {
            Inner::Exact { sum } => HarmonicSum::Exact(sum.clone()),
            Inner::Decimal { sum, digits, .. } => HarmonicSum::Decimal {
                scaled: sum.clone(),
                digits: *digits,
            },
        }
    }
}

/// Σ_{q=1..up_to} 1/(q·φ(q)).  Base case: harmonic_sum(1) = 1.
pub fn harmonic_sum(up_to: u64, mode: PrecisionMode) -> Result<HarmonicSum> {
    let table = totients(up_to)?;
    let mut acc = HarmonicAccumulator::new(mode)?;
    for q in 1..=up_to {
        acc.push(q, table[q as usize]);
    }
    Ok(acc.value())
}

/// Σ_{q=2..up_to} 1/(q·φ(q)): the error-moduli sum the aggregator consumes.
/// The q=1 arc carries the main term, so its harmonic term is excluded; this
/// is the quantity the release constant records.  Empty (zero) at up_to = 1.
pub fn error_moduli_sum(up_to: u64, mode: PrecisionMode) -> Result<HarmonicSum> {
    if up_to < 1 {
        return Err(TailError::domain("up_to", up_to, "a cutoff of at least 1"));
    }
    let mut acc = HarmonicAccumulator::new(mode)?;
    if up_to >= 2 {
        let table = totients(up_to)?;
        for q in 2..=up_to {
            acc.push(q, table[q as usize]);
        }
    }
    Ok(acc.value())
}

#[derive(Debug, Clone)]
pub struct HarmonicRow {
    pub q: u64,
    pub phi_q: u64,
    pub term: HarmonicSum,
    pub cumulative: HarmonicSum,
}

/// Row-at-a-time harmonic stream from q = 1.  Uses trial-division totients so
/// memory stays flat however large the cutoff; recomputing any prefix is
/// deterministic, which is what makes resumed streams idempotent.
pub struct HarmonicStream {
    next_q: u64,
    up_to: u64,
    acc: HarmonicAccumulator,
}

impl HarmonicStream {
    pub fn new(up_to: u64, mode: PrecisionMode) -> Result<Self> {
        if up_to < 1 {
            return Err(TailError::domain("up_to", up_to, "a cutoff of at least 1"));
        }
        Ok(Self {
            next_q: 1,
            up_to,
            acc: HarmonicAccumulator::new(mode)?,
        })
    }
}

impl Iterator for HarmonicStream {
    type Item = Result<HarmonicRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_q > self.up_to {
            return None;
        }
        let q = self.next_q;
        self.next_q += 1;
        let phi_q = match totient(q) {
            Ok(v) => v,
            Err(e) => return Some(Err(e)),
        };
        let term = self.acc.push(q, phi_q);
        Some(Ok(HarmonicRow {
            q,
            phi_q,
            term,
            cumulative: self.acc.value(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(up_to: u64) -> HarmonicSum {
        harmonic_sum(up_to, PrecisionMode::Exact).unwrap()
    }

    #[test]
    fn test_base_case_is_one() {
        let s = exact(1);
        assert_eq!(s.to_rational(), BigRational::one());
    }

    #[test]
    fn test_recurrence_per_term() {
        for q in 2..=60u64 {
            let prev = exact(q - 1).to_rational();
            let here = exact(q).to_rational();
            let phi_q = totient(q).unwrap();
            let term = BigRational::new(BigInt::one(), BigInt::from(q as u128 * phi_q as u128));
            assert_eq!(here, prev + term, "recurrence fails at q={}", q);
        }
    }

    #[test]
    fn test_error_moduli_sum_differs_by_exactly_one() {
        for q in [1u64, 2, 10, 100] {
            let full = exact(q).to_rational();
            let tail = error_moduli_sum(q, PrecisionMode::Exact)
                .unwrap()
                .to_rational();
            assert_eq!(full, tail + BigRational::one());
        }
    }

    #[test]
    fn test_monotone_in_cutoff() {
        let mut prev = BigRational::zero();
        for q in 1..=40u64 {
            let here = exact(q).to_rational();
            assert!(here > prev, "sum must strictly increase at q={}", q);
            prev = here;
        }
    }

    #[test]
    fn test_decimal_never_understates_exact() {
        for up_to in [10u64, 100, 500] {
            for digits in [5u32, 12, 30] {
                let dec = harmonic_sum(up_to, PrecisionMode::Decimal { digits })
                    .unwrap()
                    .to_rational();
                let exa = exact(up_to).to_rational();
                assert!(
                    dec >= exa,
                    "decimal({}) understates exact at Q={}",
                    digits,
                    up_to
                );
                // and overstates by at most one ulp per term
                let slack = BigRational::new(
                    BigInt::from(up_to),
                    BigInt::from(BigUint::from(10u32).pow(digits)),
                );
                assert!(dec - exa <= slack);
            }
        }
    }

    #[test]
    fn test_decimal_and_exact_agree_within_resolution() {
        let up_to = 1000u64;
        let digits = 20u32;
        let dec = harmonic_sum(up_to, PrecisionMode::Decimal { digits })
            .unwrap()
            .to_f64();
        let exa = exact(up_to).to_f64();
        assert!((dec - exa).abs() < 1e-12);
    }

    #[test]
    fn test_stream_matches_batch() {
        let rows: Vec<HarmonicRow> = HarmonicStream::new(200, PrecisionMode::Decimal { digits: 25 })
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows.len(), 200);
        assert_eq!(rows[0].q, 1);
        assert_eq!(rows[0].phi_q, 1);
        let last = rows.last().unwrap();
        let batch = harmonic_sum(200, PrecisionMode::Decimal { digits: 25 }).unwrap();
        assert_eq!(last.cumulative, batch);
    }

    #[test]
    fn test_fixed_point_rendering() {
        let one = HarmonicSum::Decimal {
            scaled: BigUint::from(10u32).pow(6),
            digits: 6,
        };
        assert_eq!(one.render(), "1.000000");
        let small = HarmonicSum::Decimal {
            scaled: BigUint::from(42u32),
            digits: 6,
        };
        assert_eq!(small.render(), "0.000042");
    }

    #[test]
    fn test_rounding_to_places() {
        // 1/3 at 5 places, half-up
        let third = HarmonicSum::Exact(BigRational::new(BigInt::one(), BigInt::from(3)));
        assert_eq!(third.to_decimal_string(5), "0.33333");
        let two_thirds = HarmonicSum::Exact(BigRational::new(BigInt::from(2), BigInt::from(3)));
        assert_eq!(two_thirds.to_decimal_string(5), "0.66667");
    }

    #[test]
    fn test_invalid_precision_rejected() {
        assert!(harmonic_sum(10, PrecisionMode::Decimal { digits: 0 }).is_err());
    }

    #[test]
    fn test_invalid_cutoff_rejected() {
        assert!(harmonic_sum(0, PrecisionMode::Exact).is_err());
        assert!(error_moduli_sum(0, PrecisionMode::Exact).is_err());
        assert!(HarmonicStream::new(0, PrecisionMode::Exact).is_err());
    }
}
