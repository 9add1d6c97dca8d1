use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::utils::error::{Result, TailError};

/// Major-arc error envelope per modulus.  Dispatch is an exhaustive match so
/// a new model is a compile-time-checked addition, never an implicit default.
#[derive(Debug, Clone)]
pub enum EnvelopeModel {
    /// N / (160·ln N), the uniform large-sieve-backed bound.
    Uniform,
    /// N·ln N + N, the trivial bound; useful as a sanity envelope.
    Trivial,
    /// Tabulated per-modulus constants with a policy for absent entries.
    PerModulus {
        table: EnvelopeTable,
        fallback: FallbackPolicy,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Substitute the uniform value and mark the row.
    UseUniform,
    /// Missing entries are an error naming the modulus.
    Error,
}

/// Closed forms a table entry may take, keyed by the `form` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeForm {
    /// c1·N/ln N
    COverLog,
    /// c1·N·ln N
    CTimesLog,
    /// c1·N·ln N + c2·N
    Affine,
}

impl EnvelopeForm {
    fn parse(raw: &str, q: u64) -> Result<Self> {
        match raw {
            "cNoverlog" => Ok(EnvelopeForm::COverLog),
            "cNlog" => Ok(EnvelopeForm::CTimesLog),
            "affine" => Ok(EnvelopeForm::Affine),
            other => Err(TailError::ConfigError {
                field: "form".to_string(),
                message: format!(
                    "unknown envelope form '{}' for q={} (expected cNoverlog, cNlog or affine)",
                    other, q
                ),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvelopeEntry {
    pub form: EnvelopeForm,
    pub c1: f64,
    pub c2: f64,
}

impl EnvelopeEntry {
    pub fn evaluate(&self, n: f64, log_n: f64) -> f64 {
        match self.form {
            EnvelopeForm::COverLog => self.c1 * n / log_n,
            EnvelopeForm::CTimesLog => self.c1 * n * log_n,
            EnvelopeForm::Affine => self.c1 * n * log_n + self.c2 * n,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEnvelopeRecord {
    q: u64,
    form: String,
    c1: f64,
    c2: f64,
}

/// Per-modulus envelope constants, `q → (form, c1, c2)`.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeTable {
    entries: BTreeMap<u64, EnvelopeEntry>,
}

impl EnvelopeTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load `q,form,c1,c2` rows; unknown forms fail at load time.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut entries = BTreeMap::new();
        for record in reader.deserialize() {
            let raw: RawEnvelopeRecord = record?;
            let entry = EnvelopeEntry {
                form: EnvelopeForm::parse(&raw.form, raw.q)?,
                c1: raw.c1,
                c2: raw.c2,
            };
            entries.insert(raw.q, entry);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, q: u64) -> Option<&EnvelopeEntry> {
        self.entries.get(&q)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An evaluated envelope, with the fallback marker the row stream carries.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeValue {
    pub value: f64,
    pub fallback_used: bool,
}

pub fn uniform_envelope(n: f64, log_n: f64) -> f64 {
    n / (160.0 * log_n)
}

pub fn trivial_envelope(n: f64, log_n: f64) -> f64 {
    n * log_n + n
}

/// Evaluate the envelope for modulus q at scale n.  The uniform form needs
/// ln n > 1, hence n > e.
pub fn envelope(q: u64, n: f64, log_n: f64, model: &EnvelopeModel) -> Result<EnvelopeValue> {
    match model {
        EnvelopeModel::Uniform => {
            require_above_e(n)?;
            Ok(EnvelopeValue {
                value: uniform_envelope(n, log_n),
                fallback_used: false,
            })
        }
        EnvelopeModel::Trivial => {
            if !(n > 1.0) || !n.is_finite() {
                return Err(TailError::domain("N", n, "N > 1"));
            }
            Ok(EnvelopeValue {
                value: trivial_envelope(n, log_n),
                fallback_used: false,
            })
        }
        EnvelopeModel::PerModulus { table, fallback } => match table.get(q) {
            Some(entry) => Ok(EnvelopeValue {
                value: entry.evaluate(n, log_n),
                fallback_used: false,
            }),
            None => match fallback {
                FallbackPolicy::UseUniform => {
                    require_above_e(n)?;
                    Ok(EnvelopeValue {
                        value: uniform_envelope(n, log_n),
                        fallback_used: true,
                    })
                }
                FallbackPolicy::Error => Err(TailError::MissingDataError { modulus: q }),
            },
        },
    }
}

fn require_above_e(n: f64) -> Result<()> {
    if !n.is_finite() || n <= std::f64::consts::E {
        return Err(TailError::domain("N", n, "N > e (so ln N stays positive)"));
    }
    Ok(())
}
