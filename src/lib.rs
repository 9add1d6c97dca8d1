pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::ledger::TailLedger;
pub use crate::core::checker::{TailChecker, TailParams};
pub use crate::core::envelope::{EnvelopeModel, EnvelopeTable, FallbackPolicy};
pub use crate::core::harmonic::{error_moduli_sum, harmonic_sum, HarmonicSum};
pub use crate::core::reporter::{CsvSink, ModulusReporter};
pub use crate::domain::model::{PrecisionMode, TargetN, Verdict, VerificationResult};
pub use crate::utils::error::{Result, TailError};
