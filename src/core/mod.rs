pub mod aggregate;
pub mod checker;
pub mod envelope;
pub mod harmonic;
pub mod reporter;
pub mod totient;

pub use crate::domain::model::{PrecisionMode, ReportRow, Verdict, VerificationResult};
pub use crate::domain::ports::RowSink;
pub use crate::utils::error::Result;
