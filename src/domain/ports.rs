use crate::domain::model::ReportRow;
use crate::utils::error::Result;

/// Where the streaming reporter appends its rows.  Implementations must
/// preserve append order; a flushed prefix is a valid resumable stream.
pub trait RowSink {
    fn append(&mut self, row: &ReportRow) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}
