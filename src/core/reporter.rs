use std::io::Write;
use std::path::Path;

use crate::core::envelope::{envelope, EnvelopeModel};
use crate::core::harmonic::{HarmonicStream, HarmonicSum};
use crate::domain::model::{PrecisionMode, ReportRow};
use crate::domain::ports::RowSink;
use crate::utils::error::{Result, TailError};

pub const DEFAULT_FLUSH_EVERY: u64 = 1024;

/// CSV sink over any writer.  Headers carry the envelope columns only when
/// the stream does.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    include_envelope: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W, include_envelope: bool, write_headers: bool) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        if write_headers {
            if include_envelope {
                writer.write_record([
                    "q",
                    "phi_q",
                    "term",
                    "cumulative_sum",
                    "envelope_q",
                    "fallback_used",
                ])?;
            } else {
                writer.write_record(["q", "phi_q", "term", "cumulative_sum"])?;
            }
        }
        Ok(Self {
            writer,
            include_envelope,
        })
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn append(&mut self, row: &ReportRow) -> Result<()> {
        if self.include_envelope {
            self.writer.write_record([
                row.q.to_string(),
                row.phi_q.to_string(),
                row.term.clone(),
                row.cumulative_sum.clone(),
                row.envelope_q.map(|v| v.to_string()).unwrap_or_default(),
                row.fallback_used.map(|v| v.to_string()).unwrap_or_default(),
            ])?;
        } else {
            self.writer.write_record([
                row.q.to_string(),
                row.phi_q.to_string(),
                row.term.clone(),
                row.cumulative_sum.clone(),
            ])?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct StreamSummary {
    pub rows_emitted: u64,
    pub final_cumulative: HarmonicSum,
}

/// Streams one row per modulus from q = 1 to the cap.  Rows already emitted
/// for a modulus are never revised; resuming recomputes the deterministic
/// prefix internally and appends from `start_q`.
pub struct ModulusReporter {
    q_cap: u64,
    mode: PrecisionMode,
    envelope: Option<(EnvelopeModel, f64)>,
    flush_every: u64,
}

impl ModulusReporter {
    pub fn new(q_cap: u64, mode: PrecisionMode) -> Result<Self> {
        if q_cap < 1 {
            return Err(TailError::domain("Qcap", q_cap, "a cutoff of at least 1"));
        }
        Ok(Self {
            q_cap,
            mode,
            envelope: None,
            flush_every: DEFAULT_FLUSH_EVERY,
        })
    }

    pub fn with_envelope(mut self, model: EnvelopeModel, n: f64) -> Self {
        self.envelope = Some((model, n));
        self
    }

    pub fn with_flush_every(mut self, every: u64) -> Self {
        self.flush_every = every.max(1);
        self
    }

    pub fn q_cap(&self) -> u64 {
        self.q_cap
    }

    pub fn has_envelope(&self) -> bool {
        self.envelope.is_some()
    }

    /// Emit rows `start_q..=q_cap` into the sink, flushing every
    /// `flush_every` rows so an interrupted run leaves a valid prefix.
    pub fn stream_into(&self, sink: &mut dyn RowSink, start_q: u64) -> Result<StreamSummary> {
        let env_context = match &self.envelope {
            Some((model, n)) => Some((model, *n, n.ln())),
            None => None,
        };
        let mut emitted = 0u64;
        let mut last_cumulative: Option<HarmonicSum> = None;
        for row in HarmonicStream::new(self.q_cap, self.mode)? {
            let row = row?;
            let cumulative = row.cumulative;
            if row.q >= start_q {
                let (envelope_q, fallback_used) = match env_context {
                    Some((model, n, log_n)) => {
                        let value = envelope(row.q, n, log_n, model)?;
                        (Some(value.value), Some(value.fallback_used))
                    }
                    None => (None, None),
                };
                sink.append(&ReportRow {
                    q: row.q,
                    phi_q: row.phi_q,
                    term: row.term.render(),
                    cumulative_sum: cumulative.render(),
                    envelope_q,
                    fallback_used,
                })?;
                emitted += 1;
                if emitted % self.flush_every == 0 {
                    sink.flush()?;
                    tracing::debug!("checkpoint: {} rows emitted, at q={}", emitted, row.q);
                }
            }
            last_cumulative = Some(cumulative);
        }
        sink.flush()?;
        let final_cumulative = last_cumulative.ok_or_else(|| {
            TailError::domain("Qcap", self.q_cap, "a stream with at least one row")
        })?;
        Ok(StreamSummary {
            rows_emitted: emitted,
            final_cumulative,
        })
    }
}

/// Last modulus present in an existing row stream, None for a headers-only
/// file.  Used to pick the resume point.
pub fn last_emitted_q<P: AsRef<Path>>(path: P) -> Result<Option<u64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let mut last = None;
    for record in reader.records() {
        let record = record?;
        if let Some(field) = record.get(0) {
            if let Ok(q) = field.parse::<u64>() {
                last = Some(q);
            }
        }
    }
    Ok(last)
}
