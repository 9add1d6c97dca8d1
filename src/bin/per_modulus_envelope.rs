use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use goldbach_tail::config::cli::{FallbackArg, PrecisionArg};
use goldbach_tail::core::reporter::{last_emitted_q, CsvSink, ModulusReporter, StreamSummary};
use goldbach_tail::utils::logger;
use goldbach_tail::utils::monitor::SystemMonitor;
use goldbach_tail::{EnvelopeModel, EnvelopeTable, Result, TargetN};

#[derive(Parser)]
#[command(name = "per-modulus-envelope")]
#[command(about = "Stream one audit row per modulus up to a cutoff")]
struct Args {
    /// Largest modulus to emit
    #[arg(long = "Qcap", default_value_t = 1000)]
    q_cap: u64,

    /// Policy for moduli absent from the table
    #[arg(long, value_enum, default_value = "uniform")]
    fallback: FallbackArg,

    /// Per-modulus constants CSV
    #[arg(long)]
    table: Option<PathBuf>,

    /// Scale the envelope column is evaluated at
    #[arg(long = "N", default_value = "4e18")]
    n: String,

    /// Harmonic-term arithmetic
    #[arg(long, value_enum, default_value = "decimal")]
    mode: PrecisionArg,

    /// Decimal digits when --mode decimal
    #[arg(long, default_value_t = 50)]
    prec: u32,

    /// Output CSV path; stdout when absent
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extend an existing output file from its last row
    #[arg(long)]
    resume: bool,

    /// Flush (checkpoint) interval in rows
    #[arg(long, default_value_t = 1024)]
    flush_every: u64,

    /// Log process stats at completion
    #[arg(long)]
    monitor: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let monitor = SystemMonitor::new(args.monitor);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run(&args) {
        Ok(Some(summary)) => {
            tracing::info!(
                "✅ Emitted {} rows, cumulative sum = {}",
                summary.rows_emitted,
                summary.final_cumulative.render()
            );
            monitor.log_checkpoint(summary.rows_emitted);
            monitor.log_final_stats();
        }
        Ok(None) => {
            tracing::info!("✅ Stream already complete, nothing to extend");
        }
        Err(e) => {
            tracing::error!("❌ Report failed: {}", e);
            eprintln!("❌ {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn run(args: &Args) -> Result<Option<StreamSummary>> {
    let n = TargetN::parse(&args.n)?;

    let table = match &args.table {
        Some(path) => {
            tracing::info!("📁 Loading per-modulus table from {}", path.display());
            EnvelopeTable::from_csv_path(path)?
        }
        None => EnvelopeTable::empty(),
    };
    let model = EnvelopeModel::PerModulus {
        table,
        fallback: args.fallback.policy(),
    };

    let reporter = ModulusReporter::new(args.q_cap, args.mode.mode(args.prec))?
        .with_envelope(model, n.value())
        .with_flush_every(args.flush_every);

    match &args.output {
        Some(path) => {
            let (start_q, file, write_headers) = if args.resume && path.exists() {
                match last_emitted_q(path)? {
                    Some(last) => {
                        let start = last + 1;
                        if start > args.q_cap {
                            return Ok(None);
                        }
                        tracing::info!("↩️ Resuming {} from q={}", path.display(), start);
                        (start, OpenOptions::new().append(true).open(path)?, false)
                    }
                    // headers-only or empty file: start over
                    None => (1, File::create(path)?, true),
                }
            } else {
                (1, File::create(path)?, true)
            };
            let mut sink = CsvSink::new(file, true, write_headers)?;
            Ok(Some(reporter.stream_into(&mut sink, start_q)?))
        }
        None => {
            let stdout = std::io::stdout();
            let mut sink = CsvSink::new(Box::new(stdout.lock()) as Box<dyn Write>, true, true)?;
            Ok(Some(reporter.stream_into(&mut sink, 1)?))
        }
    }
}
