use std::path::PathBuf;
use std::process;

use clap::Parser;

use goldbach_tail::config::cli::{FallbackArg, ModelArg, PrecisionArg};
use goldbach_tail::core::checker::{render_report, TailChecker, TailParams};
use goldbach_tail::utils::logger;
use goldbach_tail::{
    EnvelopeModel, EnvelopeTable, Result, TargetN, VerificationResult,
};

#[derive(Parser)]
#[command(name = "major-arc-envelope")]
#[command(about = "Check the tail inequality with explicit parameters")]
struct Args {
    /// Envelope model for the major-arc aggregation
    #[arg(long, value_enum, default_value = "uniform")]
    model: ModelArg,

    /// Target even integer (digit string or scientific notation)
    #[arg(long = "N", default_value = "4e18")]
    n: String,

    /// Safety factor
    #[arg(long = "K", default_value_t = 10.0)]
    k: f64,

    /// Singular-series floor
    #[arg(long = "S", default_value_t = 1.2)]
    s_floor: f64,

    /// Supremum weighting factor
    #[arg(long = "Wsup", default_value_t = 1.0)]
    w_sup: f64,

    /// Window constant (defaults to 2·Wsup)
    #[arg(long = "CW")]
    c_w: Option<f64>,

    /// Split exponent: R = N^Rexp
    #[arg(long = "Rexp", default_value_t = 0.6)]
    r_exp: f64,

    /// Harmonic cutoff (defaults to floor(N^{1/5}))
    #[arg(long = "Q")]
    q: Option<u64>,

    /// Cap on moduli actually summed (defaults to Q)
    #[arg(long = "Qcap")]
    q_cap: Option<u64>,

    /// Per-modulus constants CSV, used with --model per_modulus
    #[arg(long)]
    table: Option<PathBuf>,

    /// Policy for moduli absent from the table
    #[arg(long, value_enum, default_value = "uniform")]
    fallback: FallbackArg,

    /// Harmonic-sum arithmetic
    #[arg(long, value_enum, default_value = "decimal")]
    mode: PrecisionArg,

    /// Decimal digits when --mode decimal
    #[arg(long, default_value_t = 50)]
    prec: u32,

    /// Emit the result as JSON instead of the report
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    match run(&args) {
        Ok(result) => {
            if args.json {
                match serde_json::to_string_pretty(&result) {
                    Ok(body) => println!("{}", body),
                    Err(e) => {
                        eprintln!("❌ Failed to serialize result: {}", e);
                        process::exit(3);
                    }
                }
            } else {
                print!("{}", render_report(&result));
            }
            process::exit(result.verdict.exit_code());
        }
        Err(e) => {
            tracing::error!("❌ Check failed: {}", e);
            eprintln!("❌ {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn run(args: &Args) -> Result<VerificationResult> {
    let n = TargetN::parse(&args.n)?;
    let q = match args.q {
        Some(q) => q,
        None => n.fifth_root_floor()?,
    };
    let q_cap = args.q_cap.unwrap_or(q);

    let model = match args.model {
        ModelArg::Uniform => EnvelopeModel::Uniform,
        ModelArg::Trivial => EnvelopeModel::Trivial,
        ModelArg::PerModulus => {
            let table = match &args.table {
                Some(path) => {
                    tracing::info!("📁 Loading per-modulus table from {}", path.display());
                    EnvelopeTable::from_csv_path(path)?
                }
                None => EnvelopeTable::empty(),
            };
            tracing::debug!("table entries: {}", table.len());
            EnvelopeModel::PerModulus {
                table,
                fallback: args.fallback.policy(),
            }
        }
    };

    let params = TailParams {
        n,
        q,
        k: args.k,
        s_floor: args.s_floor,
        w_sup: args.w_sup,
        r_exp: args.r_exp,
        q_cap,
        c_w: args.c_w,
    };

    TailChecker::new(params, model, args.mode.mode(args.prec))?.run()
}
