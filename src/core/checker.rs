use crate::core::aggregate::{allowed_share, combine};
use crate::core::envelope::{envelope, uniform_envelope, EnvelopeModel};
use crate::core::harmonic::error_moduli_sum;
use crate::core::totient::totient;
use crate::domain::model::{PrecisionMode, TargetN, Verdict, VerificationResult};
use crate::utils::error::{Result, TailError};
use crate::utils::validation::{
    validate_greater_f64, validate_min_u64, validate_positive_f64, Validate,
};

/// Inputs of one tail-inequality check.  Immutable for the run; several
/// configurations can be checked side by side without cross-contamination.
#[derive(Debug, Clone)]
pub struct TailParams {
    pub n: TargetN,
    /// Harmonic cutoff Q.
    pub q: u64,
    /// Safety factor.
    pub k: f64,
    /// Proven singular-series floor.
    pub s_floor: f64,
    /// Supremum weighting factor for the minor-arc side.
    pub w_sup: f64,
    /// Major/minor split exponent: R = N^Rexp, canonically 3/5.
    pub r_exp: f64,
    /// Cap on moduli actually summed; may be below Q.
    pub q_cap: u64,
    /// Window constant; defaults to 2·Wsup when absent.
    pub c_w: Option<f64>,
}

impl TailParams {
    pub fn window_constant(&self) -> f64 {
        self.c_w.unwrap_or(2.0 * self.w_sup)
    }

    /// Moduli actually folded into the harmonic sum.
    pub fn effective_cutoff(&self) -> u64 {
        self.q.min(self.q_cap)
    }
}

impl Validate for TailParams {
    fn validate(&self) -> Result<()> {
        validate_greater_f64("N", self.n.value(), 1.0)?;
        validate_min_u64("Q", self.q, 1)?;
        validate_min_u64("Qcap", self.q_cap, 1)?;
        validate_positive_f64("Rexp", self.r_exp)?;
        validate_positive_f64("K", self.k)?;
        validate_positive_f64("S_floor", self.s_floor)?;
        validate_positive_f64("Wsup", self.w_sup)?;
        validate_positive_f64("C_W", self.window_constant())?;
        Ok(())
    }
}

/// Classify a margin against the arithmetic's resolvable epsilon.  Exact
/// mode has epsilon 0 and never returns Indeterminate; a zero margin fails
/// because the inequality is strict.
pub fn resolve_verdict(margin: f64, epsilon: f64) -> Verdict {
    if epsilon > 0.0 && margin.abs() <= epsilon {
        Verdict::Indeterminate
    } else if margin > 0.0 {
        Verdict::Pass
    } else {
        Verdict::Fail
    }
}

/// The tail inequality checker: ties the major-arc aggregation and the
/// minor-arc envelope together for one N and renders a verdict.
pub struct TailChecker {
    params: TailParams,
    model: EnvelopeModel,
    mode: PrecisionMode,
}

impl TailChecker {
    pub fn new(params: TailParams, model: EnvelopeModel, mode: PrecisionMode) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            model,
            mode,
        })
    }

    pub fn params(&self) -> &TailParams {
        &self.params
    }

    pub fn run(&self) -> Result<VerificationResult> {
        let p = &self.params;
        let n = p.n.value();
        let log_n = n.ln();
        let r = n.powf(p.r_exp);
        if !r.is_finite() || r <= std::f64::consts::E {
            return Err(TailError::domain(
                "R",
                r,
                "a minor-arc radius above e (raise N or Rexp)",
            ));
        }
        let cutoff = p.effective_cutoff();
        let c_w = p.window_constant();

        tracing::info!("Checking tail inequality at N={:e}", n);
        tracing::debug!("logN={}, R={:e}, cutoff={}", log_n, r, cutoff);

        // Major arc: envelope-weighted harmonic aggregation over 2..=cutoff.
        let (major_bound, harmonic_sum, fallback_count, envelope_reference) = match &self.model {
            EnvelopeModel::Uniform | EnvelopeModel::Trivial => {
                let sum = error_moduli_sum(cutoff, self.mode)?.to_f64();
                tracing::debug!("harmonic error-moduli sum S({}) = {}", cutoff, sum);
                let env = envelope(1, n, log_n, &self.model)?;
                let major = combine(p.k, p.s_floor, c_w, sum, env.value, r)?;
                (major, sum, 0u64, env.value)
            }
            EnvelopeModel::PerModulus { .. } => {
                // Ordered f64 fold; the envelope varies per modulus so it
                // cannot be factored out of the sum.
                let mut weighted = 0.0f64;
                let mut sum = 0.0f64;
                let mut fallbacks = 0u64;
                for q in 2..=cutoff {
                    let phi_q = totient(q)?;
                    let term = 1.0 / ((q as u128 * phi_q as u128) as f64);
                    let env = envelope(q, n, log_n, &self.model)?;
                    weighted += env.value * term;
                    sum += term;
                    if env.fallback_used {
                        fallbacks += 1;
                    }
                }
                tracing::debug!(
                    "per-modulus weighted sum = {} ({} fallbacks)",
                    weighted,
                    fallbacks
                );
                let major = combine(p.k, p.s_floor, c_w, weighted, 1.0, r)?;
                (major, sum, fallbacks, uniform_envelope(n, log_n))
            }
        };

        // Minor arc: the uniform envelope evaluated at the split radius.
        let minor_bound = p.w_sup * uniform_envelope(r, r.ln());
        let total_bound = major_bound + minor_bound;
        let threshold = allowed_share(n, log_n, p.k, p.s_floor)?;
        let margin = threshold - total_bound;

        // One-sided decimal accumulation can overstate the sum by at most
        // one ulp per term; anything inside that band is unresolvable.
        let epsilon = match self.mode {
            PrecisionMode::Exact => 0.0,
            PrecisionMode::Decimal { .. } => {
                let terms = cutoff.saturating_sub(1) as f64;
                (c_w / r) * envelope_reference * terms * self.mode.resolution()
            }
        };
        let verdict = resolve_verdict(margin, epsilon);

        tracing::info!(
            "major={:e} minor={:e} total={:e} threshold={:e} margin={:e} -> {}",
            major_bound,
            minor_bound,
            total_bound,
            threshold,
            margin,
            verdict
        );

        Ok(VerificationResult {
            n,
            log_n,
            q: p.q,
            q_effective: cutoff,
            r,
            harmonic_sum,
            major_bound,
            minor_bound,
            total_bound,
            threshold,
            margin,
            verdict,
            fallback_count,
        })
    }
}

/// Human-readable rendition of a result, one scalar per line.
pub fn render_report(result: &VerificationResult) -> String {
    let mut out = String::new();
    out.push_str("📋 Tail Inequality Report:\n");
    out.push_str(&format!("  N:              {:e}\n", result.n));
    out.push_str(&format!("  log N:          {}\n", result.log_n));
    out.push_str(&format!("  Q:              {}\n", result.q));
    out.push_str(&format!("  Q effective:    {}\n", result.q_effective));
    out.push_str(&format!("  R:              {:e}\n", result.r));
    out.push_str(&format!("  harmonic sum:   {}\n", result.harmonic_sum));
    out.push_str(&format!("  major bound:    {:e}\n", result.major_bound));
    out.push_str(&format!("  minor bound:    {:e}\n", result.minor_bound));
    out.push_str(&format!("  total bound:    {:e}\n", result.total_bound));
    out.push_str(&format!("  threshold:      {:e}\n", result.threshold));
    out.push_str(&format!("  margin:         {:e}\n", result.margin));
    if result.fallback_count > 0 {
        out.push_str(&format!("  fallbacks used: {}\n", result.fallback_count));
    }
    out.push_str(&format!("  Verdict: {}\n", result.verdict));
    out
}
