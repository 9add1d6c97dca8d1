use crate::utils::error::Result;
use crate::utils::validation::validate_positive_f64;

/// Fold the ledger constants and the harmonic weight into the major-arc
/// bound: `(C_W / R) · envelope_contribution · harmonic_weight`.
///
/// Pure, no hidden state.  Uniform-style models pass the envelope value and
/// the harmonic sum separately; per-modulus models fold the envelope into
/// `harmonic_weight` (Σ E_q/(q·φ(q))) and pass a unit contribution.  K and
/// S_floor do not enter the bound itself, but they are part of the constant
/// set and are validated here so an invalid configuration cannot produce a
/// number at all; the normalized bound `combine(..) / allowed_share(..)`
/// scales linearly with K and C_W and inversely with S_floor.
pub fn combine(
    k: f64,
    s_floor: f64,
    c_w: f64,
    harmonic_weight: f64,
    envelope_contribution: f64,
    arc_radius: f64,
) -> Result<f64> {
    validate_positive_f64("K", k)?;
    validate_positive_f64("S_floor", s_floor)?;
    validate_positive_f64("C_W", c_w)?;
    validate_positive_f64("R", arc_radius)?;
    Ok((c_w / arc_radius) * envelope_contribution * harmonic_weight)
}

/// The share of the main term the proof's contraction margin allows the
/// error to consume: `(S_floor / (8K)) · N / log²N`.  A smaller proven
/// singular-series floor shrinks the allowance proportionally.
pub fn allowed_share(n: f64, log_n: f64, k: f64, s_floor: f64) -> Result<f64> {
    validate_positive_f64("K", k)?;
    validate_positive_f64("S_floor", s_floor)?;
    validate_positive_f64("N", n)?;
    validate_positive_f64("logN", log_n)?;
    Ok((s_floor / (8.0 * k)) * n / (log_n * log_n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_rejects_nonpositive_constants() {
        assert!(combine(0.0, 1.2, 2.0, 1.0, 1.0, 1.0).is_err());
        assert!(combine(10.0, -1.2, 2.0, 1.0, 1.0, 1.0).is_err());
        assert!(combine(10.0, 1.2, 0.0, 1.0, 1.0, 1.0).is_err());
        assert!(combine(10.0, 1.2, 2.0, 1.0, 1.0, 0.0).is_err());
        assert!(combine(10.0, 1.2, 2.0, 1.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_normalized_bound_scaling() {
        let (n, l, r) = (4e18f64, 4e18f64.ln(), 4e18f64.powf(0.6));
        let (s, e) = (1.2034866535843931, 5.8e14);
        let ratio = |k: f64, s_floor: f64, c_w: f64| {
            combine(k, s_floor, c_w, s, e, r).unwrap()
                / allowed_share(n, l, k, s_floor).unwrap()
        };
        let base = ratio(10.0, 1.2, 2.0);
        // linear in K and C_W, inverse in S_floor
        assert!((ratio(20.0, 1.2, 2.0) / base - 2.0).abs() < 1e-12);
        assert!((ratio(10.0, 1.2, 4.0) / base - 2.0).abs() < 1e-12);
        assert!((ratio(10.0, 2.4, 2.0) / base - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_share_tracks_contraction_margin() {
        let l = 4e18f64.ln();
        let share = allowed_share(4e18, l, 10.0, 1.2).unwrap();
        assert!((share / ((1.2 / 80.0) * 4e18 / (l * l)) - 1.0).abs() < 1e-15);
    }
}
