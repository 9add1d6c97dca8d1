use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::harmonic::error_moduli_sum;
use crate::domain::model::PrecisionMode;
use crate::utils::error::{Result, TailError};
use crate::utils::validation::{validate_min_u64, validate_positive_f64, Validate};

/// Canonical release constants (Appendix-C configuration).
pub const RELEASE_Q: u64 = 5253;
pub const RELEASE_K: f64 = 10.0;
pub const RELEASE_S_FLOOR: f64 = 1.2;
pub const RELEASE_C_W: f64 = 2.0;
/// Error-moduli harmonic sum Σ_{2 ≤ q ≤ 5253} 1/(q·φ(q)).
pub const RELEASE_HARMONIC_SUM: f64 = 1.203486653584393;
pub const RELEASE_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerFile {
    constants: TailLedger,
}

/// The persisted constant ledger.  Loaded once per run and immutable from
/// then on; every computation receives it explicitly so several
/// configurations can be verified side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailLedger {
    /// Harmonic cutoff the cached sum was computed at.
    #[serde(rename = "Q")]
    pub q: u64,
    /// Safety factor.
    #[serde(rename = "K")]
    pub k: f64,
    /// Proven singular-series floor.
    #[serde(rename = "S_floor")]
    pub s_floor: f64,
    /// Window constant.
    #[serde(rename = "C_W")]
    pub c_w: f64,
    /// Cached Σ_{2 ≤ q ≤ Q} 1/(q·φ(q)); checked against a fresh
    /// recomputation on load.
    pub cached_harmonic_sum: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    RELEASE_TOLERANCE
}

impl TailLedger {
    pub fn release() -> Self {
        Self {
            q: RELEASE_Q,
            k: RELEASE_K,
            s_floor: RELEASE_S_FLOOR,
            c_w: RELEASE_C_W,
            cached_harmonic_sum: RELEASE_HARMONIC_SUM,
            tolerance: RELEASE_TOLERANCE,
        }
    }

    /// 從 TOML 檔案載入常數帳本
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TailError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析，支援 ${VAR} 環境變數替換
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        let file: LedgerFile = toml::from_str(&processed).map_err(|e| TailError::ConfigError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })?;
        Ok(file.constants)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(&LedgerFile {
            constants: self.clone(),
        })
        .map_err(|e| TailError::ConfigError {
            field: "toml_serialization".to_string(),
            message: e.to_string(),
        })
    }

    /// Recompute the error-moduli sum at Q and compare with the cache.
    /// Divergence beyond tolerance means a hand-edited or stale constant.
    pub fn verify_consistency(&self, mode: PrecisionMode) -> Result<f64> {
        let recomputed = error_moduli_sum(self.q, mode)?.to_f64();
        if (recomputed - self.cached_harmonic_sum).abs() > self.tolerance {
            return Err(TailError::ConsistencyError {
                cached: self.cached_harmonic_sum,
                recomputed,
                tolerance: self.tolerance,
            });
        }
        Ok(recomputed)
    }
}

impl Validate for TailLedger {
    fn validate(&self) -> Result<()> {
        validate_min_u64("Q", self.q, 1)?;
        validate_positive_f64("K", self.k)?;
        validate_positive_f64("S_floor", self.s_floor)?;
        validate_positive_f64("C_W", self.c_w)?;
        validate_positive_f64("cached_harmonic_sum", self.cached_harmonic_sum)?;
        validate_positive_f64("tolerance", self.tolerance)?;
        Ok(())
    }
}

/// 替換環境變數 (例如 ${TAIL_Q})
fn substitute_env_vars(content: &str) -> String {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();
    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}
