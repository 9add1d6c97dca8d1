use clap::ValueEnum;

use crate::core::envelope::FallbackPolicy;
use crate::domain::model::PrecisionMode;

/// Envelope model selector shared by the command-line entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelArg {
    Uniform,
    #[value(name = "per_modulus")]
    PerModulus,
    Trivial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FallbackArg {
    Uniform,
    Error,
}

impl FallbackArg {
    pub fn policy(self) -> FallbackPolicy {
        match self {
            FallbackArg::Uniform => FallbackPolicy::UseUniform,
            FallbackArg::Error => FallbackPolicy::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrecisionArg {
    Exact,
    Decimal,
}

impl PrecisionArg {
    pub fn mode(self, digits: u32) -> PrecisionMode {
        match self {
            PrecisionArg::Exact => PrecisionMode::Exact,
            PrecisionArg::Decimal => PrecisionMode::Decimal { digits },
        }
    }
}
