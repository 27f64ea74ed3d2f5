//! Monte Carlo survival statistics for droplet nucleation experiments.
//!
//! A population of droplets is tracked over discrete time steps; each step
//! every crystal-free droplet survives with a fixed probability derived from
//! a first-order nucleation rate law. Many independent runs are aggregated
//! into pointwise quantile envelopes around the expected survival curve.

pub mod config;
pub mod ensemble;
pub mod experiment;
pub mod kinetics;

use thiserror::Error;

pub use config::RunConfig;
pub use ensemble::{
    quantile_envelopes, run_ensemble, run_study, survival_fractions, EnsembleConfig, Envelope,
    StudyOutput, QUANTILE_LEVELS,
};
pub use experiment::{run_experiment, ExperimentParams, ExperimentResult};
pub use kinetics::{time_grid, KineticsModel};

#[derive(Debug, Error)]
pub enum McError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("empty ensemble: quantile envelopes require at least one experiment")]
    EmptyEnsemble,
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
