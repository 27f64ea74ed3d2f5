use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::experiment::{run_experiment, ExperimentParams, ExperimentResult};
use crate::kinetics::time_grid;
use crate::McError;

/// Quantile probability levels `0.5*(1 - p)` and `0.5*(1 + p)` for p in
/// {0.997, 0.95, 0.68}, plus the median: the 3/2/1 sigma points of a normal
/// approximation to the ensemble distribution.
pub const QUANTILE_LEVELS: [f64; 7] = [0.0015, 0.025, 0.16, 0.5, 0.84, 0.975, 0.9985];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Number of independent runs.
    pub experiments: usize,
    /// Base seed; run `i` draws from stream `i` of this seed.
    pub seed: u64,
}

impl EnsembleConfig {
    pub fn validate(&self) -> Result<(), McError> {
        if self.experiments == 0 {
            return Err(McError::InvalidParameter(
                "experiments must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pointwise quantile bands across the ensemble survival fractions.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub levels: [f64; 7],
    /// `bands[b][t]`: quantile `levels[b]` of the ensemble at time index `t`.
    pub bands: Vec<Vec<f64>>,
}

impl Envelope {
    pub fn median(&self) -> &[f64] {
        &self.bands[3]
    }

    pub fn len(&self) -> usize {
        self.bands.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fans out `experiments` independent runs and joins the results.
///
/// Each run owns a ChaCha generator on its own stream of the base seed, so
/// the batch is reproducible and runs never share random state regardless of
/// how rayon schedules them. Completion order is irrelevant downstream.
pub fn run_ensemble(
    params: &ExperimentParams,
    config: &EnsembleConfig,
) -> Result<Vec<ExperimentResult>, McError> {
    config.validate()?;
    params.validate()?;

    (0..config.experiments)
        .into_par_iter()
        .map(|run| {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
            rng.set_stream(run as u64);
            run_experiment(params, &mut rng)
        })
        .collect()
}

/// Survival fraction trajectory of every run, indexed (run, time).
pub fn survival_fractions(results: &[ExperimentResult], droplets: usize) -> Vec<Vec<f64>> {
    results
        .iter()
        .map(|result| result.survival_fractions(droplets))
        .collect()
}

/// Computes the seven quantile trajectories across the run axis.
pub fn quantile_envelopes(fractions: &[Vec<f64>]) -> Result<Envelope, McError> {
    let Some(first) = fractions.first() else {
        return Err(McError::EmptyEnsemble);
    };
    let steps = first.len();
    for trajectory in fractions {
        if trajectory.len() != steps {
            return Err(McError::LengthMismatch {
                context: "survival trajectory",
                expected: steps,
                got: trajectory.len(),
            });
        }
    }

    let mut bands = vec![vec![0.0; steps]; QUANTILE_LEVELS.len()];
    let mut column = vec![0.0; fractions.len()];

    for t in 0..steps {
        for (run, trajectory) in fractions.iter().enumerate() {
            column[run] = trajectory[t];
        }
        column.sort_by(f64::total_cmp);
        for (band, &level) in bands.iter_mut().zip(QUANTILE_LEVELS.iter()) {
            band[t] = quantile_sorted(&column, level);
        }
    }

    Ok(Envelope {
        levels: QUANTILE_LEVELS,
        bands,
    })
}

/// Linear-interpolation quantile over sorted order statistics.
fn quantile_sorted(sorted: &[f64], level: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = level * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Full numeric output handed to an external rendering collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct StudyOutput {
    /// Time grid in hours, length attempts + 1.
    pub time_hours: Vec<f64>,
    /// Theoretical survival curve from the rate law, on the same grid.
    pub theory: Vec<f64>,
    pub envelope: Envelope,
}

/// End-to-end driver: validate, fan out the ensemble, aggregate.
pub fn run_study(config: &RunConfig) -> Result<StudyOutput, McError> {
    config.validate()?;

    let kinetics = config.kinetics();
    let time_hours = time_grid(config.duration_hours, config.attempts);
    let theory = kinetics.survival_curve(&time_hours);

    let results = run_ensemble(&config.experiment_params(), &config.ensemble_config())?;
    let fractions = survival_fractions(&results, config.droplets);
    let envelope = quantile_envelopes(&fractions)?;

    Ok(StudyOutput {
        time_hours,
        theory,
        envelope,
    })
}
