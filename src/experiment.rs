use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::McError;

/// Immutable inputs for one stochastic run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperimentParams {
    /// Population size N.
    pub droplets: usize,
    /// Number of discrete time steps.
    pub attempts: usize,
    /// Per-step survival probability; a droplet stays crystal-free for the
    /// step when its uniform draw exceeds this value.
    pub cutoff: f64,
}

impl ExperimentParams {
    pub fn validate(&self) -> Result<(), McError> {
        if self.droplets == 0 {
            return Err(McError::InvalidParameter(
                "droplets must be > 0".to_string(),
            ));
        }
        if self.attempts == 0 {
            return Err(McError::InvalidParameter(
                "attempts must be > 0".to_string(),
            ));
        }
        if !self.cutoff.is_finite() || !(0.0..=1.0).contains(&self.cutoff) {
            return Err(McError::InvalidParameter(
                "cutoff must be finite and in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Newly nucleated droplet counts per step; index 0 is always zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub nucleations: Vec<u64>,
}

impl ExperimentResult {
    pub fn len(&self) -> usize {
        self.nucleations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nucleations.is_empty()
    }

    pub fn total_nucleated(&self) -> u64 {
        self.nucleations.iter().sum()
    }

    /// Remaining crystal-free droplets at each step: N minus the running
    /// cumulative nucleation count.
    pub fn survival_counts(&self, droplets: usize) -> Vec<u64> {
        let mut nucleated = 0u64;
        self.nucleations
            .iter()
            .map(|&k| {
                nucleated += k;
                assert!(
                    nucleated <= droplets as u64,
                    "nucleation count exceeds population"
                );
                droplets as u64 - nucleated
            })
            .collect()
    }

    pub fn survival_fractions(&self, droplets: usize) -> Vec<f64> {
        self.survival_counts(droplets)
            .into_iter()
            .map(|n| n as f64 / droplets as f64)
            .collect()
    }
}

/// Runs one experiment: each step, every remaining droplet draws a uniform
/// sample in [0, 1) and nucleates when the draw exceeds `cutoff`.
///
/// Once the population is exhausted the remaining steps record zero without
/// touching the generator. The caller owns the generator, so parallel runs
/// stay independent by construction.
pub fn run_experiment<R: Rng>(
    params: &ExperimentParams,
    rng: &mut R,
) -> Result<ExperimentResult, McError> {
    params.validate()?;

    let mut remaining = params.droplets;
    let mut nucleations = vec![0u64; params.attempts + 1];

    for slot in nucleations.iter_mut().skip(1) {
        let new_crystals = (0..remaining)
            .filter(|_| rng.gen::<f64>() > params.cutoff)
            .count();
        *slot = new_crystals as u64;
        remaining -= new_crystals;
    }

    Ok(ExperimentResult { nucleations })
}

#[cfg(test)]
mod tests {
    use super::{run_experiment, ExperimentParams};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params(droplets: usize, attempts: usize, cutoff: f64) -> ExperimentParams {
        ExperimentParams {
            droplets,
            attempts,
            cutoff,
        }
    }

    #[test]
    fn rejects_invalid_params() {
        assert!(params(0, 10, 0.5).validate().is_err());
        assert!(params(10, 0, 0.5).validate().is_err());
        assert!(params(10, 10, -0.1).validate().is_err());
        assert!(params(10, 10, 1.1).validate().is_err());
        assert!(params(10, 10, f64::NAN).validate().is_err());
        assert!(params(10, 10, 0.0).validate().is_ok());
        assert!(params(10, 10, 1.0).validate().is_ok());
    }

    #[test]
    fn cutoff_one_never_nucleates() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let result = run_experiment(&params(50, 20, 1.0), &mut rng).unwrap();
        assert!(result.nucleations.iter().all(|&k| k == 0));
        assert!(result
            .survival_fractions(50)
            .iter()
            .all(|&f| (f - 1.0).abs() < 1e-15));
    }

    #[test]
    fn cutoff_zero_nucleates_everything_at_step_one() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let result = run_experiment(&params(50, 20, 0.0), &mut rng).unwrap();
        assert_eq!(result.nucleations[0], 0);
        assert_eq!(result.nucleations[1], 50);
        assert!(result.nucleations[2..].iter().all(|&k| k == 0));

        let fractions = result.survival_fractions(50);
        assert_eq!(fractions[0], 1.0);
        assert!(fractions[1..].iter().all(|&f| f == 0.0));
    }

    #[test]
    fn result_respects_population_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let p = params(100, 50, 0.9);
        let result = run_experiment(&p, &mut rng).unwrap();

        assert_eq!(result.len(), 51);
        assert_eq!(result.nucleations[0], 0);
        assert!(result.total_nucleated() <= 100);

        let counts = result.survival_counts(100);
        assert!(counts.iter().all(|&n| n <= 100));
        for pair in counts.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn fixed_seed_reproduces_identical_output() {
        let p = params(100, 5, 0.99);
        let mut rng_a = ChaCha8Rng::seed_from_u64(2026);
        let mut rng_b = ChaCha8Rng::seed_from_u64(2026);

        let a = run_experiment(&p, &mut rng_a).unwrap();
        let b = run_experiment(&p, &mut rng_b).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 6);
        assert!(a.total_nucleated() <= 100);
    }

    #[test]
    fn exhausted_population_keeps_recording_zeros() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        // cutoff 0 drains the population at step 1; later steps draw nothing.
        let result = run_experiment(&params(3, 100, 0.0), &mut rng).unwrap();
        assert_eq!(result.total_nucleated(), 3);
        assert_eq!(*result.survival_counts(3).last().unwrap(), 0);
    }
}
