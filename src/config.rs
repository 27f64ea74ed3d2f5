use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ensemble::EnsembleConfig;
use crate::experiment::ExperimentParams;
use crate::kinetics::KineticsModel;
use crate::McError;

/// Immutable input configuration for one study, read once at startup.
///
/// Defaults reproduce the reference setup: 1000 runs of 100 droplets
/// (d = 100 um) over 100 hours in 100 steps with J = 1.23.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub experiments: usize,
    pub droplets: usize,
    pub attempts: usize,
    pub duration_hours: f64,
    pub rate_constant: f64,
    pub diameter_cm: f64,
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            experiments: 1000,
            droplets: 100,
            attempts: 100,
            duration_hours: 100.0,
            rate_constant: 1.23,
            diameter_cm: 100e-4,
            seed: 2026,
        }
    }
}

impl RunConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, McError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, McError> {
        let config: RunConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), McError> {
        if self.experiments == 0 {
            return Err(McError::InvalidParameter(
                "experiments must be > 0".to_string(),
            ));
        }
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
        if !self.duration_hours.is_finite() || self.duration_hours <= 0.0 {
            return Err(McError::InvalidParameter(
                "duration_hours must be finite and > 0".to_string(),
            ));
        }
        self.kinetics().validate()?;
        self.experiment_params().validate()?;
        Ok(())
    }

    pub fn kinetics(&self) -> KineticsModel {
        KineticsModel {
            rate_constant: self.rate_constant,
            diameter_cm: self.diameter_cm,
        }
    }

    pub fn experiment_params(&self) -> ExperimentParams {
        ExperimentParams {
            droplets: self.droplets,
            attempts: self.attempts,
            cutoff: self
                .kinetics()
                .step_cutoff(self.duration_hours, self.attempts),
        }
    }

    pub fn ensemble_config(&self) -> EnsembleConfig {
        EnsembleConfig {
            experiments: self.experiments,
            seed: self.seed,
        }
    }
}
