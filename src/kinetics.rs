use serde::{Deserialize, Serialize};

use crate::McError;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// First-order nucleation rate law for a monodisperse droplet population.
///
/// The probability that a droplet of volume `V` is still crystal-free after
/// `t` hours is `exp(-J * V * t * 3600)`, with `J` in events per cm^3 per
/// second and `V` in cm^3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KineticsModel {
    /// Nucleation rate constant J, events per cm^3 per second.
    pub rate_constant: f64,
    /// Droplet diameter, cm.
    pub diameter_cm: f64,
}

impl KineticsModel {
    pub fn new(rate_constant: f64, diameter_cm: f64) -> Result<Self, McError> {
        let model = Self {
            rate_constant,
            diameter_cm,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), McError> {
        if !self.rate_constant.is_finite() || self.rate_constant <= 0.0 {
            return Err(McError::InvalidParameter(
                "rate_constant must be finite and > 0".to_string(),
            ));
        }
        if !self.diameter_cm.is_finite() || self.diameter_cm <= 0.0 {
            return Err(McError::InvalidParameter(
                "diameter_cm must be finite and > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn droplet_volume_cm3(&self) -> f64 {
        let radius = self.diameter_cm / 2.0;
        (4.0 / 3.0) * std::f64::consts::PI * radius.powi(3)
    }

    /// Probability that one droplet is still crystal-free after `t_hours`.
    pub fn survival_probability(&self, t_hours: f64) -> f64 {
        (-self.rate_constant * self.droplet_volume_cm3() * t_hours * SECONDS_PER_HOUR).exp()
    }

    pub fn survival_curve(&self, time_hours: &[f64]) -> Vec<f64> {
        time_hours
            .iter()
            .map(|&t| self.survival_probability(t))
            .collect()
    }

    /// Per-step survival cutoff used by the discrete simulation.
    ///
    /// Fixed to the survival probability at the first grid step. The discrete
    /// model applies this constant per-step hazard at every attempt rather
    /// than re-deriving a time-varying cutoff.
    pub fn step_cutoff(&self, duration_hours: f64, attempts: usize) -> f64 {
        self.survival_probability(duration_hours / attempts as f64)
    }
}

/// Evenly spaced grid of `attempts + 1` points from 0 to `duration_hours`.
pub fn time_grid(duration_hours: f64, attempts: usize) -> Vec<f64> {
    let step = duration_hours / attempts as f64;
    (0..=attempts).map(|i| i as f64 * step).collect()
}
