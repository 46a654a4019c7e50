//! Générateur de lectures : échantillonne chaque paramètre d'un scénario, le
//! perturbe par un bruit capteur multiplicatif et l'arrondit à sa précision.

use crate::models::{ParamValue, Reading};
use crate::scenarios::{self, ParamRange, Precision, Scenario};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::BTreeMap;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub const DEFAULT_NOISE_LEVEL: f64 = 0.05;

#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("Unknown scenario: {requested}. Available: {available:?}")]
    InvalidScenario {
        requested: String,
        available: Vec<&'static str>,
    },
    #[error("Noise level must lie in [0, 1), got {0}")]
    InvalidNoiseLevel(f64),
}

#[derive(Debug, Clone)]
pub struct Simulator {
    noise_level: f64,
}

impl Default for Simulator {
    fn default() -> Self {
        Self { noise_level: DEFAULT_NOISE_LEVEL }
    }
}

impl Simulator {
    pub fn new(noise_level: f64) -> Result<Self, SimulatorError> {
        if !(0.0..1.0).contains(&noise_level) {
            return Err(SimulatorError::InvalidNoiseLevel(noise_level));
        }
        Ok(Self { noise_level })
    }

    #[cfg(test)]
    pub fn noise_level(&self) -> f64 {
        self.noise_level
    }

    /// Tirage pondéré dans la table des scénarios.
    pub fn select_scenario<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static Scenario {
        let table = scenarios::all();
        table
            .choose_weighted(rng, |s| s.weight)
            .unwrap_or(&table[0])
    }

    /// Génère une lecture avec le RNG du thread courant.
    pub fn generate(&self, scenario: Option<&str>) -> Result<Reading, SimulatorError> {
        self.generate_with(scenario, &mut rand::rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        scenario: Option<&str>,
        rng: &mut R,
    ) -> Result<Reading, SimulatorError> {
        let scenario = match scenario {
            None => self.select_scenario(rng),
            Some(key) => scenarios::find(key).ok_or_else(|| SimulatorError::InvalidScenario {
                requested: key.to_string(),
                available: scenarios::keys(),
            })?,
        };

        let timestamp = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();

        let data: BTreeMap<String, ParamValue> = scenario
            .ranges
            .iter()
            .map(|range| (range.param.to_string(), self.sample(range, rng)))
            .collect();

        Ok(Reading {
            scenario: scenario.key.to_string(),
            name: scenario.name.to_string(),
            location: scenario.location.to_string(),
            timestamp,
            data,
        })
    }

    fn sample<R: Rng + ?Sized>(&self, range: &ParamRange, rng: &mut R) -> ParamValue {
        let base = rng.random_range(range.min..=range.max);
        let noisy = self.add_noise(base, range.min, range.max, rng);
        round_to(noisy, scenarios::precision_of(range.param), range)
    }

    fn add_noise<R: Rng + ?Sized>(&self, value: f64, min: f64, max: f64, rng: &mut R) -> f64 {
        let noise = rng.random_range(-self.noise_level..=self.noise_level);
        (value * (1.0 + noise)).clamp(min, max)
    }
}

fn round_to(value: f64, precision: Precision, range: &ParamRange) -> ParamValue {
    match precision {
        Precision::Integer => ParamValue::Count(value.round().max(0.0) as u64),
        Precision::OneDecimal => {
            ParamValue::Measure(((value * 10.0).round() / 10.0).clamp(range.min, range.max))
        }
        Precision::TwoDecimals => {
            ParamValue::Measure(((value * 100.0).round() / 100.0).clamp(range.min, range.max))
        }
    }
}
