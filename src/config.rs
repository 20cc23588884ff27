//! Tuning parameters for the simulation.
//!
//! The defaults are the reference values the engine was tuned with. None of
//! them is physically authoritative; they control how stiff, how heavy and how
//! forgiving structures feel.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ParameterError};
use crate::material::MaterialTable;

/// Parameters shared by every run of a [`Simulation`](crate::Simulation).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fraction of the inferred velocity kept each step.
    pub damping: f64,
    /// Downward displacement per step per unit mass.
    pub gravity: f64,
    /// Mass assigned to every particle.
    pub particle_mass: f64,
    /// Relaxation passes over the members per step.
    pub constraint_iterations: usize,
    /// Steps taken to ramp the load from zero to its target.
    pub ramp_steps: usize,
    /// Hard ceiling on the number of steps in a run.
    pub max_steps: usize,
    /// Fraction of failed members above which a run ends early.
    pub failure_fraction: f64,
    /// Display scale applied to the deformation of a member.
    pub stress_scale: f64,
    /// Displacement per step contributed by one unit of effective load.
    pub load_scale: f64,
    /// Height of the band below the topmost free particle that receives the
    /// compression load.
    pub compression_band: f64,
    /// Angular rate, in radians per step, of the oscillating load.
    pub oscillation_rate: f64,
    /// Width of the simulation domain.
    pub width: f64,
    /// Height of the simulation domain; `y == height` is the floor.
    pub height: f64,
    /// Smallest distance used when normalising a member direction.
    pub min_distance: f64,
    /// Endpoints closer than this are unified into one particle.
    pub merge_tolerance: f64,
    /// Breaking thresholds per material.
    pub materials: MaterialTable,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            damping: 0.98,
            gravity: 0.3,
            particle_mass: 1.0,
            constraint_iterations: 8,
            ramp_steps: 300,
            max_steps: 600,
            failure_fraction: 0.3,
            stress_scale: 5.0,
            load_scale: 0.05,
            compression_band: 5.0,
            oscillation_rate: 0.1,
            width: 800.0,
            height: 600.0,
            min_distance: 1.0e-6,
            merge_tolerance: 1.0e-6,
            materials: MaterialTable::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse a configuration from a JSON document and validate it.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::OutOfRange`] when a parameter is invalid.
    ///
    /// # Examples
    /// ```
    /// use trussim::SimulationConfig;
    ///
    /// let config = SimulationConfig::from_json_str(r#"{ "max_steps": 120 }"#)
    ///     .expect("valid configuration");
    /// assert_eq!(config.max_steps, 120);
    /// assert_eq!(config.constraint_iterations, 8);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
    /// same errors as [`SimulationConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check every parameter against its valid range.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] naming the first invalid parameter.
    pub fn validate(&self) -> Result<(), ParameterError> {
        let out_of_range = |name: &'static str, value: f64| ParameterError { name, value };

        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(out_of_range("damping", self.damping));
        }
        if !(self.gravity.is_finite() && self.gravity >= 0.0) {
            return Err(out_of_range("gravity", self.gravity));
        }
        if !(self.particle_mass.is_finite() && self.particle_mass > 0.0) {
            return Err(out_of_range("particle_mass", self.particle_mass));
        }
        if self.constraint_iterations == 0 {
            return Err(out_of_range("constraint_iterations", 0.0));
        }
        if self.ramp_steps == 0 {
            return Err(out_of_range("ramp_steps", 0.0));
        }
        if self.max_steps == 0 {
            return Err(out_of_range("max_steps", 0.0));
        }
        if !(0.0..=1.0).contains(&self.failure_fraction) {
            return Err(out_of_range("failure_fraction", self.failure_fraction));
        }
        for (name, value) in [
            ("stress_scale", self.stress_scale),
            ("load_scale", self.load_scale),
            ("compression_band", self.compression_band),
            ("oscillation_rate", self.oscillation_rate),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(out_of_range(name, value));
            }
        }
        for (name, value) in [
            ("width", self.width),
            ("height", self.height),
            ("min_distance", self.min_distance),
            ("merge_tolerance", self.merge_tolerance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(out_of_range(name, value));
            }
        }
        for (material, max_stretch) in self.materials.entries() {
            // The compression threshold mirrors around 1.0 and must stay positive.
            if !(max_stretch > 1.0 && max_stretch < 2.0) {
                return Err(out_of_range(material.name(), max_stretch));
            }
        }
        Ok(())
    }
}
