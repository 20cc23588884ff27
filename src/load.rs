//! Test specifications and the forces they apply.

use std::fmt;
use std::str::FromStr;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::errors::ValidationError;
use crate::structure::Structure;

/// Kind of load applied during a run. Exactly one kind is active per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    /// Downward push on the topmost free particles.
    Compression,
    /// Uniform sideways push on every free particle.
    Shear,
    /// Sideways shaking with a shared sinusoidal phase.
    Oscillating,
}

impl TestKind {
    /// Lower-case name used in input documents and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TestKind::Compression => "compression",
            TestKind::Shear => "shear",
            TestKind::Oscillating => "oscillating",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TestKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "compression" => Ok(TestKind::Compression),
            "shear" => Ok(TestKind::Shear),
            "oscillating" | "earthquake" => Ok(TestKind::Oscillating),
            _ => Err(ValidationError::UnknownTestKind(value.to_owned())),
        }
    }
}

/// What to test and how hard.
///
/// The optional goals are carried for external scoring and do not influence
/// the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestSpec {
    /// Load kind.
    pub kind: TestKind,
    /// Target load reached at the end of the ramp.
    pub magnitude: f64,
    /// Number of triangles the builder was asked for.
    #[serde(default)]
    pub target_triangles: Option<usize>,
    /// Structure height the builder was asked for.
    #[serde(default)]
    pub target_height: Option<f64>,
}

impl TestSpec {
    /// Create a specification without scoring goals.
    #[must_use]
    pub const fn new(kind: TestKind, magnitude: f64) -> Self {
        Self {
            kind,
            magnitude,
            target_triangles: None,
            target_height: None,
        }
    }

    /// Attach a triangle-count goal.
    #[must_use]
    pub const fn with_target_triangles(mut self, triangles: usize) -> Self {
        self.target_triangles = Some(triangles);
        self
    }

    /// Attach a height goal.
    #[must_use]
    pub const fn with_target_height(mut self, height: f64) -> Self {
        self.target_height = Some(height);
        self
    }

    /// Check that the magnitude is a positive finite number.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonFiniteMagnitude`] or
    /// [`ValidationError::NonPositiveMagnitude`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.magnitude.is_finite() {
            return Err(ValidationError::NonFiniteMagnitude(self.magnitude));
        }
        if self.magnitude <= 0.0 {
            return Err(ValidationError::NonPositiveMagnitude(self.magnitude));
        }
        Ok(())
    }
}

/// Fraction of the target load applied at `step`, ramping linearly from zero
/// over `ramp_steps` and holding at one afterwards.
///
/// # Examples
/// ```
/// use trussim::load::progress;
///
/// assert_eq!(progress(0, 300), 0.0);
/// assert_eq!(progress(150, 300), 0.5);
/// assert_eq!(progress(900, 300), 1.0);
/// ```
#[must_use]
pub fn progress(step: usize, ramp_steps: usize) -> f64 {
    if ramp_steps == 0 {
        return 1.0;
    }
    (step as f64 / ramp_steps as f64).min(1.0)
}

/// Converts a test specification into per-particle displacements.
#[derive(Clone, Copy, Debug)]
pub struct LoadModel<'a> {
    /// Active test.
    spec: &'a TestSpec,
    /// Ramp, scale and shape parameters.
    config: &'a SimulationConfig,
}

impl<'a> LoadModel<'a> {
    /// Bind a test to the simulation parameters.
    #[must_use]
    pub fn new(spec: &'a TestSpec, config: &'a SimulationConfig) -> Self {
        Self { spec, config }
    }

    /// Load applied at `step` after ramping.
    #[must_use]
    pub fn effective_load(&self, step: usize) -> f64 {
        self.spec.magnitude * progress(step, self.config.ramp_steps)
    }

    /// Additive displacement for every particle at `step`, indexed by particle
    /// index. Pinned particles always receive zero.
    #[must_use]
    pub fn forces(&self, structure: &Structure, step: usize) -> Vec<Vector2<f64>> {
        let mut forces = vec![Vector2::zeros(); structure.particle_count()];
        let push = self.effective_load(step) * self.config.load_scale;
        let free = structure
            .particles()
            .filter(|(_, particle)| !particle.is_pinned());

        match self.spec.kind {
            TestKind::Compression => {
                let top = structure
                    .particles()
                    .filter(|(_, particle)| !particle.is_pinned())
                    .map(|(_, particle)| particle.position.y)
                    .fold(f64::INFINITY, f64::min);
                for (node, particle) in free {
                    if particle.position.y <= top + self.config.compression_band {
                        forces[node.index()].y += push;
                    }
                }
            }
            TestKind::Shear => {
                for (node, _) in free {
                    forces[node.index()].x += push;
                }
            }
            TestKind::Oscillating => {
                let phase = (step as f64 * self.config.oscillation_rate).sin();
                for (node, _) in free {
                    forces[node.index()].x += phase * push;
                }
            }
        }
        forces
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;
    use crate::material::Material;

    /// A pinned base with two free particles stacked above it.
    fn tower() -> Structure {
        let mut structure = Structure::new();
        structure
            .add_member(point(400.0, 500.0), point(400.0, 450.0), Material::Steel)
            .expect("member added");
        structure
            .add_member(point(400.0, 450.0), point(400.0, 400.0), Material::Steel)
            .expect("member added");
        structure
            .add_member(point(400.0, 400.0), point(402.0, 403.0), Material::Steel)
            .expect("member added");
        structure.add_support(point(400.0, 500.0)).expect("support added");
        structure
    }

    #[test]
    fn unknown_kinds_are_rejected() {
        assert_eq!("Shear".parse::<TestKind>(), Ok(TestKind::Shear));
        assert_eq!("earthquake".parse::<TestKind>(), Ok(TestKind::Oscillating));
        assert_eq!(
            "torsion".parse::<TestKind>(),
            Err(ValidationError::UnknownTestKind("torsion".to_owned()))
        );
    }

    #[test]
    fn magnitude_must_be_positive_and_finite() {
        assert!(TestSpec::new(TestKind::Shear, 1.0).validate().is_ok());
        assert_eq!(
            TestSpec::new(TestKind::Shear, 0.0).validate(),
            Err(ValidationError::NonPositiveMagnitude(0.0))
        );
        assert!(matches!(
            TestSpec::new(TestKind::Shear, f64::NAN).validate(),
            Err(ValidationError::NonFiniteMagnitude(_))
        ));
    }

    #[test]
    fn load_ramps_then_holds() {
        let config = SimulationConfig::default();
        let spec = TestSpec::new(TestKind::Compression, 200.0);
        let model = LoadModel::new(&spec, &config);
        assert_eq!(model.effective_load(0), 0.0);
        assert_relative_eq!(model.effective_load(75), 50.0);
        assert_relative_eq!(model.effective_load(300), 200.0);
        assert_relative_eq!(model.effective_load(599), 200.0);
    }

    #[test]
    fn compression_targets_only_the_top_band() {
        let config = SimulationConfig::default();
        let structure = tower();
        let spec = TestSpec::new(TestKind::Compression, 100.0);
        let forces = LoadModel::new(&spec, &config).forces(&structure, 300);

        let push = 100.0 * config.load_scale;
        let base = structure.find_particle(point(400.0, 500.0)).expect("particle");
        let middle = structure.find_particle(point(400.0, 450.0)).expect("particle");
        let top = structure.find_particle(point(400.0, 400.0)).expect("particle");
        let near_top = structure.find_particle(point(402.0, 403.0)).expect("particle");

        assert_eq!(forces[base.index()], Vector2::zeros());
        assert_eq!(forces[middle.index()], Vector2::zeros());
        assert_relative_eq!(forces[top.index()].y, push);
        assert_relative_eq!(forces[near_top.index()].y, push);
        assert_eq!(forces[top.index()].x, 0.0);
    }

    #[test]
    fn shear_pushes_every_free_particle_sideways() {
        let config = SimulationConfig::default();
        let structure = tower();
        let spec = TestSpec::new(TestKind::Shear, 40.0);
        let forces = LoadModel::new(&spec, &config).forces(&structure, 150);

        for (node, particle) in structure.particles() {
            let expected = if particle.is_pinned() { 0.0 } else { 20.0 * config.load_scale };
            assert_relative_eq!(forces[node.index()].x, expected);
            assert_eq!(forces[node.index()].y, 0.0);
        }
    }

    #[test]
    fn oscillation_shares_one_phase() {
        let config = SimulationConfig::default();
        let structure = tower();
        let spec = TestSpec::new(TestKind::Oscillating, 10.0);
        let model = LoadModel::new(&spec, &config);

        let at_zero = model.forces(&structure, 0);
        assert!(at_zero.iter().all(|force| *force == Vector2::zeros()));

        let step = 400;
        let forces = model.forces(&structure, step);
        let expected = (step as f64 * config.oscillation_rate).sin() * 10.0 * config.load_scale;
        let free: Vec<f64> = structure
            .particles()
            .filter(|(_, particle)| !particle.is_pinned())
            .map(|(node, _)| forces[node.index()].x)
            .collect();
        assert_eq!(free.len(), 3);
        for x in free {
            assert_relative_eq!(x, expected);
        }
    }
}
