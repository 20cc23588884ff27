//! Step-driven stress test of a structure.
//!
//! A [`Simulation`] owns one structure and moves through
//! `Idle -> Running -> Terminated`. Each call to [`Simulation::step`] is a pure
//! function of the current state, so a host may drive it from an animation
//! callback or headlessly in a loop.

use petgraph::graph::EdgeIndex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::errors::{SimulationError, StructureError};
use crate::load::{LoadModel, TestKind, TestSpec};
use crate::snapshot::Snapshot;
use crate::solver;
use crate::structure::{Structure, StructureSpec};
use crate::topology;

/// How a finished run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No member broke.
    Survived,
    /// At least one member broke, or the structure could not carry load.
    Failed,
}

/// Lifecycle of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    /// Waiting for [`Simulation::start`].
    Idle,
    /// Stepping.
    Running,
    /// Finished; the result is frozen until [`Simulation::reset`].
    Terminated(Outcome),
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The step ceiling was reached.
    StepCeiling,
    /// Too large a share of members broke.
    FailureThreshold,
    /// No chain of members joins the bridge anchors; nothing was stepped.
    NoLoadPath,
}

/// Final report of a run, produced once at termination.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TestResult {
    /// Load kind that was applied.
    pub kind: TestKind,
    /// Target load magnitude.
    pub magnitude: f64,
    /// Whether the structure came through intact.
    pub survived: bool,
    /// Members that broke, in index order.
    pub failed_members: Vec<EdgeIndex>,
    /// Distinct 3-cycles in the member graph.
    pub triangle_count: usize,
    /// Largest distance any particle moved from rest.
    pub max_deflection: f64,
    /// Steps completed.
    pub steps: usize,
    /// Why the run stopped.
    pub termination: Termination,
}

/// Receives a snapshot after every step of [`Simulation::run_observed`].
pub trait StepObserver {
    /// Called once per completed step.
    fn on_step(&mut self, snapshot: &Snapshot);
}

impl<F: FnMut(&Snapshot)> StepObserver for F {
    fn on_step(&mut self, snapshot: &Snapshot) {
        self(snapshot);
    }
}

/// One stress test of one structure.
///
/// # Examples
/// ```
/// use trussim::{point, Material, Simulation, SimulationConfig, Structure, TestKind, TestSpec};
///
/// let mut structure = Structure::new();
/// structure
///     .add_member(point(400.0, 500.0), point(400.0, 400.0), Material::Steel)
///     .expect("valid member");
/// structure.add_support(point(400.0, 500.0)).expect("valid support");
///
/// let mut simulation = Simulation::new(structure, SimulationConfig::default());
/// simulation
///     .start(TestSpec::new(TestKind::Compression, 10.0))
///     .expect("valid test");
/// let result = simulation.run().expect("run terminates");
/// assert!(result.survived);
/// ```
#[derive(Clone, Debug)]
pub struct Simulation {
    /// Structure mutated by the run.
    structure: Structure,
    /// Tuning parameters.
    config: SimulationConfig,
    /// Active test, set by `start`.
    spec: Option<TestSpec>,
    /// Lifecycle state.
    state: SimulationState,
    /// Steps completed in this run.
    step: usize,
    /// Frozen result once terminated.
    result: Option<TestResult>,
}

impl Simulation {
    /// Wrap a structure in an idle simulation.
    ///
    /// The structure keeps the particle mass, merge tolerance and material
    /// thresholds it was built with, even when they differ from `config`.
    /// Use [`Simulation::from_spec`] to build both from one configuration.
    /// `config` is checked when the run starts.
    #[must_use]
    pub fn new(structure: Structure, config: SimulationConfig) -> Self {
        Self {
            structure,
            config,
            spec: None,
            state: SimulationState::Idle,
            step: 0,
            result: None,
        }
    }

    /// Build the structure described by `spec` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns the [`StructureError`] raised while building the structure.
    pub fn from_spec(spec: &StructureSpec, config: SimulationConfig) -> Result<Self, StructureError> {
        let structure = Structure::from_spec(spec, &config)?;
        Ok(Self::new(structure, config))
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Steps completed in this run.
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.step
    }

    /// Structure being tested.
    #[must_use]
    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// Tuning parameters.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Active test, if a run has been started.
    #[must_use]
    pub fn test(&self) -> Option<&TestSpec> {
        self.spec.as_ref()
    }

    /// Result of the finished run.
    #[must_use]
    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    /// Copy the current state for rendering.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.structure, self.step)
    }

    /// Begin a run.
    ///
    /// A bridge whose anchors are not joined by members terminates at once as
    /// failed, without stepping. Otherwise the simulation becomes `Running`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NotIdle`] unless the simulation is idle,
    /// [`SimulationError::Config`] for out-of-range parameters,
    /// [`SimulationError::Validation`] for an invalid test and
    /// [`SimulationError::NothingToTest`] for a structure without members.
    pub fn start(&mut self, spec: TestSpec) -> Result<SimulationState, SimulationError> {
        if self.state != SimulationState::Idle {
            return Err(SimulationError::NotIdle);
        }
        self.config.validate()?;
        spec.validate()?;

        if let Some((left, right)) = self.structure.span() {
            if !topology::has_load_path(&self.structure, left, right) {
                warn!(kind = %spec.kind, "no load path between bridge anchors");
                self.spec = Some(spec);
                self.terminate(Termination::NoLoadPath);
                return Ok(self.state);
            }
        }
        if self.structure.member_count() == 0 {
            return Err(SimulationError::NothingToTest);
        }

        debug!(
            kind = %spec.kind,
            magnitude = spec.magnitude,
            members = self.structure.member_count(),
            particles = self.structure.particle_count(),
            "starting run"
        );
        self.spec = Some(spec);
        self.state = SimulationState::Running;
        Ok(self.state)
    }

    /// Advance a running simulation by one step.
    ///
    /// Does nothing unless the simulation is `Running`.
    pub fn step(&mut self) -> SimulationState {
        if self.state != SimulationState::Running {
            return self.state;
        }
        let Some(spec) = self.spec.as_ref() else {
            return self.state;
        };

        let forces = LoadModel::new(spec, &self.config).forces(&self.structure, self.step);
        let newly_failed = solver::step(&mut self.structure, &forces, &self.config);
        self.step += 1;
        if !newly_failed.is_empty() {
            debug!(step = self.step, count = newly_failed.len(), "members failed");
        }

        if self.structure.failed_fraction() > self.config.failure_fraction {
            self.terminate(Termination::FailureThreshold);
        } else if self.step >= self.config.max_steps {
            self.terminate(Termination::StepCeiling);
        }
        self.state
    }

    /// Step until terminated and return the result.
    ///
    /// Returns `None` when the simulation was never started.
    pub fn run(&mut self) -> Option<&TestResult> {
        self.run_observed(&mut |_: &Snapshot| {})
    }

    /// Step until terminated, handing a snapshot to `observer` after each step.
    pub fn run_observed<O: StepObserver + ?Sized>(&mut self, observer: &mut O) -> Option<&TestResult> {
        while self.state == SimulationState::Running {
            self.step();
            observer.on_step(&self.snapshot());
        }
        self.result.as_ref()
    }

    /// Return to `Idle`, restoring rest geometry and intact members.
    pub fn reset(&mut self) {
        self.structure.restore();
        self.spec = None;
        self.state = SimulationState::Idle;
        self.step = 0;
        self.result = None;
    }

    /// Freeze the result and move to `Terminated`.
    fn terminate(&mut self, termination: Termination) {
        let Some(spec) = self.spec else {
            return;
        };
        let failed_members = self.structure.failed_members();
        let survived = failed_members.is_empty() && termination != Termination::NoLoadPath;
        let result = TestResult {
            kind: spec.kind,
            magnitude: spec.magnitude,
            survived,
            failed_members,
            triangle_count: topology::triangle_count(&self.structure),
            max_deflection: self.structure.max_deflection(),
            steps: self.step,
            termination,
        };
        info!(
            kind = %result.kind,
            survived = result.survived,
            steps = result.steps,
            failed = result.failed_members.len(),
            termination = ?result.termination,
            "run terminated"
        );
        self.state = SimulationState::Terminated(if survived {
            Outcome::Survived
        } else {
            Outcome::Failed
        });
        self.result = Some(result);
    }
}
