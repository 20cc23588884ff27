use thiserror::Error;
use trussim::{Simulation, SimulationError, Snapshot, StructureError, TestResult};
use tracing::trace;

use crate::scenario::Scenario;

/// Summary of one command-line run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSummary {
    /// Frozen result of the run.
    pub result: TestResult,
    /// Number of members in the structure.
    pub member_count: usize,
    /// Vertical extent of the structure before loading.
    pub structure_height: f64,
    /// Triangle goal, when one was given.
    pub target_triangles: Option<usize>,
    /// Height goal, when one was given.
    pub target_height: Option<f64>,
}

/// Error returned when a scenario cannot be run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Returned when the structure is malformed.
    #[error(transparent)]
    Structure(#[from] StructureError),
    /// Returned when the run cannot start.
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    /// Returned when the run stopped without producing a result.
    #[error("simulation stopped without a result")]
    NoResult,
}

/// Build the structure, run the test to termination and collect a summary.
pub fn run_analysis(scenario: &Scenario) -> Result<AnalysisSummary, AnalysisError> {
    let mut simulation = Simulation::from_spec(&scenario.structure, scenario.config.clone())?;
    let member_count = simulation.structure().member_count();
    let structure_height = simulation.structure().height();

    simulation.start(scenario.test)?;
    let mut trace_step = |snapshot: &Snapshot| {
        let failed = snapshot.members.iter().filter(|member| member.failed).count();
        trace!(step = snapshot.step, failed, "step");
    };
    let result = simulation
        .run_observed(&mut trace_step)
        .cloned()
        .ok_or(AnalysisError::NoResult)?;

    Ok(AnalysisSummary {
        result,
        member_count,
        structure_height,
        target_triangles: scenario.test.target_triangles,
        target_height: scenario.test.target_height,
    })
}
