use std::fs;
use std::io;

use thiserror::Error;
use trussim::{ConfigError, SimulationConfig, StructureSpec, TestKind, TestSpec, ValidationError};

use crate::cli::Args;

/// Everything needed to run one test from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Structure as drawn in the editor.
    pub structure: StructureSpec,
    /// Test to apply.
    pub test: TestSpec,
    /// Simulation parameters.
    pub config: SimulationConfig,
}

/// Error returned when the command-line inputs cannot be turned into a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Returned when the structure document cannot be read.
    #[error("failed to read structure: {0}")]
    Read(#[from] io::Error),
    /// Returned when the structure document is not valid JSON.
    #[error("failed to parse structure: {0}")]
    Parse(#[from] serde_json::Error),
    /// Returned when the parameter file is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Returned when the requested test is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Parse a structure document.
pub fn parse_structure(json: &str) -> Result<StructureSpec, ScenarioError> {
    Ok(serde_json::from_str(json)?)
}

/// Build the test requested on the command line.
pub fn build_test(args: &Args) -> Result<TestSpec, ScenarioError> {
    let kind: TestKind = args.test.parse()?;
    let mut test = TestSpec::new(kind, args.magnitude);
    if let Some(triangles) = args.target_triangles {
        test = test.with_target_triangles(triangles);
    }
    if let Some(height) = args.target_height {
        test = test.with_target_height(height);
    }
    test.validate()?;
    Ok(test)
}

/// Read the structure, the optional parameter file and the requested test.
pub fn load_scenario(args: &Args) -> Result<Scenario, ScenarioError> {
    let structure = parse_structure(&fs::read_to_string(&args.structure)?)?;
    let config = match &args.config {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::default(),
    };
    let test = build_test(args)?;
    Ok(Scenario {
        structure,
        test,
        config,
    })
}
