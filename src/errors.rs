//! Error types produced while building structures or running stress tests.

use thiserror::Error;

use crate::geometry::Point;

/// Error returned when a structure cannot be assembled from its members.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum StructureError {
    /// Returned when both endpoints of a member collapse onto one particle.
    #[error("member {member} is degenerate: both endpoints sit at {point}")]
    DegenerateMember {
        /// Position of the member in the input list.
        member: usize,
        /// Shared endpoint location.
        point: Point,
    },
    /// Returned when a coordinate is NaN or infinite.
    #[error("coordinate {point} is not finite")]
    NonFiniteCoordinate {
        /// Rejected location.
        point: Point,
    },
}

/// Error returned when a test specification is rejected at run start.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Returned when a test kind name is not recognised.
    #[error("unknown test kind `{0}` (expected compression, shear or oscillating)")]
    UnknownTestKind(String),
    /// Returned when the target magnitude is zero or negative.
    #[error("test magnitude must be positive (received {0})")]
    NonPositiveMagnitude(f64),
    /// Returned when the target magnitude is NaN or infinite.
    #[error("test magnitude must be finite (received {0})")]
    NonFiniteMagnitude(f64),
}

/// Error returned when a simulation run cannot be started.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SimulationError {
    /// Returned when the test specification is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Returned when the simulation parameters are out of range.
    #[error(transparent)]
    Config(#[from] ParameterError),
    /// Returned when the structure has no members to load.
    #[error("nothing to test: the structure has no members")]
    NothingToTest,
    /// Returned when a run is already live or has not been reset.
    #[error("simulation must be reset to idle before starting a new run")]
    NotIdle,
}

/// Tuning parameter outside its valid range.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("parameter `{name}` is out of range (received {value})")]
pub struct ParameterError {
    /// Name of the offending field.
    pub name: &'static str,
    /// Rejected value.
    pub value: f64,
}

/// Error returned when simulation parameters are out of range or unreadable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Returned when a tuning parameter falls outside its valid range.
    #[error(transparent)]
    OutOfRange(#[from] ParameterError),
    /// Returned when a configuration file cannot be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// Returned when a configuration document is not valid JSON.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
