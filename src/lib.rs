#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

pub mod config;
pub mod errors;
pub mod failure;
pub mod geometry;
pub mod load;
pub mod material;
pub mod simulation;
pub mod snapshot;
pub mod solver;
pub mod structure;
pub mod topology;

pub use config::SimulationConfig;
pub use errors::{ConfigError, ParameterError, SimulationError, StructureError, ValidationError};
pub use geometry::{point, Point};
pub use load::{LoadModel, TestKind, TestSpec};
pub use material::{Material, MaterialTable};
pub use simulation::{Outcome, Simulation, SimulationState, StepObserver, TestResult, Termination};
pub use snapshot::{MemberId, MemberState, ParticleState, Snapshot};
pub use structure::{Member, MemberSpec, Particle, Span, Structure, StructureSpec};
