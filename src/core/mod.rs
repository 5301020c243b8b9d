//! Core module - test types, inputs, configuration and run plumbing

pub mod cancel;
pub mod config;
pub mod inputs;
pub mod logger;
pub mod test_type;
pub mod units;

pub use cancel::CancellationToken;
pub use config::{ConfigError, RunConfig};
pub use inputs::{
    InputError, MohrCoulombMapping, SimulationInputs, SoilTestInputManager, StagePlan,
    StrainIncrement,
};
pub use logger::{ConsoleLogger, Level, Logger, MemoryLogger, NullLogger};
pub use test_type::{Drainage, MeshPatch, StageRule, TestProfile, TestType};
