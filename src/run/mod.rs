//! Running a soil element test end to end

pub mod orchestrator;
pub mod renderer;
pub mod solver;

pub use orchestrator::{Orchestrator, RunOutcome, RunRequest, RunState};
pub use renderer::{render, NoOpRenderer, Renderer};
pub use solver::{ExternalSolver, Solver, SolverError};
