//! Run orchestration
//!
//! A run moves strictly forward through
//! `Idle -> FilesStaged -> MaterialConfigured -> ParametersConfigured ->
//! MeshConfigured -> SolverInvoked -> ResultsCollected -> Rendered`.
//! Any error ends it in `Failed`: the error is logged, the work directory is
//! kept for inspection and a failure outcome is returned. Only cohesion/phi
//! lookup errors escape as `Err`.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::cancel::CancellationToken;
use crate::core::inputs::{MohrCoulombMapping, SimulationInputs, StagePlan};
use crate::core::logger::Logger;
use crate::core::test_type::{MeshPatch, StageRule};
use crate::results::collector::{CombinedResult, ResultCollector};
use crate::results::mohr_coulomb::MohrCoulombError;
use crate::results::reader::ReadError;
use crate::results::store::ResultStore;
use crate::run::renderer::{render, Renderer};
use crate::run::solver::{Solver, SolverError};
use crate::template::material::{MaterialEditor, MaterialLaw};
use crate::template::mesh::{next_table_id, MdpaEditor};
use crate::template::patch::{read_text, PatchMode, PatchOutcome};
use crate::template::project::ProjectEditor;
use crate::template::workspace::Workspace;
use crate::template::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    FilesStaged,
    MaterialConfigured,
    ParametersConfigured,
    MeshConfigured,
    SolverInvoked,
    ResultsCollected,
    Rendered,
    Failed,
}

impl RunState {
    /// The only state a successful transition may lead to
    pub fn next(self) -> Option<RunState> {
        match self {
            RunState::Idle => Some(RunState::FilesStaged),
            RunState::FilesStaged => Some(RunState::MaterialConfigured),
            RunState::MaterialConfigured => Some(RunState::ParametersConfigured),
            RunState::ParametersConfigured => Some(RunState::MeshConfigured),
            RunState::MeshConfigured => Some(RunState::SolverInvoked),
            RunState::SolverInvoked => Some(RunState::ResultsCollected),
            RunState::ResultsCollected => Some(RunState::Rendered),
            RunState::Rendered | RunState::Failed => None,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::FilesStaged => write!(f, "files staged"),
            RunState::MaterialConfigured => write!(f, "material configured"),
            RunState::ParametersConfigured => write!(f, "parameters configured"),
            RunState::MeshConfigured => write!(f, "mesh configured"),
            RunState::SolverInvoked => write!(f, "solver invoked"),
            RunState::ResultsCollected => write!(f, "results collected"),
            RunState::Rendered => write!(f, "rendered"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// Everything one run needs
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub inputs: SimulationInputs,
    pub material: MaterialLaw,
    pub mohr_coulomb: MohrCoulombMapping,
    /// Template set directory (already resolved)
    pub template_dir: PathBuf,
    pub keep_tmp: bool,
    pub patch_mode: PatchMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed {
        result: CombinedResult,
        /// Set when temporary files were kept
        work_dir: Option<PathBuf>,
    },
    Failed {
        /// Last state reached before the failure
        reached: RunState,
        message: String,
        detail: Option<String>,
        work_dir: Option<PathBuf>,
    },
    Cancelled {
        reached: RunState,
        work_dir: Option<PathBuf>,
    },
}

impl RunOutcome {
    pub fn result(&self) -> Option<&CombinedResult> {
        match self {
            RunOutcome::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    pub fn work_dir(&self) -> Option<&PathBuf> {
        match self {
            RunOutcome::Completed { work_dir, .. }
            | RunOutcome::Failed { work_dir, .. }
            | RunOutcome::Cancelled { work_dir, .. } => work_dir.as_ref(),
        }
    }
}

#[derive(Debug, Error)]
enum StepError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Read(#[from] ReadError),
}

impl StepError {
    fn detail(&self) -> Option<String> {
        match self {
            StepError::Solver(e) => e.detail().map(str::to_string),
            _ => None,
        }
    }
}

/// Progress of one run
struct Tracker {
    state: RunState,
    workspace: Option<Workspace>,
}

impl Tracker {
    fn advance(&mut self, to: RunState) {
        debug_assert_eq!(self.state.next(), Some(to), "run states must not be skipped");
        self.state = to;
    }
}

pub struct Orchestrator<'a> {
    solver: &'a dyn Solver,
    logger: &'a dyn Logger,
    cancel: CancellationToken,
}

impl<'a> Orchestrator<'a> {
    pub fn new(solver: &'a dyn Solver, logger: &'a dyn Logger) -> Self {
        Self {
            solver,
            logger,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run and, when it completes, replace the test type's slot in `store`
    pub fn run_into(
        &self,
        request: &RunRequest,
        renderer: &mut dyn Renderer,
        store: &mut ResultStore,
    ) -> Result<RunOutcome, MohrCoulombError> {
        let outcome = self.run(request, renderer)?;
        if let Some(result) = outcome.result() {
            store.replace(request.inputs.test_type, result.clone());
        }
        Ok(outcome)
    }

    pub fn run(
        &self,
        request: &RunRequest,
        renderer: &mut dyn Renderer,
    ) -> Result<RunOutcome, MohrCoulombError> {
        if let Err(e) = request.inputs.validate() {
            let message = "Calculation stopped due to invalid input.";
            self.logger.error(message);
            self.logger.error(&e.to_string());
            return Ok(RunOutcome::Failed {
                reached: RunState::Idle,
                message: message.to_string(),
                detail: Some(e.to_string()),
                work_dir: None,
            });
        }
        let (cohesion, phi) = request
            .material
            .cohesion_phi(request.mohr_coulomb.to_indices())?;

        self.logger.info(&format!(
            "Starting {} simulation...",
            request.inputs.test_type.tag()
        ));

        let mut tracker = Tracker {
            state: RunState::Idle,
            workspace: None,
        };
        let step = self.execute(request, &mut tracker, renderer, cohesion, phi);
        let reached = tracker.state;

        Ok(match step {
            Ok(Some(result)) => RunOutcome::Completed {
                result,
                work_dir: self.finish(tracker.workspace, request.keep_tmp),
            },
            Ok(None) => {
                self.logger.warn(&format!("Run cancelled after: {}", reached));
                RunOutcome::Cancelled {
                    reached,
                    work_dir: self.finish(tracker.workspace, request.keep_tmp),
                }
            }
            Err(e) => {
                self.logger.error(&format!("Simulation failed: {}", e));
                let detail = e.detail();
                if let Some(detail) = &detail {
                    self.logger.error(detail);
                }
                RunOutcome::Failed {
                    reached,
                    message: e.to_string(),
                    detail,
                    work_dir: self.finish(tracker.workspace, true),
                }
            }
        })
    }

    /// Remove or keep the work directory; returns the kept location
    fn finish(&self, workspace: Option<Workspace>, keep: bool) -> Option<PathBuf> {
        let workspace = workspace?;
        if keep {
            let path = workspace.keep();
            self.logger
                .info(&format!("Temporary folder retained at: {}", path.display()));
            Some(path)
        } else {
            workspace.remove(self.logger);
            None
        }
    }

    /// The state transitions; `Ok(None)` when cancelled
    fn execute(
        &self,
        request: &RunRequest,
        tracker: &mut Tracker,
        renderer: &mut dyn Renderer,
        cohesion: Option<f64>,
        phi: Option<f64>,
    ) -> Result<Option<CombinedResult>, StepError> {
        let inputs = &request.inputs;
        let test_type = inputs.test_type;
        let mode = request.patch_mode;
        let logger = self.logger;

        let ws = tracker.workspace.insert(Workspace::stage(
            &request.template_dir,
            test_type,
            logger,
        )?);
        let work_dir = ws.path().to_path_buf();
        let project_json = ws.project_json.clone();
        let mesh = ws.mesh.clone();
        let material_json = ws.material_json.clone();
        tracker.advance(RunState::FilesStaged);

        if self.cancel.is_cancelled() {
            return Ok(None);
        }
        match &material_json {
            Some(path) => MaterialEditor::open(path, mode, logger)?.apply(&request.material)?,
            None => {
                mode.settle(
                    PatchOutcome::NotFound,
                    "MaterialParameters.json missing in template set; material law not applied.",
                    &request.template_dir,
                    logger,
                )?;
            }
        }
        tracker.advance(RunState::MaterialConfigured);

        if self.cancel.is_cancelled() {
            return Ok(None);
        }
        let mut project = ProjectEditor::open(&project_json, mode, logger)?;
        let plan = inputs.stage_plan();
        if project.is_staged()? {
            let (durations, steps) = match &plan {
                StagePlan::Single { duration, steps } => (vec![*duration], vec![*steps]),
                StagePlan::Staged {
                    durations, steps, ..
                } => (durations.clone(), steps.clone()),
            };
            let append = test_type.profile().stage_rule == StageRule::PerStrainIncrement;
            project.set_staged_timing(&durations, &steps, 0.0, append)?;
            if test_type.uses_mesh_patch(MeshPatch::DisplacementTables) && durations.len() > 1 {
                project.update_top_displacement_table_numbers(next_table_id(&read_text(&mesh)?))?;
            }
        } else if let Some((duration, steps)) = plan.first_stage() {
            project.set_flat_timing(duration / f64::from(steps), plan.total_duration())?;
        }
        project.set_initial_stress(inputs.initial_effective_cell_pressure)?;
        let output_files = project.output_file_paths(&work_dir)?;
        tracker.advance(RunState::ParametersConfigured);

        if self.cancel.is_cancelled() {
            return Ok(None);
        }
        MdpaEditor::open(&mesh, mode, logger)?.apply_inputs(inputs)?;
        tracker.advance(RunState::MeshConfigured);

        if self.cancel.is_cancelled() {
            return Ok(None);
        }
        self.solver
            .run(&work_dir, &project_json, &output_files, logger)?;
        logger.info("Finished analysis; collecting results...");
        tracker.advance(RunState::SolverInvoked);

        let collector = ResultCollector::new(output_files, logger);
        let mut stages = Vec::with_capacity(collector.paths().len());
        for path in collector.paths() {
            if self.cancel.is_cancelled() {
                return Ok(None);
            }
            stages.push(collector.collect_stage(path)?);
        }
        let result = CombinedResult::from_stages(&stages).with_cohesion_phi(cohesion, phi);
        tracker.advance(RunState::ResultsCollected);

        render(test_type, &result, renderer);
        logger.info("Rendering complete.");
        tracker.advance(RunState::Rendered);

        Ok(Some(result))
    }
}
