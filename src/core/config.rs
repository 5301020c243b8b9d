//! Run configuration
//!
//! A run is described by one YAML file:
//!
//! ```yaml
//! test_type: triaxial
//! maximum_strain: 20.0
//! initial_effective_cell_pressure: 100.0
//! number_of_steps: 100
//! duration_in_seconds: 1.0
//! material:
//!   law: udsm
//!   dll_path: MohrCoulomb64.dll
//!   parameters: [10000.0, 0.3, 3.0, 30.0]
//! mohr_coulomb: { enabled: true, c_index: 3, phi_index: 4 }
//! solver:
//!   program: python
//!   args: [run_kratos.py]
//! ```
//!
//! Omitted inputs keep the defaults of the input manager. Relative paths
//! are resolved against the directory of the configuration file.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::inputs::{MohrCoulombMapping, SimulationInputs, SoilTestInputManager, StrainIncrement};
use crate::core::test_type::{Drainage, StageRule, TestType};
use crate::run::orchestrator::RunRequest;
use crate::run::solver::ExternalSolver;
use crate::template::material::MaterialLaw;
use crate::template::patch::PatchMode;
use crate::yaml::{parse_yaml, YamlError};

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("strain_increments only apply to CRS tests, not {0}")]
    #[diagnostic(code(config::strain_increments), help("remove strain_increments or set test_type: crs"))]
    UnexpectedIncrements(TestType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub test_type: TestType,

    #[serde(default)]
    pub maximum_strain: Option<f64>,
    #[serde(default)]
    pub initial_effective_cell_pressure: Option<f64>,
    #[serde(default)]
    pub number_of_steps: Option<u32>,
    #[serde(default)]
    pub duration_in_seconds: Option<f64>,
    #[serde(default)]
    pub drainage: Option<Drainage>,
    /// CRS only
    #[serde(default)]
    pub strain_increments: Option<Vec<StrainIncrement>>,

    pub material: MaterialLaw,
    #[serde(default)]
    pub mohr_coulomb: MohrCoulombMapping,

    /// Template root or template set directory
    #[serde(default)]
    pub templates: Option<PathBuf>,
    pub solver: ExternalSolver,

    /// Keep the work directory after a successful run
    #[serde(default)]
    pub keep_tmp: bool,
    #[serde(default)]
    pub patch_mode: PatchMode,
    /// Write plot series as CSV here
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    #[serde(skip)]
    base_dir: PathBuf,
}

impl RunConfig {
    pub fn from_yaml(content: &str, filename: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = parse_yaml(content, filename)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(YamlError::from)?;
        let mut config = Self::from_yaml(&content, &path.display().to_string())?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.strain_increments.is_some()
            && self.test_type.profile().stage_rule != StageRule::PerStrainIncrement
        {
            return Err(ConfigError::UnexpectedIncrements(self.test_type));
        }
        Ok(())
    }

    /// `path` relative to the configuration file
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn templates_dir(&self) -> Option<PathBuf> {
        self.templates.as_deref().map(|p| self.resolve(p))
    }

    pub fn export_path(&self) -> Option<PathBuf> {
        self.export_dir.as_deref().map(|p| self.resolve(p))
    }

    /// Input manager defaults overlaid with the configured values
    pub fn simulation_inputs(&self) -> SimulationInputs {
        let test_type = self.test_type;
        let mut manager = SoilTestInputManager::new();
        manager.set_current_test_type(test_type);

        if let Some(increments) = &self.strain_increments {
            manager.set_crs_strain_increments(increments.clone());
        }
        if let Some(strain) = self.maximum_strain {
            manager.update_max_strain(strain, test_type);
        }
        if let Some(pressure) = self.initial_effective_cell_pressure {
            manager.update_init_pressure(pressure, test_type);
        }
        if let Some(steps) = self.number_of_steps {
            manager.update_num_steps(steps, test_type);
        }
        if let Some(duration) = self.duration_in_seconds {
            manager.update_duration(duration, test_type);
        }
        if let Some(drainage) = self.drainage {
            manager.update_drainage(drainage, test_type);
        }
        manager.current_inputs().clone()
    }

    /// Orchestrator request for an already resolved template directory
    pub fn to_request(&self, template_dir: PathBuf) -> RunRequest {
        RunRequest {
            inputs: self.simulation_inputs(),
            material: self.material.clone(),
            mohr_coulomb: self.mohr_coulomb,
            template_dir,
            keep_tmp: self.keep_tmp,
            patch_mode: self.patch_mode,
        }
    }
}
