//! Simulation inputs, their validation and the per-test input manager
//!
//! Inputs are created with defaults when the manager is built, edited in
//! place by the front-end and validated right before a run is launched.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::core::test_type::{Drainage, StageRule, TestType};
use crate::core::units::hours_to_seconds;

/// Strain increments must stay strictly inside this band (percent)
pub const MAX_ABS_STRAIN_INCREMENT: f64 = 100.0;

/// Number of CRS increments a fresh manager starts with
pub const DEFAULT_CRS_INCREMENTS: usize = 5;

#[derive(Debug, Error, Diagnostic, PartialEq)]
pub enum InputError {
    #[error("Number of steps must be > 0, but got {0}")]
    #[diagnostic(code(inputs::steps))]
    NonPositiveSteps(u32),

    #[error("Duration must be > 0, but got {0}")]
    #[diagnostic(code(inputs::duration))]
    NonPositiveDuration(f64),

    #[error("Strain increment must be between -100.0% and 100.0%, but got {0}")]
    #[diagnostic(code(inputs::strain))]
    StrainOutOfRange(f64),

    #[error("A CRS test needs at least one strain increment")]
    #[diagnostic(code(inputs::increments))]
    NoStrainIncrements,

    #[error("Strain increment {index}: {source}")]
    #[diagnostic(code(inputs::increment))]
    Increment {
        index: usize,
        #[source]
        source: Box<InputError>,
    },

    #[error("Strain increment index {index} is out of range ({len} increments)")]
    #[diagnostic(code(inputs::index))]
    IncrementIndex { index: usize, len: usize },
}

/// One constant-rate-of-strain stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrainIncrement {
    pub duration_in_hours: f64,
    /// Strain increment in percent
    pub strain_increment: f64,
    pub steps: u32,
}

impl Default for StrainIncrement {
    fn default() -> Self {
        Self {
            duration_in_hours: 1.0,
            strain_increment: 0.0,
            steps: 100,
        }
    }
}

impl StrainIncrement {
    pub fn new(duration_in_hours: f64, strain_increment: f64, steps: u32) -> Self {
        Self {
            duration_in_hours,
            strain_increment,
            steps,
        }
    }

    pub fn duration_in_seconds(&self) -> f64 {
        hours_to_seconds(self.duration_in_hours)
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if !(self.strain_increment.abs() < MAX_ABS_STRAIN_INCREMENT) {
            return Err(InputError::StrainOutOfRange(self.strain_increment));
        }
        if self.steps == 0 {
            return Err(InputError::NonPositiveSteps(self.steps));
        }
        if !(self.duration_in_hours > 0.0) {
            return Err(InputError::NonPositiveDuration(self.duration_in_hours));
        }
        Ok(())
    }
}

/// Where cohesion and friction angle live in a flat material parameter vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MohrCoulombMapping {
    pub enabled: bool,
    /// 1-based
    pub c_index: Option<usize>,
    /// 1-based
    pub phi_index: Option<usize>,
}

impl MohrCoulombMapping {
    pub fn new(c_index: usize, phi_index: usize) -> Self {
        Self {
            enabled: true,
            c_index: Some(c_index),
            phi_index: Some(phi_index),
        }
    }

    /// The index pair, only when enabled and complete
    pub fn to_indices(&self) -> Option<(usize, usize)> {
        if !self.enabled {
            return None;
        }
        match (self.c_index, self.phi_index) {
            (Some(c), Some(phi)) => Some((c, phi)),
            _ => None,
        }
    }
}

/// Timing layout derived from the inputs
#[derive(Debug, Clone, PartialEq)]
pub enum StagePlan {
    /// One loading phase
    Single { duration: f64, steps: u32 },
    /// One solver stage per strain increment
    Staged {
        durations: Vec<f64>,
        steps: Vec<u32>,
        strain_increments: Vec<f64>,
    },
}

impl StagePlan {
    /// Duration and step count of the first loading phase
    pub fn first_stage(&self) -> Option<(f64, u32)> {
        match self {
            StagePlan::Single { duration, steps } => Some((*duration, *steps)),
            StagePlan::Staged {
                durations, steps, ..
            } => durations.first().copied().zip(steps.first().copied()),
        }
    }

    pub fn total_duration(&self) -> f64 {
        match self {
            StagePlan::Single { duration, .. } => *duration,
            StagePlan::Staged { durations, .. } => durations.iter().sum(),
        }
    }
}

/// Configuration for one test type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInputs {
    pub test_type: TestType,
    /// Percent
    #[serde(default = "default_maximum_strain")]
    pub maximum_strain: f64,
    /// kN/m2, compression positive
    #[serde(default = "default_cell_pressure")]
    pub initial_effective_cell_pressure: f64,
    #[serde(default = "default_steps")]
    pub number_of_steps: u32,
    #[serde(default = "default_duration")]
    pub duration_in_seconds: f64,
    #[serde(default)]
    pub drainage: Drainage,
    /// CRS only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strain_increments: Vec<StrainIncrement>,
}

fn default_maximum_strain() -> f64 {
    20.0
}

fn default_cell_pressure() -> f64 {
    100.0
}

fn default_steps() -> u32 {
    100
}

fn default_duration() -> f64 {
    1.0
}

impl SimulationInputs {
    /// Defaults used when the manager is constructed
    pub fn defaults_for(test_type: TestType) -> Self {
        match test_type.profile().stage_rule {
            StageRule::Template => Self {
                test_type,
                maximum_strain: default_maximum_strain(),
                initial_effective_cell_pressure: default_cell_pressure(),
                number_of_steps: default_steps(),
                duration_in_seconds: default_duration(),
                drainage: Drainage::Drained,
                strain_increments: Vec::new(),
            },
            StageRule::PerStrainIncrement => {
                let mut inputs = Self {
                    test_type,
                    maximum_strain: 0.0,
                    initial_effective_cell_pressure: 0.0,
                    number_of_steps: 0,
                    duration_in_seconds: 0.0,
                    drainage: Drainage::Drained,
                    strain_increments: vec![StrainIncrement::default(); DEFAULT_CRS_INCREMENTS],
                };
                inputs.update_totals();
                inputs
            }
        }
    }

    /// Recompute totals from the strain increments (CRS only)
    pub fn update_totals(&mut self) {
        if self.test_type.profile().stage_rule != StageRule::PerStrainIncrement {
            return;
        }
        self.number_of_steps = self.strain_increments.iter().map(|i| i.steps).sum();
        self.duration_in_seconds = hours_to_seconds(
            self.strain_increments
                .iter()
                .map(|i| i.duration_in_hours)
                .sum(),
        );
        self.maximum_strain = self
            .strain_increments
            .iter()
            .map(|i| i.strain_increment)
            .sum();
    }

    pub fn validate(&self) -> Result<(), InputError> {
        match self.test_type.profile().stage_rule {
            StageRule::Template => {
                if self.number_of_steps == 0 {
                    return Err(InputError::NonPositiveSteps(self.number_of_steps));
                }
                if !(self.duration_in_seconds > 0.0) {
                    return Err(InputError::NonPositiveDuration(self.duration_in_seconds));
                }
            }
            StageRule::PerStrainIncrement => {
                if self.strain_increments.is_empty() {
                    return Err(InputError::NoStrainIncrements);
                }
                for (index, increment) in self.strain_increments.iter().enumerate() {
                    increment.validate().map_err(|e| InputError::Increment {
                        index: index + 1,
                        source: Box::new(e),
                    })?;
                }
            }
        }
        Ok(())
    }

    pub fn stage_plan(&self) -> StagePlan {
        match self.test_type.profile().stage_rule {
            StageRule::Template => StagePlan::Single {
                duration: self.duration_in_seconds,
                steps: self.number_of_steps,
            },
            StageRule::PerStrainIncrement => StagePlan::Staged {
                durations: self
                    .strain_increments
                    .iter()
                    .map(StrainIncrement::duration_in_seconds)
                    .collect(),
                steps: self.strain_increments.iter().map(|i| i.steps).collect(),
                strain_increments: self
                    .strain_increments
                    .iter()
                    .map(|i| i.strain_increment)
                    .collect(),
            },
        }
    }
}

/// Holds the inputs of every test type and tracks the selected one
#[derive(Debug, Clone)]
pub struct SoilTestInputManager {
    current: TestType,
    inputs: HashMap<TestType, SimulationInputs>,
}

impl Default for SoilTestInputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SoilTestInputManager {
    pub fn new() -> Self {
        let inputs = TestType::all()
            .into_iter()
            .map(|t| (t, SimulationInputs::defaults_for(t)))
            .collect();
        Self {
            current: TestType::Triaxial,
            inputs,
        }
    }

    pub fn current_test_type(&self) -> TestType {
        self.current
    }

    pub fn set_current_test_type(&mut self, test_type: TestType) {
        self.current = test_type;
    }

    pub fn inputs(&self, test_type: TestType) -> &SimulationInputs {
        // every variant is inserted in new()
        &self.inputs[&test_type]
    }

    pub fn current_inputs(&self) -> &SimulationInputs {
        self.inputs(self.current)
    }

    fn inputs_mut(&mut self, test_type: TestType) -> &mut SimulationInputs {
        self.inputs
            .entry(test_type)
            .or_insert_with(|| SimulationInputs::defaults_for(test_type))
    }

    pub fn update_init_pressure(&mut self, pressure: f64, test_type: TestType) {
        self.inputs_mut(test_type).initial_effective_cell_pressure = pressure;
    }

    pub fn update_max_strain(&mut self, strain: f64, test_type: TestType) {
        self.inputs_mut(test_type).maximum_strain = strain;
    }

    pub fn update_num_steps(&mut self, steps: u32, test_type: TestType) {
        self.inputs_mut(test_type).number_of_steps = steps;
    }

    pub fn update_duration(&mut self, duration: f64, test_type: TestType) {
        self.inputs_mut(test_type).duration_in_seconds = duration;
    }

    pub fn update_drainage(&mut self, drainage: Drainage, test_type: TestType) {
        self.inputs_mut(test_type).drainage = drainage;
    }

    fn crs_increment_mut(&mut self, index: usize) -> Result<&mut StrainIncrement, InputError> {
        let crs = self.inputs_mut(TestType::Crs);
        let len = crs.strain_increments.len();
        crs.strain_increments
            .get_mut(index)
            .ok_or(InputError::IncrementIndex { index, len })
    }

    pub fn set_crs_strain_increment(&mut self, index: usize, value: f64) -> Result<(), InputError> {
        self.crs_increment_mut(index)?.strain_increment = value;
        self.inputs_mut(TestType::Crs).update_totals();
        Ok(())
    }

    pub fn set_crs_duration(&mut self, index: usize, hours: f64) -> Result<(), InputError> {
        self.crs_increment_mut(index)?.duration_in_hours = hours;
        self.inputs_mut(TestType::Crs).update_totals();
        Ok(())
    }

    pub fn set_crs_steps(&mut self, index: usize, steps: u32) -> Result<(), InputError> {
        self.crs_increment_mut(index)?.steps = steps;
        self.inputs_mut(TestType::Crs).update_totals();
        Ok(())
    }

    pub fn add_strain_increment(&mut self) {
        let crs = self.inputs_mut(TestType::Crs);
        crs.strain_increments.push(StrainIncrement::default());
        crs.update_totals();
    }

    /// Drops the last increment; the first one is never removed
    pub fn remove_last_crs_strain_increment(&mut self) {
        let crs = self.inputs_mut(TestType::Crs);
        if crs.strain_increments.len() > 1 {
            crs.strain_increments.pop();
            crs.update_totals();
        }
    }

    /// Replace the whole CRS increment list
    pub fn set_crs_strain_increments(&mut self, increments: Vec<StrainIncrement>) {
        let crs = self.inputs_mut(TestType::Crs);
        crs.strain_increments = increments;
        crs.update_totals();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_holds_every_test_type() {
        let manager = SoilTestInputManager::new();
        for test_type in TestType::all() {
            assert_eq!(manager.inputs(test_type).test_type, test_type);
        }
        assert_eq!(manager.current_test_type(), TestType::Triaxial);
    }

    #[test]
    fn test_crs_defaults() {
        let manager = SoilTestInputManager::new();
        let crs = manager.inputs(TestType::Crs);
        assert_eq!(crs.strain_increments.len(), 5);
        assert_eq!(crs.maximum_strain, 0.0);
        assert_eq!(crs.number_of_steps, 500);
        assert_eq!(crs.duration_in_seconds, 5.0 * 3600.0);
    }

    #[test]
    fn test_crs_totals_follow_edits() {
        let mut manager = SoilTestInputManager::new();
        manager.set_crs_strain_increment(0, 0.02).unwrap();
        manager.set_crs_strain_increment(1, 0.04).unwrap();
        manager.set_crs_duration(0, 1.5).unwrap();
        manager.set_crs_steps(0, 150).unwrap();

        let crs = manager.inputs(TestType::Crs);
        assert!((crs.maximum_strain - 0.06).abs() < 1e-12);
        assert_eq!(crs.duration_in_seconds, 5.5 * 3600.0);
        assert_eq!(crs.number_of_steps, 550);
    }

    #[test]
    fn test_crs_edit_out_of_range() {
        let mut manager = SoilTestInputManager::new();
        let err = manager.set_crs_steps(9, 10).unwrap_err();
        assert_eq!(err, InputError::IncrementIndex { index: 9, len: 5 });
    }

    #[test]
    fn test_add_and_remove_increments() {
        let mut manager = SoilTestInputManager::new();
        manager.add_strain_increment();
        assert_eq!(manager.inputs(TestType::Crs).strain_increments.len(), 6);
        assert_eq!(manager.inputs(TestType::Crs).number_of_steps, 600);

        for _ in 0..10 {
            manager.remove_last_crs_strain_increment();
        }
        assert_eq!(manager.inputs(TestType::Crs).strain_increments.len(), 1);
        assert_eq!(manager.inputs(TestType::Crs).number_of_steps, 100);
    }

    #[test]
    fn test_validate_rejects_zero_steps_and_duration() {
        let mut inputs = SimulationInputs::defaults_for(TestType::Triaxial);
        assert!(inputs.validate().is_ok());

        inputs.number_of_steps = 0;
        assert_eq!(inputs.validate(), Err(InputError::NonPositiveSteps(0)));

        inputs.number_of_steps = 10;
        inputs.duration_in_seconds = 0.0;
        assert_eq!(inputs.validate(), Err(InputError::NonPositiveDuration(0.0)));
    }

    #[test]
    fn test_validate_rejects_out_of_range_increment() {
        let mut inputs = SimulationInputs::defaults_for(TestType::Crs);
        inputs.strain_increments[2].strain_increment = -100.0;
        let err = inputs.validate().unwrap_err();
        assert!(matches!(err, InputError::Increment { index: 3, .. }));
        assert!(err.to_string().contains("between -100.0% and 100.0%"));
    }

    #[test]
    fn test_validate_rejects_empty_crs() {
        let mut inputs = SimulationInputs::defaults_for(TestType::Crs);
        inputs.strain_increments.clear();
        assert_eq!(inputs.validate(), Err(InputError::NoStrainIncrements));
    }

    #[test]
    fn test_stage_plan() {
        let triaxial = SimulationInputs::defaults_for(TestType::Triaxial);
        assert_eq!(
            triaxial.stage_plan(),
            StagePlan::Single {
                duration: 1.0,
                steps: 100
            }
        );

        let mut crs = SimulationInputs::defaults_for(TestType::Crs);
        crs.strain_increments = vec![
            StrainIncrement::new(1.0, 5.0, 10),
            StrainIncrement::new(2.0, 5.0, 20),
        ];
        crs.update_totals();
        let plan = crs.stage_plan();
        assert_eq!(
            plan,
            StagePlan::Staged {
                durations: vec![3600.0, 7200.0],
                steps: vec![10, 20],
                strain_increments: vec![5.0, 5.0],
            }
        );
        assert_eq!(plan.first_stage(), Some((3600.0, 10)));
        assert_eq!(plan.total_duration(), 10800.0);
        assert_eq!(crs.maximum_strain, 10.0);
    }

    #[test]
    fn test_mohr_coulomb_mapping_requires_enabled_and_complete() {
        assert_eq!(MohrCoulombMapping::default().to_indices(), None);
        assert_eq!(MohrCoulombMapping::new(3, 4).to_indices(), Some((3, 4)));

        let incomplete = MohrCoulombMapping {
            enabled: true,
            c_index: Some(1),
            phi_index: None,
        };
        assert_eq!(incomplete.to_indices(), None);

        let disabled = MohrCoulombMapping {
            enabled: false,
            ..MohrCoulombMapping::new(1, 2)
        };
        assert_eq!(disabled.to_indices(), None);
    }
}
