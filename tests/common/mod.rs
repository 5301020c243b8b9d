//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files:
//! the binary under test, the synthetic result fixture, template sets and
//! solvers that never leave the process.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

use soiltest::core::cancel::CancellationToken;
use soiltest::core::logger::Logger;
use soiltest::core::test_type::TestType;
use soiltest::run::solver::{Solver, SolverError};

/// Helper to get a soiltest command
pub fn soiltest() -> Command {
    Command::new(cargo::cargo_bin!("soiltest"))
}

/// Synthetic GiD result file with 5 time steps (0.2 .. 1.0)
///
/// Vertical strain runs 0, -0.05 .. -0.2, sigma_xx stays at -100 and the
/// von Mises stress grows by 45000 per step.
pub fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("output.post.res")
}

pub fn assert_all_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{:?} != {:?}", actual, expected);
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{:?} != {:?}", actual, expected);
    }
}

// ============================================================================
// Template sets
// ============================================================================

pub const MESH: &str = "Begin ModelPartData
End ModelPartData

Begin Table 1 TIME DISPLACEMENT_Y
  0.0 0.0
  $end_time $maximum_strain
End Table

Begin Table 2 TIME DISPLACEMENT_X
  0.0 0.0
  $end_time $middle_maximum_strain
End Table

Begin ProcessInfo
  FIRST_TIMESTEP $first_timestep
  CELL_PRESSURE $initial_effective_cell_pressure
End ProcessInfo

Begin SubModelPart top_displacement
  Begin SubModelPartTables
    1
  End SubModelPartTables
  Begin SubModelPartNodes
    3
    4
  End SubModelPartNodes
End SubModelPart
";

/// Ids of every `Begin Table <id>` block, in file order
pub fn table_ids(mesh: &str) -> Vec<u32> {
    mesh.lines()
        .filter_map(|line| line.strip_prefix("Begin Table "))
        .map(|rest| rest.split_whitespace().next().unwrap().parse().unwrap())
        .collect()
}

/// Table ids listed under the top displacement sub model part
pub fn top_displacement_tables(mesh: &str) -> Vec<u32> {
    let part = &mesh[mesh.find("Begin SubModelPart top_displacement").unwrap()..];
    let start = part.find("Begin SubModelPartTables").unwrap();
    let end = part.find("End SubModelPartTables").unwrap();
    part[start..end]
        .lines()
        .skip(1)
        .map(|l| l.trim().parse().unwrap())
        .collect()
}

pub fn material_json() -> Value {
    json!({
        "properties": [{
            "model_part_name": "PorousDomain.Soil",
            "properties_id": 1,
            "Material": {
                "constitutive_law": {"name": "GeoLinearElasticPlaneStrain2DLaw"},
                "Variables": {"DENSITY_SOLID": 2650.0}
            }
        }]
    })
}

fn initial_stress_process() -> Value {
    json!({
        "python_module": "apply_initial_uniform_stress_field",
        "Parameters": {"model_part_name": "PorousDomain.Soil", "value": [0.0, 0.0, 0.0, 0.0]}
    })
}

pub fn flat_project_json() -> Value {
    json!({
        "problem_data": {"start_time": 0.0, "end_time": 1.0},
        "solver_settings": {"time_stepping": {"time_step": 0.01}},
        "output_processes": {
            "gid_output": [{"Parameters": {"output_name": "gid_output/output"}}]
        },
        "processes": {"loads_process_list": [initial_stress_process()]}
    })
}

pub fn staged_project_json(stages: usize) -> Value {
    let names: Vec<String> = (1..=stages).map(|i| format!("stage_{}", i)).collect();
    let mut map = serde_json::Map::new();
    for (i, name) in names.iter().enumerate() {
        let start = i as f64;
        map.insert(
            name.clone(),
            json!({
                "stage_preprocess": {"operations": []},
                "stage_settings": {
                    "problem_data": {"start_time": start, "end_time": start + 1.0},
                    "solver_settings": {"time_stepping": {"time_step": 0.1}},
                    "output_processes": {
                        "gid_output": [{"Parameters": {"output_name": format!("gid_output/output_stage{}", i + 1)}}]
                    },
                    "processes": {
                        "constraints_process_list": [{
                            "python_module": "apply_vector_constraint_table_process",
                            "Parameters": {"model_part_name": "PorousDomain.top_displacement", "table": [0, 0, 0]}
                        }],
                        "loads_process_list": [initial_stress_process()]
                    }
                }
            }),
        );
    }
    json!({
        "orchestrator": {"settings": {"execution_list": names}},
        "stages": map
    })
}

fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

/// Write `root/test_<tag>` with a flat project file; returns the set directory
pub fn write_flat_template(root: &Path, test_type: TestType) -> PathBuf {
    let set = root.join(test_type.template_dir_name());
    fs::create_dir_all(&set).unwrap();
    fs::write(set.join("mesh.mdpa"), MESH).unwrap();
    write_json(&set.join("MaterialParameters.json"), &material_json());
    write_json(&set.join("ProjectParameters.json"), &flat_project_json());
    set
}

/// Write `root/test_<tag>` with an orchestrator file of `stages` stages
pub fn write_staged_template(root: &Path, test_type: TestType, stages: usize) -> PathBuf {
    let set = root.join(test_type.template_dir_name());
    fs::create_dir_all(&set).unwrap();
    fs::write(set.join("mesh.mdpa"), MESH).unwrap();
    write_json(&set.join("MaterialParameters.json"), &material_json());
    write_json(
        &set.join("ProjectParametersOrchestrator.json"),
        &staged_project_json(stages),
    );
    set
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// ============================================================================
// Solvers
// ============================================================================

/// Copies the fixture into every expected output file
#[derive(Default)]
pub struct FixtureSolver {
    /// Cancelled once the outputs are written
    pub cancel_after: Option<CancellationToken>,
}

impl Solver for FixtureSolver {
    fn run(
        &self,
        work_dir: &Path,
        project_file: &Path,
        output_files: &[PathBuf],
        _logger: &dyn Logger,
    ) -> Result<(), SolverError> {
        assert!(work_dir.is_dir());
        assert!(project_file.starts_with(work_dir));
        for path in output_files {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::copy(fixture_path(), path).unwrap();
        }
        if let Some(token) = &self.cancel_after {
            token.cancel();
        }
        Ok(())
    }
}

/// Always fails, leaving no output behind
pub struct FailingSolver;

impl Solver for FailingSolver {
    fn run(&self, _: &Path, _: &Path, _: &[PathBuf], _: &dyn Logger) -> Result<(), SolverError> {
        Err(SolverError::Failed {
            program: "kratos".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "Traceback: diverged at step 3".to_string(),
        })
    }
}
