//! CLI and basic command tests

mod common;

use common::{fixture_path, soiltest, write_flat_template};
use predicates::prelude::*;
use soiltest::core::test_type::TestType;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    soiltest()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Soil element test toolkit"))
        .stdout(predicate::str::contains("collect"));
}

#[test]
fn test_version_displays() {
    soiltest()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("soiltest"));
}

#[test]
fn test_unknown_command_fails() {
    soiltest()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// ============================================================================
// Inspect Command Tests
// ============================================================================

#[test]
fn test_inspect_table() {
    soiltest()
        .args(["inspect", "--format", "table"])
        .arg(fixture_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("CAUCHY_STRESS_TENSOR"))
        .stdout(predicate::str::contains("gauss points"))
        .stdout(predicate::str::contains("5 time steps"))
        .stdout(predicate::str::contains("25 records in total"));
}

#[test]
fn test_inspect_json() {
    let output = soiltest()
        .args(["inspect", "--format", "json", "--quiet"])
        .arg(fixture_path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["results"].as_array().unwrap().len(), 5);
    assert_eq!(json["results"][0]["name"], "DISPLACEMENT");
    assert_eq!(json["results"][0]["location"], "nodes");
    assert_eq!(json["time_steps"], serde_json::json!([0.2, 0.4, 0.6, 0.8, 1.0]));
}

#[test]
fn test_inspect_missing_file_fails() {
    soiltest()
        .args(["inspect", "no/such/output.post.res"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Result file not found"));
}

// ============================================================================
// Collect Command Tests
// ============================================================================

fn stage_dir(tmp: &TempDir) -> std::path::PathBuf {
    let out = tmp.path().join("gid_output");
    fs::create_dir(&out).unwrap();
    fs::copy(fixture_path(), out.join("output_stage1.post.res")).unwrap();
    fs::copy(fixture_path(), out.join("output_stage2.post.res")).unwrap();
    out
}

#[test]
fn test_collect_directory_stitches_stages() {
    let tmp = TempDir::new().unwrap();
    let out = stage_dir(&tmp);

    let output = soiltest()
        .args(["collect", "--format", "json"])
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let yy = json["yy_strain"].as_array().unwrap();
    assert_eq!(yy.len(), 10);
    assert!((yy[9].as_f64().unwrap() + 0.4).abs() < 1e-9);
    assert!(json["cohesion"].is_null());
}

#[test]
fn test_collect_with_cohesion_phi_table() {
    soiltest()
        .args([
            "collect",
            "--format",
            "table",
            "--params",
            "1,2,3,4",
            "--c-phi",
            "3,4",
            "--test-type",
            "triaxial",
        ])
        .arg(fixture_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Triaxial"))
        .stdout(predicate::str::contains("von Mises"))
        .stdout(predicate::str::contains("c = 3.0000  phi = 4.0000"));
}

#[test]
fn test_collect_bad_index_fails() {
    soiltest()
        .args(["collect", "--params", "1,2", "--c-phi", "3,4"])
        .arg(fixture_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_collect_export_requires_test_type() {
    let tmp = TempDir::new().unwrap();
    soiltest()
        .args(["collect", "--export"])
        .arg(tmp.path())
        .arg(fixture_path())
        .assert()
        .failure();
}

#[test]
fn test_collect_export_writes_csv() {
    let tmp = TempDir::new().unwrap();
    let export = tmp.path().join("csv");
    soiltest()
        .args(["collect", "--quiet", "-t", "crs", "--export"])
        .arg(&export)
        .arg(fixture_path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Exported 5 series"));

    for i in 1..=5 {
        assert!(export.join(format!("crs_plot{}.csv", i)).is_file());
    }
}

#[test]
fn test_collect_empty_directory_fails() {
    let tmp = TempDir::new().unwrap();
    soiltest()
        .arg("collect")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No result files found"));
}

// ============================================================================
// Run Command Tests
// ============================================================================

fn write_config(dir: &Path, solver_script: &str) -> std::path::PathBuf {
    let config = format!(
        r#"test_type: triaxial
number_of_steps: 50
material:
  law: udsm
  dll_path: MohrCoulomb64.dll
  parameters: [1.0, 2.0, 3.0, 4.0]
mohr_coulomb: {{ enabled: true, c_index: 3, phi_index: 4 }}
templates: templates
patch_mode: strict
solver:
  program: sh
  args: ["-c", {script}]
"#,
        script = serde_json::to_string(solver_script).unwrap()
    );
    let path = dir.join("run.yaml");
    fs::write(&path, config).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn test_run_with_shell_solver() {
    let tmp = TempDir::new().unwrap();
    write_flat_template(&tmp.path().join("templates"), TestType::Triaxial);
    let script = format!(
        "mkdir -p gid_output && cp '{}' gid_output/output.post.res",
        fixture_path().display()
    );
    let config = write_config(tmp.path(), &script);

    soiltest()
        .args(["run", "--format", "table", "--export"])
        .arg(tmp.path().join("csv"))
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Triaxial"))
        .stdout(predicate::str::contains("c = 3.0000  phi = 4.0000"))
        .stderr(predicate::str::contains("Starting triaxial simulation..."));

    assert!(tmp.path().join("csv").join("triaxial_plot1.csv").is_file());
}

#[cfg(unix)]
#[test]
fn test_run_reports_solver_failure() {
    let tmp = TempDir::new().unwrap();
    write_flat_template(&tmp.path().join("templates"), TestType::Triaxial);
    let config = write_config(tmp.path(), "echo 'solver diverged' >&2; exit 3");

    soiltest()
        .arg("run")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("run failed"))
        .stderr(predicate::str::contains("Work directory"));
}

#[test]
fn test_run_rejects_unknown_test_type() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("run.yaml");
    fs::write(
        &path,
        "test_type: oedometer\nmaterial: { law: linear_elastic, young_modulus: 1.0, poisson_ratio: 0.3 }\nsolver: { program: sh }\n",
    )
    .unwrap();

    soiltest()
        .arg("run")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("oedometer"));
}

#[test]
fn test_run_without_templates_fails() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), "true");

    soiltest()
        .arg("run")
        .arg(&config)
        .env_remove("SOILTEST_TEMPLATES")
        .current_dir(tmp.path())
        .assert()
        .failure();
}
