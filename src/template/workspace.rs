//! Template discovery and the per-run working directory

use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::core::logger::Logger;
use crate::core::test_type::TestType;
use crate::template::TemplateError;

pub const TEMPLATES_ENV: &str = "SOILTEST_TEMPLATES";

pub const MATERIAL_FILE: &str = "MaterialParameters.json";
pub const MESH_FILE: &str = "mesh.mdpa";
pub const PROJECT_FILE: &str = "ProjectParameters.json";
pub const ORCHESTRATOR_FILE: &str = "ProjectParametersOrchestrator.json";

/// Files copied from a template set when present
pub const REQUIRED_FILES: [&str; 4] = [MATERIAL_FILE, MESH_FILE, PROJECT_FILE, ORCHESTRATOR_FILE];

/// Template roots in lookup order
pub fn candidate_template_roots(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(dir) = explicit {
        roots.push(dir.to_path_buf());
    }
    if let Some(dir) = std::env::var_os(TEMPLATES_ENV).filter(|v| !v.is_empty()) {
        roots.push(PathBuf::from(dir));
    }
    roots.push(PathBuf::from("templates"));
    if let Some(dirs) = ProjectDirs::from("", "", "soiltest") {
        roots.push(dirs.data_dir().join("templates"));
    }
    roots
}

/// Template set directory of `test_type`
///
/// A root may hold `test_<tag>` folders or be a template set itself.
pub fn find_template_dir(test_type: TestType, explicit: Option<&Path>) -> Result<PathBuf, TemplateError> {
    let roots = candidate_template_roots(explicit);
    let mut tried = Vec::new();
    for root in &roots {
        let nested = root.join(test_type.template_dir_name());
        if nested.is_dir() {
            return Ok(nested);
        }
        tried.push(nested.display().to_string());
        if root.join(MESH_FILE).is_file() {
            return Ok(root.clone());
        }
    }
    Err(TemplateError::TemplatesNotFound {
        test_type: test_type.tag().to_string(),
        tried: tried.join("\n  - "),
    })
}

/// Private copy of a template set
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    pub material_json: Option<PathBuf>,
    pub project_json: PathBuf,
    pub mesh: PathBuf,
}

impl Workspace {
    /// Copy the template files of `template_dir` into a fresh `<tag>_` temp directory
    ///
    /// The orchestrator file wins over the flat project file. A missing
    /// project file or mesh is fatal.
    pub fn stage(template_dir: &Path, test_type: TestType, logger: &dyn Logger) -> Result<Self, TemplateError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}_", test_type.tag()))
            .tempdir()
            .map_err(|source| TemplateError::Io {
                path: std::env::temp_dir(),
                source,
            })?;

        let mut copied = Vec::new();
        for name in REQUIRED_FILES {
            let src = template_dir.join(name);
            if !src.is_file() {
                continue;
            }
            let dst = dir.path().join(name);
            std::fs::copy(&src, &dst).map_err(|source| TemplateError::Io {
                path: src.clone(),
                source,
            })?;
            copied.push(name);
        }
        let has = |name: &str| copied.contains(&name);

        let project_json = if has(ORCHESTRATOR_FILE) {
            dir.path().join(ORCHESTRATOR_FILE)
        } else if has(PROJECT_FILE) {
            dir.path().join(PROJECT_FILE)
        } else {
            return Err(TemplateError::MissingFile(format!(
                "Neither {} nor {} found in template {}",
                ORCHESTRATOR_FILE,
                PROJECT_FILE,
                template_dir.display()
            )));
        };
        if !has(MESH_FILE) {
            return Err(TemplateError::MissingFile(format!(
                "{} missing in template set {}",
                MESH_FILE,
                template_dir.display()
            )));
        }
        let material_json = has(MATERIAL_FILE).then(|| dir.path().join(MATERIAL_FILE));

        logger.info(&format!(
            "Copied {} template file(s) from {} to {}",
            copied.len(),
            template_dir.display(),
            dir.path().display()
        ));

        Ok(Self {
            mesh: dir.path().join(MESH_FILE),
            material_json,
            project_json,
            dir,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Keep the directory on disk and return its location
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }

    /// Delete the directory
    pub fn remove(self, logger: &dyn Logger) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            logger.warn(&format!("Failed to clean tmp dir {}: {}", path.display(), e));
        }
    }
}
