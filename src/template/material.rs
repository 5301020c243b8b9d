//! Material laws and the material parameter file
//!
//! The material file holds one or more blocks with a `constitutive_law`
//! entry and a flat `Variables` map. A law writes its variables into every
//! such block and sets the law name.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

use crate::core::logger::Logger;
use crate::results::mohr_coulomb::{extract_cohesion_phi, MohrCoulombError};
use crate::template::patch::{parse_json, read_text, to_pretty_json, write_atomic, PatchMode, PatchOutcome};
use crate::template::TemplateError;

pub const LINEAR_ELASTIC_LAW: &str = "GeoLinearElasticPlaneStrain2DLaw";
pub const MOHR_COULOMB_LAW: &str = "GeoMohrCoulombWithTensionCutOff2D";
pub const UDSM_LAW: &str = "SmallStrainUDSM2DPlaneStrainLaw";

/// Constitutive law of the soil sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum MaterialLaw {
    LinearElastic {
        young_modulus: f64,
        poisson_ratio: f64,
    },
    MohrCoulomb {
        young_modulus: f64,
        poisson_ratio: f64,
        cohesion: f64,
        friction_angle: f64,
        #[serde(default)]
        tensile_strength: f64,
        #[serde(default)]
        dilatancy_angle: f64,
    },
    /// User defined soil model loaded from a native library
    Udsm {
        dll_path: PathBuf,
        #[serde(default = "default_udsm_number")]
        udsm_number: u32,
        parameters: Vec<f64>,
    },
}

fn default_udsm_number() -> u32 {
    1
}

impl MaterialLaw {
    pub fn constitutive_law_name(&self) -> &'static str {
        match self {
            MaterialLaw::LinearElastic { .. } => LINEAR_ELASTIC_LAW,
            MaterialLaw::MohrCoulomb { .. } => MOHR_COULOMB_LAW,
            MaterialLaw::Udsm { .. } => UDSM_LAW,
        }
    }

    /// Flat parameter vector, in the order the front-end lists them
    pub fn parameter_vector(&self) -> Vec<f64> {
        match self {
            MaterialLaw::LinearElastic {
                young_modulus,
                poisson_ratio,
            } => vec![*young_modulus, *poisson_ratio],
            MaterialLaw::MohrCoulomb {
                young_modulus,
                poisson_ratio,
                cohesion,
                friction_angle,
                tensile_strength,
                dilatancy_angle,
            } => vec![
                *young_modulus,
                *poisson_ratio,
                *cohesion,
                *friction_angle,
                *tensile_strength,
                *dilatancy_angle,
            ],
            MaterialLaw::Udsm { parameters, .. } => parameters.clone(),
        }
    }

    /// Variables written into the material file
    pub fn variables(&self) -> Vec<(&'static str, Value)> {
        match self {
            MaterialLaw::LinearElastic {
                young_modulus,
                poisson_ratio,
            } => vec![
                ("YOUNG_MODULUS", json!(young_modulus)),
                ("POISSON_RATIO", json!(poisson_ratio)),
            ],
            MaterialLaw::MohrCoulomb {
                young_modulus,
                poisson_ratio,
                cohesion,
                friction_angle,
                tensile_strength,
                dilatancy_angle,
            } => vec![
                ("YOUNG_MODULUS", json!(young_modulus)),
                ("POISSON_RATIO", json!(poisson_ratio)),
                ("GEO_COHESION", json!(cohesion)),
                ("GEO_FRICTION_ANGLE", json!(friction_angle)),
                ("GEO_TENSILE_STRENGTH", json!(tensile_strength)),
                ("GEO_DILATANCY_ANGLE", json!(dilatancy_angle)),
            ],
            MaterialLaw::Udsm {
                dll_path,
                udsm_number,
                parameters,
            } => vec![
                ("IS_FORTRAN_UDSM", json!(true)),
                ("UMAT_PARAMETERS", json!(parameters)),
                ("UDSM_NAME", json!(dll_path.display().to_string())),
                ("UDSM_NUMBER", json!(udsm_number)),
            ],
        }
    }

    /// Cohesion and friction angle for the failure line
    ///
    /// A Mohr-Coulomb law knows its own values; other laws look them up
    /// in their parameter vector through the 1-based index pair.
    pub fn cohesion_phi(
        &self,
        indices: Option<(usize, usize)>,
    ) -> Result<(Option<f64>, Option<f64>), MohrCoulombError> {
        match (self, indices) {
            (_, None) => Ok((None, None)),
            (
                MaterialLaw::MohrCoulomb {
                    cohesion,
                    friction_angle,
                    ..
                },
                Some(_),
            ) => Ok((Some(*cohesion), Some(*friction_angle))),
            (_, Some(_)) => extract_cohesion_phi(&self.parameter_vector(), indices),
        }
    }
}

pub struct MaterialEditor<'a> {
    path: PathBuf,
    data: Value,
    mode: PatchMode,
    logger: &'a dyn Logger,
}

impl<'a> MaterialEditor<'a> {
    pub fn open(path: &Path, mode: PatchMode, logger: &'a dyn Logger) -> Result<Self, TemplateError> {
        let text = read_text(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            data: parse_json(&text, path)?,
            mode,
            logger,
        })
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Merge variables into every material block
    pub fn update_material_properties(
        &mut self,
        variables: &[(&str, Value)],
    ) -> Result<PatchOutcome, TemplateError> {
        let mut blocks = 0;
        visit_material_blocks(&mut self.data, &mut |block| {
            let vars = block
                .entry("Variables")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(vars) = vars.as_object_mut() {
                for (name, value) in variables {
                    vars.insert(name.to_string(), value.clone());
                }
                blocks += 1;
            }
        });
        self.finish(blocks, "Could not find a material block to update.")
    }

    /// Set the constitutive law name of every material block
    pub fn set_constitutive_law(&mut self, name: &str) -> Result<PatchOutcome, TemplateError> {
        let mut blocks = 0;
        visit_material_blocks(&mut self.data, &mut |block| {
            match block.get_mut("constitutive_law") {
                Some(Value::Object(law)) => {
                    law.insert("name".to_string(), json!(name));
                }
                Some(other) => *other = json!(name),
                None => return,
            }
            blocks += 1;
        });
        self.finish(
            blocks,
            &format!("Could not set constitutive law '{}'.", name),
        )
    }

    /// Write variables and law name for `law`
    pub fn apply(&mut self, law: &MaterialLaw) -> Result<(), TemplateError> {
        self.update_material_properties(&law.variables())?;
        self.set_constitutive_law(law.constitutive_law_name())?;
        Ok(())
    }

    fn finish(&mut self, blocks: usize, message: &str) -> Result<PatchOutcome, TemplateError> {
        if blocks > 0 {
            write_atomic(&self.path, &to_pretty_json(&self.data, &self.path)?)?;
        }
        self.mode
            .settle(PatchOutcome::from_count(blocks), message, &self.path, self.logger)
    }
}

/// Call `visit` on every object that owns a `constitutive_law` entry
fn visit_material_blocks(value: &mut Value, visit: &mut dyn FnMut(&mut Map<String, Value>)) {
    match value {
        Value::Object(map) => {
            if map.contains_key("constitutive_law") {
                visit(map);
                return;
            }
            for child in map.values_mut() {
                visit_material_blocks(child, visit);
            }
        }
        Value::Array(items) => {
            for child in items {
                visit_material_blocks(child, visit);
            }
        }
        _ => {}
    }
}
