//! Test types and their per-variant behaviour table

use serde::{Deserialize, Serialize};

/// Soil element test being simulated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    Triaxial,
    DirectShear,
    Crs,
}

/// How the number of solver stages is decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRule {
    /// The template's stage layout is used as-is
    Template,
    /// One stage per strain increment, appending clones of the last template stage
    PerStrainIncrement,
}

/// Mesh placeholders a test type fills in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshPatch {
    MaximumStrain,
    MiddleMaximumStrain,
    InitialEffectiveCellPressure,
    FirstTimestep,
    EndTime,
    DisplacementTables,
}

/// Static description of one test type
#[derive(Debug)]
pub struct TestProfile {
    pub test_type: TestType,
    /// Machine tag, also the template directory suffix
    pub tag: &'static str,
    /// Human readable name
    pub label: &'static str,
    pub stage_rule: StageRule,
    pub mesh_patches: &'static [MeshPatch],
}

const PROFILES: [TestProfile; 3] = [
    TestProfile {
        test_type: TestType::Triaxial,
        tag: "triaxial",
        label: "Triaxial",
        stage_rule: StageRule::Template,
        mesh_patches: &[
            MeshPatch::MaximumStrain,
            MeshPatch::EndTime,
            MeshPatch::FirstTimestep,
            MeshPatch::InitialEffectiveCellPressure,
        ],
    },
    TestProfile {
        test_type: TestType::DirectShear,
        tag: "direct_shear",
        label: "Direct Simple Shear",
        stage_rule: StageRule::Template,
        mesh_patches: &[
            MeshPatch::MaximumStrain,
            MeshPatch::EndTime,
            MeshPatch::FirstTimestep,
            MeshPatch::MiddleMaximumStrain,
        ],
    },
    TestProfile {
        test_type: TestType::Crs,
        tag: "crs",
        label: "CRS",
        stage_rule: StageRule::PerStrainIncrement,
        mesh_patches: &[
            MeshPatch::MaximumStrain,
            MeshPatch::EndTime,
            MeshPatch::FirstTimestep,
            MeshPatch::DisplacementTables,
        ],
    },
];

impl TestType {
    pub fn all() -> [TestType; 3] {
        [TestType::Triaxial, TestType::DirectShear, TestType::Crs]
    }

    pub fn profile(&self) -> &'static TestProfile {
        match self {
            TestType::Triaxial => &PROFILES[0],
            TestType::DirectShear => &PROFILES[1],
            TestType::Crs => &PROFILES[2],
        }
    }

    pub fn tag(&self) -> &'static str {
        self.profile().tag
    }

    pub fn label(&self) -> &'static str {
        self.profile().label
    }

    /// Directory name of this test's template set, e.g. `test_triaxial`
    pub fn template_dir_name(&self) -> String {
        format!("test_{}", self.tag())
    }

    pub fn uses_mesh_patch(&self, patch: MeshPatch) -> bool {
        self.profile().mesh_patches.contains(&patch)
    }
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl std::str::FromStr for TestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PROFILES
            .iter()
            .find(|p| p.tag == wanted || p.label.to_lowercase() == wanted)
            .map(|p| p.test_type)
            .ok_or_else(|| format!("Unknown test type: {}", s))
    }
}

/// Pore-water drainage condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Drainage {
    #[default]
    Drained,
    Undrained,
}

impl std::fmt::Display for Drainage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Drainage::Drained => write!(f, "drained"),
            Drainage::Undrained => write!(f, "undrained"),
        }
    }
}

impl std::str::FromStr for Drainage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drained" => Ok(Drainage::Drained),
            "undrained" => Ok(Drainage::Undrained),
            _ => Err(format!("Unknown drainage: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_line_up_with_variants() {
        for test_type in TestType::all() {
            assert_eq!(test_type.profile().test_type, test_type);
        }
    }

    #[test]
    fn test_parse_accepts_tag_and_label() {
        assert_eq!("triaxial".parse::<TestType>(), Ok(TestType::Triaxial));
        assert_eq!("Direct Simple Shear".parse::<TestType>(), Ok(TestType::DirectShear));
        assert_eq!("CRS".parse::<TestType>(), Ok(TestType::Crs));
        assert!("oedometer".parse::<TestType>().is_err());
    }

    #[test]
    fn test_template_dir_name() {
        assert_eq!(TestType::DirectShear.template_dir_name(), "test_direct_shear");
    }

    #[test]
    fn test_only_crs_appends_stages() {
        assert_eq!(TestType::Crs.profile().stage_rule, StageRule::PerStrainIncrement);
        assert_eq!(TestType::Triaxial.profile().stage_rule, StageRule::Template);
    }

    #[test]
    fn test_mesh_patches_per_type() {
        assert!(TestType::Triaxial.uses_mesh_patch(MeshPatch::InitialEffectiveCellPressure));
        assert!(!TestType::Crs.uses_mesh_patch(MeshPatch::InitialEffectiveCellPressure));
        assert!(TestType::DirectShear.uses_mesh_patch(MeshPatch::MiddleMaximumStrain));
        assert!(TestType::Crs.uses_mesh_patch(MeshPatch::DisplacementTables));
    }

    #[test]
    fn test_serde_tags() {
        let json = serde_json::to_string(&TestType::DirectShear).unwrap();
        assert_eq!(json, "\"direct_shear\"");
        let drainage: Drainage = serde_json::from_str("\"undrained\"").unwrap();
        assert_eq!(drainage, Drainage::Undrained);
    }
}
