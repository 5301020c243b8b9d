//! Mesh (`.mdpa`) placeholder substitution and table insertion

use std::path::{Path, PathBuf};

use crate::core::inputs::{SimulationInputs, StagePlan};
use crate::core::logger::Logger;
use crate::core::test_type::MeshPatch;
use crate::template::patch::{format_float, read_text, write_atomic, PatchMode, PatchOutcome};
use crate::template::TemplateError;

/// Replace every `$token` not followed by a word character
pub fn replace_token(text: &str, token: &str, replacement: &str) -> (String, usize) {
    let needle = format!("${}", token);
    let mut out = String::with_capacity(text.len());
    let mut count = 0;
    let mut rest = text;

    while let Some(pos) = rest.find(&needle) {
        let end = pos + needle.len();
        let bounded = rest[end..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        out.push_str(&rest[..pos]);
        if bounded {
            out.push_str(replacement);
            count += 1;
        } else {
            out.push_str(&needle);
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    (out, count)
}

/// Sub model part whose prescribed displacement follows the stage tables
pub const TOP_DISPLACEMENT_SUB_MODEL_PART: &str = "top_displacement";

/// Id for the first table added after the template's own `Begin Table <id>` blocks
pub fn next_table_id(text: &str) -> u32 {
    text.lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            match (tokens.next(), tokens.next(), tokens.next()) {
                (Some("Begin"), Some("Table"), Some(id)) => id.parse::<u32>().ok(),
                _ => None,
            }
        })
        .max()
        .map_or(1, |id| id + 1)
}

/// One displacement-vs-time table per stage, numbered from `first_id`
///
/// Stage `i` ramps from zero at its start time to `-strain_increment / 100`
/// at its end time. The solver measures each stage's displacement from zero
/// at the start of that stage, so the values are per increment.
pub fn displacement_tables(first_id: u32, durations: &[f64], strain_increments: &[f64]) -> String {
    let mut tables = String::new();
    let mut start = 0.0;
    for (id, (duration, strain)) in (first_id..).zip(durations.iter().zip(strain_increments)) {
        let end = start + duration;
        let displacement = -strain / 100.0;
        tables.push_str(&format!(
            "Begin Table {} TIME DISPLACEMENT_Y\n  {} 0.0\n  {} {}\nEnd Table\n\n",
            id,
            format_float(start),
            format_float(end),
            format_float(displacement),
        ));
        start = end;
    }
    tables
}

/// Line range `(begin, end)` of the `SubModelPartTables` markers owned by
/// the top displacement sub model part
fn top_displacement_tables_block(lines: &[&str]) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut owner: Option<usize> = None;
    let mut begin = None;
    for (i, line) in lines.iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["Begin", "SubModelPart", name, ..] => {
                depth += 1;
                if owner.is_none() && *name == TOP_DISPLACEMENT_SUB_MODEL_PART {
                    owner = Some(depth);
                }
            }
            ["End", "SubModelPart", ..] => {
                if owner == Some(depth) {
                    return None;
                }
                depth = depth.saturating_sub(1);
            }
            ["Begin", "SubModelPartTables", ..] if owner == Some(depth) => begin = Some(i),
            ["End", "SubModelPartTables", ..] if owner == Some(depth) => {
                return begin.map(|b| (b, i));
            }
            _ => {}
        }
    }
    None
}

pub struct MdpaEditor<'a> {
    path: PathBuf,
    raw_text: String,
    mode: PatchMode,
    logger: &'a dyn Logger,
}

impl<'a> MdpaEditor<'a> {
    pub fn open(path: &Path, mode: PatchMode, logger: &'a dyn Logger) -> Result<Self, TemplateError> {
        Ok(Self {
            path: path.to_path_buf(),
            raw_text: read_text(path)?,
            mode,
            logger,
        })
    }

    pub fn text(&self) -> &str {
        &self.raw_text
    }

    fn substitute(
        &mut self,
        token: &str,
        replacement: &str,
        failure: &str,
    ) -> Result<PatchOutcome, TemplateError> {
        let (text, count) = replace_token(&self.raw_text, token, replacement);
        if count > 0 {
            self.raw_text = text;
            write_atomic(&self.path, &self.raw_text)?;
        }
        self.mode
            .settle(PatchOutcome::from_count(count), failure, &self.path, self.logger)
    }

    /// `$maximum_strain` becomes the prescribed displacement `-max/100`
    pub fn update_maximum_strain(&mut self, maximum_strain: f64) -> Result<PatchOutcome, TemplateError> {
        let displacement = -maximum_strain / 100.0;
        self.substitute(
            "maximum_strain",
            &format!("{:.4}", displacement),
            "Could not update maximum strain.",
        )
    }

    /// Half the top displacement, for the mid-height nodes of a shear sample
    pub fn update_middle_maximum_strain(
        &mut self,
        maximum_strain: f64,
    ) -> Result<PatchOutcome, TemplateError> {
        let displacement = (-maximum_strain / 2.0) / 100.0;
        self.substitute(
            "middle_maximum_strain",
            &format!("{:.4}", displacement),
            "Could not update middle maximum strain.",
        )
    }

    pub fn update_initial_effective_cell_pressure(
        &mut self,
        pressure: f64,
    ) -> Result<PatchOutcome, TemplateError> {
        self.substitute(
            "initial_effective_cell_pressure",
            &format!("{:.4}", pressure),
            "Could not update initial effective cell pressure.",
        )
    }

    pub fn update_first_timestep(&mut self, duration: f64, steps: u32) -> Result<PatchOutcome, TemplateError> {
        if steps == 0 {
            return Err(TemplateError::ZeroSteps {
                stage: "first".to_string(),
            });
        }
        let time_step = duration / f64::from(steps);
        self.substitute(
            "first_timestep",
            &format!("{:.4}", time_step),
            "Could not apply the first time step.",
        )
    }

    pub fn update_end_time(&mut self, end_time: f64) -> Result<PatchOutcome, TemplateError> {
        self.substitute("end_time", &format_float(end_time), "Could not update the end time.")
    }

    /// Prepend one displacement table per stage, returning the first new id
    pub fn insert_displacement_tables(
        &mut self,
        durations: &[f64],
        strain_increments: &[f64],
    ) -> Result<u32, TemplateError> {
        if durations.len() != strain_increments.len() {
            return Err(TemplateError::StageCountMismatch {
                durations: durations.len(),
                steps: strain_increments.len(),
            });
        }
        let first_id = next_table_id(&self.raw_text);
        if durations.is_empty() {
            return Ok(first_id);
        }
        self.raw_text = format!(
            "{}{}",
            displacement_tables(first_id, durations, strain_increments),
            self.raw_text
        );
        write_atomic(&self.path, &self.raw_text)?;
        self.logger.info(&format!(
            "Inserted {} displacement table(s) into {}",
            durations.len(),
            self.path.display()
        ));
        Ok(first_id)
    }

    /// List tables `first_id..first_id + count` under the top displacement
    /// sub model part
    pub fn update_top_displacement_tables(
        &mut self,
        first_id: u32,
        count: usize,
    ) -> Result<PatchOutcome, TemplateError> {
        let lines: Vec<&str> = self.raw_text.lines().collect();
        let Some((begin, end)) = top_displacement_tables_block(&lines) else {
            return self.mode.settle(
                PatchOutcome::NotFound,
                "Could not find the top displacement sub model part tables.",
                &self.path,
                self.logger,
            );
        };

        let indent: String = lines[begin].chars().take_while(|c| c.is_whitespace()).collect();
        let mut rewritten: Vec<String> = lines[..=begin].iter().map(|l| l.to_string()).collect();
        rewritten.extend((first_id..).take(count).map(|id| format!("{}  {}", indent, id)));
        rewritten.extend(lines[end..].iter().map(|l| l.to_string()));
        let mut text = rewritten.join("\n");
        if self.raw_text.ends_with('\n') {
            text.push('\n');
        }
        self.raw_text = text;
        write_atomic(&self.path, &self.raw_text)?;
        Ok(PatchOutcome::Applied)
    }

    /// Every placeholder the test type uses
    pub fn apply_inputs(&mut self, inputs: &SimulationInputs) -> Result<(), TemplateError> {
        let test_type = inputs.test_type;
        let plan = inputs.stage_plan();

        if test_type.uses_mesh_patch(MeshPatch::MaximumStrain) {
            self.update_maximum_strain(inputs.maximum_strain)?;
        }
        if test_type.uses_mesh_patch(MeshPatch::EndTime) {
            self.update_end_time(plan.total_duration())?;
        }
        if test_type.uses_mesh_patch(MeshPatch::FirstTimestep) {
            if let Some((duration, steps)) = plan.first_stage() {
                self.update_first_timestep(duration, steps)?;
            }
        }
        if test_type.uses_mesh_patch(MeshPatch::InitialEffectiveCellPressure) {
            self.update_initial_effective_cell_pressure(inputs.initial_effective_cell_pressure)?;
        }
        if test_type.uses_mesh_patch(MeshPatch::MiddleMaximumStrain) {
            self.update_middle_maximum_strain(inputs.maximum_strain)?;
        }
        if test_type.uses_mesh_patch(MeshPatch::DisplacementTables) {
            if let StagePlan::Staged {
                durations,
                strain_increments,
                ..
            } = &plan
            {
                let first_id = self.insert_displacement_tables(durations, strain_increments)?;
                if durations.len() > 1 {
                    self.update_top_displacement_tables(first_id, durations.len())?;
                }
            }
        }
        Ok(())
    }
}
