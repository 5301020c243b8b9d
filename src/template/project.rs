//! Project parameter editing
//!
//! Handles both layouts the solver accepts: a flat project file with
//! top-level `time_step`/`end_time`, and an orchestrator file with a
//! `stages` map plus `orchestrator.settings.execution_list`.

use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

use crate::core::logger::Logger;
use crate::template::patch::{
    format_float, parse_json, read_text, to_pretty_json, write_atomic, PatchMode, PatchOutcome,
};
use crate::template::TemplateError;

pub const INITIAL_STRESS_MODULE: &str = "apply_initial_uniform_stress_field";
pub const TABLE_CONSTRAINT_MODULE: &str = "apply_vector_constraint_table_process";
pub const TOP_DISPLACEMENT_PART: &str = "PorousDomain.top_displacement";

/// Solver output directory inside the work directory
pub const OUTPUT_DIR: &str = "gid_output";

pub struct ProjectEditor<'a> {
    path: PathBuf,
    raw_text: String,
    mode: PatchMode,
    logger: &'a dyn Logger,
}

impl<'a> ProjectEditor<'a> {
    pub fn open(path: &Path, mode: PatchMode, logger: &'a dyn Logger) -> Result<Self, TemplateError> {
        Ok(Self {
            path: path.to_path_buf(),
            raw_text: read_text(path)?,
            mode,
            logger,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.raw_text
    }

    fn load(&self) -> Result<Value, TemplateError> {
        parse_json(&self.raw_text, &self.path)
    }

    fn store(&mut self, data: &Value) -> Result<(), TemplateError> {
        self.raw_text = to_pretty_json(data, &self.path)?;
        write_atomic(&self.path, &self.raw_text)
    }

    fn structure(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::Structure {
            path: self.path.clone(),
            message: message.into(),
        }
    }

    pub fn is_staged(&self) -> Result<bool, TemplateError> {
        Ok(self.load()?.get("stages").is_some())
    }

    /// Stage keys in file order; empty for a flat project
    pub fn stage_names(&self) -> Result<Vec<String>, TemplateError> {
        match self.load()?.get("stages") {
            None => Ok(Vec::new()),
            Some(Value::Object(stages)) => Ok(stages.keys().cloned().collect()),
            Some(_) => Err(self.structure("'stages' is not an object")),
        }
    }

    pub fn stage_count(&self) -> Result<usize, TemplateError> {
        Ok(self.stage_names()?.len())
    }

    /// Result files the solver writes for this project
    pub fn output_file_paths(&self, work_dir: &Path) -> Result<Vec<PathBuf>, TemplateError> {
        let output = work_dir.join(OUTPUT_DIR);
        if !self.is_staged()? {
            return Ok(vec![output.join("output.post.res")]);
        }
        Ok((1..=self.stage_count()?)
            .map(|i| output.join(format!("output_stage{}.post.res", i)))
            .collect())
    }

    /// Replace the numeric value of every `"name": <number>` occurrence
    pub fn update_property(&mut self, name: &str, value: f64) -> Result<PatchOutcome, TemplateError> {
        let (text, count) = replace_numeric_property(&self.raw_text, name, &format_float(value));
        if count > 1 {
            self.logger.warn(&format!(
                "Multiple occurrences of '{}' found. Updated all {}.",
                name, count
            ));
        }
        if count > 0 {
            self.raw_text = text;
            write_atomic(&self.path, &self.raw_text)?;
        }
        self.mode.settle(
            PatchOutcome::from_count(count),
            &format!("Could not find '{}' to update.", name),
            &self.path,
            self.logger,
        )
    }

    /// Set `Parameters.<key>` of every load process running `module`
    ///
    /// Looks in the top-level `processes` and in every stage's processes.
    pub fn update_nested_value(
        &mut self,
        module: &str,
        key: &str,
        value: Value,
    ) -> Result<PatchOutcome, TemplateError> {
        let mut data = self.load()?;
        let mut count = 0;
        for_each_process_list(&mut data, "loads_process_list", |list| {
            for process in list.iter_mut() {
                if process.get("python_module").and_then(Value::as_str) != Some(module) {
                    continue;
                }
                if let Some(params) = process.get_mut("Parameters").and_then(Value::as_object_mut) {
                    if params.contains_key(key) {
                        params.insert(key.to_string(), value.clone());
                        count += 1;
                    }
                }
            }
        });
        if count > 0 {
            self.store(&data)?;
        }
        self.mode.settle(
            PatchOutcome::from_count(count),
            &format!("Could not find '{}' under '{}'.", key, module),
            &self.path,
            self.logger,
        )
    }

    /// Initial isotropic effective stress `[-p, -p, -p, 0]`, compression negative
    pub fn set_initial_stress(&mut self, pressure: f64) -> Result<PatchOutcome, TemplateError> {
        let p = -pressure;
        self.update_nested_value(INITIAL_STRESS_MODULE, "value", json!([p, p, p, 0.0]))
    }

    /// Timing of a flat project
    pub fn set_flat_timing(&mut self, time_step: f64, end_time: f64) -> Result<(), TemplateError> {
        self.update_property("time_step", time_step)?;
        self.update_property("end_time", end_time)?;
        Ok(())
    }

    /// Chain the existing stages: each starts where the previous one ended
    ///
    /// Every list must have one entry per template stage. Nothing is
    /// written when validation fails.
    pub fn update_stage_timings(
        &mut self,
        end_times: &[f64],
        steps: &[u32],
        start_time: f64,
    ) -> Result<(), TemplateError> {
        if end_times.len() != steps.len() {
            return Err(TemplateError::StageCountMismatch {
                durations: end_times.len(),
                steps: steps.len(),
            });
        }
        let names = self.stage_names()?;
        if names.len() != end_times.len() {
            return Err(TemplateError::TemplateStageMismatch {
                template: names.len(),
                requested: end_times.len(),
            });
        }
        if let Some(i) = steps.iter().position(|s| *s == 0) {
            return Err(TemplateError::ZeroSteps {
                stage: names[i].clone(),
            });
        }

        let mut data = self.load()?;
        let mut start = start_time;
        let mut updates = Vec::with_capacity(names.len());
        {
            let stages = data
                .get_mut("stages")
                .and_then(Value::as_object_mut)
                .ok_or_else(|| self.structure("'stages' is not an object"))?;
            for ((name, end), n) in names.iter().zip(end_times).zip(steps) {
                let stage = stages
                    .get_mut(name)
                    .ok_or_else(|| self.structure(format!("stage '{}' vanished", name)))?;
                let time_step = (end - start) / f64::from(*n);
                let written = set_path(stage, &["stage_settings", "problem_data", "start_time"], json!(start))
                    && set_path(stage, &["stage_settings", "problem_data", "end_time"], json!(end))
                    && set_path(
                        stage,
                        &["stage_settings", "solver_settings", "time_stepping", "time_step"],
                        json!(time_step),
                    );
                if !written {
                    return Err(self.structure(format!("stage '{}' settings are not objects", name)));
                }
                updates.push(format!(
                    "Updated {}: start_time={}, end_time={}, time_step={}",
                    name, start, end, time_step
                ));
                start = *end;
            }
        }

        self.store(&data)?;
        for message in &updates {
            self.logger.info(message);
        }
        Ok(())
    }

    /// Timing of a staged project from per-stage durations
    ///
    /// With `append`, stages beyond the template's count are cloned from
    /// the last one first. Without it the counts must match exactly.
    pub fn set_staged_timing(
        &mut self,
        durations: &[f64],
        steps: &[u32],
        start_time: f64,
        append: bool,
    ) -> Result<(), TemplateError> {
        if durations.len() != steps.len() {
            return Err(TemplateError::StageCountMismatch {
                durations: durations.len(),
                steps: steps.len(),
            });
        }
        let current = self.stage_count()?;
        if current == 0 {
            return Err(self.structure("project has no stages"));
        }
        let requested = durations.len();
        if requested < current || (requested > current && !append) {
            return Err(TemplateError::TemplateStageMismatch {
                template: current,
                requested,
            });
        }
        if let Some(i) = steps.iter().position(|s| *s == 0) {
            return Err(TemplateError::ZeroSteps {
                stage: format!("stage_{}", i + 1),
            });
        }

        for (duration, n) in durations[current..].iter().zip(&steps[current..]) {
            self.append_stage(*duration, *n)?;
        }

        let end_times: Vec<f64> = durations
            .iter()
            .scan(start_time, |end, d| {
                *end += d;
                Some(*end)
            })
            .collect();
        self.update_stage_timings(&end_times, steps, start_time)
    }

    /// Clone the last stage as `stage_<n>` running for `duration`
    pub fn append_stage(&mut self, duration: f64, steps: u32) -> Result<String, TemplateError> {
        let mut data = self.load()?;
        let (mut new_stage, index) = {
            let stages = data
                .get("stages")
                .and_then(Value::as_object)
                .ok_or_else(|| self.structure("project has no 'stages' object"))?;
            let (_, last) = stages
                .iter()
                .last()
                .ok_or_else(|| self.structure("project has no stages to clone"))?;
            (last.clone(), stages.len() + 1)
        };
        let new_key = format!("stage_{}", index);
        if steps == 0 {
            return Err(TemplateError::ZeroSteps { stage: new_key });
        }

        if let Some(stage) = new_stage.as_object_mut() {
            stage.shift_remove("stage_preprocess");
        }
        let previous_end = new_stage
            .pointer("/stage_settings/problem_data/end_time")
            .and_then(Value::as_f64)
            .ok_or_else(|| self.structure("last stage has no numeric problem_data.end_time"))?;

        let written = set_path(&mut new_stage, &["stage_settings", "problem_data", "start_time"], json!(previous_end))
            && set_path(
                &mut new_stage,
                &["stage_settings", "problem_data", "end_time"],
                json!(previous_end + duration),
            )
            && set_path(
                &mut new_stage,
                &["stage_settings", "solver_settings", "time_stepping", "time_step"],
                json!(duration / f64::from(steps)),
            );
        if !written {
            return Err(self.structure("last stage settings are not objects"));
        }

        let output_params = new_stage
            .pointer_mut("/stage_settings/output_processes/gid_output/0/Parameters")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| self.structure("last stage has no gid_output parameters"))?;
        output_params.insert(
            "output_name".to_string(),
            json!(format!("{}/output_stage{}", OUTPUT_DIR, index)),
        );

        data.pointer_mut("/orchestrator/settings/execution_list")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| self.structure("missing orchestrator.settings.execution_list"))?
            .push(json!(new_key));
        if let Some(stages) = data.get_mut("stages").and_then(Value::as_object_mut) {
            stages.insert(new_key.clone(), new_stage);
        }

        self.store(&data)?;
        self.logger.info(&format!("Appended a new stage: {}", new_key));
        Ok(new_key)
    }

    /// Point stage `i`'s top displacement constraint at table `first_table + i`
    pub fn update_top_displacement_table_numbers(
        &mut self,
        first_table: u32,
    ) -> Result<PatchOutcome, TemplateError> {
        let mut data = self.load()?;
        let mut count = 0;
        if let Some(stages) = data.get_mut("stages").and_then(Value::as_object_mut) {
            for (table, stage) in (first_table..).zip(stages.values_mut()) {
                let Some(list) = stage
                    .pointer_mut("/stage_settings/processes/constraints_process_list")
                    .and_then(Value::as_array_mut)
                else {
                    continue;
                };
                for process in list.iter_mut().filter(|p| is_top_displacement_table(p)) {
                    if let Some(params) = process.get_mut("Parameters").and_then(Value::as_object_mut) {
                        params.insert("table".to_string(), json!([0, table, 0]));
                        count += 1;
                    }
                }
            }
        }
        if count > 0 {
            self.store(&data)?;
        }
        self.mode.settle(
            PatchOutcome::from_count(count),
            "Could not find a top displacement table constraint to renumber.",
            &self.path,
            self.logger,
        )
    }
}

fn is_top_displacement_table(process: &Value) -> bool {
    process.get("python_module").and_then(Value::as_str) == Some(TABLE_CONSTRAINT_MODULE)
        && process.pointer("/Parameters/model_part_name").and_then(Value::as_str)
            == Some(TOP_DISPLACEMENT_PART)
}

/// Visit `processes.<list>` at the top level and in every stage
fn for_each_process_list(data: &mut Value, list: &str, mut visit: impl FnMut(&mut Vec<Value>)) {
    if let Some(items) = data
        .pointer_mut(&format!("/processes/{}", list))
        .and_then(Value::as_array_mut)
    {
        visit(items);
    }
    if let Some(stages) = data.get_mut("stages").and_then(Value::as_object_mut) {
        for stage in stages.values_mut() {
            if let Some(items) = stage
                .pointer_mut(&format!("/stage_settings/processes/{}", list))
                .and_then(Value::as_array_mut)
            {
                visit(items);
            }
        }
    }
}

/// Insert `value` at `path`, creating missing intermediate objects
///
/// Returns false when an existing intermediate is not an object.
fn set_path(root: &mut Value, path: &[&str], value: Value) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };
    let mut node = root;
    for key in parents {
        let Some(object) = node.as_object_mut() else {
            return false;
        };
        node = object
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    match node.as_object_mut() {
        Some(object) => {
            object.insert(last.to_string(), value);
            true
        }
        None => false,
    }
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, 'e' | 'E' | '+' | '-' | '.')
}

/// Textual `"name"<ws>:<ws><number>` replacement; returns the new text and the match count
pub fn replace_numeric_property(text: &str, name: &str, replacement: &str) -> (String, usize) {
    let needle = format!("\"{}\"", name);
    let mut out = String::with_capacity(text.len());
    let mut count = 0;
    let mut rest = text;

    while let Some(pos) = rest.find(&needle) {
        let after_key = pos + needle.len();
        out.push_str(&rest[..after_key]);
        let tail = &rest[after_key..];

        let ws_before = tail.len() - tail.trim_start().len();
        if let Some(after_colon) = tail[ws_before..].strip_prefix(':') {
            let ws_after = after_colon.len() - after_colon.trim_start().len();
            let value = &after_colon[ws_after..];
            let number_len = value
                .find(|c: char| !is_number_char(c))
                .unwrap_or(value.len());
            if number_len > 0 {
                out.push_str(&tail[..ws_before + 1 + ws_after]);
                out.push_str(replacement);
                count += 1;
                rest = &value[number_len..];
                continue;
            }
        }
        rest = tail;
    }
    out.push_str(rest);
    (out, count)
}
