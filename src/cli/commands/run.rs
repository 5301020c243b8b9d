//! `soiltest run` command - stage, solve and collect one soil test

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::commands::export_series;
use crate::cli::output::{effective_format, SummaryRenderer};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::RunConfig;
use crate::results::store::ResultStore;
use crate::run::orchestrator::{Orchestrator, RunOutcome};
use crate::template::patch::PatchMode;
use crate::template::workspace::find_template_dir;

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Run configuration (YAML)
    pub config: PathBuf,

    /// Template root or template set directory (overrides the configuration)
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Keep the work directory after a successful run
    #[arg(long)]
    pub keep_tmp: bool,

    /// How to treat template edits whose target is missing
    #[arg(long, value_enum)]
    pub patch_mode: Option<PatchMode>,

    /// Write the plot series as CSV files into this directory
    #[arg(long)]
    pub export: Option<PathBuf>,
}

pub fn run(args: RunArgs, global: &GlobalOpts) -> Result<()> {
    let config = RunConfig::load(&args.config)?;
    let logger = global.logger();
    let test_type = config.test_type;

    let explicit = args.templates.clone().or_else(|| config.templates_dir());
    let template_dir = find_template_dir(test_type, explicit.as_deref())?;

    let mut request = config.to_request(template_dir);
    request.keep_tmp |= args.keep_tmp;
    if let Some(mode) = args.patch_mode {
        request.patch_mode = mode;
    }

    let mut renderer = SummaryRenderer::new();
    let mut store = ResultStore::new();
    let outcome = Orchestrator::new(&config.solver, &logger)
        .run_into(&request, &mut renderer, &mut store)
        .map_err(|e| miette::miette!("{}", e))?;

    match outcome {
        RunOutcome::Completed { result, work_dir } => {
            match effective_format(global.format) {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&result).into_diagnostic()?;
                    println!("{}", json);
                }
                _ => {
                    if let Some(table) = renderer.output() {
                        println!("{}", table);
                    }
                }
            }
            if let Some(dir) = work_dir {
                eprintln!("{} Work directory: {}", style("→").blue(), style(dir.display()).cyan());
            }
            if let Some(dir) = args.export.or_else(|| config.export_path()) {
                export_series(&dir, test_type, &result)?;
            }
            Ok(())
        }
        RunOutcome::Failed {
            reached,
            message,
            detail,
            work_dir,
        } => {
            if let Some(dir) = work_dir {
                eprintln!("{} Work directory: {}", style("→").blue(), style(dir.display()).cyan());
            }
            match detail {
                Some(detail) if detail != message => Err(miette::miette!(
                    help = detail,
                    "{} run failed during {}: {}",
                    test_type.label(),
                    reached,
                    message
                )),
                _ => Err(miette::miette!(
                    "{} run failed during {}: {}",
                    test_type.label(),
                    reached,
                    message
                )),
            }
        }
        RunOutcome::Cancelled { reached, .. } => Err(miette::miette!(
            "{} run cancelled during {}",
            test_type.label(),
            reached
        )),
    }
}
