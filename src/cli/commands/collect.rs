//! `soiltest collect` command - reduce existing result files

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::commands::export_series;
use crate::cli::helpers::{expand_result_paths, parse_c_phi};
use crate::cli::output::{cohesion_phi_line, effective_format, result_rows, series_table, SummaryRenderer};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::test_type::TestType;
use crate::results::collector::ResultCollector;
use crate::run::renderer::render;

#[derive(clap::Args, Debug)]
pub struct CollectArgs {
    /// Result files in stage order, or directories holding *.post.res files
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Material parameter vector, comma separated
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub params: Vec<f64>,

    /// 1-based positions of cohesion and friction angle in --params
    #[arg(long, value_name = "C,PHI", value_parser = parse_c_phi)]
    pub c_phi: Option<(usize, usize)>,

    /// Test type the files belong to (selects the plotted series)
    #[arg(long, short = 't')]
    pub test_type: Option<TestType>,

    /// Write the plot series as CSV files into this directory
    #[arg(long, requires = "test_type")]
    pub export: Option<PathBuf>,
}

pub fn run(args: CollectArgs, global: &GlobalOpts) -> Result<()> {
    let logger = global.logger();
    let files = expand_result_paths(&args.paths);
    if files.is_empty() {
        return Err(miette::miette!(
            help = "pass result files or a directory such as gid_output/",
            "No result files found"
        ));
    }

    let collector = ResultCollector::new(files, &logger);
    for path in collector.paths() {
        eprintln!("{} Reading {}", style("→").blue(), path.display());
    }
    let result = collector
        .collect(&args.params, args.c_phi)
        .into_diagnostic()?;

    match effective_format(global.format) {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result).into_diagnostic()?;
            println!("{}", json);
        }
        _ => match args.test_type {
            Some(test_type) => {
                let mut renderer = SummaryRenderer::new();
                render(test_type, &result, &mut renderer);
                if let Some(table) = renderer.output() {
                    println!("{}", table);
                }
            }
            None => {
                println!("{}", series_table(&result_rows(&result)));
                if let Some(line) = cohesion_phi_line(result.cohesion, result.phi) {
                    println!("{}", line);
                }
            }
        },
    }

    if let (Some(dir), Some(test_type)) = (&args.export, args.test_type) {
        export_series(dir, test_type, &result)?;
    }
    Ok(())
}
