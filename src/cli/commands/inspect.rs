//! `soiltest inspect` command - list the content of a result file

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::output::{effective_format, format_number};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::results::reader::{GidResultReader, Location};

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    /// GiD ASCII result file (.post.res)
    pub file: PathBuf,
}

fn location_name(location: Location) -> &'static str {
    match location {
        Location::OnNodes => "nodes",
        Location::OnGaussPoints => "gauss points",
    }
}

pub fn run(args: InspectArgs, global: &GlobalOpts) -> Result<()> {
    if !args.file.is_file() {
        return Err(miette::miette!(
            "Result file not found: {}",
            args.file.display()
        ));
    }
    let logger = global.logger();
    let file = GidResultReader::new(&logger)
        .read(&args.file)
        .into_diagnostic()?;
    let times = file.time_steps();

    match effective_format(global.format) {
        OutputFormat::Json => {
            let results: Vec<serde_json::Value> = file
                .iter()
                .map(|(name, records)| {
                    serde_json::json!({
                        "name": name,
                        "records": records.len(),
                        "location": records.first().map(|r| location_name(r.location)),
                    })
                })
                .collect();
            let json = serde_json::json!({
                "file": args.file.display().to_string(),
                "results": results,
                "time_steps": times,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        _ => {
            let mut builder = Builder::default();
            builder.push_record(["Result", "Records", "Location", "Points"]);
            for (name, records) in file.iter() {
                let first = records.first();
                builder.push_record([
                    name.to_string(),
                    records.len().to_string(),
                    first.map_or("-", |r| location_name(r.location)).to_string(),
                    first.map_or(0, |r| r.values.len()).to_string(),
                ]);
            }
            let mut table = builder.build();
            table.with(Style::rounded());
            println!("{}", table);

            let axis: Vec<String> = times.iter().copied().map(format_number).collect();
            println!("{} time steps: {}", times.len(), axis.join(", "));
            println!("{} records in total", file.record_count());
        }
    }
    Ok(())
}
