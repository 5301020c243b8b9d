//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{collect::CollectArgs, inspect::InspectArgs, run::RunArgs};
use crate::core::logger::ConsoleLogger;

#[derive(Parser, Debug)]
#[command(name = "soiltest")]
#[command(version)]
#[command(about = "Soil element test toolkit - run triaxial, direct shear and CRS simulations and reduce their results")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Only print warnings and errors on stderr
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Output format for results on stdout
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub format: OutputFormat,
}

impl GlobalOpts {
    pub fn logger(&self) -> ConsoleLogger {
        ConsoleLogger { quiet: self.quiet }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table on a terminal, JSON when piped
    Auto,
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stage templates, run the solver and collect the results of one test
    Run(RunArgs),

    /// Reduce existing result files without running the solver
    Collect(CollectArgs),

    /// List the variables and time axis of a result file
    Inspect(InspectArgs),
}
