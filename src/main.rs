use clap::Parser;
use miette::Result;
use soiltest::cli::{Cli, Commands};

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => soiltest::cli::commands::run::run(args, &cli.global),
        Commands::Collect(args) => soiltest::cli::commands::collect::run(args, &cli.global),
        Commands::Inspect(args) => soiltest::cli::commands::inspect::run(args, &cli.global),
    }
}
