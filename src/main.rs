use anyhow::Result;
use clap::Parser;
use modledger::cli::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet);
    cli::run(cli)
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
