mod cli;
mod config;
mod core;
mod error;
mod models;
mod player;
mod sources;

#[cfg(feature = "gui")]
mod gui;

#[cfg(test)]
mod testing;

use clap::Parser;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

fn main() {
    let cli = cli::Cli::parse();

    let level = cli.verbosity.unwrap_or(tracing::Level::WARN);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(level).into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    if let Err(e) = cli::run(cli) {
        eprintln!("오류: {:#}", e);
        std::process::exit(1);
    }
}
