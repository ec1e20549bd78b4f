mod app;
mod cli;
mod commands;
mod effects;
mod logging;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    let config = cli::SessionConfig::from(args);
    logging::initialize(config.log, config.log_level());
    app::run(config)
}
