use std::io;

use anyhow::Result;
use clap::Parser;
use birdtrails::{commands, config::{Config, Settings}, log, prompt::Prompter};

fn main() -> Result<()> {
    let config = Config::parse();
    log::setup_trace(&config);

    let settings = Settings::load(&config.config)?;
    tracing::debug!("settings: {settings:?}");

    println!("\nWelcome to BirdTrails!");
    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
    commands::run(&config.command, &settings, &mut prompter)
}
