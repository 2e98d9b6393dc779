//! convarchive CLI: archive exported AI conversations as markdown.
//!
//! Converts transcript JSON exports into numbered question/answer files and
//! merges those files back into a single document.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
