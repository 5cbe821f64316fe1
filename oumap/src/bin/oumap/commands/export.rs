use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use oumap::OumapConfig;
use oumap::export::write_csv;

use super::{FilterArgs, prepare_session};
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "CSV Export",
    commands: &[
        "oumap export -l locations.json -o all.csv                 # Every location",
        "oumap export -l locations.json -c cafe -o cafes.csv       # Filtered subset",
        "oumap -q export -l locations.json -f 5:open_now --now     # Open now, CSV to stdout",
    ],
}];

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Destination file; CSV is written to stdout when omitted
    #[arg(short = 'o', long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

pub fn handle_export(args: ExportArgs, config: &OumapConfig, output: &OutputManager) -> Result<()> {
    let session = prepare_session(&args.filter, config, output)?;
    let visible = session.markers().visible_locations(session.outcome());

    match &args.out {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            let written = write_csv(file, visible).context("Failed to write CSV")?;
            output.success(&format!("Exported {written} locations to {}", path.display()));
        }
        None => {
            write_csv(io::stdout().lock(), visible).context("Failed to write CSV")?;
        }
    }

    Ok(())
}
