//! Command-line arguments.  Everything is optional: launched bare, the app
//! asks for the input folder with a native picker.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "PairPrep", about = "Dual-pane FULL/PARTIAL photo masking editor")]
pub struct CliArgs {
    /// Input folder containing FULL and PARTIAL subfolders.
    /// When omitted, a folder picker is shown at startup.
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,
}
