use std::path::PathBuf;

use clap::Parser;

use crate::io::format::cellsym_output;

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Logs a nicely formatted `cellsym` heading to the `cellsym-output` logger.
pub fn log_heading() {
    let version = if let Some(ver) = VERSION {
        format!("v{ver}")
    } else {
        "v unknown".to_string()
    };
    cellsym_output!("╭─────────────────────────────────────────────────────────────────────────────────────╮");
    cellsym_output!("│                                                                                     │");
    cellsym_output!("│     ▄▄▄▄  ▄▄▄▄▄ ▄     ▄      ▄▄▄▄ ▄   ▄ ▄   ▄                                       │");
    cellsym_output!("│    █      █▄▄▄  █     █     ▀▄▄▄   ▀▄▀  █▀▄▀█                                       │");
    cellsym_output!("│    █      █     █     █         █   █   █   █                                       │");
    cellsym_output!("│     ▀▀▀▀  ▀▀▀▀▀ ▀▀▀▀▀ ▀▀▀▀▀ ▀▀▀▀    ▀   ▀   ▀                                       │");
    cellsym_output!("│                                                                                     │");
    cellsym_output!("│    Symmetry-consistent crystal cells from partial crystallographic data             │");
    cellsym_output!("│                                                                       {version:>13} │");
    cellsym_output!("╰─────────────────────────────────────────────────────────────────────────────────────╯");
    cellsym_output!("");
}

/// Command-line arguments of the `cellsym` binary.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// The YAML configuration file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// The output file. If not given, the output is written to standard output.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Increases the verbosity of the diagnostic log.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
