use std::path::Path;

use anyhow::{self, Context};
use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use cellsym::interfaces::cli::{log_heading, Cli};
use cellsym::interfaces::input::Input;
use cellsym::interfaces::InputHandle;
use cellsym::io::read_cellsym_yaml;

const OUTPUT_PATTERN: &str = "{m}{n}";
const DIAGNOSTIC_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}";

/// Builds the logging configuration: main output goes to the `cellsym-output` target, written to
/// `output` if given or to standard output otherwise, and diagnostics go to standard error.
fn logging_config(output: Option<&Path>, verbose: u8) -> Result<Config, anyhow::Error> {
    let diagnostic_level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let diagnostics = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(DIAGNOSTIC_PATTERN)))
        .build();
    let output_appender: Box<dyn log4rs::append::Append> = match output {
        Some(path) => Box::new(
            FileAppender::builder()
                .append(false)
                .encoder(Box::new(PatternEncoder::new(OUTPUT_PATTERN)))
                .build(path)
                .with_context(|| format!("Unable to open output file `{}`", path.display()))?,
        ),
        None => Box::new(
            ConsoleAppender::builder()
                .encoder(Box::new(PatternEncoder::new(OUTPUT_PATTERN)))
                .build(),
        ),
    };
    let config = Config::builder()
        .appender(Appender::builder().build("diagnostics", Box::new(diagnostics)))
        .appender(Appender::builder().build("output", output_appender))
        .logger(
            Logger::builder()
                .appender("output")
                .additive(false)
                .build("cellsym-output", LevelFilter::Info),
        )
        .build(
            Root::builder()
                .appender("diagnostics")
                .build(diagnostic_level),
        )?;
    Ok(config)
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let config = logging_config(cli.output.as_deref(), cli.verbose)?;
    log4rs::init_config(config)?;

    log_heading();
    let input = read_cellsym_yaml::<Input, _>(&cli.config).with_context(|| {
        format!(
            "Unable to read the configuration file `{}`",
            cli.config.display()
        )
    })?;
    input.handle()
}
