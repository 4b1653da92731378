//! Formatted `cellsym` output.

use std::fmt;

use log;

const CELLSYM_BANNER_LENGTH: usize = 89;

/// Logs a warning to the `cellsym-output` logger as well as to the default logger.
macro_rules! cellsym_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::warn!($fmt, $($($arg)*)?);
        log::warn!(target: "cellsym-output", $fmt, $($($arg)*)?);
    }
}

/// Logs a main output line to the `cellsym-output` logger.
macro_rules! cellsym_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "cellsym-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {cellsym_output, cellsym_warn};

/// Logs a nicely formatted section title to the `cellsym-output` logger.
pub(crate) fn log_title(title: &str) {
    let length = title.chars().count().max(CELLSYM_BANNER_LENGTH - 6);
    let bar = "─".repeat(length);
    cellsym_output!("┌──{bar}──┐");
    cellsym_output!("│§ {title:^length$} §│");
    cellsym_output!("└──{bar}──┘");
}

/// Writes a nicely formatted subtitle.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    writeln!(f, "{subtitle}")?;
    writeln!(f, "{bar}")?;
    Ok(())
}

/// Logs a nicely formatted subtitle to the `cellsym-output` logger.
pub(crate) fn log_subtitle(subtitle: &str) {
    let length = subtitle.chars().count();
    let bar = "═".repeat(length);
    cellsym_output!("{}", subtitle);
    cellsym_output!("{}", bar);
}

/// Turns a boolean into a string of `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    if b {
        "yes".to_string()
    } else {
        "no".to_string()
    }
}

/// A trait for logging `cellsym` outputs nicely.
pub(crate) trait CellsymOutput: fmt::Debug + fmt::Display {
    /// Logs display output nicely.
    fn log_output_display(&self) {
        let lines = self.to_string();
        lines.lines().for_each(|line| {
            cellsym_output!("{line}");
        })
    }
}

// Blanket implementation
impl<T> CellsymOutput for T where T: fmt::Debug + fmt::Display {}
