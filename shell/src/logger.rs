//! Colored stderr logger for the shell.

use std::io::Write;

use log::{Level, LevelFilter, Log};
use owo_colors::OwoColorize;

struct ShellLogger;

static LOGGER: ShellLogger = ShellLogger;

impl Log for ShellLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = record.level();
        let tag = format!("{level:5}");
        let tag = match level {
            Level::Error => tag.bright_red().to_string(),
            Level::Warn => tag.bright_yellow().to_string(),
            Level::Info => tag.bright_blue().to_string(),
            Level::Debug => tag.bright_cyan().to_string(),
            Level::Trace => tag.bright_magenta().to_string(),
        };
        eprintln!("{tag} {}", record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the logger. The level comes from `FS_LOG` (error, warn, info,
/// debug, trace); warnings and errors only by default so the prompt stays
/// readable.
pub fn init() {
    let level = std::env::var("FS_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn);
    log::set_max_level(level);
    let _ = log::set_logger(&LOGGER);
}
