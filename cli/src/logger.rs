use colored::*;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{self, Write};

/// Prints `sbx` and `sbx_util` records; warnings and errors go to stderr.
pub struct PackLogger {
    level: LevelFilter,
    use_colors: bool,
}

impl PackLogger {
    pub fn new(level: LevelFilter, use_colors: bool) -> Self {
        Self { level, use_colors }
    }

    fn label(&self, level: Level) -> ColoredString {
        let text = level.as_str();
        if !self.use_colors {
            return text.normal();
        }
        match level {
            Level::Error => text.red().bold(),
            Level::Warn => text.yellow().bold(),
            Level::Info => text.blue().bold(),
            Level::Debug => text.cyan().bold(),
            Level::Trace => text.green().bold(),
        }
    }

    fn format(&self, record: &Record) -> String {
        let target = record.target();
        if self.use_colors {
            format!("[{}] {}: {}", self.label(record.level()), target.dimmed(), record.args())
        } else {
            format!("[{}] {}: {}", self.label(record.level()), target, record.args())
        }
    }
}

impl Log for PackLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with("sbx")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let output = self.format(record);
        match record.level() {
            Level::Error | Level::Warn => {
                let _ = writeln!(io::stderr(), "{}", output);
            }
            _ => {
                let _ = writeln!(io::stdout(), "{}", output);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }
}

static LOGGER: std::sync::OnceLock<PackLogger> = std::sync::OnceLock::new();

pub fn init_logger(level: LevelFilter, use_colors: bool) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(|| PackLogger::new(level, use_colors));
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

pub fn level_from_str(level: &str) -> Option<LevelFilter> {
    level.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_str() {
        assert_eq!(level_from_str("off"), Some(LevelFilter::Off));
        assert_eq!(level_from_str("WARN"), Some(LevelFilter::Warn));
        assert_eq!(level_from_str("trace"), Some(LevelFilter::Trace));
        assert_eq!(level_from_str("loud"), None);
    }

    fn meta(level: Level, target: &str) -> Metadata<'_> {
        Metadata::builder().level(level).target(target).build()
    }

    #[test]
    fn test_enabled_filters_by_target_and_level() {
        let logger = PackLogger::new(LevelFilter::Info, false);
        assert!(logger.enabled(&meta(Level::Info, "sbx::build")));
        assert!(logger.enabled(&meta(Level::Warn, "sbx_util::assets")));
        assert!(!logger.enabled(&meta(Level::Debug, "sbx::build")));
        assert!(!logger.enabled(&meta(Level::Error, "walkdir")));
    }

    #[test]
    fn test_plain_format() {
        let logger = PackLogger::new(LevelFilter::Info, false);
        let line = logger.format(
            &Record::builder()
                .level(Level::Warn)
                .target("sbx::build")
                .args(format_args!("careful"))
                .build(),
        );
        assert_eq!(line, "[WARN] sbx::build: careful");
    }
}
