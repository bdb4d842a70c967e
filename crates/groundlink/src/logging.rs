use clap::ValueEnum;
use groundlink_transport::STATUS_TARGET;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    fn is_verbose(self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Trace)
    }
}

/// Per-target levels for the stderr log.
///
/// Status lines are mirrored as events on [`STATUS_TARGET`]. When a command
/// already prints the status stream on stdout, those events stay off stderr
/// unless the level is `debug` or finer.
fn targets(level: LogLevel, status_on_stdout: bool) -> Targets {
    let status = if status_on_stdout && !level.is_verbose() {
        LevelFilter::OFF
    } else {
        level.as_filter()
    };
    Targets::new()
        .with_default(level.as_filter())
        .with_target(STATUS_TARGET, status)
}

/// Install the stderr subscriber.
pub fn init_logging(format: LogFormat, level: LogLevel, status_on_stdout: bool) {
    let filter = targets(level, status_on_stdout);

    match format {
        LogFormat::Text => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(false);
            let _ = tracing_subscriber::registry()
                .with(layer)
                .with(filter)
                .try_init();
        }
        LogFormat::Json => {
            let layer = fmt::layer().json().with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(layer)
                .with(filter)
                .try_init();
        }
    }
}
