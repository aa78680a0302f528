//! Diagnostics: warning/error formatting and the failure reporting hook.

use crate::error::CompileError;
use std::fmt::Display;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Format a user-facing error line.
pub fn error_message(msg: impl Display) -> String {
    format!("error: {}", msg)
}

/// Emit a non-fatal warning.
pub fn warn(msg: impl Display) {
    tracing::warn!("{}", msg);
}

/// Receives the single message emitted when a compilation fails.
pub trait Reporter {
    fn report(&mut self, error: &CompileError);
}

impl<F> Reporter for F
where
    F: FnMut(&CompileError),
{
    fn report(&mut self, error: &CompileError) {
        self(error)
    }
}

/// Reporter that forwards failures to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, error: &CompileError) {
        tracing::error!(kind = ?error.kind(), "{}", error_message(error));
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "info,most_config=debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
