//! Log stream setup
//!
//! Every line is prefixed so other tooling can scrape it:
//!
//! ```text
//! [sync] Syncing character: A/Org/Mage
//! [sync][warn] Failed to copy ...
//! [sync][error] prototype A/Hero not found under ...
//! ```

use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Prefix of every log line
pub const LOG_PREFIX: &str = "[sync]";

/// Formats events as `[sync] message`, tagging warnings and errors
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncLogFormat;

impl<S, N> FormatEvent<S, N> for SyncLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        match *event.metadata().level() {
            Level::ERROR => write!(writer, "{}[error] ", LOG_PREFIX)?,
            Level::WARN => write!(writer, "{}[warn] ", LOG_PREFIX)?,
            _ => write!(writer, "{} ", LOG_PREFIX)?,
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initialize logging based on verbosity level.
///
/// `RUST_LOG` overrides the level. Warnings and errors go to stderr,
/// everything else to stdout.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(SyncLogFormat)
                .with_ansi(false)
                .with_writer(writer),
        )
        .with(filter)
        .try_init()?;

    Ok(())
}
