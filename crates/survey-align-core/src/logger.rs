//! Stderr logging for the CLI and tests.
//!
//! [`init_with_level`] installs a `log` backend that writes one line per
//! record: `[  0.012s  WARN mapping] message`. The target is cut to its last
//! module segment so stage names stay readable. With the `tracing` feature,
//! [`init_tracing`] installs a `tracing-subscriber` formatter instead, which
//! also forwards `log` records.

use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

struct StageLogger {
    level: LevelFilter,
    started: Instant,
}

/// Last `::` segment of a log target.
fn stage_name(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

fn write_record<W: Write>(out: &mut W, elapsed: Duration, record: &Record) -> io::Result<()> {
    writeln!(
        out,
        "[{:7.3}s {:>5} {}] {}",
        elapsed.as_secs_f64(),
        record.level(),
        stage_name(record.target()),
        record.args()
    )
}

impl Log for StageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = write_record(&mut io::stderr().lock(), self.started.elapsed(), record);
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static LOGGER: OnceLock<StageLogger> = OnceLock::new();

/// Install the stderr logger with the provided level filter.
///
/// Only the first call installs a logger; later calls keep the first level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StageLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Install a `tracing` subscriber on stderr, filtered by `RUST_LOG`
/// (default `info`). `json` switches to flattened JSON lines.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(io::stderr);
    let installed = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
    if let Err(err) = installed {
        log::debug!("tracing subscriber not installed: {err}");
    }
}
