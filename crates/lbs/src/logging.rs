use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;

use crate::args::GlobalArgs;

/// Initialize the dual-layer tracing subscriber.
///
/// Sets up:
/// - File layer: writes to `<log-dir>/lbs.log` with daily rotation
/// - Stderr layer: compact output at the verbosity the flags select
/// - `EnvFilter`: respects `RUST_LOG` env var, defaults to the flag level
///
/// Returns a `WorkerGuard` that must be kept alive for the file logging to work.
pub fn init_tracing(args: &GlobalArgs) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(args.log_dir.as_std_path(), "lbs.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(file_filter);

    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_directive()));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    Registry::default().with(file_layer).with(stderr_layer).init();

    guard
}
