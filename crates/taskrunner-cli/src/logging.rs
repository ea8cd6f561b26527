use tracing_subscriber::EnvFilter;

/// Filter comes from `TASKRUNNER_LOG` (e.g. "debug",
/// "taskrunner_pod=trace"), defaulting to `info`. Logs go to stderr so
/// command output on stdout stays clean.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("TASKRUNNER_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
