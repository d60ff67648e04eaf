use crate::config::{DEFAULT_LOG_FILTER, ShellConfig};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Logs go to stderr, or to `config.log_file` when set. Stderr is shared with the prompt,
/// so the default filter only lets warnings through.
pub fn init_tracing(config: &ShellConfig) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|e| {
        eprintln!("warning: invalid log filter {:?}: {}", config.log_filter, e);
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    if let Some(path) = &config.log_file {
        match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file))
                    .init();
                return;
            }
            Err(e) => eprintln!("warning: failed to open log file {}: {}", path.display(), e),
        }
    }

    builder
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}
