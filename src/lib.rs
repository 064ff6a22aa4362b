pub mod config;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod scoring;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for embedding binaries. Library consumers that
/// install their own subscriber should skip this.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
