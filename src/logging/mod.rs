use crate::cli::TracingFormat;
use crate::config::Config;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Build the filter directive for a configured base level.
///
/// Dependencies stay at `warn`; the crate's own targets follow the config.
pub fn filter_directive(base_level: &str) -> String {
    format!("warn,roster={base_level}")
}

/// Configure and initialize logging for the application.
///
/// `RUST_LOG`, when set, takes precedence over the configured level.
pub fn setup_logging(config: &Config, tracing_format: TracingFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(&config.log_level)));

    // Logs go to stderr so table output on stdout stays pipeable.
    match tracing_format {
        TracingFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        TracingFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}
