use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use imgtext::config::LoggingConfig;

/// Installs the global subscriber and routes `log` records into it.
/// `RUST_LOG` overrides the configured level.
///
/// Output goes to stderr so command results on stdout stay machine-readable.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    tracing_log::LogTracer::init()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_writer(std::io::stderr)),
        )?;
    } else {
        tracing::subscriber::set_global_default(
            registry.with(fmt::layer().with_target(false).with_writer(std::io::stderr)),
        )?;
    }

    Ok(())
}
