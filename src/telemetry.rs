use tracing::Subscriber;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Plain-text layer writing `level` and above to `<log_dir>/<prefix>.<date>`.
fn rolling_file_layer<S>(log_dir: &str, prefix: &str, level: LevelFilter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_writer(tracing_appender::rolling::daily(log_dir, prefix))
        .with_ansi(false)
        .with_filter(level)
}

/// Initialize console and file-based logging
///
/// Log files rotate daily and are split by level:
/// `logs/info.log.2024-12-22`, `logs/error.log.2024-12-22`, etc.
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(log_dir: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout).with_ansi(true))
        .with(rolling_file_layer(log_dir, "info.log", LevelFilter::INFO))
        .with(rolling_file_layer(log_dir, "warn.log", LevelFilter::WARN))
        .with(rolling_file_layer(log_dir, "error.log", LevelFilter::ERROR))
        .with(rolling_file_layer(log_dir, "debug.log", LevelFilter::DEBUG))
        .init();

    Ok(())
}
