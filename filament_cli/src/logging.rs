//! Tracing setup: console layer on stderr plus an optional JSON file sink.

use crate::cli::FILE_GUARD;
use eyre::{Result, WrapErr};
use std::path::Path;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `level` for the console layer. The file layer always
/// writes JSON lines at `logging.level` (default "info").
pub fn init_tracing(cfg: &filament_config::Logging, level: &str, json: bool) -> Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level `{level}`"))?;

    let console: BoxedLayer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };

    let mut layers = vec![console];
    if let Some(file) = cfg.file.as_deref() {
        layers.push(file_layer(file, cfg)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}

fn file_layer(file: &str, cfg: &filament_config::Logging) -> Result<BoxedLayer> {
    let path = Path::new(file);
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| eyre::eyre!("logging.file `{file}` has no file name"))?;

    let appender = match cfg.rotation.as_deref().unwrap_or("never") {
        "never" => tracing_appender::rolling::never(dir, name),
        "daily" => tracing_appender::rolling::daily(dir, name),
        "hourly" => tracing_appender::rolling::hourly(dir, name),
        other => eyre::bail!("logging.rotation must be never, daily or hourly (got `{other}`)"),
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // Keep the worker alive for the whole process so buffered lines are flushed.
    let _ = FILE_GUARD.set(guard);

    let filter = EnvFilter::try_new(cfg.level.as_deref().unwrap_or("info"))
        .wrap_err("invalid logging.level")?;
    Ok(tracing_subscriber::fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter)
        .boxed())
}
