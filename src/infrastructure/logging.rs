//! Logging system configuration and initialization
//!
//! tracing-based setup with console output and optional file output. The
//! dependency targets that get noisy on DEBUG (sqlx, reqwest, hyper) are
//! capped below the application level unless TRACE is requested or RUST_LOG
//! overrides the filter.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use lazy_static::lazy_static;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking file writer alive for the process lifetime.
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Log directory next to the rest of the application data.
pub fn get_log_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("boardgame-keep")
        .join("logs")
}

pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(&config.level);
        if !config.level.to_lowercase().contains("trace") {
            filter = filter
                .add_directive("sqlx=warn".parse().unwrap())
                .add_directive("reqwest=info".parse().unwrap())
                .add_directive("hyper=warn".parse().unwrap())
                .add_directive("h2=warn".parse().unwrap())
                .add_directive(format!("boardgame_keep={}", config.level).parse().unwrap());
        }
        filter
    });

    let registry = Registry::default().with(env_filter);

    match (config.file_output, config.console_output) {
        (true, console) => {
            let log_dir = get_log_directory();
            std::fs::create_dir_all(&log_dir)
                .map_err(|e| anyhow!("Failed to create log directory {log_dir:?}: {e}"))?;

            let file_appender = rolling::daily(&log_dir, "boardgame-keep.log");
            let (file_writer, file_guard) = non_blocking(file_appender);
            LOG_GUARDS.lock().unwrap().push(file_guard);

            let file_layer = fmt::Layer::new()
                .with_writer(file_writer)
                .with_target(false)
                .with_ansi(false);

            if console {
                let console_layer = fmt::Layer::new()
                    .with_writer(std::io::stdout)
                    .with_target(false);
                registry.with(file_layer).with(console_layer).init();
            } else {
                registry.with(file_layer).init();
            }
        }
        (false, true) => {
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_target(false);
            registry.with(console_layer).init();
        }
        (false, false) => {
            return Err(anyhow!("No logging output configured"));
        }
    }

    info!("Logging initialized (level: {})", config.level);
    Ok(())
}
