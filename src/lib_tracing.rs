use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_flame::{FlameLayer, FlushGuard};
use tracing_subscriber::prelude::*;

#[derive(Error, Debug)]
pub enum TracingError {
    #[error("cannot open log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot open flame graph output: {0}")]
    Flame(#[from] tracing_flame::Error),
    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Where search events end up.
#[derive(Clone, Debug)]
pub struct TracingConfig {
    pub stdout_level: LevelFilter,
    /// Plain-text file receiving every event at every level.
    pub debug_log: Option<PathBuf>,
    /// Folded stacks for `inferno`/`flamegraph`.
    pub flame_graph: Option<PathBuf>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        TracingConfig {
            stdout_level: LevelFilter::INFO,
            debug_log: None,
            flame_graph: None,
        }
    }
}

/// Keeps the global subscriber's flushing state alive.
pub struct LibTracer {
    flame_guard: Option<FlushGuard<BufWriter<File>>>,
}

impl LibTracer {
    pub fn install(config: &TracingConfig) -> Result<Self, TracingError> {
        let stdout_log = tracing_subscriber::fmt::layer().pretty().with_filter(config.stdout_level);

        // A layer that logs events to a file.
        let debug_log = match &config.debug_log {
            Some(path) => {
                let file = File::create(path)?;
                Some(tracing_subscriber::fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
            }
            None => None,
        };

        let (flame_layer, flame_guard) = match &config.flame_graph {
            Some(path) => {
                let (layer, guard) = FlameLayer::with_file(path)?;
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        let subscriber = tracing_subscriber::registry()
            .with(stdout_log)
            .with(debug_log)
            .with(flame_layer);
        tracing::subscriber::set_global_default(subscriber)?;

        Ok(LibTracer { flame_guard })
    }

    /// Writes any buffered flame graph samples.
    pub fn flush(&self) -> Result<(), TracingError> {
        if let Some(guard) = &self.flame_guard {
            guard.flush()?;
        }
        Ok(())
    }
}
