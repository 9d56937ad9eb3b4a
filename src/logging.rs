//! Driver log setup
//!
//! The subscriber is installed once per process with a reloadable filter.
//! Provider init (re)applies the configured filter, cleanup silences the
//! driver by reloading the filter to `off`.

use std::sync::OnceLock;

use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use crate::error::InitError;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

// None when the host process had its own global subscriber already
static FILTER_HANDLE: OnceLock<Option<FilterHandle>> = OnceLock::new();

fn install(filter: EnvFilter) -> Option<FilterHandle> {
    let (filter_layer, handle) = reload::Layer::new(filter);
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);
    // Route through libtest's capture instead of raw stdout
    #[cfg(test)]
    let fmt_layer = fmt_layer.with_test_writer();

    let result = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();

    match result {
        Ok(()) => Some(handle),
        Err(e) => {
            warn!("Driver log joins existing subscriber: {}", e);
            None
        }
    }
}

/// Starts (or restarts) the driver log with the given `EnvFilter` directive.
pub fn init_driver_log(directive: &str) -> Result<(), InitError> {
    let filter = EnvFilter::try_new(directive).map_err(|e| InitError::LogInit(e.to_string()))?;

    let mut pending = Some(filter);
    let handle = FILTER_HANDLE.get_or_init(|| pending.take().and_then(install));

    // Already installed by an earlier init: swap in the new filter
    if let (Some(filter), Some(handle)) = (pending, handle) {
        handle
            .reload(filter)
            .map_err(|e| InitError::LogInit(e.to_string()))?;
    }

    info!("Driver log initialized with filter '{}'", directive);
    Ok(())
}

/// Silences the driver log until the next [`init_driver_log`].
pub fn cleanup_driver_log() {
    debug!("Shutting down driver log");
    if let Some(Some(handle)) = FILTER_HANDLE.get() {
        if let Err(e) = handle.reload(EnvFilter::new("off")) {
            warn!("Failed to silence driver log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_directive_is_rejected() {
        let result = init_driver_log("glyph_driver=notalevel");
        assert!(matches!(result, Err(InitError::LogInit(_))));
    }

    #[test]
    fn init_is_repeatable() {
        assert!(init_driver_log("debug").is_ok());
        cleanup_driver_log();
        assert!(init_driver_log("info").is_ok());
    }
}
