//! Logger initialization for the `log` facade.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
///
/// `verbose` forces `debug`. Otherwise `RUST_LOG` is honored, falling back to
/// `warn`.
pub fn init_logging(verbose: bool) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if verbose {
            builder.filter_level(log::LevelFilter::Debug);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Warn);
        }

        builder.format_timestamp(None);
        // A host application may already have installed a logger.
        let _ = builder.try_init();

        log::debug!("logging initialized");
    });
}
