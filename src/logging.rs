use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install the tracing subscriber: fmt layer to stderr, level taken from
/// `RUST_LOG` (default `info`). Safe to call more than once; later calls are
/// no-ops, which keeps test binaries happy.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    });
}
