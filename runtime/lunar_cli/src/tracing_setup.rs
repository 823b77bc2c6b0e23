//! Tracing initialization for the CLI.
//!
//! `LUNAR_LOG` takes an `EnvFilter` directive such as `debug` or
//! `lunar_eval=trace` and defaults to `warn`. `LUNAR_LOG_TREE=1` swaps the
//! flat formatter for an indented span tree.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("LUNAR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
        let registry = tracing_subscriber::registry().with(filter);
        if std::env::var("LUNAR_LOG_TREE").is_ok_and(|v| v != "0") {
            registry
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}
