//! Structured logging.
//!
//! # Design Decisions
//! - Uses the tracing crate for structured events
//! - `RUST_LOG` wins when set; otherwise `info`, or `debug` when requested
//! - Output goes to stderr so command output on stdout stays pipeable

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for this crate.
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "xtool_config=debug"
    } else {
        "xtool_config=info"
    }
}

/// Install the global subscriber. Returns `false` if one was already installed.
pub fn init(debug: bool) -> bool {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(debug).into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok()
}
