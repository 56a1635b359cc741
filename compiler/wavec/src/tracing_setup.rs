//! Tracing initialization for the Wave compiler.
//!
//! Controlled by environment variables:
//! - `WAVE_LOG`: Filter string (`RUST_LOG` syntax). Falls back to `RUST_LOG`.
//!
//! When neither `WAVE_LOG` nor `RUST_LOG` is set, defaults to `warn`
//! level. Output goes to stderr so it never mixes with a compiled
//! program's stdout.

use std::sync::OnceLock;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};

static INIT: OnceLock<()> = OnceLock::new();

/// Initialize the tracing subscriber.
///
/// Safe to call multiple times — only the first call takes effect.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_env("WAVE_LOG")
            .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        Registry::default()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .with(filter)
            .init();
    });
}
