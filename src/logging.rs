//! Diagnostic logging setup.
//!
//! Diagnostics (unavailable tools, rejected strategies, per-file failures,
//! timeouts) go through `tracing` to stderr. Progress lines and the final
//! report are plain stdout output and do not depend on the log level.
//!
//! The level comes from `RESIZE_BENCH_LOG`, using `EnvFilter` syntax:
//!
//! ```text
//! RESIZE_BENCH_LOG=resize_bench=debug resize-bench run photos/
//! RESIZE_BENCH_LOG=resize_bench::registry=warn,resize_bench::runner=debug ...
//! ```

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_ENV: &str = "RESIZE_BENCH_LOG";
pub const DEFAULT_FILTER: &str = "resize_bench=info";

static INIT: Once = Once::new();

/// Install the global subscriber. Later calls do nothing.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .without_time(),
            )
            .with(filter)
            .init();
    });
}
