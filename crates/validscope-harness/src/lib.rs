#![forbid(unsafe_code)]

//! Test support for validscope.
//!
//! - [`recording_scope`] / [`RecordingSink`]: capture what a scope receives,
//!   batch brackets included.
//! - [`recording_handler`]: capture what an `on_valid_change` handler sees.
//! - [`probe_reducer`]: capture every map a reducer is asked to reduce.
//! - [`assert_changes!`]: compare a [`ChangeLog`] against expected triples.
//! - [`strategies`]: proptest generators.
//! - [`map_snapshot_json`]: deterministic map rendering.
//!
//! Set `VALIDSCOPE_LOG=debug` (any `EnvFilter` directive) and call
//! [`init_test_logging`] to see collector recomputes in test output.

pub mod recording;
pub mod snapshot;
pub mod strategies;

pub use recording::{
    ChangeLog, Event, RecordingSink, ReducerLog, probe_reducer, recording_handler,
    recording_scope,
};
pub use snapshot::map_snapshot_json;
pub use validscope_core::Validity;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the test log filter.
pub const LOG_ENV: &str = "VALIDSCOPE_LOG";

/// Install a test-writer subscriber once; later calls are no-ops.
pub fn init_test_logging() {
    let directives = std::env::var(LOG_ENV).unwrap_or_else(|_| "warn".to_owned());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("warn"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(env = LOG_ENV, %directives, "test logging installed");
    }
}
