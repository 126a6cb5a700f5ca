//! Shared test utilities for snmp-session integration tests.

// Allow dead code and unused imports since not all test files use all utilities
#![allow(dead_code)]
#![allow(unused_imports)]

mod fixtures;
mod stream;

pub use fixtures::*;
pub use stream::collect_stream;

/// Route `tracing` output through the test harness. `RUST_LOG` overrides the
/// default `snmp_session=debug`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("snmp_session=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
