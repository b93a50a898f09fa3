//! Structured logging bootstrap. Grounded on the teacher's
//! `init_tracing()` in `crates/gateway/src/main.rs`: `EnvFilter` sourced
//! from `RUST_LOG`, falling back to a crate-scoped default, JSON output.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,orc_gateway=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();
}
