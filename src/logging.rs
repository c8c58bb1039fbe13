//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events; hosts call [`init_tracing`]
//! once (or install their own subscriber).

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber at `default_level`; `RUST_LOG` directives win.
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing(default_level: Level) -> bool {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
