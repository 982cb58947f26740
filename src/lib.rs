pub mod app;
pub mod config;
mod error;
pub mod store;
pub mod web;

use tracing_subscriber::EnvFilter;

// re-exports
pub use app::{App, AppState};
pub use error::{Error, Result};
pub use web::serve;

/// Verbose, pretty logging for local development.
/// Uses `RUST_LOG` when set.
pub fn init_dbg_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("signup_store=debug,tower_http=debug,info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .pretty()
        .init();
}

/// Compact single-line logging for production.
/// Uses `RUST_LOG` when set.
pub fn init_production_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .compact()
        .init();
}
