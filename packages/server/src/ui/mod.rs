//! UI layer: axum router, WebSocket upgrade, HTTP endpoints.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use signal::shutdown_signal;
