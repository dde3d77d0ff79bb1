//! Request handlers.

mod http;
mod websocket;

pub use http::{export_data, get_stats, health_check, import_data, index};
pub use websocket::websocket_handler;
