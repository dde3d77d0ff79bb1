//! Real-time chat relay library.
//!
//! Clients speak JSON-RPC 2.0 over WebSocket: they register a username,
//! exchange public and private messages, and receive presence and typing
//! notifications. All state lives in memory.

// layers
pub mod domain;
pub mod infrastructure;
pub mod rpc;
pub mod ui;
pub mod usecase;

pub mod config;
