//! Protocol layer: envelope parsing and routing, the single mutation stream,
//! and the idle-session sweeper.

mod dispatcher;
mod error;
mod event_loop;
mod sweeper;

pub use dispatcher::{RpcDispatcher, method};
pub use error::{RpcError, RpcErrorCode};
pub use event_loop::{EventSender, ImportReply, InboundEvent, spawn_event_loop};
pub use sweeper::IdleSessionSweeper;
