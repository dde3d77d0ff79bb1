//! Domain layer: value objects, entities, the Session Registry, the
//! Conversation Store, and the traits the outer layers implement.

mod conversation;
mod entity;
mod error;
mod message_pusher;
mod registry;
mod repository;
mod value_object;

pub use conversation::{
    ConversationStore, DEFAULT_PUBLIC_CAPACITY, DEFAULT_REPLAY_LIMIT, DEFAULT_THREAD_CAPACITY,
    StoreLimits,
};
pub use entity::{
    ChatSnapshot, PrivateMessage, PrivateMessageDraft, PublicMessage, PublicMessageDraft,
    RemovedUser, Session, SessionView, StorageStats,
};
pub use error::{MessagePushError, RegistryError, StoreError, ValueObjectError};
#[cfg(test)]
pub use message_pusher::MockMessagePusher;
pub use message_pusher::{MessagePusher, PusherChannel};
pub use registry::SessionRegistry;
pub use repository::ChatRepository;
pub use value_object::{
    ConnectionId, ConnectionIdFactory, MessageId, MessageText, ThreadKey, Timestamp, Username,
};
