//! UseCase layer: one use case per protocol operation.
//!
//! Use cases mutate state through [`ChatRepository`](crate::domain::ChatRepository)
//! and fan out notifications through
//! [`MessagePusher`](crate::domain::MessagePusher). They never touch sockets.

mod disconnect_connection;
mod error;
mod presence;
mod query;
mod register_user;
mod reset_all_data;
mod send_message;
mod send_private_message;
mod sweep_idle_sessions;
mod transfer;
mod typing;

#[cfg(test)]
pub(crate) mod test_support;

pub use disconnect_connection::DisconnectConnectionUseCase;
pub use error::UseCaseError;
pub use query::{ChatHistory, GetChatHistoryUseCase, GetOnlineUsersUseCase, GetStorageStatsUseCase};
pub use register_user::{RegisterUserUseCase, RegistrationMode};
pub use reset_all_data::ResetAllDataUseCase;
pub use send_message::SendMessageUseCase;
pub use send_private_message::SendPrivateMessageUseCase;
pub use sweep_idle_sessions::SweepIdleSessionsUseCase;
pub use transfer::{ExportDataUseCase, ImportDataUseCase};
pub use typing::{TypingKind, TypingUseCase};
