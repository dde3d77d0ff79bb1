//! RPC Dispatcher
//!
//! 受信したペイロードを JSON-RPC の呼び出しとして解釈し、メソッド表に従って
//! UseCase を呼び出し、呼び出し元の接続にレスポンスを 1 つ返します。
//!
//! Envelope handling:
//! - not JSON, not an object, or no usable `id`: dropped
//! - `method` missing or not a string: -32700
//! - `method` empty, or `params` present but not an object: -32600
//! - unknown method: -32601
//! - params that do not deserialize or fail validation: -32602

use std::{panic::AssertUnwindSafe, sync::Arc};

use futures_util::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use yoriai_shared::time::Clock;

use crate::{
    config::ServerConfig,
    domain::{
        ChatRepository, ConnectionId, MessagePusher, PrivateMessageDraft, PublicMessageDraft,
        Username,
    },
    infrastructure::dto::{
        http::{ExportDocument, ImportSummaryDto},
        notification::{
            ChatHistoryDto, ChatMessageDto, DeliveredDto, OnlineUsersDto, PrivateMessageDto,
            RegisteredDto, ResetDto, StorageStatsDto,
        },
        rpc::{
            GetChatHistoryParams, RegisterUserParams, RequestId, RpcResponse,
            SendMessageParams, SendPrivateMessageParams, TypingParams,
        },
    },
    usecase::{
        DisconnectConnectionUseCase, GetChatHistoryUseCase, GetOnlineUsersUseCase,
        GetStorageStatsUseCase, ImportDataUseCase, RegisterUserUseCase, RegistrationMode,
        ResetAllDataUseCase, SendMessageUseCase, SendPrivateMessageUseCase,
        SweepIdleSessionsUseCase, TypingKind, TypingUseCase, UseCaseError,
    },
};

use super::RpcError;

/// メソッド名
pub mod method {
    pub const REGISTER_USER: &str = "registerUser";
    pub const SEND_MESSAGE: &str = "sendMessage";
    pub const SEND_PRIVATE_MESSAGE: &str = "sendPrivateMessage";
    pub const TYPING: &str = "typing";
    pub const STOP_TYPING: &str = "stopTyping";
    pub const GET_ONLINE_USERS: &str = "getOnlineUsers";
    pub const GET_CHAT_HISTORY: &str = "getChatHistory";
    pub const GET_STORAGE_STATS: &str = "getStorageStats";
    pub const RESET_ALL_DATA: &str = "resetAllData";
}

/// A call whose envelope passed parsing
#[derive(Debug)]
struct ParsedCall {
    id: RequestId,
    method: String,
    params: Value,
}

enum Envelope {
    Call(ParsedCall),
    Rejected(RequestId, RpcError),
    Dropped,
}

pub struct RpcDispatcher {
    message_pusher: Arc<dyn MessagePusher>,
    register_user: RegisterUserUseCase,
    disconnect_connection: DisconnectConnectionUseCase,
    send_message: SendMessageUseCase,
    send_private_message: SendPrivateMessageUseCase,
    typing: TypingUseCase,
    get_online_users: GetOnlineUsersUseCase,
    get_chat_history: GetChatHistoryUseCase,
    get_storage_stats: GetStorageStatsUseCase,
    reset_all_data: ResetAllDataUseCase,
    sweep_idle_sessions: SweepIdleSessionsUseCase,
    import_data: ImportDataUseCase,
}

impl RpcDispatcher {
    pub fn new(
        repository: Arc<dyn ChatRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            register_user: RegisterUserUseCase::new(repository.clone(), message_pusher.clone()),
            disconnect_connection: DisconnectConnectionUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            ),
            send_message: SendMessageUseCase::new(repository.clone(), message_pusher.clone()),
            send_private_message: SendPrivateMessageUseCase::new(
                repository.clone(),
                message_pusher.clone(),
            ),
            typing: TypingUseCase::new(repository.clone(), message_pusher.clone()),
            get_online_users: GetOnlineUsersUseCase::new(repository.clone()),
            get_chat_history: GetChatHistoryUseCase::new(
                repository.clone(),
                config.public_history_limit,
            ),
            get_storage_stats: GetStorageStatsUseCase::new(repository.clone()),
            reset_all_data: ResetAllDataUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            ),
            sweep_idle_sessions: SweepIdleSessionsUseCase::new(
                repository.clone(),
                config.session_idle_threshold,
            ),
            import_data: ImportDataUseCase::new(repository, message_pusher.clone(), clock),
            message_pusher,
        }
    }

    /// 受信したペイロードを処理する
    ///
    /// 相関できる `id` がある限り、呼び出し元の接続にちょうど 1 つのレスポンスを返す。
    /// 通知はレスポンスより先に Transport に渡される。
    pub async fn handle_call(&self, caller: &ConnectionId, payload: &str) {
        let (id, outcome) = match parse_envelope(payload) {
            Envelope::Dropped => {
                tracing::warn!("Dropping uncorrelatable payload from '{}'", caller);
                return;
            }
            Envelope::Rejected(id, error) => {
                tracing::warn!("Rejected envelope from '{}': {}", caller, error);
                (id, Err(error))
            }
            Envelope::Call(call) => {
                tracing::debug!("'{}' called '{}' (id {})", caller, call.method, call.id);
                let outcome = AssertUnwindSafe(self.route(caller, &call.method, call.params))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        tracing::error!("Handler for '{}' panicked", call.method);
                        Err(RpcError::internal())
                    });
                if let Err(e) = &outcome {
                    tracing::warn!("Call '{}' from '{}' failed: {}", call.method, caller, e);
                }
                (call.id, outcome)
            }
        };

        let response = match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => RpcResponse::error(id, error.into()),
        };
        self.respond(caller, &response).await;
    }

    /// 接続の切断を反映する
    pub async fn handle_disconnect(&self, connection_id: &ConnectionId) {
        if let Err(e) = self.disconnect_connection.execute(connection_id).await {
            tracing::error!("Failed to handle disconnect of '{}': {}", connection_id, e);
        }
    }

    /// アイドルセッションを掃除する
    pub async fn handle_sweep(&self) -> Vec<Username> {
        self.sweep_idle_sessions.execute().await
    }

    /// エクスポートドキュメントで状態を置き換える
    pub async fn handle_import(
        &self,
        document: ExportDocument,
    ) -> Result<ImportSummaryDto, UseCaseError> {
        self.import_data.execute(document).await
    }

    async fn route(
        &self,
        caller: &ConnectionId,
        method: &str,
        params: Value,
    ) -> Result<Value, RpcError> {
        match method {
            method::REGISTER_USER => {
                let params: RegisterUserParams = parse_params(params)?;
                self.register_user
                    .execute(
                        caller,
                        params.username,
                        RegistrationMode::from_exclusive(params.exclusive),
                    )
                    .await?;
                to_result(&RegisteredDto { registered: true })
            }
            method::SEND_MESSAGE => {
                let params: SendMessageParams = parse_params(params)?;
                self.send_message
                    .execute(PublicMessageDraft {
                        id: params.id,
                        user: params.user,
                        username: params.username,
                        text: Some(params.text),
                        timestamp: params.timestamp,
                    })
                    .await?;
                to_result(&DeliveredDto { delivered: true })
            }
            method::SEND_PRIVATE_MESSAGE => {
                let params: SendPrivateMessageParams = parse_params(params)?;
                self.send_private_message
                    .execute(
                        caller,
                        PrivateMessageDraft {
                            from: params.sender,
                            to: params.recipient,
                            text: params.text,
                            timestamp: params.timestamp,
                        },
                    )
                    .await?;
                to_result(&DeliveredDto { delivered: true })
            }
            method::TYPING | method::STOP_TYPING => {
                let kind = if method == method::TYPING {
                    TypingKind::Start
                } else {
                    TypingKind::Stop
                };
                let params: TypingParams = parse_params(params)?;
                self.typing
                    .execute(caller, kind, params.username, params.target)
                    .await?;
                Ok(json!({}))
            }
            method::GET_ONLINE_USERS => {
                let users = self.get_online_users.execute().await;
                to_result(&OnlineUsersDto::from(users.as_slice()))
            }
            method::GET_CHAT_HISTORY => {
                let params: GetChatHistoryParams = parse_params(params)?;
                let history = self.get_chat_history.execute(caller, params.limit).await;
                to_result(&ChatHistoryDto {
                    public_messages: history
                        .public_messages
                        .iter()
                        .map(ChatMessageDto::from)
                        .collect(),
                    private_chats: history
                        .private_chats
                        .iter()
                        .map(|(partner, messages)| {
                            (
                                partner.as_str().to_string(),
                                messages.iter().map(PrivateMessageDto::from).collect(),
                            )
                        })
                        .collect(),
                })
            }
            method::GET_STORAGE_STATS => {
                let stats = self.get_storage_stats.execute().await;
                to_result(&StorageStatsDto::from(stats))
            }
            method::RESET_ALL_DATA => {
                self.reset_all_data.execute().await?;
                to_result(&ResetDto { reset: true })
            }
            other => Err(RpcError::method_not_found(other)),
        }
    }

    async fn respond(&self, caller: &ConnectionId, response: &RpcResponse) {
        let json = match serde_json::to_string(response) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize response: {}", e);
                return;
            }
        };
        if let Err(e) = self.message_pusher.send_to(caller, &json).await {
            tracing::warn!("Response to '{}' dropped: {}", caller, e);
        }
    }
}

fn parse_envelope(payload: &str) -> Envelope {
    let Ok(Value::Object(mut envelope)) = serde_json::from_str::<Value>(payload) else {
        return Envelope::Dropped;
    };
    let Some(id) = envelope.get("id").and_then(RequestId::from_value) else {
        return Envelope::Dropped;
    };

    let method = match envelope.remove("method") {
        Some(Value::String(method)) => method,
        Some(_) => {
            return Envelope::Rejected(id, RpcError::parse_error("'method' must be a string"));
        }
        None => return Envelope::Rejected(id, RpcError::parse_error("'method' is missing")),
    };
    if method.trim().is_empty() {
        return Envelope::Rejected(id, RpcError::invalid_request("'method' is empty"));
    }

    let params = match envelope.remove("params") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(params @ Value::Object(_)) => params,
        Some(_) => {
            return Envelope::Rejected(id, RpcError::invalid_request("'params' must be an object"));
        }
    };

    Envelope::Call(ParsedCall { id, method, params })
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    Ok(serde_json::from_value(params)?)
}

fn to_result<T: serde::Serialize>(dto: &T) -> Result<Value, RpcError> {
    serde_json::to_value(dto).map_err(|e| {
        tracing::error!("Failed to serialize result: {}", e);
        RpcError::internal()
    })
}
