//! JSON-RPC 2.0 envelopes carried over the WebSocket channel.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use yoriai_shared::time::rfc3339_to_timestamp;

pub const JSONRPC_VERSION: &str = "2.0";

/// Correlation id of a call. Only numbers and strings are usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(serde_json::Number),
    String(String),
}

impl RequestId {
    /// Extract a usable id from a raw envelope field
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// `error` member of an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcOutcome {
    Result(Value),
    Error(RpcErrorObject),
}

/// Response to a call: `{jsonrpc, id, result}` or `{jsonrpc, id, error}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(flatten)]
    pub outcome: RpcOutcome,
}

impl RpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: RpcOutcome::Result(result),
        }
    }

    pub fn error(id: RequestId, error: RpcErrorObject) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: RpcOutcome::Error(error),
        }
    }
}

/// Server-to-client message with no response expected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
}

impl RpcNotification {
    pub fn new(method: &str, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params,
        }
    }
}

/// `registerUser` parameters
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserParams {
    pub username: String,
    /// Reject the name when another open connection holds it
    #[serde(default)]
    pub exclusive: bool,
}

/// `sendMessage` parameters; `username` is an alias of `user`
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageParams {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    pub text: String,
    #[serde(default, deserialize_with = "lenient_message_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<i64>,
}

/// `sendPrivateMessage` parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SendPrivateMessageParams {
    pub sender: String,
    pub recipient: String,
    pub text: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<i64>,
}

/// `typing` / `stopTyping` parameters
#[derive(Debug, Clone, Deserialize)]
pub struct TypingParams {
    pub username: String,
    #[serde(default)]
    pub target: Option<String>,
}

/// `getChatHistory` parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetChatHistoryParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Client-supplied message id. Numbers are stringified; any other shape is
/// ignored so the store assigns a fresh id.
fn lenient_message_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Client-supplied timestamp: epoch milliseconds (fractions truncated) or an
/// RFC 3339 string. Unusable values fall back to the server clock.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|millis| millis.is_finite())
                .map(|millis| millis.trunc() as i64)
        }),
        Some(Value::String(text)) => rfc3339_to_timestamp(&text),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_response_shape() {
        // テスト項目: 成功レスポンスは jsonrpc, id, result を持つ
        // given (前提条件):
        let response = RpcResponse::success(
            RequestId::Number(1_i64.into()),
            json!({"registered": true}),
        );

        // when (操作):
        let value = serde_json::to_value(&response).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": 1, "result": {"registered": true}})
        );
    }

    #[test]
    fn test_error_response_shape() {
        // テスト項目: エラーレスポンスは error.code と error.message を持ち、result を持たない
        // given (前提条件):
        let response = RpcResponse::error(
            RequestId::String("abc".to_string()),
            RpcErrorObject {
                code: -32601,
                message: "Method not found".to_string(),
            },
        );

        // when (操作):
        let value = serde_json::to_value(&response).unwrap();

        // then (期待する結果):
        assert_eq!(value["id"], "abc");
        assert_eq!(value["error"]["code"], -32601);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_request_id_from_value() {
        // テスト項目: 数値と文字列のみが利用可能な id として扱われる
        // given (前提条件):
        let candidates = [json!(7), json!("x"), json!(null), json!({}), json!([1])];

        // when (操作):
        let ids: Vec<_> = candidates.iter().map(RequestId::from_value).collect();

        // then (期待する結果):
        assert!(ids[0].is_some());
        assert!(ids[1].is_some());
        assert!(ids[2..].iter().all(Option::is_none));
    }

    #[test]
    fn test_send_message_params_rejects_wrong_type() {
        // テスト項目: text が文字列でない場合はデシリアライズに失敗する
        // given (前提条件):
        let params = json!({"user": "alice", "text": 42});

        // when (操作):
        let result = serde_json::from_value::<SendMessageParams>(params);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_send_message_params_tolerates_optional_field_shapes() {
        // テスト項目: id と timestamp は数値・小数・RFC 3339 文字列を受け付け、使えない値は無視する
        // given (前提条件):
        let numeric = json!({
            "user": "tester",
            "text": "hi",
            "id": 1712345678901.123,
            "timestamp": 1712318400000.9,
        });
        let iso = json!({
            "username": "tester",
            "text": "hi",
            "id": 42,
            "timestamp": "2024-04-05T12:00:00.000Z",
        });
        let unusable = json!({
            "user": "tester",
            "text": "hi",
            "id": {"nested": true},
            "timestamp": "not a date",
        });

        // when (操作):
        let numeric: SendMessageParams = serde_json::from_value(numeric).unwrap();
        let iso: SendMessageParams = serde_json::from_value(iso).unwrap();
        let unusable: SendMessageParams = serde_json::from_value(unusable).unwrap();

        // then (期待する結果):
        assert_eq!(numeric.id.as_deref(), Some("1712345678901.123"));
        assert_eq!(numeric.timestamp, Some(1_712_318_400_000));
        assert_eq!(iso.id.as_deref(), Some("42"));
        assert_eq!(iso.timestamp, Some(1_712_318_400_000));
        assert_eq!(unusable.id, None);
        assert_eq!(unusable.timestamp, None);
    }

    #[test]
    fn test_send_private_message_params_accepts_iso_timestamp() {
        // テスト項目: 個人メッセージの timestamp も RFC 3339 文字列を受け付ける
        // given (前提条件):
        let params = json!({
            "sender": "alice",
            "recipient": "bob",
            "text": "hey",
            "timestamp": "2024-04-05T21:00:00+09:00",
        });

        // when (操作):
        let params: SendPrivateMessageParams = serde_json::from_value(params).unwrap();

        // then (期待する結果):
        assert_eq!(params.timestamp, Some(1_712_318_400_000));
    }
}
