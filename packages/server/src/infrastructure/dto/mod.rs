//! DTO（Data Transfer Object）
//!
//! - `rpc`: JSON-RPC エンベロープとメソッドのパラメータ
//! - `notification`: 通知とレスポンスのペイロード
//! - `http`: HTTP API のレスポンス / リクエスト
//! - `conversion`: Domain Model との変換

pub mod conversion;
pub mod http;
pub mod notification;
pub mod rpc;
