//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

/// Version tag written into export documents
pub const EXPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub status: String,
    pub timestamp: String,
    pub uptime_secs: u64,
}

/// Bulk export document. Messages are codec-encoded strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: String,
    #[serde(default)]
    pub public_messages: Vec<String>,
    #[serde(default)]
    pub private_threads: Vec<ExportedThread>,
    #[serde(default)]
    pub sessions: Vec<ExportedSession>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedThread {
    pub participants: [String; 2],
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedSession {
    pub username: String,
    pub last_seen_at: i64,
    pub is_online: bool,
}

/// Counts of what an import applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummaryDto {
    pub public_messages: usize,
    pub threads: usize,
    pub private_messages: usize,
    pub sessions: usize,
    pub skipped: usize,
}
