//! AI Status Queries

use serde::{Deserialize, Serialize};

/// 查询 AI 可用性
#[derive(Debug, Clone, Default)]
pub struct CheckAiStatus;

/// AI 可用性
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiStatus {
    pub ai_available: bool,
    pub message: String,
    pub provider: String,
    pub model: String,
}
