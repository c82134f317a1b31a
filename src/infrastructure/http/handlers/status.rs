//! AI Status Handler

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::application::{AiStatus, CheckAiStatus};
use crate::infrastructure::http::state::AppState;

/// 查询 AI 可用性
pub async fn check_ai_status(State(state): State<Arc<AppState>>) -> Json<AiStatus> {
    Json(state.check_ai_status_handler.handle(CheckAiStatus))
}
