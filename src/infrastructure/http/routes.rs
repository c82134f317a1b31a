//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                     GET    健康检查
//! - /api/check-ai-status          GET    AI 可用性
//! - /api/generate-chapter         POST   生成章节（JSON 模板或 SSE 流）
//! - /api/generate-title           POST   生成书名
//! - /api/stories                  GET    列出故事
//! - /api/stories                  POST   创建故事
//! - /api/stories/:id              GET    获取故事
//! - /api/stories/:id              PUT    更新故事
//! - /api/stories/:id              DELETE 删除故事
//! - /api/stories/:id/chapters     POST   保存章节

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/check-ai-status", get(handlers::check_ai_status))
        .route("/generate-chapter", post(handlers::generate_chapter))
        .route("/generate-title", post(handlers::generate_title))
        .nest("/stories", story_routes())
}

/// Story 路由
fn story_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::list_stories).post(handlers::create_story))
        .route(
            "/:story_id",
            get(handlers::get_story)
                .put(handlers::update_story)
                .delete(handlers::delete_story),
        )
        .route("/:story_id/chapters", post(handlers::create_chapter))
}
