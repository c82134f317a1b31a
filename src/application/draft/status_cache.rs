//! AI Status Cache
//!
//! 短时缓存服务端的 AI 可用性，避免每次打开编辑器都发请求。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::application::ports::{GenerationTransportPort, TransportError};
use crate::application::queries::AiStatus;

/// AI 状态缓存
pub struct AiStatusCache {
    transport: Arc<dyn GenerationTransportPort>,
    ttl: Duration,
    cached: Mutex<Option<(Instant, AiStatus)>>,
}

impl AiStatusCache {
    pub fn new(transport: Arc<dyn GenerationTransportPort>, ttl: Duration) -> Self {
        Self {
            transport,
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// 读取状态；过期或未缓存时向服务端查询。查询失败不缓存
    pub async fn get(&self) -> Result<AiStatus, TransportError> {
        let mut cached = self.cached.lock().await;
        if let Some((at, status)) = cached.as_ref() {
            if at.elapsed() < self.ttl {
                return Ok(status.clone());
            }
        }

        let status = self.transport.check_ai_status().await?;
        tracing::debug!(ai_available = status.ai_available, "AI status refreshed");
        *cached = Some((Instant::now(), status.clone()));
        Ok(status)
    }

    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }
}
