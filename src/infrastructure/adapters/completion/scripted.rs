//! Scripted Completion - 按脚本输出的补全引擎
//!
//! 不访问网络，按固定增量序列输出，可配置：
//! - 在第 n 个增量后中断
//! - 流式调用建立失败
//! - 每个增量之前的延迟

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use secrecy::SecretString;

use crate::application::ports::{CompletionError, CompletionPort, CompletionRequest, DeltaStream};

const DEMO_CHAPTER: &str = "The lamps of the harbor flickered as the last ferry pulled away. \
Nobody on the pier noticed the stranger with the salt-stained map, \
but the map had already noticed them. By morning the tide would turn, \
and with it every plan they had made.";

/// 脚本化补全引擎
#[derive(Debug, Clone)]
pub struct ScriptedCompletion {
    deltas: Arc<Vec<String>>,
    /// 输出 n 个增量后返回中断错误
    fail_after: Option<usize>,
    /// 流式调用直接失败
    fail_stream_setup: bool,
    /// 非流式调用失败
    fail_complete: bool,
    delay: Duration,
    /// 已输出的增量数
    delivered: Arc<AtomicUsize>,
}

impl ScriptedCompletion {
    pub fn new<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            deltas: Arc::new(deltas.into_iter().map(Into::into).collect()),
            fail_after: None,
            fail_stream_setup: false,
            fail_complete: false,
            delay: Duration::ZERO,
            delivered: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 离线演示脚本：按词输出一段固定章节
    pub fn demo() -> Self {
        Self::new(DEMO_CHAPTER.split_inclusive(' ')).with_delay(Duration::from_millis(40))
    }

    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn fail_stream_setup(mut self) -> Self {
        self.fail_stream_setup = true;
        self
    }

    /// 流式和非流式调用全部失败
    pub fn unavailable(mut self) -> Self {
        self.fail_stream_setup = true;
        self.fail_complete = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionPort for ScriptedCompletion {
    fn provider_name(&self) -> &str {
        "Scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _api_key: &SecretString,
        _request: CompletionRequest,
    ) -> Result<String, CompletionError> {
        if self.fail_complete {
            return Err(CompletionError::Unavailable);
        }
        Ok(self.deltas.concat())
    }

    async fn stream(
        &self,
        _api_key: &SecretString,
        _request: CompletionRequest,
    ) -> Result<DeltaStream, CompletionError> {
        if self.fail_stream_setup {
            return Err(CompletionError::Unavailable);
        }

        let script = self.clone();
        let deltas = stream::unfold(Some(0usize), move |state| {
            let script = script.clone();
            async move {
                let index = state?;
                if script.fail_after == Some(index) {
                    let err = CompletionError::Network("connection reset by peer".into());
                    return Some((Err(err), None));
                }
                let delta = script.deltas.get(index)?.clone();
                if !script.delay.is_zero() {
                    tokio::time::sleep(script.delay).await;
                }
                script.delivered.fetch_add(1, Ordering::SeqCst);
                Some((Ok(delta), Some(index + 1)))
            }
        });
        Ok(deltas.boxed())
    }
}
