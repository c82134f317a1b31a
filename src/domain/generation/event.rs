//! Generation Events
//!
//! 一次生成的事件序列：
//! `connected` → `start` → `text`* → (`complete` | `error`)
//!
//! 负载字段使用 camelCase，与线上格式一致。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ProtocolError;
use super::frame::Frame;
use super::request::GenerationRequest;
use crate::domain::text::word_count;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedPayload {
    pub status: String,
}

impl Default for ConnectedPayload {
    fn default() -> Self {
        Self {
            status: "connected".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPayload {
    pub chapter_number: u32,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub characters: String,
    /// 语言显示名称
    #[serde(default)]
    pub language: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPayload {
    pub delta: String,
    /// 截至本帧的完整文本
    pub full_content: String,
    pub word_count: usize,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePayload {
    pub full_content: String,
    pub word_count: usize,
    #[serde(rename = "isAIGenerated", default = "default_true")]
    pub is_ai_generated: bool,
    #[serde(default)]
    pub language: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    /// 面向用户的说明
    pub error: String,
    /// 完整的模板兜底章节
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    /// 失败前已生成的 AI 文本
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_content: Option<String>,
}

fn default_true() -> bool {
    true
}

/// 生成事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    Connected(ConnectedPayload),
    Start(StartPayload),
    Text(TextPayload),
    Complete(CompletePayload),
    Error(ErrorPayload),
}

impl GenerationEvent {
    pub const CONNECTED: &'static str = "connected";
    pub const START: &'static str = "start";
    pub const TEXT: &'static str = "text";
    pub const COMPLETE: &'static str = "complete";
    pub const ERROR: &'static str = "error";

    pub fn connected() -> Self {
        GenerationEvent::Connected(ConnectedPayload::default())
    }

    pub fn start(request: &GenerationRequest, timestamp: DateTime<Utc>) -> Self {
        GenerationEvent::Start(StartPayload {
            chapter_number: request.chapter_number.get(),
            genre: request.genre.clone(),
            characters: request.characters.clone(),
            language: request.language().name.to_string(),
            timestamp,
        })
    }

    /// 文本增量事件，字数由完整文本重新计算
    pub fn text(delta: impl Into<String>, full_content: impl Into<String>, language: &str) -> Self {
        let full_content = full_content.into();
        GenerationEvent::Text(TextPayload {
            delta: delta.into(),
            word_count: word_count(&full_content),
            full_content,
            language: language.to_string(),
        })
    }

    pub fn complete(
        full_content: impl Into<String>,
        is_ai_generated: bool,
        language: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let full_content = full_content.into();
        GenerationEvent::Complete(CompletePayload {
            word_count: word_count(&full_content),
            full_content,
            is_ai_generated,
            language: language.to_string(),
            timestamp,
        })
    }

    pub fn error(
        message: impl Into<String>,
        fallback: Option<String>,
        partial_content: Option<String>,
    ) -> Self {
        GenerationEvent::Error(ErrorPayload {
            error: message.into(),
            fallback,
            partial_content: partial_content.filter(|p| !p.is_empty()),
        })
    }

    /// 事件名（SSE `event:` 字段）
    pub fn name(&self) -> &'static str {
        match self {
            GenerationEvent::Connected(_) => Self::CONNECTED,
            GenerationEvent::Start(_) => Self::START,
            GenerationEvent::Text(_) => Self::TEXT,
            GenerationEvent::Complete(_) => Self::COMPLETE,
            GenerationEvent::Error(_) => Self::ERROR,
        }
    }

    /// `complete` 与 `error` 是终止事件
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationEvent::Complete(_) | GenerationEvent::Error(_))
    }

    /// 编码为 SSE 帧
    pub fn to_frame(&self) -> Result<Frame, serde_json::Error> {
        let data = match self {
            GenerationEvent::Connected(p) => serde_json::to_string(p)?,
            GenerationEvent::Start(p) => serde_json::to_string(p)?,
            GenerationEvent::Text(p) => serde_json::to_string(p)?,
            GenerationEvent::Complete(p) => serde_json::to_string(p)?,
            GenerationEvent::Error(p) => serde_json::to_string(p)?,
        };
        Ok(Frame::new(self.name(), data))
    }

    /// 从 SSE 帧解码
    ///
    /// 编码端的 payload 总是单行 JSON。多行 data 解析失败时，前面的行视为混入的残行，
    /// 只用最后一行重试，这样残行不会吞掉后面的有效帧。
    pub fn from_frame(frame: &Frame) -> Result<Self, ProtocolError> {
        match Self::decode(&frame.event, &frame.data) {
            Err(err @ ProtocolError::InvalidPayload { .. }) => match frame.data.rsplit_once('\n') {
                Some((_, last)) => Self::decode(&frame.event, last).map_err(|_| err),
                None => Err(err),
            },
            result => result,
        }
    }

    fn decode(name: &str, data: &str) -> Result<Self, ProtocolError> {
        let invalid = |source| ProtocolError::InvalidPayload {
            event: name.to_string(),
            source,
        };
        let event = match name {
            Self::CONNECTED => GenerationEvent::Connected(serde_json::from_str(data).map_err(invalid)?),
            Self::START => GenerationEvent::Start(serde_json::from_str(data).map_err(invalid)?),
            Self::TEXT => GenerationEvent::Text(serde_json::from_str(data).map_err(invalid)?),
            Self::COMPLETE => GenerationEvent::Complete(serde_json::from_str(data).map_err(invalid)?),
            Self::ERROR => GenerationEvent::Error(serde_json::from_str(data).map_err(invalid)?),
            other => return Err(ProtocolError::UnknownEvent(other.to_string())),
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    #[test]
    fn test_text_event_recomputes_word_count() {
        let event = GenerationEvent::text("time.", "Once upon a time.", "English");
        match event {
            GenerationEvent::Text(p) => assert_eq!(p.word_count, 4),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_wire_field_names() {
        let frame = GenerationEvent::complete("Hi there", true, "English", Utc::now())
            .to_frame()
            .unwrap();
        assert_eq!(frame.event, "complete");
        let json: serde_json::Value = serde_json::from_str(&frame.data).unwrap();
        assert_eq!(json["fullContent"], "Hi there");
        assert_eq!(json["wordCount"], 2);
        assert_eq!(json["isAIGenerated"], true);

        let frame = GenerationEvent::error("failed", Some("fallback".into()), Some(String::new()))
            .to_frame()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame.data).unwrap();
        assert_eq!(json["error"], "failed");
        assert_eq!(json["fallback"], "fallback");
        assert!(json.get("partialContent").is_none());
    }

    #[test]
    fn test_start_frame_decodes_back() {
        let req = GenerationRequest::new("p", "Horror", "Nell", "Fogmoor", NonZeroU32::MIN)
            .with_language("de");
        let event = GenerationEvent::start(&req, Utc::now());
        let decoded = GenerationEvent::from_frame(&event.to_frame().unwrap()).unwrap();
        assert_eq!(decoded, event);
        match decoded {
            GenerationEvent::Start(p) => assert_eq!(p.language, "German"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_tolerates_missing_optional_fields() {
        let frame = Frame::new("complete", r#"{"fullContent":"a b","wordCount":2}"#);
        match GenerationEvent::from_frame(&frame).unwrap() {
            GenerationEvent::Complete(p) => {
                assert!(p.is_ai_generated);
                assert_eq!(p.full_content, "a b");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_decode_errors() {
        let unknown = GenerationEvent::from_frame(&Frame::new("heartbeat", "{}"));
        assert!(matches!(unknown, Err(ProtocolError::UnknownEvent(name)) if name == "heartbeat"));

        let malformed = GenerationEvent::from_frame(&Frame::new("text", "{not json"));
        assert!(matches!(malformed, Err(ProtocolError::InvalidPayload { .. })));

        let both_bad = GenerationEvent::from_frame(&Frame::new("text", "{not json\n{also not"));
        assert!(matches!(both_bad, Err(ProtocolError::InvalidPayload { .. })));
    }

    #[test]
    fn test_stray_data_line_does_not_swallow_payload() {
        let frame = Frame::new("complete", "{not json\n{\"fullContent\":\"Done.\",\"wordCount\":1}");
        match GenerationEvent::from_frame(&frame).unwrap() {
            GenerationEvent::Complete(p) => assert_eq!(p.full_content, "Done."),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
