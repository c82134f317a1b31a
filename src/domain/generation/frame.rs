//! SSE Frame Codec
//!
//! 编码：`event: <name>\ndata: <payload>\n\n`
//!
//! 解码：字节级增量缓冲，传输层一次读取可能包含半帧、多帧或切断在多字节字符中间。
//! 只有读到完整一行（`\n` 结尾）后才做 UTF-8 解码，所以任意切分位置都安全。

/// 未声明 `event:` 字段时的默认事件名
pub const DEFAULT_EVENT_NAME: &str = "message";

/// 一个完整的 SSE 帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event: String,
    pub data: String,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    /// 编码为线上格式
    pub fn encode(&self) -> String {
        encode_frame(&self.event, &self.data)
    }
}

/// 编码单帧；多行 data 拆成多条 `data:` 行
pub fn encode_frame(event: &str, data: &str) -> String {
    let mut out = String::with_capacity(event.len() + data.len() + 16);
    out.push_str("event: ");
    out.push_str(event);
    out.push('\n');
    for line in data.split('\n') {
        out.push_str("data: ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out
}

/// 增量 SSE 解码器
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// 尚未构成完整行的字节
    buf: Vec<u8>,
    /// 当前帧的事件名
    event: Option<String>,
    /// 当前帧的 data 行
    data: Vec<String>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 喂入一段字节，返回本次新完成的帧
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buf[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let line = strip_cr(&self.buf[start..end]);
            let line = String::from_utf8_lossy(line).into_owned();
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
            start = end + 1;
        }
        self.buf.drain(..start);
        frames
    }

    /// 输入结束：处理残留的最后一行，并派发未以空行结尾的帧
    pub fn finish(&mut self) -> Option<Frame> {
        if !self.buf.is_empty() {
            let rest = std::mem::take(&mut self.buf);
            let line = String::from_utf8_lossy(strip_cr(&rest)).into_owned();
            if let Some(frame) = self.process_line(&line) {
                return Some(frame);
            }
        }
        self.dispatch()
    }

    /// 缓冲区中是否还有未完成的数据
    pub fn has_pending(&self) -> bool {
        !self.buf.is_empty() || !self.data.is_empty() || self.event.is_some()
    }

    fn process_line(&mut self, line: &str) -> Option<Frame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id / retry 以及未知字段忽略
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<Frame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(Frame {
            event: event.unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string()),
            data,
        })
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame_shape() {
        assert_eq!(
            encode_frame("connected", r#"{"status":"connected"}"#),
            "event: connected\ndata: {\"status\":\"connected\"}\n\n"
        );
    }

    #[test]
    fn test_decode_multiple_frames_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(b"event: a\ndata: 1\n\nevent: b\ndata: 2\n\n");
        assert_eq!(frames, vec![Frame::new("a", "1"), Frame::new("b", "2")]);
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_decode_crlf_comments_and_multiline_data() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(b": keep-alive\r\nevent: text\r\ndata: line1\r\ndata: line2\r\n\r\n");
        assert_eq!(frames, vec![Frame::new("text", "line1\nline2")]);
    }

    #[test]
    fn test_decode_split_inside_multibyte_char() {
        let wire = encode_frame("text", "héllo wörld");
        let bytes = wire.as_bytes();
        for cut in 0..=bytes.len() {
            let mut decoder = FrameDecoder::new();
            let mut frames = decoder.feed(&bytes[..cut]);
            frames.extend(decoder.feed(&bytes[cut..]));
            assert_eq!(frames, vec![Frame::new("text", "héllo wörld")], "cut at {cut}");
        }
    }

    #[test]
    fn test_missing_event_uses_default_name() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed(b"data: [DONE]\n\n");
        assert_eq!(frames, vec![Frame::new(DEFAULT_EVENT_NAME, "[DONE]")]);
    }

    #[test]
    fn test_finish_flushes_unterminated_frame() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"event: complete\ndata: {}").is_empty());
        assert_eq!(decoder.finish(), Some(Frame::new("complete", "{}")));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_event_without_data_is_not_dispatched() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"event: ping\n\n").is_empty());
        let frames = decoder.feed(b"data: x\n\n");
        assert_eq!(frames, vec![Frame::new(DEFAULT_EVENT_NAME, "x")]);
    }
}
