//! 文本工具
//!
//! 字数统计始终从当前文本重新计算，不做增量累计。

/// 统计以空白分隔的非空词数
#[inline]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// 按字符（而非字节）截断，不会切断多字节字符
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
