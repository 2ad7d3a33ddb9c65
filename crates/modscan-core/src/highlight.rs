//! 高亮渲染：生成可安全嵌入页面的 HTML 片段
//!
//! 用户提交的文本一律经过 HTML 转义后再输出（包括高亮段内部的文本），
//! 高亮段以带严重级别底色的 `<mark>` 包裹。
use crate::types::{Run, Severity};

/// 转义 `& < > " '`
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    push_escaped(&mut out, s);
    out
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// 严重级别对应的底色（低 → 高逐级加深）
pub fn marker_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "#fff3bf",
        Severity::Medium => "#ffc078",
        Severity::High => "#ff8787",
    }
}

fn push_marker_open(out: &mut String, severity: Severity) {
    out.push_str("<mark class=\"modscan-");
    out.push_str(severity.as_str());
    out.push_str("\" style=\"background-color:");
    out.push_str(marker_color(severity));
    out.push_str("\">");
}

/// 按高亮段渲染 `text`
/// - `runs` 须按 start 升序；偏移越界或落在字符中间时会被截断/对齐到字符边界，不会 panic；
/// - 与已输出部分重叠的段从当前游标处开始。
pub fn highlight(text: &str, runs: &[Run]) -> String {
    let mut out = String::with_capacity(text.len() + runs.len() * 64);
    let mut cursor = 0usize;
    for run in runs {
        let start = floor_char_boundary(text, run.start.max(cursor));
        let end = ceil_char_boundary(text, run.end);
        if end <= start {
            continue;
        }
        push_escaped(&mut out, &text[cursor..start]);
        push_marker_open(&mut out, run.severity);
        push_escaped(&mut out, &text[start..end]);
        out.push_str("</mark>");
        cursor = end;
    }
    push_escaped(&mut out, &text[cursor..]);
    out
}

fn floor_char_boundary(s: &str, offset: usize) -> usize {
    if offset >= s.len() {
        return s.len();
    }
    let mut pos = offset;
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

fn ceil_char_boundary(s: &str, offset: usize) -> usize {
    if offset >= s.len() {
        return s.len();
    }
    let mut pos = offset;
    while !s.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}
