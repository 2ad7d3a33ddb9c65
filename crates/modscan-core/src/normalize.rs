//! 文本归一化（模块）
//!
//! 处理步骤：
//! - NFKC 兼容归一化（全角 → 半角、连字、兼容字符折叠等）；
//! - 任意空白字符序列压缩为单个 ASCII 空格；
//! - 连字符/破折号家族统一为 ASCII `-`。
//!
//! 归一化是幂等的纯函数。匹配在归一化文本上进行，因此另提供
//! `normalize_with_offsets`，记录归一化片段到原文字节区间的映射，
//! 供高亮渲染回写原文位置。

use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;

/// 归一化文本（用于比较）
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for ch in text.nfkc() {
        push_folded(&mut out, ch, &mut prev_space);
    }
    out
}

/// 连字符/破折号家族（ASCII `-` 本身除外）
fn is_dash(ch: char) -> bool {
    matches!(
        ch,
        '\u{058A}'
            | '\u{05BE}'
            | '\u{1400}'
            | '\u{1806}'
            | '\u{2010}'..='\u{2015}'
            | '\u{2212}'
            | '\u{2E17}'
            | '\u{2E1A}'
            | '\u{2E3A}'
            | '\u{2E3B}'
            | '\u{2E40}'
            | '\u{301C}'
            | '\u{3030}'
            | '\u{30A0}'
            | '\u{FE31}'
            | '\u{FE32}'
            | '\u{FE58}'
            | '\u{FE63}'
            | '\u{FF0D}'
    )
}

/// 折叠单个（已 NFKC 的）字符并写入 `out`；返回是否实际写入
fn push_folded(out: &mut String, ch: char, prev_space: &mut bool) -> bool {
    if ch.is_whitespace() {
        if *prev_space {
            return false;
        }
        out.push(' ');
        *prev_space = true;
        return true;
    }
    *prev_space = false;
    out.push(if is_dash(ch) { '-' } else { ch });
    true
}

/// 归一化片段：归一化文本从 `norm_start` 起（到下一片段为止）来自原文 `[orig_start, orig_end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    norm_start: usize,
    orig_start: usize,
    orig_end: usize,
}

/// 归一化偏移 → 原文偏移的映射表
#[derive(Debug, Clone, Default)]
pub struct OffsetMap {
    segments: Vec<Segment>,
    original_len: usize,
    aligned: bool,
}

impl OffsetMap {
    /// 映射是否精确；为 false 时退化为按原偏移截断（可能错位）
    pub fn is_aligned(&self) -> bool {
        self.aligned
    }

    /// 将归一化文本上的半开区间映射到原文字节区间
    /// - 片段内部的偏移映射到整个片段（例如连字 `ﬁ` 中只命中 `i` 时高亮整个 `ﬁ`）
    pub fn to_original(&self, start: usize, end: usize) -> (usize, usize) {
        if !self.aligned || self.segments.is_empty() {
            let s = start.min(self.original_len);
            let e = end.min(self.original_len);
            return (s, e.max(s));
        }
        let first = self
            .segments
            .partition_point(|seg| seg.norm_start <= start)
            .saturating_sub(1);
        let last = self
            .segments
            .partition_point(|seg| seg.norm_start < end)
            .saturating_sub(1)
            .max(first);
        (self.segments[first].orig_start, self.segments[last].orig_end)
    }
}

/// 归一化结果：文本 + 偏移映射
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub text: String,
    pub map: OffsetMap,
}

/// 归一化并记录偏移映射
///
/// 按“起始字符 + 其后的组合字符”分簇逐簇归一化，再与整串归一化结果比对：
/// 一致则映射精确；不一致（如朝鲜文字母跨簇组合）则退化为恒等映射并记录 debug 日志。
pub fn normalize_with_offsets(original: &str) -> Normalized {
    let text = normalize(original);

    let mut clustered = String::with_capacity(text.len());
    let mut segments: Vec<Segment> = Vec::new();
    let mut prev_space = false;
    for (start, end) in starter_clusters(original) {
        let norm_start = clustered.len();
        let mut wrote = false;
        for ch in original[start..end].nfkc() {
            wrote |= push_folded(&mut clustered, ch, &mut prev_space);
        }
        if wrote {
            segments.push(Segment { norm_start, orig_start: start, orig_end: end });
        } else if let Some(last) = segments.last_mut() {
            // 被压缩掉的空白归入前一片段
            last.orig_end = end;
        }
    }

    let aligned = clustered == text;
    if !aligned {
        tracing::debug!(
            original_len = original.len(),
            normalized_len = text.len(),
            "cluster-wise normalization diverged; highlight offsets fall back to identity"
        );
        segments.clear();
    }

    Normalized {
        text,
        map: OffsetMap { segments, original_len: original.len(), aligned },
    }
}

/// 以规范组合类为 0 的字符为簇起点切分原文，返回各簇字节区间
fn starter_clusters(text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut cluster_start = 0usize;
    for (idx, ch) in text.char_indices() {
        if idx > 0 && canonical_combining_class(ch) == 0 {
            out.push((cluster_start, idx));
            cluster_start = idx;
        }
    }
    if cluster_start < text.len() {
        out.push((cluster_start, text.len()));
    }
    out
}
