//! 匹配引擎：在归一化文本上为单条规则收集全部命中区间
use regex_automata::{meta, Input};

use crate::detectors::{CompiledRule, LiteralFinder, RuleKind};
use crate::types::Span;

/// 单条规则的全部命中区间（升序，同一规则内互不重叠）
pub(crate) fn find_spans(rule: &CompiledRule, text: &str) -> Vec<Span> {
    match &rule.kind {
        RuleKind::Literal { finder: LiteralFinder::Ascii(ac) } => ac
            .find_iter(text)
            .filter(|m| m.end() > m.start())
            .map(|m| Span::new(m.start(), m.end()))
            .collect(),
        RuleKind::Literal { finder: LiteralFinder::Folded(re) } => cursor_spans(re, text).0,
        RuleKind::Pattern { regex } => cursor_spans(regex, text).0,
    }
}

/// 以显式游标迭代正则匹配，返回 (区间, 迭代步数)
/// - 非空匹配：游标推进到匹配末尾，同一规则的区间不会重叠；
/// - 零宽匹配：不产生区间，游标强制前进一个码点，保证最多 `字符数 + 1` 步终止。
pub(crate) fn cursor_spans(re: &meta::Regex, text: &str) -> (Vec<Span>, usize) {
    let mut spans = Vec::new();
    let mut steps = 0usize;
    let mut at = 0usize;
    while at <= text.len() {
        steps += 1;
        let input = Input::new(text).span(at..text.len());
        let m = match re.search(&input) {
            Some(m) => m,
            None => break,
        };
        if m.is_empty() {
            at = next_code_point(text, m.end());
            continue;
        }
        spans.push(Span::new(m.start(), m.end()));
        at = m.end();
    }
    (spans, steps)
}

/// `pos` 之后下一个码点边界；已在末尾时返回 `len + 1` 以结束循环
fn next_code_point(text: &str, pos: usize) -> usize {
    match text.get(pos..).and_then(|rest| rest.chars().next()) {
        Some(ch) => pos + ch.len_utf8(),
        None => text.len() + 1,
    }
}
