//! 基于 proptest 的性质测试

use proptest::prelude::*;

use modscan_core::{
    escape_html, highlight, normalize, resolve, scan, DecisionPolicy, Match, RuleEntry, Run,
    Severity, Span,
};

const SEVERITIES: &[Severity] = &[Severity::Low, Severity::Medium, Severity::High];

/// 覆盖各个归一化步骤的字符集
const ALPHABET: &[char] = &[
    'a', 'B', 'z', '0', '-', ' ', '\t', '\n', '\u{00A0}', '\u{3000}', '\u{2014}', '\u{2013}',
    '\u{2212}', '\u{FF0D}', '\u{FE58}', 'Ａ', 'ｚ', '１', '\u{FB01}', 'e', '\u{0301}', '\u{00E9}',
    '\u{212B}', '\u{2460}', '&', '<', '>', '"', '\'',
];

fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop::sample::select(SEVERITIES)
}

fn mixed_text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(ALPHABET), 0..48)
        .prop_map(|chars| chars.into_iter().collect())
}

/// 0..120 内任意（可能重叠）区间的命中
fn matches_strategy() -> impl Strategy<Value = Vec<Match>> {
    prop::collection::vec(
        (
            severity_strategy(),
            prop::collection::vec((0usize..100, 1usize..20), 1..6),
        ),
        0..6,
    )
    .prop_map(|groups| {
        groups
            .into_iter()
            .map(|(severity, spans)| {
                let mut spans: Vec<Span> =
                    spans.into_iter().map(|(s, len)| Span::new(s, s + len)).collect();
                spans.sort();
                Match { rule_id: String::new(), pattern: String::new(), severity, spans }
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // normalize(normalize(x)) == normalize(x)
    #[test]
    fn property_normalize_is_idempotent(text in mixed_text_strategy()) {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn property_normalize_is_idempotent_on_arbitrary_unicode(text in any::<String>()) {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    // 字面量出现 k 次，恰好返回 k 个升序区间
    #[test]
    fn property_literal_occurrences_are_exact(
        fillers in prop::collection::vec(prop::string::string_regex("[a-w]{0,5}").expect("valid regex"), 1..7),
    ) {
        let mut text = String::new();
        let mut expected = Vec::new();
        for (i, filler) in fillers.iter().enumerate() {
            text.push_str(filler);
            if i + 1 < fillers.len() {
                expected.push(Span::new(text.len(), text.len() + 3));
                text.push_str("xyz");
            }
        }

        let result = scan(&text, &[RuleEntry::literal("XYZ", Severity::Low)]);
        let spans: Vec<Span> = result.matches.iter().flat_map(|m| m.spans.clone()).collect();
        prop_assert_eq!(spans, expected);
    }

    // 高亮段升序且两两不相交，覆盖每个输入区间且严重级别不低于该区间
    #[test]
    fn property_resolve_runs_are_disjoint(matches in matches_strategy()) {
        let runs = resolve(&matches);

        for pair in runs.windows(2) {
            prop_assert!(pair[0].start < pair[0].end);
            prop_assert!(pair[0].end < pair[1].start, "runs touch or overlap: {:?}", pair);
        }
        for m in &matches {
            for s in &m.spans {
                let covering = runs.iter().find(|r| r.start <= s.start && s.end <= r.end);
                prop_assert!(covering.is_some(), "span {:?} not covered", s);
                prop_assert!(covering.map(|r| r.severity >= m.severity).unwrap_or(false));
            }
        }
    }

    // 两个重叠区间合并为一段，严重级别取 max(s1, s2)
    #[test]
    fn property_merge_takes_max_severity(
        s1 in severity_strategy(),
        s2 in severity_strategy(),
        start in 0usize..50,
        len1 in 1usize..10,
        offset in 0usize..10,
        len2 in 1usize..10,
    ) {
        let offset = offset.min(len1 - 1);
        let a = Match { rule_id: "a".into(), pattern: "a".into(), severity: s1, spans: vec![Span::new(start, start + len1)] };
        let b = Match { rule_id: "b".into(), pattern: "b".into(), severity: s2, spans: vec![Span::new(start + offset, start + offset + len2)] };
        let runs = resolve(&[a, b]);
        prop_assert_eq!(runs.len(), 1);
        prop_assert_eq!(runs[0].severity, s1.max(s2));
        prop_assert_eq!(runs[0].start, start);
        prop_assert_eq!(runs[0].end, (start + len1).max(start + offset + len2));
    }

    #[test]
    fn property_highlight_without_runs_is_escape(text in any::<String>()) {
        prop_assert_eq!(highlight(&text, &[]), escape_html(&text));
    }

    // 除自身的 mark 标签外，输出中不含未转义的标记字符
    #[test]
    fn property_highlight_never_leaks_markup(
        text in mixed_text_strategy(),
        raw_runs in prop::collection::vec((0usize..160, 0usize..40, severity_strategy()), 0..5),
    ) {
        let mut runs: Vec<Run> = raw_runs
            .into_iter()
            .map(|(start, len, severity)| Run { start, end: start + len, severity })
            .collect();
        runs.sort_by_key(|r| r.start);

        let html = highlight(&text, &runs);
        let mut stripped = html.replace("</mark>", "");
        for sev in SEVERITIES {
            let open = format!(
                "<mark class=\"modscan-{}\" style=\"background-color:{}\">",
                sev.as_str(),
                modscan_core::marker_color(*sev)
            );
            stripped = stripped.replace(&open, "");
        }
        prop_assert!(!stripped.contains('<'));
        prop_assert!(!stripped.contains('>'));
        prop_assert!(!stripped.contains('"'));
        prop_assert!(!stripped.contains('\''));
    }

    // 任意合法策略下，更高的严重级别不会得到更宽松的决策
    #[test]
    fn property_decision_is_monotonic(
        review_at in severity_strategy(),
        block_at in severity_strategy(),
        a in prop::option::of(severity_strategy()),
        b in prop::option::of(severity_strategy()),
    ) {
        prop_assume!(review_at <= block_at);
        let policy = DecisionPolicy::new(review_at, block_at).expect("valid policy");
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(policy.decide_severity(lo) <= policy.decide_severity(hi));
    }

    // 可零宽匹配的正则能终止，且不产生空区间
    #[test]
    fn property_zero_width_patterns_terminate(
        text in mixed_text_strategy(),
        pattern in prop::sample::select(&["a*", "(?:)", r"\b", "^", "$", "x?", "(?:e|)"][..]),
    ) {
        let result = scan(&text, &[RuleEntry::regex(pattern, Severity::High)]);
        for m in &result.matches {
            for s in &m.spans {
                prop_assert!(s.start < s.end);
                prop_assert!(s.end <= result.normalized_text().len());
            }
        }
    }

    // highest_severity 为 None 当且仅当 runs 为空
    #[test]
    fn property_highest_severity_tracks_runs(
        text in mixed_text_strategy(),
        needles in prop::collection::vec((prop::sample::select(&["a", "e", "-", "ab", "z z"][..]), severity_strategy()), 0..4),
    ) {
        let rules: Vec<RuleEntry> = needles
            .into_iter()
            .map(|(needle, severity)| RuleEntry::literal(needle, severity))
            .collect();
        let result = scan(&text, &rules);
        prop_assert_eq!(result.highest_severity.is_none(), result.runs.is_empty());
        prop_assert_eq!(result.highest_severity, result.runs.iter().map(|r| r.severity).max());
    }
}
