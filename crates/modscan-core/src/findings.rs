//! 命中合并：重叠/相邻区间合并为互不相交的高亮段，严重级别取最大值
use crate::types::{Match, Run};

/// 对区间进行稳定排序：起始偏移升序 → 结束偏移降序（长者优先）
pub(crate) fn sort_runs_stable(runs: &mut [Run]) {
    runs.sort_by(|a, b| {
        use std::cmp::Ordering;
        match a.start.cmp(&b.start) {
            Ordering::Equal => b.end.cmp(&a.end),
            o => o,
        }
    });
}

/// 排序后从左到右扫描合并：`next.start <= cur.end` 即并入当前段
pub(crate) fn merge_runs(mut runs: Vec<Run>) -> Vec<Run> {
    sort_runs_stable(&mut runs);
    let mut out: Vec<Run> = Vec::with_capacity(runs.len());
    for run in runs {
        if let Some(cur) = out.last_mut() {
            if run.start <= cur.end {
                cur.end = cur.end.max(run.end);
                cur.severity = cur.severity.max(run.severity);
                continue;
            }
        }
        out.push(run);
    }
    out
}

/// 将所有规则的命中展开为 (start, end, severity) 后合并
pub fn resolve(matches: &[Match]) -> Vec<Run> {
    let flat: Vec<Run> = matches
        .iter()
        .flat_map(|m| {
            m.spans.iter().map(move |s| Run { start: s.start, end: s.end, severity: m.severity })
        })
        .collect();
    merge_runs(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Severity, Span};

    fn m(severity: Severity, spans: &[(usize, usize)]) -> Match {
        Match {
            rule_id: String::new(),
            pattern: String::new(),
            severity,
            spans: spans.iter().map(|&(s, e)| Span::new(s, e)).collect(),
        }
    }

    fn run(start: usize, end: usize, severity: Severity) -> Run {
        Run { start, end, severity }
    }

    #[test]
    fn overlapping_spans_take_max_severity() {
        let runs = resolve(&[m(Severity::Low, &[(0, 2)]), m(Severity::High, &[(1, 3)])]);
        assert_eq!(runs, vec![run(0, 3, Severity::High)]);
    }

    #[test]
    fn adjacent_spans_merge() {
        let runs = resolve(&[m(Severity::Low, &[(0, 3), (3, 5)])]);
        assert_eq!(runs, vec![run(0, 5, Severity::Low)]);
    }

    #[test]
    fn disjoint_spans_stay_separate_and_sorted() {
        let runs = resolve(&[
            m(Severity::Medium, &[(10, 12)]),
            m(Severity::Low, &[(0, 3), (20, 25)]),
        ]);
        assert_eq!(
            runs,
            vec![run(0, 3, Severity::Low), run(10, 12, Severity::Medium), run(20, 25, Severity::Low)]
        );
    }

    #[test]
    fn contained_span_does_not_shrink_run() {
        let runs = resolve(&[m(Severity::Low, &[(0, 10)]), m(Severity::Medium, &[(2, 4)])]);
        assert_eq!(runs, vec![run(0, 10, Severity::Medium)]);
    }

    #[test]
    fn chain_of_overlaps_collapses_into_one_run() {
        let runs = resolve(&[
            m(Severity::Low, &[(0, 4), (8, 12)]),
            m(Severity::Medium, &[(3, 9)]),
        ]);
        assert_eq!(runs, vec![run(0, 12, Severity::Medium)]);
    }

    #[test]
    fn equal_starts_sort_longest_first() {
        let mut runs = vec![run(5, 6, Severity::Low), run(5, 9, Severity::Low), run(1, 2, Severity::Low)];
        sort_runs_stable(&mut runs);
        assert_eq!(runs[0].start, 1);
        assert_eq!((runs[1].start, runs[1].end), (5, 9));
    }

    #[test]
    fn no_matches_no_runs() {
        assert!(resolve(&[]).is_empty());
    }
}
