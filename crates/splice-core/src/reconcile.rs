//! Boundary reconciliation for generated code
//!
//! Models tend to restate the lines around the edit point before and after
//! the code they were asked for. Merging that output verbatim duplicates
//! code the document already has. This module trims the echoed runs, and
//! only the runs that touch the edit point: interior repetition is kept.
//!
//! Lines are compared on their whitespace-free form so re-indentation does
//! not hide an echo. A run is removed only when it matches in full.
//!
//! Known quirk: blank and whitespace-only lines all normalise to `""`, so a
//! blank separator line in the output can be taken for an echo of a blank
//! document line and dropped.

/// Comparison key for a line: every whitespace character removed.
pub fn normalize_line(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Outcome of a reconciliation with the number of lines each boundary dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub text: String,
    pub trimmed_leading: usize,
    pub trimmed_trailing: usize,
}

/// Trim `generated` of the lines that duplicate the document context around
/// lines `range.start..=range.end`, returning the block to merge.
pub fn reconcile(document: &str, generated: &str, range: crate::LineRange) -> String {
    reconcile_detailed(document, generated, range).text
}

pub fn reconcile_detailed(
    document: &str,
    generated: &str,
    range: crate::LineRange,
) -> Reconciliation {
    if generated.is_empty() {
        return Reconciliation {
            text: String::new(),
            trimmed_leading: 0,
            trimmed_trailing: 0,
        };
    }

    let doc_lines: Vec<&str> = document.split('\n').collect();
    let before_end = range.start.min(doc_lines.len());
    let after_start = range.end.saturating_add(1).min(doc_lines.len());
    let before = &doc_lines[..before_end];
    let after = &doc_lines[after_start..];

    let mut lines: Vec<&str> = generated.split('\n').collect();

    let trimmed_leading = leading_echo_len(before, &lines);
    lines.drain(..trimmed_leading);

    // Nothing left to anchor a trailing match against.
    let trimmed_trailing = if lines.is_empty() {
        0
    } else {
        trailing_echo_len(after, &lines)
    };
    lines.truncate(lines.len() - trimmed_trailing);

    Reconciliation {
        text: lines.join("\n"),
        trimmed_leading,
        trimmed_trailing,
    }
}

/// Length of the run at the start of `generated` that repeats the tail of
/// `before`.
///
/// Candidates are tried from the top of `before` downward, so the first full
/// match found is the longest one.
fn leading_echo_len(before: &[&str], generated: &[&str]) -> usize {
    let Some(first) = generated.first() else {
        return 0;
    };
    let first = normalize_line(first);

    for i in 0..before.len() {
        let run = before.len() - i;
        if generated.len() < run {
            continue;
        }
        if normalize_line(before[i]) != first {
            continue;
        }
        let full_match =
            (1..run).all(|j| normalize_line(generated[j]) == normalize_line(before[i + j]));
        if full_match {
            return run;
        }
    }
    0
}

/// Length of the run at the end of `generated` that repeats the head of
/// `after`, trying the longest run first.
fn trailing_echo_len(after: &[&str], generated: &[&str]) -> usize {
    let Some(last) = generated.last() else {
        return 0;
    };
    let last = normalize_line(last);
    let end = generated.len() - 1;

    for run in (1..=after.len()).rev() {
        if generated.len() < run {
            continue;
        }
        if normalize_line(after[run - 1]) != last {
            continue;
        }
        let full_match = (1..run)
            .all(|j| normalize_line(generated[end - j]) == normalize_line(after[run - 1 - j]));
        if full_match {
            return run;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LineRange;

    #[test]
    fn test_normalize_line_strips_all_whitespace() {
        assert_eq!(normalize_line("  foo( a, b );\t"), "foo(a,b);");
        assert_eq!(normalize_line("\r"), "");
        assert_eq!(normalize_line("\u{00a0}x"), "x");
    }

    #[test]
    fn test_no_shared_lines_returns_generated_unchanged() {
        let doc = "fn a() {\n    one();\n}\n";
        let generated = "let x = 1;\nlet y = 2;";
        assert_eq!(reconcile(doc, generated, LineRange::single(1)), generated);
    }

    #[test]
    fn test_leading_echo_trimmed_from_nearest_context() {
        // "a" and "b" precede the replaced line; the model repeated "b" only.
        let doc = "a\nb\nc";
        let result = reconcile(doc, "b\nc\nd", LineRange::single(2));
        assert_eq!(result, "c\nd");
    }

    #[test]
    fn test_leading_echo_prefers_longest_run() {
        let doc = "x\ny\nz\ncursor\ntail";
        let result = reconcile_detailed(doc, "x\ny\nz\nnew", LineRange::single(3));
        assert_eq!(result.text, "new");
        assert_eq!(result.trimmed_leading, 3);
        assert_eq!(result.trimmed_trailing, 0);
    }

    #[test]
    fn test_trailing_echo_trimmed() {
        let doc = "head\ncursor\nnext();\n}\n";
        let generated = "body();\nnext();\n}";
        let result = reconcile_detailed(doc, generated, LineRange::single(1));
        assert_eq!(result.text, "body();");
        assert_eq!(result.trimmed_trailing, 2);
    }

    #[test]
    fn test_trailing_echo_prefers_longest_run() {
        // Both "}" alone and "}\n}" would match at the boundary; the longer run wins.
        let doc = "cursor\n}\n}";
        let result = reconcile_detailed(doc, "work();\n}\n}", LineRange::single(0));
        assert_eq!(result.text, "work();");
        assert_eq!(result.trimmed_trailing, 2);
    }

    #[test]
    fn test_whitespace_insensitive_matching() {
        let doc = "  foo();\ncursor";
        assert_eq!(reconcile(doc, "foo();\nbar();", LineRange::single(1)), "bar();");
        assert_eq!(reconcile(doc, "\tfoo();\nbar();", LineRange::single(1)), "bar();");
    }

    #[test]
    fn test_partial_run_is_not_trimmed() {
        // First line agrees with pre[0] but the second diverges from pre[1];
        // no candidate yields a full match, so nothing is trimmed.
        let doc = "alpha\nbeta\ncursor";
        let generated = "alpha\ngamma\ndelta";
        assert_eq!(reconcile(doc, generated, LineRange::single(2)), generated);
    }

    #[test]
    fn test_partial_run_falls_through_to_later_candidate() {
        // Candidate i=0 ("k") fails on its second line, candidate i=2 ("k")
        // is a full one-line match.
        let doc = "k\nm\nk\ncursor";
        let result = reconcile_detailed(doc, "k\nnew\nmore", LineRange::single(3));
        assert_eq!(result.text, "new\nmore");
        assert_eq!(result.trimmed_leading, 1);
    }

    #[test]
    fn test_empty_generated_block() {
        assert_eq!(reconcile("a\nb", "", LineRange::single(1)), "");
        assert_eq!(reconcile("", "", LineRange::single(0)), "");
    }

    #[test]
    fn test_fully_echoed_block_skips_trailing_scan() {
        let doc = "a\nb\ncursor\nc";
        let result = reconcile_detailed(doc, "a\nb", LineRange::single(2));
        assert_eq!(result.text, "");
        assert_eq!(result.trimmed_leading, 2);
        assert_eq!(result.trimmed_trailing, 0);
    }

    #[test]
    fn test_interior_duplication_is_kept() {
        let doc = "start\ncursor\nend";
        let generated = "one\nstart\nend\ntwo";
        assert_eq!(reconcile(doc, generated, LineRange::single(1)), generated);
    }

    #[test]
    fn test_range_past_document_end_is_clamped() {
        let doc = "a\nb";
        assert_eq!(reconcile(doc, "b\nc", LineRange::single(10)), "c");
        assert_eq!(reconcile(doc, "x", LineRange::new(5, 9).unwrap()), "x");
    }

    #[test]
    fn test_multi_line_range_uses_outer_context() {
        let doc = "head\nold1\nold2\ntail";
        let generated = "head\nnew1\nnew2\ntail";
        let range = LineRange::new(1, 2).unwrap();
        assert_eq!(reconcile(doc, generated, range), "new1\nnew2");
    }

    #[test]
    fn test_blank_lines_match_each_other() {
        let doc = "fn a() {}\n\ncursor";
        let result = reconcile(doc, "   \nfn b() {}", LineRange::single(2));
        assert_eq!(result, "fn b() {}");
    }

    #[test]
    fn test_method_body_completion_inside_class() {
        let doc = "class A {\n  void foo() {\n    \n  }\n}";
        let generated = "void foo() {\n  print('hi');\n}";
        let result = reconcile_detailed(doc, generated, LineRange::single(2));
        assert_eq!(result.text, "  print('hi');");
        assert_eq!(normalize_line(&result.text), "print('hi');");
        assert_eq!(result.trimmed_leading, 1);
        assert_eq!(result.trimmed_trailing, 1);
    }
}
