//! Cloze tokenizer (C3, §4.1).
//!
//! Brace-balanced scanning so that embedded LaTeX such as `\frac{a}{b}`
//! does not prematurely close a cloze.

use crate::helpers::{normalize_whitespace, split_first};
use crate::model::{Cloze, Scope};
use fancy_regex::Regex;
use std::sync::LazyLock;

static SCOPE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(-?\d+)(,\s*-?\d+)?\]").unwrap());

/// Tokenizes `content`, whose first line is `base_line` in the original
/// document, into a sequence of valid clozes in source order. Every parse
/// failure degrades silently per §4.1; nothing here ever errors.
#[must_use]
pub fn tokenize(content: &str, base_line: usize) -> Vec<Cloze> {
    let bytes = content.as_bytes();
    let mut clozes = Vec::new();
    let mut pos = 0usize;

    while pos + 1 < bytes.len() {
        if bytes[pos] == b'{' && bytes[pos + 1] == b'{' {
            match find_closing(content, pos) {
                Some(close_end) => {
                    let interior_start = pos + 2;
                    let interior_end = close_end - 2;
                    let interior = &content[interior_start..interior_end];

                    let mut full_end = close_end;
                    let scope = if let Some((scope, suffix_len)) =
                        parse_scope_suffix(&content[close_end..])
                    {
                        full_end += suffix_len;
                        scope
                    } else {
                        Scope::DEFAULT
                    };

                    if let Some(cloze) =
                        build_cloze(content, pos, full_end, interior, scope, base_line)
                    {
                        clozes.push(cloze);
                    }
                    pos = full_end;
                    continue;
                }
                None => {
                    pos += 1;
                    continue;
                }
            }
        }
        pos += 1;
    }

    clozes
}

/// Returns the byte index just past the `}}` that closes the cloze opened
/// at `open_start` (which must point at `{{`), tracking brace depth so
/// interior `{`/`}` pairs (e.g. from LaTeX) don't close it early.
fn find_closing(content: &str, open_start: usize) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut depth = 2i32; // the opening `{{` counts as two levels
    let mut i = open_start + 2;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 1 && i + 1 < bytes.len() && bytes[i + 1] == b'}' {
                    return Some(i + 2);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn parse_scope_suffix(rest: &str) -> Option<(Scope, usize)> {
    if !rest.starts_with('[') {
        return None;
    }
    let caps = SCOPE_SUFFIX_RE.captures(rest).ok().flatten()?;
    let whole = caps.get(0)?;
    let first: i32 = caps.get(1)?.as_str().parse().ok()?;
    let scope = if let Some(second_match) = caps.get(2) {
        let second_str = second_match.as_str().trim_start_matches(',').trim();
        let second: i32 = second_str.parse().ok()?;
        Scope {
            before: -first.abs(),
            after: second.abs(),
        }
    } else if first < 0 {
        Scope {
            before: first,
            after: 0,
        }
    } else {
        Scope {
            before: 0,
            after: first,
        }
    };
    Some((scope, whole.as_str().len()))
}

fn build_cloze(
    content: &str,
    byte_start: usize,
    byte_end: usize,
    interior: &str,
    scope: Scope,
    base_line: usize,
) -> Option<Cloze> {
    let full_text = content[byte_start..byte_end].to_string();
    let line_number = base_line + content[..byte_start].matches('\n').count();

    let (ids_part, content_part) = match split_first(interior, '>') {
        Some((ids, rest)) => (Some(ids), rest),
        None => (None, interior),
    };

    let (head, extra) = match split_first(content_part, '<') {
        Some((head, extra)) => (head, Some(normalize_whitespace(extra))),
        None => (content_part, None),
    };
    let (answer_raw, hint) = match split_first(head, '|') {
        Some((a, h)) => (a, Some(normalize_whitespace(h))),
        None => (head, None),
    };
    let answer = normalize_whitespace(answer_raw);
    if answer.is_empty() {
        return None;
    }

    let (group_id, sequence_order, note_id_code) = ids_part.map_or((None, None, None), parse_ids);

    Some(Cloze::new(
        full_text,
        byte_start..byte_end,
        line_number,
        group_id,
        sequence_order,
        note_id_code,
        answer,
        hint,
        extra,
        scope,
    ))
}

fn parse_ids(ids_part: &str) -> (Option<String>, Option<u32>, Option<String>) {
    let mut group_id = None;
    let mut sequence_order = None;
    let mut note_id_code = None;

    for raw_part in ids_part.split(',') {
        let part = raw_part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((first, second)) = split_first(part, '.') {
            if is_all_digits(first) {
                group_id = Some(first.to_string());
                if is_all_digits(second) {
                    sequence_order = second.parse().ok();
                }
                continue;
            }
        }
        if is_all_digits(part) {
            group_id = Some(part.to_string());
        } else if crate::codec::is_valid_alphabet(part) {
            note_id_code = Some(part.to_string());
        }
        // anything else is ignored, per §4.1
    }

    (group_id, sequence_order, note_id_code)
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_full_text() {
        let input = "The answer is {{42}}.";
        let clozes = tokenize(input, 0);
        assert_eq!(clozes.len(), 1);
        let c = &clozes[0];
        assert_eq!(&input[c.byte_range.clone()], c.full_text);
        assert_eq!(c.answer, "42");
    }

    #[test]
    fn test_brace_balance_latex() {
        let clozes = tokenize(r"{{$\frac{a}{b}$}}", 0);
        assert_eq!(clozes.len(), 1);
        assert_eq!(clozes[0].answer, r"$\frac{a}{b}$");
    }

    #[test]
    fn test_brace_balance_nested_triple() {
        let clozes = tokenize(r"{{${a{b{c}}}$}}", 0);
        assert_eq!(clozes.len(), 1);
        assert_eq!(clozes[0].answer, r"${a{b{c}}}$");
    }

    #[test]
    fn test_empty_answer_forms_dropped() {
        for input in ["{{}}", "{{   }}", "{{|hint}}", "{{<extra}}"] {
            assert!(tokenize(input, 0).is_empty(), "expected drop for {input}");
        }
    }

    #[test]
    fn test_empty_answer_does_not_block_later_cloze() {
        let clozes = tokenize("{{}} then {{43}}", 0);
        assert_eq!(clozes.len(), 1);
        assert_eq!(clozes[0].answer, "43");
    }

    #[test]
    fn test_whitespace_normalization_in_answer() {
        let clozes = tokenize("{{a very\nlong answer}}", 0);
        assert_eq!(clozes[0].answer, "a very long answer");
    }

    #[test]
    fn test_whitespace_normalization_preserves_paragraph() {
        let clozes = tokenize("{{first para\n\nsecond para}}", 0);
        assert_eq!(clozes[0].answer, "first para\n\nsecond para");
    }

    #[test]
    fn test_group_and_sequence_ids() {
        let clozes = tokenize("{{1.1>a}} {{1.2>b}} {{1.3>c}}", 0);
        assert_eq!(clozes.len(), 3);
        assert_eq!(clozes[0].group_id.as_deref(), Some("1"));
        assert_eq!(clozes[0].sequence_order, Some(1));
        assert_eq!(clozes[1].sequence_order, Some(2));
    }

    #[test]
    fn test_group_without_sequence() {
        let clozes = tokenize("{{1>apples}} and {{1>oranges}}", 0);
        assert_eq!(clozes[0].group_id.as_deref(), Some("1"));
        assert_eq!(clozes[0].sequence_order, None);
        assert_eq!(clozes[1].group_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_ids_order_irrelevant() {
        let a = tokenize("{{1,abc>x}}", 0);
        let b = tokenize("{{abc,1>x}}", 0);
        assert_eq!(a[0].group_id, b[0].group_id);
        assert_eq!(a[0].note_id_code, b[0].note_id_code);
    }

    #[test]
    fn test_note_id_code_parsed() {
        let clozes = tokenize("{{abcdef>42}}", 0);
        assert_eq!(clozes[0].note_id_code.as_deref(), Some("abcdef"));
        assert_eq!(clozes[0].answer, "42");
    }

    #[test]
    fn test_invalid_code_with_digits_is_a_group_id_not_a_code() {
        // `abc123` is neither pure digits nor letters-only, so per §4.1 it is
        // simply ignored as an id fragment; the cloze still parses.
        let clozes = tokenize("{{abc123>42}}", 0);
        assert_eq!(clozes[0].note_id_code, None);
        assert_eq!(clozes[0].group_id, None);
    }

    #[test]
    fn test_hint_and_extra() {
        let clozes = tokenize("{{answer|hint<extra}}", 0);
        assert_eq!(clozes[0].answer, "answer");
        assert_eq!(clozes[0].hint.as_deref(), Some("hint"));
        assert_eq!(clozes[0].extra.as_deref(), Some("extra"));
    }

    #[test]
    fn test_scope_suffix_single_negative() {
        let clozes = tokenize("{{a}}[-1]", 0);
        assert_eq!(clozes[0].scope, Scope { before: -1, after: 0 });
    }

    #[test]
    fn test_scope_suffix_pair() {
        let clozes = tokenize("{{a}}[-2,3]", 0);
        assert_eq!(
            clozes[0].scope,
            Scope {
                before: -2,
                after: 3
            }
        );
    }

    #[test]
    fn test_default_scope() {
        let clozes = tokenize("{{a}}", 0);
        assert_eq!(clozes[0].scope, Scope::DEFAULT);
    }

    #[test]
    fn test_line_number_tracked_across_newlines() {
        let clozes = tokenize("line0\nline1\n{{a}}", 5);
        assert_eq!(clozes[0].line_number, 7);
    }

    #[test]
    fn test_unbalanced_braces_no_closer() {
        assert!(tokenize("{{no closer here", 0).is_empty());
    }
}
