//! ID writer (C9, §4.8).
//!
//! Runs after every prompt in a file has been synced. Re-tokenizes the
//! *whole* document (rather than trusting any single context's relative
//! byte ranges) so every replacement's `byte_start` is valid against the
//! file being rewritten, matching the precedent set by the prompt
//! generator's own scope-expansion path (§4.4).

use crate::helpers::split_first;
use crate::model::{Cloze, ClozeVariant};
use crate::parsers::tokenizer::tokenize;
use std::collections::HashMap;

struct Replacement {
    byte_start: usize,
    old_full_text: String,
    new_full_text: String,
}

/// Builds the new `full_text` for `cloze` once it has been assigned
/// `code`, preserving the author's original `content_part` verbatim
/// (§4.8 step 3).
fn rebuild_full_text(cloze: &Cloze, code: &str) -> String {
    let ids_part = match cloze.variant() {
        ClozeVariant::Sequence => format!(
            "{}.{},{}",
            cloze.group_id.as_deref().unwrap_or_default(),
            cloze.sequence_order.unwrap_or_default(),
            code
        ),
        ClozeVariant::Grouped => format!("{},{}", cloze.group_id.as_deref().unwrap_or_default(), code),
        ClozeVariant::Basic => code.to_string(),
    };

    let without_open = cloze.full_text.strip_prefix("{{").unwrap_or(&cloze.full_text);
    let (interior, scope_suffix) = match without_open.rfind("}}") {
        Some(idx) => (&without_open[..idx], &without_open[idx + 2..]),
        None => (without_open, ""),
    };
    let content_part = split_first(interior, '>').map_or(interior, |(_ids, rest)| rest);

    format!("{{{{{ids_part}>{content_part}}}}}{scope_suffix}")
}

/// Rewrites `document`'s source text, assigning each cloze identified in
/// `assigned` (keyed by `(full_text, line_number)` identity, mapping to
/// its freshly encoded [`crate::codec`] code) its new `ids_part` (§4.8).
/// Clozes not present in `assigned` — because they already carried a
/// valid code, or were untouched this run — are left byte-for-byte alone.
#[must_use]
pub fn rewrite_source(document: &str, assigned: &HashMap<(String, usize), String>) -> String {
    if assigned.is_empty() {
        return document.to_string();
    }

    let doc_clozes = tokenize(document, 0);
    let mut replacements = Vec::new();
    for cloze in &doc_clozes {
        let key = (cloze.full_text.clone(), cloze.line_number);
        let Some(code) = assigned.get(&key) else {
            continue;
        };
        let new_full_text = rebuild_full_text(cloze, code);
        if new_full_text == cloze.full_text {
            continue;
        }
        replacements.push(Replacement {
            byte_start: cloze.byte_range.start,
            old_full_text: cloze.full_text.clone(),
            new_full_text,
        });
    }

    apply_replacements(document, replacements)
}

/// Applies `replacements` in descending `byte_start` order so earlier
/// indices remain valid as later (higher-offset) edits are applied first
/// (§4.8 step 4).
fn apply_replacements(document: &str, mut replacements: Vec<Replacement>) -> String {
    replacements.sort_by(|a, b| b.byte_start.cmp(&a.byte_start));
    let mut result = document.to_string();
    for r in replacements {
        let end = r.byte_start + r.old_full_text.len();
        if result.get(r.byte_start..end) == Some(r.old_full_text.as_str()) {
            result.replace_range(r.byte_start..end, &r.new_full_text);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_noop_when_nothing_assigned() {
        let doc = "The answer is {{42}}.";
        assert_eq!(rewrite_source(doc, &HashMap::new()), doc);
    }

    #[test]
    fn test_basic_cloze_gets_code() {
        let doc = "The answer is {{42}}.";
        let mut assigned = HashMap::new();
        assigned.insert(("{{42}}".to_string(), 0), "dmSkYk".to_string());
        assert_eq!(
            rewrite_source(doc, &assigned),
            "The answer is {{dmSkYk>42}}."
        );
    }

    #[test]
    fn test_grouped_clozes_both_get_same_code() {
        let doc = "I like {{1>apples}} and {{1>oranges}}.";
        let mut assigned = HashMap::new();
        assigned.insert(("{{1>apples}}".to_string(), 0), "ab".to_string());
        assigned.insert(("{{1>oranges}}".to_string(), 0), "ab".to_string());
        assert_eq!(
            rewrite_source(doc, &assigned),
            "I like {{1,ab>apples}} and {{1,ab>oranges}}."
        );
    }

    #[test]
    fn test_sequence_cloze_gets_code() {
        let doc = "Steps: {{1.1>a}} {{1.2>b}} {{1.3>c}}.";
        let mut assigned = HashMap::new();
        assigned.insert(("{{1.1>a}}".to_string(), 0), "x".to_string());
        let rewritten = rewrite_source(doc, &assigned);
        assert!(rewritten.contains("{{1.1,x>a}}"));
        assert!(rewritten.contains("{{1.2>b}}"));
    }

    #[test]
    fn test_already_coded_cloze_untouched() {
        let doc = "{{abcdef>42}}";
        assert_eq!(rewrite_source(doc, &HashMap::new()), doc);
    }

    #[test]
    fn test_scope_suffix_preserved() {
        let doc = "{{42}}[-1]";
        let mut assigned = HashMap::new();
        assigned.insert(("{{42}}[-1]".to_string(), 0), "b".to_string());
        assert_eq!(rewrite_source(doc, &assigned), "{{b>42}}[-1]");
    }
}
