//! Scope resolver (C5, §4.3).

use crate::model::Scope;

/// Maximal runs of non-empty lines, as `(first_line, last_line)` pairs.
#[must_use]
pub fn paragraph_boundaries(lines: &[&str]) -> Vec<(usize, usize)> {
    let mut paragraphs = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim().is_empty() {
            i += 1;
            continue;
        }
        let start = i;
        let mut j = i;
        while j < lines.len() && !lines[j].trim().is_empty() {
            j += 1;
        }
        paragraphs.push((start, j - 1));
        i = j;
    }
    paragraphs
}

/// Expands the paragraph containing line `target_line` by `scope.before`
/// (non-positive) and `scope.after` (non-negative), bounded by the document,
/// and returns the resulting line slice of `document` joined by `\n`. If
/// `target_line` falls in no paragraph (e.g. a blank line), the full
/// document is returned.
#[must_use]
pub fn resolve_scope(document: &str, target_line: usize, scope: Scope) -> String {
    let lines: Vec<&str> = document.lines().collect();
    let (start_line, end_line) = resolve_scope_line_range(document, target_line, scope)
        .unwrap_or((0, lines.len().saturating_sub(1)));
    lines[start_line..=end_line].join("\n")
}

/// As [`resolve_scope`], but returns the inclusive `(start_line, end_line)`
/// range instead of the joined text, so callers can relate the slice back
/// to absolute document positions. `None` if `target_line` falls in no
/// paragraph.
#[must_use]
pub fn resolve_scope_line_range(
    document: &str,
    target_line: usize,
    scope: Scope,
) -> Option<(usize, usize)> {
    let lines: Vec<&str> = document.lines().collect();
    let paragraphs = paragraph_boundaries(&lines);
    let idx = paragraphs
        .iter()
        .position(|&(first, last)| target_line >= first && target_line <= last)?;

    let idx = idx as i64;
    let lo = (idx + i64::from(scope.before)).max(0) as usize;
    let hi = ((idx + i64::from(scope.after)) as usize).min(paragraphs.len().saturating_sub(1));

    Some((paragraphs[lo].0, paragraphs[hi].1))
}
