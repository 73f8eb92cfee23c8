//! Card context extraction (C4, §4.2).

use fancy_regex::Regex;
use std::sync::LazyLock;

static CLOZE_PRESENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{.+?\}\}").unwrap());

/// A region of source identified as a card backdrop, before tokenization.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawContext {
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    /// True for an explicit `> ?` block, false for an implicit paragraph.
    pub is_explicit: bool,
}

/// Splits `document` into explicit `> ?` blocks and implicit paragraphs
/// containing at least one cloze, in ascending `start_line` order.
#[must_use]
pub fn extract_contexts(document: &str) -> Vec<RawContext> {
    let lines: Vec<&str> = document.lines().collect();
    let mut contexts = Vec::new();
    let mut explicit_line_ranges: Vec<(usize, usize)> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim() == "> ?" {
            let block_start = i;
            let mut j = i;
            while j < lines.len() && lines[j].starts_with('>') {
                j += 1;
            }
            let block_end = j - 1;
            explicit_line_ranges.push((block_start, block_end));

            let mut cleaned: Vec<&str> = lines[block_start..=block_end]
                .iter()
                .map(|line| strip_quote_prefix(line))
                .collect();
            let mut start_line = block_start;
            if cleaned.first().map(|s| s.trim()) == Some("?") {
                cleaned.remove(0);
                start_line += 1;
            }
            contexts.push(RawContext {
                content: cleaned.join("\n"),
                start_line,
                end_line: block_end,
                is_explicit: true,
            });
            i = j;
        } else {
            i += 1;
        }
    }

    for (start, end) in find_paragraphs(&lines, &explicit_line_ranges) {
        let candidate = lines[start..=end].join("\n");
        if CLOZE_PRESENT_RE.is_match(&candidate).unwrap_or(false) {
            contexts.push(RawContext {
                content: candidate,
                start_line: start,
                end_line: end,
                is_explicit: false,
            });
        }
    }

    contexts.sort_by_key(|c| c.start_line);
    contexts
}

fn strip_quote_prefix(line: &str) -> &str {
    let rest = line.strip_prefix('>').unwrap_or(line);
    rest.strip_prefix(' ').unwrap_or(rest)
}

/// Maximal runs of non-blank lines not already covered by an explicit block.
fn find_paragraphs(lines: &[&str], explicit: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut paragraphs = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim().is_empty() || in_explicit(i, explicit) {
            i += 1;
            continue;
        }
        let start = i;
        let mut j = i;
        while j < lines.len() && !lines[j].trim().is_empty() && !in_explicit(j, explicit) {
            j += 1;
        }
        paragraphs.push((start, j - 1));
        i = j;
    }
    paragraphs
}

fn in_explicit(line: usize, explicit: &[(usize, usize)]) -> bool {
    explicit.iter().any(|&(s, e)| line >= s && line <= e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_implicit_paragraph_with_cloze() {
        let doc = "Some prose with {{a cloze}} in it.";
        let contexts = extract_contexts(doc);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].start_line, 0);
    }

    #[test]
    fn test_paragraph_without_cloze_is_not_a_context() {
        let doc = "Just prose, nothing occluded.";
        assert!(extract_contexts(doc).is_empty());
    }

    #[test]
    fn test_explicit_block_strips_quote_and_question_leader() {
        let doc = "> ?\n> What is {{this}}?\n> Some more context.";
        let contexts = extract_contexts(doc);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].content, "What is {{this}}?\nSome more context.");
        assert_eq!(contexts[0].start_line, 1);
    }

    #[test]
    fn test_explicit_and_implicit_do_not_overlap() {
        let doc = "> ?\n> {{a}}\n\nOutside paragraph with {{b}}.";
        let contexts = extract_contexts(doc);
        assert_eq!(contexts.len(), 2);
        assert!(contexts[0].start_line < contexts[1].start_line);
    }

    #[test]
    fn test_blank_lines_separate_paragraphs() {
        let doc = "{{a}}\n\n{{b}}";
        let contexts = extract_contexts(doc);
        assert_eq!(contexts.len(), 2);
    }
}
