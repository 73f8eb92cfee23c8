//! Prompt generator (C6, §4.4).

use crate::model::{CardContext, Cloze, ClozeGroup, GroupKey, Prompt};
use crate::parsers::scope::resolve_scope_line_range;
use crate::parsers::tokenizer::tokenize;
use indexmap::IndexMap;
use std::ops::Range;
use std::path::Path;

/// Groups clozes by `group_id`, giving each group-less (BASIC) cloze its
/// own singleton group (§4.4, §9). Groups are emitted in order of first
/// appearance.
#[must_use]
pub fn group_clozes(clozes: &[Cloze]) -> Vec<ClozeGroup> {
    let mut map: IndexMap<GroupKey, Vec<Cloze>> = IndexMap::new();
    for cloze in clozes {
        let key = match &cloze.group_id {
            Some(group_id) => GroupKey::Named(group_id.clone()),
            None => GroupKey::Singleton(cloze.byte_range.start as u64),
        };
        map.entry(key).or_default().push(cloze.clone());
    }
    map.into_iter()
        .map(|(key, mut members)| {
            let is_sequence = members.iter().any(|m| m.sequence_order.is_some());
            if is_sequence {
                members.sort_by_key(|m| (m.sequence_order.unwrap_or(u32::MAX), m.byte_range.start));
            }
            ClozeGroup {
                key,
                is_sequence,
                members,
            }
        })
        .collect()
}

/// Generates every prompt for one card context. Takes the whole document so
/// that a non-default scope on an implicit-paragraph context can reach
/// across paragraphs the extractor did not merge (§4.3, §9).
#[must_use]
pub fn generate_prompts(context: &CardContext, file_path: &Path, full_document: &str) -> Vec<Prompt> {
    let groups = group_clozes(&context.clozes);
    let mut prompts = Vec::new();
    for group in &groups {
        if group.is_sequence {
            prompts.extend(generate_sequence_prompts(group, context, file_path, full_document));
        } else if let Some(prompt) = generate_group_prompt(group, context, file_path, full_document) {
            prompts.push(prompt);
        }
    }
    prompts
}

enum Replacement {
    Target,
    TargetIndexed(usize),
    Answer,
    Ellipsis,
}

/// Two clozes are "the same occurrence" across a re-tokenization (local
/// context vs. the whole document) iff their `full_text` and absolute line
/// number agree; `full_text` is unique by construction of the tokenizer
/// (§4.1), and the line number disambiguates the rare case of two
/// identical-looking clozes on different lines.
fn same_occurrence(a: &Cloze, b: &Cloze) -> bool {
    a.full_text == b.full_text && a.line_number == b.line_number
}

fn apply_mask(text: &str, positioned: &[(Range<usize>, Cloze)], classify: impl Fn(&Cloze) -> Replacement) -> String {
    let mut ordered: Vec<&(Range<usize>, Cloze)> = positioned.iter().collect();
    ordered.sort_by(|a, b| b.0.start.cmp(&a.0.start));

    let mut result = text.to_string();
    for (range, cloze) in ordered {
        let replacement = match classify(cloze) {
            Replacement::Target => "__CLOZE__".to_string(),
            Replacement::TargetIndexed(idx) => format!("__CLOZE_{idx}__"),
            Replacement::Answer => cloze.answer.clone(),
            Replacement::Ellipsis => "...".to_string(),
        };
        result.replace_range(range.clone(), &replacement);
    }
    result
}

/// Resolves the text to mask and the positions of every cloze within it,
/// expanding across paragraphs via the full document when the context is
/// implicit and the primary's scope is non-default (§4.3).
fn text_and_positions(
    context: &CardContext,
    primary: &Cloze,
    full_document: &str,
) -> (String, Vec<(Range<usize>, Cloze)>) {
    let needs_expansion = !context.from_explicit_block && !primary.scope.is_default();
    if !needs_expansion {
        let positions = context
            .clozes
            .iter()
            .map(|c| (c.byte_range.clone(), c.clone()))
            .collect();
        return (context.content.clone(), positions);
    }

    let Some((start_line, end_line)) =
        resolve_scope_line_range(full_document, primary.line_number, primary.scope)
    else {
        let positions = context
            .clozes
            .iter()
            .map(|c| (c.byte_range.clone(), c.clone()))
            .collect();
        return (context.content.clone(), positions);
    };

    let lines: Vec<&str> = full_document.lines().collect();
    let slice_text = lines[start_line..=end_line].join("\n");

    let doc_clozes = tokenize(full_document, 0);
    let positions = doc_clozes
        .into_iter()
        .filter(|c| c.line_number >= start_line && c.line_number <= end_line)
        .filter_map(|c| {
            let idx = slice_text.find(&c.full_text)?;
            let range = idx..idx + c.full_text.len();
            Some((range, c))
        })
        .collect();

    (slice_text, positions)
}

fn generate_group_prompt(
    group: &ClozeGroup,
    context: &CardContext,
    file_path: &Path,
    full_document: &str,
) -> Option<Prompt> {
    let primary = group.members.first()?.clone();
    let (text, positions) = text_and_positions(context, &primary, full_document);

    let classify = |cloze: &Cloze| {
        if let Some(idx) = group.members.iter().position(|m| same_occurrence(m, cloze)) {
            if group.members.len() > 1 {
                Replacement::TargetIndexed(idx)
            } else {
                Replacement::Target
            }
        } else {
            Replacement::Answer
        }
    };
    let body_template = apply_mask(&text, &positions, classify);

    Some(Prompt {
        primary: primary.clone(),
        body_template,
        file_path: file_path.to_path_buf(),
        line_number: primary.line_number,
        group_members: (group.members.len() >= 2).then(|| group.members.clone()),
    })
}

fn generate_sequence_prompts(
    group: &ClozeGroup,
    context: &CardContext,
    file_path: &Path,
    full_document: &str,
) -> Vec<Prompt> {
    let mut prompts = Vec::with_capacity(group.members.len());
    for (i, target) in group.members.iter().enumerate() {
        let (text, positions) = text_and_positions(context, target, full_document);

        let classify = |cloze: &Cloze| {
            if same_occurrence(target, cloze) {
                Replacement::Target
            } else if group.members[..i].iter().any(|m| same_occurrence(m, cloze)) {
                Replacement::Answer
            } else if group.members[i + 1..].iter().any(|m| same_occurrence(m, cloze)) {
                Replacement::Ellipsis
            } else {
                Replacement::Answer
            }
        };
        let body_template = apply_mask(&text, &positions, classify);

        prompts.push(Prompt {
            primary: target.clone(),
            body_template,
            file_path: file_path.to_path_buf(),
            line_number: target.line_number,
            group_members: None,
        });
    }
    prompts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::context::extract_contexts;
    use crate::parsers::tokenizer::tokenize;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn build_context(document: &str) -> CardContext {
        let raw = &extract_contexts(document)[0];
        let clozes = tokenize(&raw.content, raw.start_line);
        CardContext {
            content: raw.content.clone(),
            start_line: raw.start_line,
            end_line: raw.end_line,
            clozes,
            from_explicit_block: raw.is_explicit,
        }
    }

    #[test]
    fn test_basic_cloze_single_prompt() {
        let doc = "The answer is {{42}}.";
        let context = build_context(doc);
        let prompts = generate_prompts(&context, &PathBuf::from("/test.md"), doc);
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].body_template, "The answer is __CLOZE__.");
        assert!(prompts[0].group_members.is_none());
    }

    #[test]
    fn test_grouped_clozes_one_prompt_both_placeholders() {
        let doc = "I like {{1>apples}} and {{1>oranges}}.";
        let context = build_context(doc);
        let prompts = generate_prompts(&context, &PathBuf::from("/test.md"), doc);
        assert_eq!(prompts.len(), 1);
        assert_eq!(
            prompts[0].body_template,
            "I like __CLOZE_0__ and __CLOZE_1__."
        );
        assert_eq!(prompts[0].group_members.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_sequence_clozes_progressive_reveal() {
        let doc = "Steps: {{1.1>a}} {{1.2>b}} {{1.3>c}}.";
        let context = build_context(doc);
        let prompts = generate_prompts(&context, &PathBuf::from("/test.md"), doc);
        assert_eq!(prompts.len(), 3);
        assert_eq!(prompts[1].body_template, "Steps: a __CLOZE__ ....");
    }

    #[test]
    fn test_different_group_shows_answer() {
        let doc = "{{1>x}} and {{2>y}}.";
        let context = build_context(doc);
        let prompts = generate_prompts(&context, &PathBuf::from("/test.md"), doc);
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].body_template, "__CLOZE__ and y.");
        assert_eq!(prompts[1].body_template, "x and __CLOZE__.");
    }

    #[test]
    fn test_scope_expansion_across_paragraphs() {
        let doc = "Context paragraph here.\n\nThe answer is {{here}}[-1].";
        let context = build_context(doc);
        let prompts = generate_prompts(&context, &PathBuf::from("/test.md"), doc);
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].body_template.contains("Context paragraph here."));
        assert!(prompts[0].body_template.contains("__CLOZE__"));
    }

    #[test]
    fn test_default_scope_does_not_expand() {
        let doc = "Before paragraph.\n\nThe answer is {{here}}.\n\nAfter paragraph.";
        let context = build_context(doc);
        let prompts = generate_prompts(&context, &PathBuf::from("/test.md"), doc);
        assert!(!prompts[0].body_template.contains("Before paragraph."));
        assert!(!prompts[0].body_template.contains("After paragraph."));
    }
}
