//! Parser/rewriter pipeline: tokenizer (C3), context extractor (C4), scope
//! resolver (C5), and prompt generator (C6).

pub mod context;
pub mod prompt;
pub mod scope;
pub mod tokenizer;

use crate::model::CardContext;

/// Extracts every card context in `document` and tokenizes each one's
/// clozes, producing the full [`CardContext`] values the rest of the
/// pipeline consumes (§4.1, §4.2).
#[must_use]
pub fn extract_card_contexts(document: &str) -> Vec<CardContext> {
    context::extract_contexts(document)
        .into_iter()
        .map(|raw| CardContext {
            clozes: tokenizer::tokenize(&raw.content, raw.start_line),
            content: raw.content,
            start_line: raw.start_line,
            end_line: raw.end_line,
            from_explicit_block: raw.is_explicit,
        })
        .filter(|ctx| !ctx.clozes.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_card_contexts_implicit_paragraph() {
        let doc = "Some prose with {{a cloze}} in it.";
        let contexts = extract_card_contexts(doc);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].clozes.len(), 1);
        assert!(!contexts[0].from_explicit_block);
    }

    #[test]
    fn test_extract_card_contexts_explicit_block() {
        let doc = "> ?\n> What is {{this}}?";
        let contexts = extract_card_contexts(doc);
        assert_eq!(contexts.len(), 1);
        assert!(contexts[0].from_explicit_block);
    }

    #[test]
    fn test_paragraph_without_clozes_is_skipped() {
        let doc = "Just prose.";
        assert!(extract_card_contexts(doc).is_empty());
    }
}
