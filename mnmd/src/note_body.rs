//! Note body formatter (C7, §4.6).
//!
//! Turns a masked `body_template` (Markdown with `__CLOZE__` / `__CLOZE_i__`
//! placeholders) into the HTML the remote note's `Text` field stores, with
//! math regions and cloze blanks protected from the Markdown renderer.

use crate::helpers::normalize_whitespace;
use crate::model::Cloze;
use pulldown_cmark::{html, Event, Options, Parser};

const CLOZE_PLACEHOLDER_SENTINEL: char = '\u{e001}';
const MATH_PLACEHOLDER_SENTINEL: char = '\u{e000}';

struct MathRegion {
    placeholder: String,
    rendered: String,
}

/// Renders `body_template` into the note's `Text` field HTML, restoring
/// cloze blanks as `{{c1::answer}}` / `{{c1::answer::hint}}`. `group_members`
/// is `Some` only for a grouped (non-sequence) prompt with ≥ 2 members,
/// indexed by `__CLOZE_i__`.
#[must_use]
pub fn format_note_body(body_template: &str, primary: &Cloze, group_members: Option<&[Cloze]>) -> String {
    let (text, cloze_slots) = extract_cloze_placeholders(body_template);
    let (text, math_regions) = extract_math(&text);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(&text, options).map(|event| match event {
        // nl2br semantics: a single newline becomes a hard break, matching
        // the reference tool's Markdown `nl2br` extension (§10).
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });
    let mut html_out = String::new();
    html::push_html(&mut html_out, parser);

    let html_out = strip_single_paragraph_wrapper(&html_out);
    let html_out = restore_math(&html_out, &math_regions);
    restore_cloze_placeholders(&html_out, &cloze_slots, primary, group_members)
}

/// Converts `$$…$$` / `$…$` inside a standalone string (an `answer` or
/// `hint`, never Markdown-rendered in its own right) to `\[…\]` / `\(…\)`
/// (§4.6 step 6).
#[must_use]
pub fn convert_math_delimiters(s: &str) -> String {
    let (stripped, regions) = extract_math(s);
    restore_math(&stripped, &regions)
}

fn extract_cloze_placeholders(text: &str) -> (String, Vec<Option<usize>>) {
    let mut result = String::with_capacity(text.len());
    let mut slots = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("__CLOZE") {
        result.push_str(&rest[..start]);
        let after = &rest[start + "__CLOZE".len()..];

        if let Some(remainder) = after.strip_prefix("__") {
            slots.push(None);
            result.push(CLOZE_PLACEHOLDER_SENTINEL);
            result.push_str(&(slots.len() - 1).to_string());
            result.push(CLOZE_PLACEHOLDER_SENTINEL);
            rest = remainder;
        } else if let Some(after_underscore) = after.strip_prefix('_') {
            let digits_end = after_underscore.find("__").filter(|&end| {
                end > 0 && after_underscore[..end].bytes().all(|b| b.is_ascii_digit())
            });
            if let Some(end) = digits_end {
                let idx: usize = after_underscore[..end].parse().expect("all-digit prefix");
                slots.push(Some(idx));
                result.push(CLOZE_PLACEHOLDER_SENTINEL);
                result.push_str(&(slots.len() - 1).to_string());
                result.push(CLOZE_PLACEHOLDER_SENTINEL);
                rest = &after_underscore[end + "__".len()..];
            } else {
                result.push_str("__CLOZE");
                rest = after;
            }
        } else {
            result.push_str("__CLOZE");
            rest = after;
        }
    }
    result.push_str(rest);
    (result, slots)
}

fn cloze_slot_token(idx: usize) -> String {
    format!("{CLOZE_PLACEHOLDER_SENTINEL}{idx}{CLOZE_PLACEHOLDER_SENTINEL}")
}

fn restore_cloze_placeholders(
    html: &str,
    slots: &[Option<usize>],
    primary: &Cloze,
    group_members: Option<&[Cloze]>,
) -> String {
    let mut result = html.to_string();
    for (i, slot) in slots.iter().enumerate() {
        let cloze = match slot {
            Some(idx) => group_members.and_then(|members| members.get(*idx)).unwrap_or(primary),
            None => primary,
        };
        let mut replacement = String::from("{{c1::");
        replacement.push_str(&convert_math_delimiters(&cloze.answer));
        if let Some(hint) = &cloze.hint {
            replacement.push_str("::");
            replacement.push_str(&convert_math_delimiters(hint));
        }
        replacement.push_str("}}");
        result = result.replace(&cloze_slot_token(i), &replacement);
    }
    result
}

/// Finds `$$…$$` then `$…$` regions in `text`, in that precedence order
/// (so a `$$` pair is never mistaken for two adjacent inline regions),
/// replacing each with a unique placeholder and remembering its rendered
/// delimited form with whitespace normalized per §4.1.
fn extract_math(text: &str) -> (String, Vec<MathRegion>) {
    let mut result = String::with_capacity(text.len());
    let mut regions = Vec::new();
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        if let Some(stripped) = rest.strip_prefix("$$") {
            if let Some(close) = stripped.find("$$") {
                let inner = &stripped[..close];
                push_math_region(&mut result, &mut regions, inner, "\\[", "\\]");
                i += 2 + close + 2;
                continue;
            }
        } else if let Some(stripped) = rest.strip_prefix('$') {
            if let Some(close) = stripped.find('$') {
                let inner = &stripped[..close];
                push_math_region(&mut result, &mut regions, inner, "\\(", "\\)");
                i += 1 + close + 1;
                continue;
            }
        }
        let ch_len = rest.chars().next().map_or(1, char::len_utf8);
        result.push_str(&text[i..i + ch_len]);
        i += ch_len;
    }
    (result, regions)
}

fn push_math_region(result: &mut String, regions: &mut Vec<MathRegion>, inner: &str, open: &str, close: &str) {
    let placeholder = format!("{MATH_PLACEHOLDER_SENTINEL}{}{MATH_PLACEHOLDER_SENTINEL}", regions.len());
    let rendered = format!("{open}{}{close}", normalize_whitespace(inner));
    result.push_str(&placeholder);
    regions.push(MathRegion { placeholder, rendered });
}

fn restore_math(html: &str, regions: &[MathRegion]) -> String {
    let mut result = html.to_string();
    for region in regions {
        result = result.replace(&region.placeholder, &region.rendered);
    }
    result
}

/// Strips the `<p>…</p>` wrapper iff the whole HTML is exactly one
/// paragraph (§4.6 step 4).
fn strip_single_paragraph_wrapper(html: &str) -> String {
    let trimmed = html.trim_end_matches('\n');
    if let Some(inner) = trimmed.strip_prefix("<p>").and_then(|s| s.strip_suffix("</p>")) {
        if !inner.contains("<p>") {
            return inner.to_string();
        }
    }
    html.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scope;
    use pretty_assertions::assert_eq;

    fn basic_cloze(answer: &str, hint: Option<&str>) -> Cloze {
        Cloze::new(
            format!("{{{{{answer}}}}}"),
            0..1,
            0,
            None,
            None,
            None,
            answer.to_string(),
            hint.map(str::to_string),
            None,
            Scope::DEFAULT,
        )
    }

    #[test]
    fn test_single_cloze_basic_markdown() {
        let primary = basic_cloze("42", None);
        let out = format_note_body("The answer is __CLOZE__.", &primary, None);
        assert_eq!(out, "The answer is {{c1::42}}.");
    }

    #[test]
    fn test_cloze_with_hint() {
        let primary = basic_cloze("42", Some("a number"));
        let out = format_note_body("The answer is __CLOZE__.", &primary, None);
        assert_eq!(out, "The answer is {{c1::42::a number}}.");
    }

    #[test]
    fn test_math_conversion_inline() {
        let primary = basic_cloze("$E = mc^2$", Some("famous"));
        let out = format_note_body("Einstein's __CLOZE__.", &primary, None);
        assert_eq!(out, r"Einstein's {{c1::\(E = mc^2\)::famous}}.");
    }

    #[test]
    fn test_math_conversion_display() {
        let primary = basic_cloze("x", None);
        let out = format_note_body("Given $$a + b = c$$, find __CLOZE__.", &primary, None);
        assert!(out.contains(r"\[a + b = c\]"));
    }

    #[test]
    fn test_grouped_clozes_both_restored() {
        let a = basic_cloze("apples", None);
        let b = basic_cloze("oranges", None);
        let out = format_note_body(
            "I like __CLOZE_0__ and __CLOZE_1__.",
            &a,
            Some(&[a.clone(), b.clone()]),
        );
        assert_eq!(out, "I like {{c1::apples}} and {{c1::oranges}}.");
    }

    #[test]
    fn test_single_paragraph_wrapper_stripped() {
        let primary = basic_cloze("42", None);
        let out = format_note_body("**Bold** answer is __CLOZE__.", &primary, None);
        assert!(!out.contains("<p>"));
        assert!(out.contains("<strong>Bold</strong>"));
    }

    #[test]
    fn test_nl2br_hard_break_on_single_newline() {
        let primary = basic_cloze("42", None);
        let out = format_note_body("Line one\nhas __CLOZE__.", &primary, None);
        assert!(out.contains("<br"));
    }

    #[test]
    fn test_convert_math_delimiters_standalone() {
        assert_eq!(convert_math_delimiters("$a^2$"), r"\(a^2\)");
        assert_eq!(convert_math_delimiters("$$a^2$$"), r"\[a^2\]");
        assert_eq!(convert_math_delimiters("no math"), "no math");
    }
}
