//! Small free functions shared across the parser/rewriter pipeline.

/// Collapses whitespace the way the tokenizer requires for `answer`/`hint`/
/// `extra` (§4.1) and the way the math extractor requires inside a math
/// region (§4.6). Both call sites need the exact same transformation, so it
/// lives here once rather than being reimplemented twice (§9).
///
/// Runs of two or more consecutive newlines become a paragraph break
/// (preserved as `\n\n`); any remaining single newline becomes a space;
/// runs of two or more spaces collapse to one; the result is trimmed.
#[must_use]
pub fn normalize_whitespace(s: &str) -> String {
    const PARAGRAPH_PLACEHOLDER: &str = "\u{0}\u{0}PARA\u{0}\u{0}";

    let mut chars = s.chars().peekable();
    let mut with_placeholders = String::with_capacity(s.len());
    while let Some(c) = chars.next() {
        if c == '\n' {
            let mut newline_count = 1;
            while chars.peek() == Some(&'\n') {
                chars.next();
                newline_count += 1;
            }
            if newline_count >= 2 {
                with_placeholders.push_str(PARAGRAPH_PLACEHOLDER);
            } else {
                with_placeholders.push(' ');
            }
        } else {
            with_placeholders.push(c);
        }
    }

    let single_spaced = collapse_spaces(&with_placeholders);
    single_spaced
        .replace(PARAGRAPH_PLACEHOLDER, "\n\n")
        .trim()
        .to_string()
}

fn collapse_spaces(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            while chars.peek() == Some(&' ') {
                chars.next();
            }
            result.push(' ');
        } else {
            result.push(c);
        }
    }
    result
}

/// Splits `s` at the first occurrence of `delim`, returning `(before,
/// after)`. `None` if `delim` does not occur.
#[must_use]
pub fn split_first(s: &str, delim: char) -> Option<(&str, &str)> {
    s.find(delim).map(|idx| (&s[..idx], &s[idx + delim.len_utf8()..]))
}

/// HTML-escapes `s` for insertion into an attribute or text node (§6: both
/// the editor-link URL and its visible text must be escaped).
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_single_newline_becomes_space() {
        assert_eq!(
            normalize_whitespace("a very\nlong answer"),
            "a very long answer"
        );
    }

    #[test]
    fn test_normalize_preserves_paragraph_break() {
        assert_eq!(
            normalize_whitespace("first para\n\nsecond para"),
            "first para\n\nsecond para"
        );
    }

    #[test]
    fn test_normalize_collapses_spaces_and_trims() {
        assert_eq!(normalize_whitespace("  a   b  "), "a b");
    }

    #[test]
    fn test_normalize_three_newlines_still_one_break() {
        assert_eq!(normalize_whitespace("a\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_split_first() {
        assert_eq!(split_first("a>b>c", '>'), Some(("a", "b>c")));
        assert_eq!(split_first("abc", '>'), None);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">'&'</a>"),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }
}
