//! Locating the first balanced delimiter pair in a string.
//!
//! A delimiter preceded by `\` is escaped and never counts towards nesting.

use crate::error::{Result, ScriptError};

/// The before / inside / after decomposition of a string around its first
/// balanced bracket pair.
///
/// `prefix` is only non-empty for function calls, where it holds the matched
/// function name exactly as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketSpan<'a> {
    pub before: &'a str,
    pub prefix: &'a str,
    pub inside: &'a str,
    pub after: &'a str,
    pub open: char,
    pub close: char,
}

impl BracketSpan<'_> {
    /// Replace the whole span (prefix and delimiters included).
    pub fn splice(&self, replacement: &str) -> String {
        let mut out =
            String::with_capacity(self.before.len() + replacement.len() + self.after.len());
        out.push_str(self.before);
        out.push_str(replacement);
        out.push_str(self.after);
        out
    }

    /// Keep prefix and delimiters, swap in new inner text.
    pub fn rewrap(&self, inner: &str) -> String {
        let mut out = String::with_capacity(
            self.before.len() + self.prefix.len() + inner.len() + self.after.len() + 2,
        );
        out.push_str(self.before);
        out.push_str(self.prefix);
        out.push(self.open);
        out.push_str(inner);
        out.push(self.close);
        out.push_str(self.after);
        out
    }
}

/// Byte offset of the first unescaped `ch` at or after `from`.
pub fn find_unescaped(text: &str, ch: char, from: usize) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in text[from..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == ch {
            return Some(from + i);
        }
    }
    None
}

pub fn contains_unescaped(text: &str, ch: char) -> bool {
    find_unescaped(text, ch, 0).is_some()
}

/// Byte offset where `name` followed directly by `open` first appears.
/// The name is compared ASCII case-insensitively.
pub fn find_call(text: &str, name: &str, open: char) -> Option<usize> {
    if name.is_empty() {
        return None;
    }
    let mut needle = name.to_ascii_lowercase();
    needle.push(open);
    // ASCII lowercasing keeps byte offsets intact.
    text.to_ascii_lowercase().find(&needle)
}

/// Offset of the delimiter closing the one at `open_at`.
fn matching_close(text: &str, open_at: usize, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in text[open_at..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(open_at + i);
            }
        }
    }
    None
}

fn malformed(text: &str, open: char, close: char) -> ScriptError {
    ScriptError::MalformedBracket {
        open,
        close,
        text: text.to_string(),
    }
}

fn span_at<'a>(
    text: &'a str,
    prefix_at: usize,
    open_at: usize,
    open: char,
    close: char,
) -> Result<BracketSpan<'a>> {
    let close_at =
        matching_close(text, open_at, open, close).ok_or_else(|| malformed(text, open, close))?;
    Ok(BracketSpan {
        before: &text[..prefix_at],
        prefix: &text[prefix_at..open_at],
        inside: &text[open_at + open.len_utf8()..close_at],
        after: &text[close_at + close.len_utf8()..],
        open,
        close,
    })
}

/// Focus the first complete `open`…`close` pair.
///
/// ```text
/// a{b{c}d}e  ->  before "a", inside "b{c}d", after "e"
/// ```
pub fn focus_first(text: &str, open: char, close: char) -> Result<BracketSpan<'_>> {
    let open_at = find_unescaped(text, open, 0).ok_or_else(|| malformed(text, open, close))?;
    span_at(text, open_at, open_at, open, close)
}

/// Focus the first `name(`…`)` call, with `name` as the span's prefix.
pub fn focus_call<'a>(
    text: &'a str,
    name: &str,
    open: char,
    close: char,
) -> Result<BracketSpan<'a>> {
    let prefix_at = find_call(text, name, open).ok_or_else(|| malformed(text, open, close))?;
    span_at(text, prefix_at, prefix_at + name.len(), open, close)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_outer_pair_first() {
        let span = focus_first("a{b{c}d}e", '{', '}').unwrap();
        assert_eq!(span.before, "a");
        assert_eq!(span.inside, "b{c}d");
        assert_eq!(span.after, "e");
        assert_eq!(span.prefix, "");
    }

    #[test]
    fn first_of_two_siblings() {
        let span = focus_first("{1}+{2}", '{', '}').unwrap();
        assert_eq!(span.inside, "1");
        assert_eq!(span.after, "+{2}");
    }

    #[test]
    fn unbalanced_is_malformed() {
        let err = focus_first("val{2+", '{', '}').unwrap_err();
        assert!(matches!(err, ScriptError::MalformedBracket { open: '{', .. }));
    }

    #[test]
    fn absent_is_malformed() {
        assert!(focus_first("plain", '{', '}').is_err());
    }

    #[test]
    fn escaped_delimiters_are_skipped() {
        let span = focus_first(r"\{x} {y}", '{', '}').unwrap();
        assert_eq!(span.inside, "y");
        assert_eq!(span.before, r"\{x} ");

        let span = focus_first(r"{a\}b}", '{', '}').unwrap();
        assert_eq!(span.inside, r"a\}b");
        assert!(!contains_unescaped(r"\{", '{'));
    }

    #[test]
    fn call_keeps_prefix_as_written() {
        let span = focus_call("[Double(2),1]", "double", '(', ')').unwrap();
        assert_eq!(span.before, "[");
        assert_eq!(span.prefix, "Double");
        assert_eq!(span.inside, "2");
        assert_eq!(span.after, ",1]");
        assert_eq!(span.splice("4"), "[4,1]");
        assert_eq!(span.rewrap("3"), "[Double(3),1]");
    }

    #[test]
    fn call_with_nested_parens() {
        let span = focus_call("f(g(1),2)", "f", '(', ')').unwrap();
        assert_eq!(span.inside, "g(1),2");
    }

    #[test]
    fn call_needs_the_open_delimiter() {
        assert_eq!(find_call("double 2", "double", '('), None);
        assert_eq!(find_call("x double(2", "double", '('), Some(2));
        assert!(focus_call("x double(2", "double", '(', ')').is_err());
    }
}
