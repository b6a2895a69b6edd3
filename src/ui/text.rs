//! Width-aware text helpers
//!
//! Every string drawn into a panel goes through these so content never
//! spills past its allotted columns.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '…';

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]")
        .expect("Invalid ANSI regex")
});

/// Display width in terminal columns
pub fn width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` to at most `max` columns, ending in `…` when anything was dropped
pub fn truncate(s: &str, max: usize) -> String {
    if width(s) <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let budget = max - 1;
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push(ELLIPSIS);
    out
}

/// Truncate, then right-pad with spaces to exactly `cols` columns
pub fn fit(s: &str, cols: usize) -> String {
    let mut out = truncate(s, cols);
    let w = width(&out);
    if w < cols {
        out.push_str(&" ".repeat(cols - w));
    }
    out
}

/// Strip escape sequences and control characters from a log line
pub fn sanitize(line: &str) -> String {
    let stripped = ANSI_ESCAPE.replace_all(line, "");
    stripped
        .chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_strings_pass_through() {
        assert_eq!(truncate("web", 10), "web");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn long_strings_end_in_ellipsis() {
        assert_eq!(truncate("postgres-primary", 8), "postgre…");
        assert_eq!(width(&truncate("postgres-primary", 8)), 8);
        assert_eq!(truncate("abc", 1), "…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn wide_characters_respect_columns() {
        let cut = truncate("日本語のログ", 5);
        assert!(width(&cut) <= 5, "{cut}");
        assert!(cut.ends_with(ELLIPSIS));
    }

    #[test]
    fn fit_pads_to_exact_width() {
        assert_eq!(fit("ab", 5), "ab   ");
        assert_eq!(fit("abcdefgh", 5), "abcd…");
        assert_eq!(width(&fit("日本", 5)), 5);
    }

    #[test]
    fn sanitize_removes_escapes_and_controls() {
        assert_eq!(sanitize("\u{1b}[1;31mERROR\u{1b}[0m boom"), "ERROR boom");
        assert_eq!(sanitize("a\tb\r"), "a b");
        assert_eq!(sanitize("\u{1b}]0;title\u{7}text"), "text");
    }
}
