//! Text cleanup and truncation for extracted titles and abstracts.

use std::sync::OnceLock;

use regex::Regex;

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Zero-width, bidi, soft-hyphen and private-use codepoints that result
/// pages sprinkle into titles and abstracts.
fn invisible_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\x{00AD}\x{200B}-\x{200F}\x{2060}\x{FEFF}\x{E000}-\x{F8FF}]")
            .expect("Failed to compile invisible-char pattern")
    })
}

/// Removes invisible codepoints, collapses whitespace runs (including
/// non-breaking and ideographic spaces) into one ASCII space and trims.
pub fn clean(raw: &str) -> String {
    let visible = invisible_chars().replace_all(raw, "");
    visible.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips every leading occurrence of `title` from `abstract_text`, along
/// with separators left behind (`Title - Title: body` becomes `body`).
///
/// Both inputs are expected to be cleaned already.
pub fn strip_title_prefix(abstract_text: &str, title: &str) -> String {
    if title.is_empty() {
        return abstract_text.to_string();
    }

    let mut rest = abstract_text;
    while let Some(after) = rest.strip_prefix(title) {
        rest = after.trim_start_matches(|c: char| {
            c.is_whitespace() || matches!(c, '-' | '|' | ':' | '_' | '：' | '—')
        });
    }
    rest.to_string()
}

/// Cuts `s` to at most `max_len` characters on a word boundary and appends
/// [`ELLIPSIS`]. Text that already fits is returned unchanged.
///
/// When the first `max_len` characters contain no whitespace (typical of
/// CJK text) the cut falls exactly at `max_len`.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }

    let cut = s
        .char_indices()
        .nth(max_len)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len());
    let head = &s[..cut];
    let at_boundary = s[cut..].chars().next().is_some_and(char::is_whitespace);

    let body = if at_boundary {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(idx) if idx > 0 => &head[..idx],
            _ => head,
        }
    };

    format!("{}{}", body.trim_end(), ELLIPSIS)
}

/// Full abstract pipeline: clean, drop a repeated title, truncate.
pub fn normalize_abstract(raw_abstract: &str, clean_title: &str, max_len: usize) -> String {
    let cleaned = clean(raw_abstract);
    let stripped = strip_title_prefix(&cleaned, clean_title);
    truncate(&stripped, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_collapses_whitespace() {
        assert_eq!(clean("  Rust \n\t programming  "), "Rust programming");
        assert_eq!(clean("a\u{00A0}\u{00A0}b"), "a b");
        assert_eq!(clean("中文\u{3000}标题"), "中文 标题");
    }

    #[test]
    fn test_clean_strips_invisible_codepoints() {
        assert_eq!(clean("Rust\u{E62B}"), "Rust");
        assert_eq!(clean("Ru\u{200B}st \u{FEFF}lang"), "Rust lang");
        assert_eq!(clean("\u{200D}\u{E000} title \u{F8FF}"), "title");
    }

    #[test]
    fn test_clean_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean(" \u{00A0}\u{200B} "), "");
    }

    #[test]
    fn test_clean_is_idempotent() {
        let samples = [
            "  a  b  ",
            "x\u{00A0}\u{200B} y\u{E001}",
            "\u{FEFF}\u{FEFF}",
            "百度 \u{3000} 一下\n\n你就知道",
            "plain",
        ];
        for sample in samples {
            let once = clean(sample);
            assert_eq!(clean(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_strip_title_prefix() {
        assert_eq!(
            strip_title_prefix("Rust Language - a systems language", "Rust Language"),
            "a systems language"
        );
        assert_eq!(strip_title_prefix("body text", "Title"), "body text");
        assert_eq!(strip_title_prefix("Title", "Title"), "");
        assert_eq!(strip_title_prefix("text", ""), "text");
    }

    #[test]
    fn test_strip_title_prefix_repeated() {
        let stripped = strip_title_prefix("Rust - Rust: Rust rules", "Rust");
        assert_eq!(stripped, "rules");
        assert!(!stripped.starts_with("Rust"));
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("short", 20), "short");
        assert_eq!(truncate("exactly ten", 11), "exactly ten");
    }

    #[test]
    fn test_truncate_backs_off_to_word_boundary() {
        let text = "Buy tickets now BuyTickets now cheap flights to everywhere";
        assert_eq!(truncate(text, 20), "Buy tickets now...");
    }

    #[test]
    fn test_truncate_cut_on_space_keeps_whole_prefix() {
        assert_eq!(truncate("hello world again", 11), "hello world...");
    }

    #[test]
    fn test_truncate_without_spaces_cuts_hard() {
        assert_eq!(truncate("一二三四五六七八九十", 4), "一二三四...");
        assert_eq!(truncate("abcdefghij", 3), "abc...");
    }

    #[test]
    fn test_truncate_never_splits_words() {
        let text = "the quick brown fox jumps over the lazy dog";
        for max_len in 1..text.len() {
            let out = truncate(text, max_len);
            let body = out.strip_suffix(ELLIPSIS).unwrap();
            assert!(body.chars().count() <= max_len);
            assert!(text.starts_with(body));
            let next = text[body.len()..].chars().next();
            let hard_cut = !body.contains(' ') && body.chars().count() == max_len;
            assert!(next == Some(' ') || hard_cut, "split mid-word at {max_len}: {out:?}");
        }
    }

    #[test]
    fn test_normalize_abstract() {
        let out = normalize_abstract("  Rust\u{00A0}Book  Rust Book  the official guide ", "Rust Book", 200);
        assert_eq!(out, "the official guide");
        let out = normalize_abstract("Rust Book learn everything about rust today", "Rust Book", 20);
        assert_eq!(out, "learn everything...");
    }
}
