//! Inline tag extraction from note bodies.

use regex::Regex;
use std::sync::OnceLock;

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

/// A tag token is `#` immediately followed by identifier characters:
/// ASCII letters/digits/`_`/`-`/`/` plus Hiragana, Katakana, and the
/// CJK ideograph range.
fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| {
        Regex::new(r"#[A-Za-z0-9_\-/\x{3040}-\x{309F}\x{30A0}-\x{30FF}\x{4E00}-\x{9FAF}]+")
            .unwrap()
    })
}

static HEADING_REGEX: OnceLock<Regex> = OnceLock::new();

/// A markdown heading marker: optional leading whitespace, one to six
/// `#` characters, then whitespace. Headings share the `#` sigil with
/// tags and are disambiguated by position in the line.
fn heading_regex() -> &'static Regex {
    HEADING_REGEX.get_or_init(|| Regex::new(r"^[ \t]*#{1,6}[ \t]").unwrap())
}

/// Extract inline tags from a body and return them together with the
/// tag-stripped body.
///
/// Tags come back in first-occurrence order; duplicates are kept (they
/// are de-duplicated later, when merged into metadata). Removing a tag
/// also consumes one immediately-following space or tab, and any run of
/// two or more blank lines left behind collapses to a single blank
/// line.
///
/// A heading line's leading `#` run is never treated as a tag; scanning
/// on such a line starts after the marker.
///
/// ```
/// use vaultport_core::extract_tags;
///
/// let (tags, body) = extract_tags("# Heading\nbody #tag1 #タグ\n");
/// assert_eq!(tags, vec!["tag1", "タグ"]);
/// assert_eq!(body, "# Heading\nbody \n");
/// ```
pub fn extract_tags(body: &str) -> (Vec<String>, String) {
    let mut tags = Vec::new();
    let mut stripped = String::with_capacity(body.len());

    for line in body.split_inclusive('\n') {
        let scan_from = heading_regex().find(line).map(|m| m.end()).unwrap_or(0);
        stripped.push_str(&line[..scan_from]);

        let mut rest = &line[scan_from..];
        while let Some(m) = tag_regex().find(rest) {
            stripped.push_str(&rest[..m.start()]);
            tags.push(rest[m.start() + 1..m.end()].to_string());

            rest = &rest[m.end()..];
            // Consume one trailing space/tab so removal leaves no double gap
            if let Some(next) = rest.strip_prefix([' ', '\t']) {
                rest = next;
            }
        }
        stripped.push_str(rest);
    }

    (tags, collapse_blank_lines(&stripped))
}

/// Collapse runs of two-or-more blank lines to exactly one blank line.
fn collapse_blank_lines(text: &str) -> String {
    static BLANK_RUN: OnceLock<Regex> = OnceLock::new();
    let re = BLANK_RUN.get_or_init(|| Regex::new(r"\n([ \t]*\n){2,}").unwrap());
    re.replace_all(text, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_not_a_tag() {
        let (tags, body) = extract_tags("# Heading\nbody #tag1 #タグ\n");
        assert_eq!(tags, vec!["tag1", "タグ"]);
        assert_eq!(body, "# Heading\nbody \n");
    }

    #[test]
    fn test_deep_heading_preserved() {
        let (tags, body) = extract_tags("###### Deep\n#### Also deep\n");
        assert!(tags.is_empty());
        assert_eq!(body, "###### Deep\n#### Also deep\n");
    }

    #[test]
    fn test_tag_on_heading_line() {
        let (tags, body) = extract_tags("## Topic #rust\n");
        assert_eq!(tags, vec!["rust"]);
        assert_eq!(body, "## Topic \n");
    }

    #[test]
    fn test_tag_at_line_start() {
        // No whitespace after the sigil, so this is a tag, not a heading
        let (tags, body) = extract_tags("#standalone\ncontent\n");
        assert_eq!(tags, vec!["standalone"]);
        assert_eq!(body, "\ncontent\n");
    }

    #[test]
    fn test_first_occurrence_order_with_duplicates() {
        let (tags, _) = extract_tags("#b #a #b\n");
        assert_eq!(tags, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_nested_tag_path() {
        let (tags, _) = extract_tags("see #projects/rust for details\n");
        assert_eq!(tags, vec!["projects/rust"]);
    }

    #[test]
    fn test_blank_line_collapse() {
        let (tags, body) = extract_tags("intro\n\n#only-tags\n#more-tags\n\noutro\n");
        assert_eq!(tags, vec!["only-tags", "more-tags"]);
        assert_eq!(body, "intro\n\noutro\n");
    }

    #[test]
    fn test_single_blank_line_untouched() {
        let (_, body) = extract_tags("a\n\nb\n");
        assert_eq!(body, "a\n\nb\n");
    }

    #[test]
    fn test_no_tags() {
        let (tags, body) = extract_tags("plain text with # alone and c# code\n");
        assert!(tags.is_empty());
        assert_eq!(body, "plain text with # alone and c# code\n");
    }

    #[test]
    fn test_japanese_tags() {
        let (tags, _) = extract_tags("メモ #日本語 と #ひらがな と #カタカナ\n");
        assert_eq!(tags, vec!["日本語", "ひらがな", "カタカナ"]);
    }

    #[test]
    fn test_body_without_trailing_newline() {
        let (tags, body) = extract_tags("note #tag");
        assert_eq!(tags, vec!["tag"]);
        assert_eq!(body, "note ");
    }
}
