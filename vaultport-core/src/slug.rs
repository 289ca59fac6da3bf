//! Slug generation, title derivation, and random token support.

use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

/// Convert a string to a URL-safe slug
///
/// Rules:
/// - Lowercase
/// - Replace whitespace runs with a single hyphen
/// - Strip everything outside `[a-z0-9-]`
/// - Collapse multiple hyphens
/// - Trim leading/trailing hyphens
///
/// Never fails; empty input yields an empty string.
///
/// # Examples
///
/// ```
/// use vaultport_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("C++ Programming"), "c-programming");
/// ```
pub fn slugify(input: &str) -> String {
    let lowercased = input.to_lowercase();

    // Replace whitespace and underscores with hyphens
    let with_hyphens = lowercased
        .graphemes(true)
        .map(|g| match g {
            " " | "_" | "\t" | "\n" => "-",
            _ => g,
        })
        .collect::<String>();

    // Keep only ASCII alphanumerics and hyphens
    let cleaned = with_hyphens
        .graphemes(true)
        .filter(|g| {
            g.chars()
                .next()
                .map(|c| c.is_ascii_alphanumeric() || c == '-')
                .unwrap_or(false)
        })
        .collect::<String>();

    static HYPHEN_RUN: OnceLock<Regex> = OnceLock::new();
    let re = HYPHEN_RUN.get_or_init(|| Regex::new(r"-+").unwrap());
    let collapsed = re.replace_all(&cleaned, "-");

    collapsed.trim_matches('-').to_string()
}

/// Derive a display title from a filename stem.
///
/// Separators (`-`, `_`) become spaces and the first letter of each
/// word is upper-cased. Used by the site profile; the article profile
/// keeps the bare stem.
///
/// ```
/// use vaultport_core::title_from_stem;
///
/// assert_eq!(title_from_stem("my-first-note"), "My First Note");
/// assert_eq!(title_from_stem("rust_lang"), "Rust Lang");
/// ```
pub fn title_from_stem(stem: &str) -> String {
    let spaced = stem.replace(['-', '_'], " ");
    spaced
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Source of random tokens for generated filenames.
///
/// Injectable so tests can pin token output without touching any
/// other component's determinism.
pub trait TokenSource {
    /// Draw `len` independent uniform samples from `alphabet`.
    fn token(&mut self, alphabet: &str, len: usize) -> String;
}

/// Default token source backed by the thread-local RNG.
#[derive(Debug, Default)]
pub struct ThreadRngTokens;

impl TokenSource for ThreadRngTokens {
    fn token(&mut self, alphabet: &str, len: usize) -> String {
        let chars: Vec<char> = alphabet.chars().collect();
        if chars.is_empty() {
            return String::new();
        }
        let mut rng = rand::thread_rng();
        (0..len)
            .map(|_| chars[rng.gen_range(0..chars.len())])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Rust Programming"), "rust-programming");
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(slugify("Rust & Safety"), "rust-safety");
        assert_eq!(slugify("C++ Programming"), "c-programming");
        assert_eq!(slugify("Node.js Tips"), "nodejs-tips");
        assert_eq!(slugify("What's new?"), "whats-new");
    }

    #[test]
    fn test_non_ascii_stripped() {
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
        assert_eq!(slugify("日本語ノート"), "");
    }

    #[test]
    fn test_multiple_spaces() {
        assert_eq!(slugify("Hello    World"), "hello-world");
        assert_eq!(slugify("Multiple   Spaces   Here"), "multiple-spaces-here");
    }

    #[test]
    fn test_leading_trailing_hyphens() {
        assert_eq!(slugify("  Hello World  "), "hello-world");
        assert_eq!(slugify("-Leading Hyphen"), "leading-hyphen");
        assert_eq!(slugify("Trailing Hyphen-"), "trailing-hyphen");
    }

    #[test]
    fn test_empty_and_special_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("   "), "");
    }

    #[test]
    fn test_idempotent() {
        for input in ["Hello World", "C++ Programming", "--a--b--", ""] {
            let once = slugify(input);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn test_slug_shape() {
        let re = Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap();
        for input in ["Hello World", "A", "What's new?", "rust_lang_basics"] {
            let slug = slugify(input);
            assert!(slug.is_empty() || re.is_match(&slug), "bad slug: {slug:?}");
        }
    }

    #[test]
    fn test_title_from_stem() {
        assert_eq!(title_from_stem("my-first-note"), "My First Note");
        assert_eq!(title_from_stem("hello_world"), "Hello World");
        assert_eq!(title_from_stem("note"), "Note");
        assert_eq!(title_from_stem(""), "");
    }

    #[test]
    fn test_thread_rng_tokens() {
        let mut source = ThreadRngTokens;
        let token = source.token("abc123", 12);
        assert_eq!(token.chars().count(), 12);
        assert!(token.chars().all(|c| "abc123".contains(c)));
        assert_eq!(source.token("x", 0), "");
        assert_eq!(source.token("", 5), "");
    }
}
