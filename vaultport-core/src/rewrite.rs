//! Wikilink and image-embed rewriting.
//!
//! Two token families, each with a bare and an aliased form:
//! `[[target]]` / `[[target|display]]` for wikilinks and
//! `![[target]]` / `![[target|alt]]` for image embeds. A single pass
//! matches both; the optional `!` prefix is captured rather than
//! excluded with lookbehind (which the regex crate does not support),
//! so an embed is never also rewritten as a wikilink.

use crate::profile::{LinkStyle, Profile};
use crate::slug::slugify;
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;

static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> &'static Regex {
    TOKEN_REGEX.get_or_init(|| {
        Regex::new(r"(!?)\[\[([^|\[\]]+)(?:\|([^\[\]]+))?\]\]").unwrap()
    })
}

/// Rewrite every wikilink and image-embed token in `body` into the
/// profile's destination syntax. Text outside matched token spans is
/// left untouched and content order is preserved.
pub fn rewrite_tokens(body: &str, profile: &Profile) -> String {
    token_regex()
        .replace_all(body, |caps: &Captures<'_>| {
            let target = &caps[2];
            let alias = caps.get(3).map(|m| m.as_str());

            if caps[1].is_empty() {
                rewrite_wikilink(target, alias, profile)
            } else {
                rewrite_image(target, alias, profile)
            }
        })
        .into_owned()
}

fn rewrite_image(target: &str, alias: Option<&str>, profile: &Profile) -> String {
    // Bare form derives alt text from the target's filename stem
    let alt = match alias {
        Some(alt) => alt.to_string(),
        None => Path::new(target)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(target)
            .to_string(),
    };
    let encoded = urlencoding::encode(target);
    format!("![{}]({}{})", alt, profile.image_root, encoded)
}

fn rewrite_wikilink(target: &str, alias: Option<&str>, profile: &Profile) -> String {
    let display = alias.unwrap_or(target);
    let dest = match profile.link_style {
        // Link to a sibling content directory by slug
        LinkStyle::SiblingSlug => format!("../{}/", slugify(target)),
        // No per-note pages with stable paths, so the target passes
        // through unmodified
        LinkStyle::Literal => target.to_string(),
    };
    format!("[{display}]({dest})")
}

/// Collect the raw target of every image-embed token in `body`.
///
/// Identity for reconciliation is the basename exactly as written in
/// the markup, before any URL encoding.
pub fn collect_image_refs(body: &str) -> Vec<String> {
    token_regex()
        .captures_iter(body)
        .filter(|caps| !caps[1].is_empty())
        .map(|caps| caps[2].to_string())
        .collect()
}
