//! Conversion profiles.
//!
//! A [`Profile`] is a fixed configuration value describing one output
//! dialect: how wikilinks and image embeds are rewritten, which
//! metadata fields are defaulted, and how output filenames are
//! derived. Two concrete profiles exist: the static-site profile and
//! the article-platform profile. Profiles are never mutated at
//! runtime; everything downstream receives them as explicit values.

/// Recognized image file extensions (lowercase, without the dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "svg", "webp"];

/// Directories skipped during any input-tree walk: the wiki dialect's
/// private configuration folder and the templates folder.
pub const EXCLUDED_DIRS: &[&str] = &[".obsidian", "templates"];

/// Alphabet for generated article filenames.
pub const SLUG_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated article filenames.
pub const SLUG_LENGTH: usize = 12;

/// Canonical-name table for converting extracted tags to topics.
/// Lookup is over the lower-cased tag; tags not in the table fall back
/// to the lower-cased tag unchanged.
const TOPIC_MAP: &[(&str, &str)] = &[
    ("javascript", "javascript"),
    ("typescript", "typescript"),
    ("react", "react"),
    ("vue", "vue"),
    ("nodejs", "nodejs"),
    ("web", "web"),
    ("frontend", "frontend"),
    ("backend", "backend"),
    ("oss", "oss"),
    ("github", "github"),
    ("npm", "npm"),
    ("css", "css"),
    ("html", "html"),
];

/// Which output dialect a profile targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Site,
    Article,
}

/// Wikilink destination policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStyle {
    /// Slugify the target and link to a sibling content directory
    /// (`../<slug>/`).
    SiblingSlug,
    /// Emit the literal target string as the destination.
    Literal,
}

/// How the physical output filename is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugPolicy {
    /// Output path mirrors the input path relative to the source root;
    /// the `slug` metadata field is informational only.
    MirrorInput,
    /// The `slug` metadata field names the file when present (even an
    /// explicit empty string); otherwise a random token is generated.
    ExplicitOrRandom,
}

/// How the date metadata field is defaulted and formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePolicy {
    /// `date`: current timestamp, RFC 3339.
    Rfc3339,
    /// `published_at`: `YYYY-MM-DD HH:MM` in local time; a supplied
    /// date is reformatted the same way.
    LocalMinutes,
}

/// Fixed rewrite/default rules for one output dialect.
#[derive(Debug, Clone)]
pub struct Profile {
    pub kind: ProfileKind,
    pub link_style: LinkStyle,
    /// Path root prepended to URL-encoded image destinations.
    pub image_root: &'static str,
    pub slug_policy: SlugPolicy,
    pub date_policy: DatePolicy,
    /// Maximum number of topics emitted by the article profile.
    pub max_topics: usize,
    pub default_emoji: &'static str,
    pub default_type: &'static str,
    pub default_published: bool,
}

impl Profile {
    /// The static-site profile: mirrored output tree, slugified
    /// sibling links, assets served from the static root.
    pub fn site() -> Self {
        Self {
            kind: ProfileKind::Site,
            link_style: LinkStyle::SiblingSlug,
            image_root: "/",
            slug_policy: SlugPolicy::MirrorInput,
            date_policy: DatePolicy::Rfc3339,
            max_topics: usize::MAX,
            default_emoji: "",
            default_type: "",
            default_published: true,
        }
    }

    /// The article-platform profile: flat slug-named output, literal
    /// link targets, reconciled `/images/` asset directory.
    pub fn article() -> Self {
        Self {
            kind: ProfileKind::Article,
            link_style: LinkStyle::Literal,
            image_root: "/images/",
            slug_policy: SlugPolicy::ExplicitOrRandom,
            date_policy: DatePolicy::LocalMinutes,
            max_topics: 5,
            default_emoji: "📝",
            default_type: "tech",
            default_published: true,
        }
    }

    /// Map an extracted tag to its canonical topic name.
    pub fn canonical_topic(&self, tag: &str) -> String {
        let lowered = tag.to_lowercase();
        TOPIC_MAP
            .iter()
            .find(|(from, _)| *from == lowered)
            .map(|(_, to)| (*to).to_string())
            .unwrap_or(lowered)
    }
}

/// Whether a filename has a recognized image extension
/// (case-insensitive).
pub fn is_image_name(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lowered = e.to_lowercase();
            IMAGE_EXTENSIONS.contains(&lowered.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_topic_table_hit() {
        let profile = Profile::article();
        assert_eq!(profile.canonical_topic("TypeScript"), "typescript");
        assert_eq!(profile.canonical_topic("OSS"), "oss");
    }

    #[test]
    fn test_canonical_topic_fallback() {
        let profile = Profile::article();
        assert_eq!(profile.canonical_topic("Rust"), "rust");
        assert_eq!(profile.canonical_topic("タグ"), "タグ");
    }

    #[test]
    fn test_is_image_name() {
        assert!(is_image_name("pic.png"));
        assert!(is_image_name("PHOTO.JPG"));
        assert!(is_image_name("nested/pic.webp"));
        assert!(!is_image_name("note.md"));
        assert!(!is_image_name("noextension"));
        assert!(!is_image_name("archive.tar.gz"));
    }

    #[test]
    fn test_profiles_are_distinct() {
        let site = Profile::site();
        let article = Profile::article();
        assert_eq!(site.link_style, LinkStyle::SiblingSlug);
        assert_eq!(article.link_style, LinkStyle::Literal);
        assert_eq!(site.image_root, "/");
        assert_eq!(article.image_root, "/images/");
    }
}
