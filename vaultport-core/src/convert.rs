//! Single-document conversion.
//!
//! Composes tag extraction, link/embed rewriting, metadata synthesis,
//! and serialization for one document. Nothing here touches the
//! filesystem; the pipeline feeds documents in and writes results out.

use crate::frontmatter::{self, FrontmatterError, Metadata};
use crate::profile::{DatePolicy, Profile, ProfileKind, SlugPolicy, SLUG_ALPHABET, SLUG_LENGTH};
use crate::rewrite::rewrite_tokens;
use crate::slug::{slugify, title_from_stem, ThreadRngTokens, TokenSource};
use crate::tags::extract_tags;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde_yaml::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

/// One converted document, ready to be written.
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    /// Output filename. The site profile mirrors the input path and
    /// uses this only as the basename; the article profile writes the
    /// file flat under this name.
    pub file_name: String,
    /// Full serialized text (frontmatter block plus body).
    pub text: String,
}

/// Converts documents for one profile.
///
/// The timestamp used for date defaulting is taken at construction and
/// the token source for generated filenames is injectable, so
/// conversion is deterministic under test.
pub struct Converter {
    profile: Profile,
    now: DateTime<Local>,
    tokens: Box<dyn TokenSource>,
}

impl Converter {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            now: Local::now(),
            tokens: Box::new(ThreadRngTokens),
        }
    }

    /// Pin the timestamp used when defaulting date fields.
    pub fn with_now(mut self, now: DateTime<Local>) -> Self {
        self.now = now;
        self
    }

    /// Replace the random token source for generated filenames.
    pub fn with_tokens(mut self, tokens: Box<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Convert one document given its raw text and filename stem.
    pub fn convert(&mut self, raw: &str, stem: &str) -> Result<ConvertedDocument, ConvertError> {
        let (metadata, body) = frontmatter::parse(raw)?;
        let (tags, stripped) = extract_tags(&body);
        let rewritten = rewrite_tokens(&stripped, &self.profile);

        let file_name = match self.profile.slug_policy {
            SlugPolicy::MirrorInput => format!("{stem}.md"),
            SlugPolicy::ExplicitOrRandom => self.explicit_or_random_file_name(&metadata),
        };
        let metadata = match self.profile.kind {
            ProfileKind::Site => self.synthesize_site(metadata, stem, &tags),
            ProfileKind::Article => self.synthesize_article(metadata, stem, &tags),
        };

        let text = frontmatter::serialize(&metadata, &rewritten)?;
        Ok(ConvertedDocument { file_name, text })
    }

    /// Default absent site fields in place; explicit values are never
    /// overwritten and unrecognized fields ride along untouched.
    fn synthesize_site(&self, mut metadata: Metadata, stem: &str, tags: &[String]) -> Metadata {
        if metadata.get("title").is_none() {
            metadata.insert(key("title"), Value::String(title_from_stem(stem)));
        }
        if metadata.get("date").is_none() {
            metadata.insert(key("date"), Value::String(self.format_now()));
        }
        if metadata.get("draft").is_none() {
            metadata.insert(key("draft"), Value::Bool(false));
        }
        if metadata.get("slug").is_none() {
            metadata.insert(key("slug"), Value::String(slugify(stem)));
        }

        let declared = string_seq(metadata.get("tags"));
        let mut merged = dedup_preserving_order(declared.into_iter().chain(tags.iter().cloned()));
        merged.truncate(self.profile.max_topics);
        if !merged.is_empty() {
            metadata.insert(key("tags"), string_seq_value(merged));
        }

        metadata
    }

    /// Build the article profile's canonical metadata shape, then
    /// append any input fields the profile does not recognize.
    fn synthesize_article(&self, metadata: Metadata, stem: &str, tags: &[String]) -> Metadata {
        let mut out = Metadata::new();

        out.insert(
            key("title"),
            metadata
                .get("title")
                .cloned()
                .unwrap_or_else(|| Value::String(stem.to_string())),
        );
        out.insert(
            key("emoji"),
            metadata
                .get("emoji")
                .cloned()
                .unwrap_or_else(|| Value::String(self.profile.default_emoji.to_string())),
        );
        out.insert(
            key("type"),
            metadata
                .get("type")
                .cloned()
                .unwrap_or_else(|| Value::String(self.profile.default_type.to_string())),
        );
        out.insert(
            key("published"),
            metadata
                .get("published")
                .cloned()
                .unwrap_or(Value::Bool(self.profile.default_published)),
        );

        // A supplied published_at or date is reformatted; otherwise the
        // current timestamp is used.
        let supplied = metadata
            .get("published_at")
            .or_else(|| metadata.get("date"))
            .and_then(Value::as_str);
        out.insert(
            key("published_at"),
            Value::String(self.format_article_date(supplied)),
        );

        if let Some(slug) = metadata.get("slug") {
            out.insert(key("slug"), slug.clone());
        }

        let declared = string_seq(metadata.get("topics"));
        let mapped = tags.iter().map(|t| self.profile.canonical_topic(t));
        let mut topics = dedup_preserving_order(declared.into_iter().chain(mapped));
        topics.truncate(self.profile.max_topics);
        if !topics.is_empty() {
            out.insert(key("topics"), string_seq_value(topics));
        }

        const RECOGNIZED: &[&str] = &[
            "title",
            "emoji",
            "type",
            "published",
            "published_at",
            "date",
            "slug",
            "topics",
        ];
        for (k, v) in metadata {
            let known = k
                .as_str()
                .map(|s| RECOGNIZED.contains(&s))
                .unwrap_or(false);
            if !known {
                out.insert(k, v);
            }
        }

        out
    }

    /// Output filename for the article profile: an explicit `slug`
    /// field names the file (even an empty string is honored),
    /// otherwise a random token is drawn.
    fn explicit_or_random_file_name(&mut self, metadata: &Metadata) -> String {
        match metadata.get("slug") {
            Some(value) => match value.as_str() {
                Some(slug) => format!("{slug}.md"),
                None => {
                    tracing::warn!("Non-string slug field; generating a random filename");
                    format!("{}.md", self.tokens.token(SLUG_ALPHABET, SLUG_LENGTH))
                }
            },
            None => format!("{}.md", self.tokens.token(SLUG_ALPHABET, SLUG_LENGTH)),
        }
    }

    fn format_article_date(&self, supplied: Option<&str>) -> String {
        if let Some(raw) = supplied {
            if let Some(formatted) = reformat_date(raw) {
                return formatted;
            }
            tracing::warn!("Unparseable date '{}'; falling back to now", raw);
        }
        self.now.format(DATE_FORMAT).to_string()
    }

    /// Current timestamp in the profile's date format.
    fn format_now(&self) -> String {
        match self.profile.date_policy {
            DatePolicy::Rfc3339 => self.now.to_rfc3339(),
            DatePolicy::LocalMinutes => self.now.format(DATE_FORMAT).to_string(),
        }
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

fn reformat_date(raw: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).format(DATE_FORMAT).to_string());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.format(DATE_FORMAT).to_string());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let dt = date.and_hms_opt(0, 0, 0)?;
        return Some(dt.format(DATE_FORMAT).to_string());
    }
    None
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

/// Read a metadata value as a list of strings (non-string entries are
/// skipped).
fn string_seq(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_sequence)
        .map(|seq| {
            seq.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn string_seq_value(items: Vec<String>) -> Value {
    Value::Sequence(items.into_iter().map(Value::String).collect())
}

fn dedup_preserving_order(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}
