//! Frontmatter parsing and serialization.
//!
//! The metadata block is a `---`-delimited YAML header. It is treated
//! as an off-the-shelf codec: `parse` splits a document into an
//! insertion-ordered metadata map and a body, `serialize` puts them
//! back together. Field order and unrecognized fields survive the
//! round trip.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Insertion-ordered metadata map.
pub type Metadata = serde_yaml::Mapping;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Frontmatter is not a key/value mapping")]
    NotAMapping,
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| Regex::new(r"(?s)^---\s*\n(.*?)\n---\s*\n?(.*)$").unwrap())
}

/// Parse a document into its metadata map and body.
///
/// If no frontmatter block is present, returns an empty map with the
/// full content as body.
///
/// # Example
///
/// ```
/// use vaultport_core::frontmatter::parse;
///
/// let content = "---\ntitle: My Post\ndate: 2025-01-01\n---\n# Hello\n";
/// let (metadata, body) = parse(content).unwrap();
/// assert_eq!(metadata["title"], "My Post");
/// assert!(body.starts_with("# Hello"));
/// ```
pub fn parse(content: &str) -> Result<(Metadata, String), FrontmatterError> {
    let re = frontmatter_regex();

    if let Some(captures) = re.captures(content) {
        let yaml = captures.get(1).unwrap().as_str();
        let body = captures.get(2).unwrap().as_str();

        if yaml.trim().is_empty() {
            return Ok((Metadata::new(), body.to_string()));
        }

        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let metadata = match value {
            serde_yaml::Value::Mapping(map) => map,
            serde_yaml::Value::Null => Metadata::new(),
            _ => return Err(FrontmatterError::NotAMapping),
        };

        Ok((metadata, body.to_string()))
    } else {
        Ok((Metadata::new(), content.to_string()))
    }
}

/// Serialize a metadata map and body back into document text.
///
/// An empty map produces the bare body with no delimiter block.
pub fn serialize(metadata: &Metadata, body: &str) -> Result<String, FrontmatterError> {
    if metadata.is_empty() {
        return Ok(body.to_string());
    }

    let yaml = serde_yaml::to_string(metadata)?;
    Ok(format!("---\n{yaml}---\n{body}"))
}
