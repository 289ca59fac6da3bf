//! # vaultport-core
//!
//! Core library for the vaultport vault-to-publishing converter.
//!
//! This crate provides the transformation pipeline that turns a vault of
//! wiki-dialect markdown notes (wikilinks, image embeds, inline tags,
//! optional frontmatter) into one of two publishing dialects, plus the
//! corpus-wide image reference reconciliation that keeps the published
//! asset directory in sync with what the notes actually reference.

pub mod assets;
pub mod convert;
pub mod frontmatter;
pub mod pipeline;
pub mod profile;
pub mod rewrite;
pub mod slug;
pub mod tags;

pub use assets::{AssetIndex, SyncReport};
pub use convert::{ConvertError, ConvertedDocument, Converter};
pub use frontmatter::Metadata;
pub use pipeline::{run, PipelineError, RunPaths, RunSummary};
pub use profile::{DatePolicy, LinkStyle, Profile, ProfileKind, SlugPolicy};
pub use slug::{slugify, title_from_stem, ThreadRngTokens, TokenSource};
pub use tags::extract_tags;
