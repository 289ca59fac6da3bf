//! Run orchestration: corpus discovery, asset reconciliation,
//! per-document conversion, and output writing.
//!
//! Per-document and per-asset failures are logged and skipped; the
//! only fatal errors are an unreadable input root and an unusable
//! output directory. Both pipelines own their output directories and
//! regenerate their contents on every invocation (destructive, not
//! incremental).

use crate::assets::{self, mirror_all, sync_referenced, AssetIndex};
use crate::convert::Converter;
use crate::frontmatter;
use crate::profile::{Profile, ProfileKind};
use crate::rewrite::collect_image_refs;
use crate::tags::extract_tags;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Cannot enumerate input directory {0}")]
    InputRoot(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The three directories a run operates on.
#[derive(Debug, Clone)]
pub struct RunPaths {
    /// Input vault root.
    pub input: PathBuf,
    /// Converted document output directory.
    pub output: PathBuf,
    /// Asset output directory (static root for the site profile,
    /// reconciled images directory for the article profile).
    pub assets: PathBuf,
}

/// Aggregated counts from one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub converted: usize,
    pub skipped: usize,
    pub assets_copied: usize,
    pub assets_deleted: usize,
    pub dangling_refs: usize,
}

/// Run the full pipeline for one profile.
pub fn run(profile: Profile, paths: &RunPaths) -> Result<RunSummary, PipelineError> {
    run_with_converter(Converter::new(profile), paths)
}

/// Run with a caller-supplied converter (used to inject a pinned
/// timestamp or token source).
pub fn run_with_converter(
    converter: Converter,
    paths: &RunPaths,
) -> Result<RunSummary, PipelineError> {
    match converter.profile().kind {
        ProfileKind::Site => run_site(converter, paths),
        ProfileKind::Article => run_article(converter, paths),
    }
}

/// Site profile: mirror the input tree, blind-copy every asset.
/// Documents carry no cross-document dependency, so they are processed
/// in discovery order.
fn run_site(mut converter: Converter, paths: &RunPaths) -> Result<RunSummary, PipelineError> {
    let documents = discover_documents(&paths.input)?;
    tracing::info!("Processing {} markdown files", documents.len());

    // The output tree is owned by the run and rebuilt from scratch
    if paths.output.exists() {
        fs::remove_dir_all(&paths.output)?;
    }
    fs::create_dir_all(&paths.output)?;

    let mut summary = RunSummary::default();

    for path in &documents {
        let Some(relative) = path.strip_prefix(&paths.input).ok().map(Path::to_path_buf) else {
            continue;
        };
        match convert_one(&mut converter, path) {
            Some(document) => {
                let dest = paths.output.join(&relative);
                if let Err(e) = write_document(&dest, &document.text) {
                    tracing::error!("Failed to write {}: {}", dest.display(), e);
                    summary.skipped += 1;
                    continue;
                }
                summary.converted += 1;
            }
            None => summary.skipped += 1,
        }
    }

    summary.assets_copied = mirror_all(&paths.input, &paths.assets);

    tracing::info!(
        "Conversion complete: {} files converted, {} assets copied",
        summary.converted,
        summary.assets_copied
    );
    Ok(summary)
}

/// Article profile: collect image references across the whole corpus,
/// reconcile the asset directory, then convert every document into the
/// flat output directory. All reads happen before any write because
/// the reference set must cover the full corpus first.
fn run_article(mut converter: Converter, paths: &RunPaths) -> Result<RunSummary, PipelineError> {
    let documents = discover_documents(&paths.input)?;
    tracing::info!("Processing {} markdown files", documents.len());

    tracing::info!("Analyzing image references...");
    let references = collect_corpus_references(&documents);
    tracing::info!("Found {} unique image references", references.len());

    let index = AssetIndex::scan(&paths.input);
    let report = sync_referenced(&references, &index, &paths.assets)?;

    clear_markdown_files(&paths.output)?;
    fs::create_dir_all(&paths.output)?;

    let mut summary = RunSummary {
        assets_copied: report.copied,
        assets_deleted: report.deleted,
        dangling_refs: report.dangling,
        ..RunSummary::default()
    };

    for path in &documents {
        match convert_one(&mut converter, path) {
            Some(document) => {
                let dest = paths.output.join(&document.file_name);
                if let Err(e) = write_document(&dest, &document.text) {
                    tracing::error!("Failed to write {}: {}", dest.display(), e);
                    summary.skipped += 1;
                    continue;
                }
                tracing::info!(
                    "Converted: {} → {}",
                    path.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
                    document.file_name
                );
                summary.converted += 1;
            }
            None => summary.skipped += 1,
        }
    }

    tracing::info!(
        "Conversion complete: {} files converted, {} images copied, {} cleaned up, {} dangling",
        summary.converted,
        summary.assets_copied,
        summary.assets_deleted,
        summary.dangling_refs
    );
    Ok(summary)
}

/// Discover markdown files under the input root, skipping excluded
/// directories. Sorted for deterministic processing order.
fn discover_documents(input: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !input.is_dir() {
        return Err(PipelineError::InputRoot(input.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = assets::walk(input)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    Ok(files)
}

/// First corpus pass: every document's stripped body contributes its
/// image-embed targets to the reference set before anything is copied.
fn collect_corpus_references(documents: &[PathBuf]) -> BTreeSet<String> {
    let mut references = BTreeSet::new();

    for path in documents {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Error analyzing image references in {}: {}", path.display(), e);
                continue;
            }
        };
        let body = match frontmatter::parse(&raw) {
            Ok((_, body)) => body,
            Err(e) => {
                tracing::error!("Error analyzing image references in {}: {}", path.display(), e);
                continue;
            }
        };
        let (_, stripped) = extract_tags(&body);
        references.extend(collect_image_refs(&stripped));
    }

    references
}

fn convert_one(
    converter: &mut Converter,
    path: &Path,
) -> Option<crate::convert::ConvertedDocument> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("Error reading {}: {}", path.display(), e);
            return None;
        }
    };
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("untitled");
    match converter.convert(&raw, stem) {
        Ok(document) => Some(document),
        Err(e) => {
            tracing::error!("Error processing {}: {}", path.display(), e);
            None
        }
    }
}

/// Each output document is written whole; no incremental appends.
fn write_document(dest: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, text)
}

/// Remove converted documents left by prior article runs. Only `*.md`
/// files are deleted; the directory itself stays.
fn clear_markdown_files(output: &Path) -> Result<(), PipelineError> {
    if !output.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(output)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to read output entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "md") {
            if let Err(e) = fs::remove_file(&path) {
                tracing::error!("Failed to delete {}: {}", path.display(), e);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slug::TokenSource;
    use tempfile::tempdir;

    struct CountingTokens(u32);

    impl TokenSource for CountingTokens {
        fn token(&mut self, _alphabet: &str, _len: usize) -> String {
            self.0 += 1;
            format!("token{:08}", self.0)
        }
    }

    fn paths(root: &Path) -> RunPaths {
        RunPaths {
            input: root.join("vault"),
            output: root.join("out"),
            assets: root.join("assets"),
        }
    }

    #[test]
    fn test_missing_input_root_is_fatal() {
        let dir = tempdir().unwrap();
        let result = run(Profile::site(), &paths(dir.path()));
        assert!(matches!(result, Err(PipelineError::InputRoot(_))));
    }

    #[test]
    fn test_site_run_mirrors_structure() {
        let dir = tempdir().unwrap();
        let run_paths = paths(dir.path());
        fs::create_dir_all(run_paths.input.join("sub")).unwrap();
        fs::write(run_paths.input.join("top.md"), "top [[Other]]\n").unwrap();
        fs::write(run_paths.input.join("sub/nested.md"), "nested\n").unwrap();
        fs::write(run_paths.input.join("sub/pic.png"), b"img").unwrap();

        let summary = run(Profile::site(), &run_paths).unwrap();

        assert_eq!(summary.converted, 2);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.assets_copied, 1);
        assert!(run_paths.output.join("top.md").exists());
        assert!(run_paths.output.join("sub/nested.md").exists());
        assert!(run_paths.assets.join("sub/pic.png").exists());

        let text = fs::read_to_string(run_paths.output.join("top.md")).unwrap();
        assert!(text.contains("[Other](../other/)"));
        assert!(text.contains("title: Top"));
    }

    #[test]
    fn test_site_run_resets_output_dir() {
        let dir = tempdir().unwrap();
        let run_paths = paths(dir.path());
        fs::create_dir_all(&run_paths.input).unwrap();
        fs::write(run_paths.input.join("a.md"), "a\n").unwrap();
        fs::create_dir_all(&run_paths.output).unwrap();
        fs::write(run_paths.output.join("stale.md"), "old\n").unwrap();

        run(Profile::site(), &run_paths).unwrap();

        assert!(!run_paths.output.join("stale.md").exists());
        assert!(run_paths.output.join("a.md").exists());
    }

    #[test]
    fn test_article_run_reconciles_assets() {
        let dir = tempdir().unwrap();
        let run_paths = paths(dir.path());
        fs::create_dir_all(&run_paths.input).unwrap();
        fs::write(run_paths.input.join("a.png"), b"a").unwrap();
        fs::write(run_paths.input.join("b.png"), b"b").unwrap();
        fs::write(
            run_paths.input.join("note.md"),
            "---\nslug: note\n---\n![[a.png]] and ![[missing.png]]\n",
        )
        .unwrap();
        // Orphan from a prior run
        fs::create_dir_all(&run_paths.assets).unwrap();
        fs::write(run_paths.assets.join("b.png"), b"stale").unwrap();

        let summary = run(Profile::article(), &run_paths).unwrap();

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.assets_copied, 1);
        assert_eq!(summary.assets_deleted, 1);
        assert_eq!(summary.dangling_refs, 1);
        assert!(run_paths.assets.join("a.png").exists());
        assert!(!run_paths.assets.join("b.png").exists());

        let text = fs::read_to_string(run_paths.output.join("note.md")).unwrap();
        assert!(text.contains("![a](/images/a.png)"));
        assert!(!text.contains("[["));
    }

    #[test]
    fn test_article_references_collected_before_copying() {
        // A reference in the alphabetically-last document must still be
        // honored when assets are synced before that document converts.
        let dir = tempdir().unwrap();
        let run_paths = paths(dir.path());
        fs::create_dir_all(&run_paths.input).unwrap();
        fs::write(run_paths.input.join("z-late.png"), b"z").unwrap();
        fs::write(
            run_paths.input.join("a.md"),
            "---\nslug: a\n---\nno images\n",
        )
        .unwrap();
        fs::write(
            run_paths.input.join("z.md"),
            "---\nslug: z\n---\n![[z-late.png]]\n",
        )
        .unwrap();

        let summary = run(Profile::article(), &run_paths).unwrap();
        assert_eq!(summary.assets_copied, 1);
        assert!(run_paths.assets.join("z-late.png").exists());
    }

    #[test]
    fn test_article_random_filenames_injectable() {
        let dir = tempdir().unwrap();
        let run_paths = paths(dir.path());
        fs::create_dir_all(&run_paths.input).unwrap();
        fs::write(run_paths.input.join("unnamed.md"), "body\n").unwrap();

        let converter = Converter::new(Profile::article())
            .with_tokens(Box::new(CountingTokens(0)));
        let summary = run_with_converter(converter, &run_paths).unwrap();

        assert_eq!(summary.converted, 1);
        assert!(run_paths.output.join("token00000001.md").exists());
    }

    #[test]
    fn test_article_run_clears_stale_markdown_only() {
        let dir = tempdir().unwrap();
        let run_paths = paths(dir.path());
        fs::create_dir_all(&run_paths.input).unwrap();
        fs::write(run_paths.input.join("note.md"), "---\nslug: fresh\n---\nx\n").unwrap();
        fs::create_dir_all(&run_paths.output).unwrap();
        fs::write(run_paths.output.join("stale.md"), "old").unwrap();
        fs::write(run_paths.output.join("keep.json"), "{}").unwrap();

        run(Profile::article(), &run_paths).unwrap();

        assert!(!run_paths.output.join("stale.md").exists());
        assert!(run_paths.output.join("keep.json").exists());
        assert!(run_paths.output.join("fresh.md").exists());
    }

    #[test]
    fn test_unparseable_document_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let run_paths = paths(dir.path());
        fs::create_dir_all(&run_paths.input).unwrap();
        fs::write(run_paths.input.join("good.md"), "fine\n").unwrap();
        fs::write(
            run_paths.input.join("bad.md"),
            "---\ntitle: Test\nbroken yaml: [unclosed\n---\nbody\n",
        )
        .unwrap();

        let summary = run(Profile::site(), &run_paths).unwrap();
        assert_eq!(summary.converted, 1);
        assert_eq!(summary.skipped, 1);
        assert!(run_paths.output.join("good.md").exists());
        assert!(!run_paths.output.join("bad.md").exists());
    }
}
