//! Corpus-wide asset indexing and reconciliation.
//!
//! The article profile keeps its published image directory exactly in
//! sync with what the corpus references: referenced-and-found images
//! are copied in, images no longer referenced are garbage collected,
//! and references with no source file are reported as dangling. The
//! site profile instead mirrors every asset file blindly; the two
//! modes are intentionally different contracts.

use crate::profile::{is_image_name, EXCLUDED_DIRS};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Map from image basename to its source path, built once per run
/// from a full scan of the input tree.
#[derive(Debug, Default)]
pub struct AssetIndex {
    by_name: HashMap<String, PathBuf>,
}

impl AssetIndex {
    /// Scan the input tree for image files, skipping excluded
    /// directories. When two source paths share a basename the last
    /// one found wins; the collision is logged.
    pub fn scan(input_dir: &Path) -> Self {
        let mut by_name = HashMap::new();

        for entry in walk(input_dir) {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !is_image_name(name) {
                continue;
            }
            if let Some(shadowed) =
                by_name.insert(name.to_string(), entry.path().to_path_buf())
            {
                tracing::warn!(
                    "Duplicate image basename '{}': {} shadows {}",
                    name,
                    entry.path().display(),
                    shadowed.display()
                );
            }
        }

        Self { by_name }
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.by_name.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    #[cfg(test)]
    fn insert(&mut self, name: &str, path: PathBuf) {
        self.by_name.insert(name.to_string(), path);
    }
}

/// Outcome counts of one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Referenced images copied into the output directory.
    pub copied: usize,
    /// Orphaned images deleted from the output directory.
    pub deleted: usize,
    /// References with no matching file in the index.
    pub dangling: usize,
}

/// Reconcile the output asset directory against the reference set.
///
/// For each referenced name found in the index, the source file is
/// copied under its basename. References missing from the index are
/// logged as dangling and skipped. Image files already in the output
/// directory but no longer referenced are deleted. Per-asset failures
/// are logged and skipped; only an unusable output directory is fatal.
///
/// Postcondition: the output directory's image basenames equal the
/// referenced set intersected with the index keys.
pub fn sync_referenced(
    references: &BTreeSet<String>,
    index: &AssetIndex,
    output_dir: &Path,
) -> io::Result<SyncReport> {
    fs::create_dir_all(output_dir)?;

    let mut report = SyncReport::default();
    report.deleted = delete_orphans(references, output_dir)?;

    for name in references {
        let Some(source) = index.get(name) else {
            tracing::warn!("Referenced image not found: {}", name);
            report.dangling += 1;
            continue;
        };
        let dest = output_dir.join(name);
        match fs::copy(source, &dest) {
            Ok(_) => {
                tracing::info!("Copied image: {}", name);
                report.copied += 1;
            }
            Err(e) => {
                tracing::error!("Failed to copy {}: {}", source.display(), e);
            }
        }
    }

    Ok(report)
}

/// Delete image files in the output directory whose basename is not in
/// the reference set (orphans left behind by prior runs).
fn delete_orphans(references: &BTreeSet<String>, output_dir: &Path) -> io::Result<usize> {
    let mut deleted = 0;

    for entry in fs::read_dir(output_dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to read asset entry: {}", e);
                continue;
            }
        };
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !is_image_name(&name) || references.contains(&name) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => {
                tracing::info!("Cleaned up unused image: {}", name);
                deleted += 1;
            }
            Err(e) => {
                tracing::error!("Failed to delete {}: {}", name, e);
            }
        }
    }

    Ok(deleted)
}

/// Blind asset copy for the site profile: every non-markdown file
/// under the input tree is copied into the output tree, mirroring the
/// directory structure. No reference filtering, no garbage collection.
pub fn mirror_all(input_dir: &Path, output_dir: &Path) -> usize {
    let mut copied = 0;

    for entry in walk(input_dir) {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().is_some_and(|e| e == "md") {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(input_dir) else {
            continue;
        };
        let dest = output_dir.join(relative);
        if let Err(e) = copy_into(entry.path(), &dest) {
            tracing::error!("Failed to copy asset {}: {}", entry.path().display(), e);
            continue;
        }
        copied += 1;
    }

    copied
}

fn copy_into(source: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, dest)?;
    Ok(())
}

/// Walk an input tree, skipping excluded directories and logging
/// unreadable entries.
pub(crate) fn walk(root: &Path) -> impl Iterator<Item = DirEntry> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
}

fn is_excluded_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| EXCLUDED_DIRS.contains(&name))
            .unwrap_or(false)
}
