//! Recursive scans over the AIP root.
//!
//! All scans share the same traversal: sorted by file name so results are
//! deterministic, never following symlinks, and skipping staging directories
//! left by an interrupted extraction. An unreadable root is an
//! error; unreadable entries further down are logged and skipped so one bad
//! subtree cannot stop the whole batch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use walkdir::{DirEntry, FilterEntry, IntoIter, WalkDir};

use super::structures::{BAG_MARKER, OBJECTS_DIR, STAGING_PREFIX};

/// Find every file beneath `root` whose name ends with `suffix`.
pub fn find_archives(root: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
    let mut archives = Vec::new();

    for entry in walk(root, 0, &[]) {
        let Some(entry) = keep_or_skip(entry)? else {
            continue;
        };
        if entry.file_type().is_file() && name_of(&entry).is_some_and(|n| n.ends_with(suffix)) {
            archives.push(entry.into_path());
        }
    }

    Ok(archives)
}

/// Find every directory beneath `root` (excluding `root`) whose name contains
/// the bag marker.
///
/// Neither a matched bag nor any directory in `prune` is descended into:
/// anything inside them is payload, even when its name happens to contain
/// the marker. Pass the output directories of already unpacked AIPs as
/// `prune`.
pub fn find_bags(root: &Path, prune: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut bags = Vec::new();
    let mut walker = walk(root, 1, prune);

    while let Some(entry) = walker.next() {
        let Some(entry) = keep_or_skip(entry)? else {
            continue;
        };
        if entry.file_type().is_dir() && name_of(&entry).is_some_and(|n| n.contains(BAG_MARKER)) {
            bags.push(entry.into_path());
            walker.skip_current_dir();
        }
    }

    Ok(bags)
}

/// Find the shallowest directory named `objects` beneath `bag`.
pub fn find_objects_dir(bag: &Path) -> Result<Option<PathBuf>> {
    let mut best: Option<DirEntry> = None;

    for entry in walk(bag, 1, &[]) {
        let Some(entry) = keep_or_skip(entry)? else {
            continue;
        };
        if !entry.file_type().is_dir() || name_of(&entry) != Some(OBJECTS_DIR) {
            continue;
        }
        if best.as_ref().is_none_or(|b| entry.depth() < b.depth()) {
            best = Some(entry);
        }
    }

    Ok(best.map(DirEntry::into_path))
}

/// Find staging directories left directly under `root` by an extraction
/// that never finished.
pub fn find_staging_leftovers(root: &Path) -> Result<Vec<PathBuf>> {
    let mut leftovers = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
        let Some(entry) = keep_or_skip(entry)? else {
            continue;
        };
        if is_staging(&entry) {
            leftovers.push(entry.into_path());
        }
    }

    Ok(leftovers)
}

fn walk<'a>(
    root: &Path,
    min_depth: usize,
    prune: &'a [PathBuf],
) -> FilterEntry<IntoIter, impl FnMut(&DirEntry) -> bool + 'a> {
    WalkDir::new(root)
        .min_depth(min_depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            !is_staging(entry)
                && !(entry.file_type().is_dir() && prune.iter().any(|p| p == entry.path()))
        })
}

/// A root error is fatal, deeper errors are logged and skipped.
fn keep_or_skip(entry: walkdir::Result<DirEntry>) -> Result<Option<DirEntry>> {
    match entry {
        Ok(entry) => Ok(Some(entry)),
        Err(err) if err.depth() == 0 => {
            let path = err
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            Err(err).with_context(|| format!("Cannot scan {path}"))
        }
        Err(err) => {
            warn!("Skipping unreadable entry: {err}");
            Ok(None)
        }
    }
}

// Staging directories only ever sit directly under the root
fn is_staging(entry: &DirEntry) -> bool {
    entry.depth() == 1
        && entry.file_type().is_dir()
        && name_of(entry).is_some_and(|n| n.starts_with(STAGING_PREFIX))
}

fn name_of(entry: &DirEntry) -> Option<&str> {
    entry.file_name().to_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::write_file;
    use tempfile::TempDir;

    #[test]
    fn finds_archives_recursively() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_file(root, "A001_bag.tar.bz2", "");
        write_file(root, "batch/B002_bag.tar.bz2", "");
        write_file(root, "notes.tar.gz", "");
        write_file(root, "readme.bz2", "");

        let archives = find_archives(root, ".tar.bz2").unwrap();

        assert_eq!(
            archives,
            vec![root.join("A001_bag.tar.bz2"), root.join("batch/B002_bag.tar.bz2")]
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");

        let err = find_archives(&missing, ".tar.bz2").unwrap_err();
        assert!(format!("{err:#}").contains("nope"));
    }

    #[test]
    fn finds_bags_but_not_bags_inside_bags() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_file(root, "A001_bag/data/objects/inner_bag/file.txt", "x");
        write_file(root, "batch/B002_bag/data/objects/file.txt", "y");
        write_file(root, "A001_bag.tar.bz2", "");
        write_file(root, "plain/file.txt", "z");

        let bags = find_bags(root, &[]).unwrap();

        assert_eq!(bags, vec![root.join("A001_bag"), root.join("batch/B002_bag")]);
    }

    #[test]
    fn no_bags_is_empty_not_error() {
        let temp = TempDir::new().unwrap();
        assert!(find_bags(temp.path(), &[]).unwrap().is_empty());
    }

    #[test]
    fn staging_directories_are_ignored() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_file(root, ".unbag-abc123/C003_bag/data/objects/f.txt", "");
        write_file(root, ".unbag-abc123/nested.tar.bz2", "");

        assert!(find_bags(root, &[]).unwrap().is_empty());
        assert!(find_archives(root, ".tar.bz2").unwrap().is_empty());
    }

    #[test]
    fn pruned_output_dirs_are_not_searched_for_bags() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_file(root, "A001/scans_bag/objects/p.tif", "tif");
        write_file(root, "A001/notes_bag/readme.txt", "notes");
        write_file(root, "B002_bag/data/objects/b.txt", "b");

        let bags = find_bags(root, &[root.join("A001")]).unwrap();

        assert_eq!(bags, vec![root.join("B002_bag")]);
    }

    #[test]
    fn reports_staging_leftovers() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_file(root, ".unbag-k3Jx9q/A001_bag/data/objects/f.txt", "");
        write_file(root, "A001_bag.tar.bz2", "");
        write_file(root, "nested/.unbag-not-staging/f.txt", "");

        let leftovers = find_staging_leftovers(root).unwrap();

        assert_eq!(leftovers, vec![root.join(".unbag-k3Jx9q")]);
    }

    #[test]
    fn picks_shallowest_objects_dir() {
        let temp = TempDir::new().unwrap();
        let bag = temp.path().join("A001_bag");
        write_file(&bag, "data/objects/objects/deep.txt", "");
        write_file(&bag, "data/objects/top.txt", "");

        let objects = find_objects_dir(&bag).unwrap();
        assert_eq!(objects, Some(bag.join("data/objects")));
    }

    #[test]
    fn objects_dir_may_be_missing() {
        let temp = TempDir::new().unwrap();
        let bag = temp.path().join("A001_bag");
        write_file(&bag, "data/payload.txt", "");

        assert_eq!(find_objects_dir(&bag).unwrap(), None);
    }
}
