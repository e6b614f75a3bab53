use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Substring marking a directory (or archive) as a BagIt bag
pub const BAG_MARKER: &str = "_bag";

/// Name of the payload folder inside a bag holding the preservation files
pub const OBJECTS_DIR: &str = "objects";

/// Prefix of the scratch directories archives are staged in before being
/// moved into the root. Locators never descend into these.
pub const STAGING_PREFIX: &str = ".unbag-";

/// Identifier of one Archival Information Package.
///
/// Derived from a bag (or archive) name by truncating at the first
/// [`BAG_MARKER`]; used verbatim as the name of the AIP's output directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AipId(String);

impl AipId {
    /// Derive the identifier from a bag directory name.
    ///
    /// `EXAMPLE001_bag` yields `EXAMPLE001`. Names without the marker, or
    /// with nothing in front of it, are rejected.
    pub fn from_bag_name(name: &str) -> Result<Self> {
        match name.find(BAG_MARKER) {
            Some(0) => bail!("Bag name {name:?} has no identifier before {BAG_MARKER:?}"),
            Some(idx) => Ok(Self(name[..idx].to_string())),
            None => bail!("{name:?} is not a bag name (missing {BAG_MARKER:?})"),
        }
    }

    /// Derive the identifier from an archive file name.
    ///
    /// Truncates at the bag marker when present, otherwise strips `suffix`.
    pub fn from_archive_name(name: &str, suffix: &str) -> Result<Self> {
        if name.contains(BAG_MARKER) {
            return Self::from_bag_name(name);
        }
        match name.strip_suffix(suffix) {
            Some(stem) if !stem.is_empty() => Ok(Self(stem.to_string())),
            _ => bail!("Cannot derive an AIP identifier from archive name {name:?}"),
        }
    }

    /// Derive the identifier from a bag directory path's final segment.
    pub fn from_bag_dir(path: &Path) -> Result<Self> {
        let name = final_segment(path)?;
        Self::from_bag_name(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Output directory for this AIP: directly under `root`.
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

impl fmt::Display for AipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A located compressed AIP archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub id: AipId,
    /// File name with the archive suffix removed; the bag directory the
    /// archive is expected to unpack to.
    pub stem: String,
}

impl ArchiveEntry {
    pub fn new(path: PathBuf, suffix: &str) -> Result<Self> {
        let name = final_segment(&path)?;
        let id = AipId::from_archive_name(name, suffix)?;
        let stem = name.strip_suffix(suffix).unwrap_or(name).to_string();
        Ok(Self { path, id, stem })
    }
}

/// Where an AIP stands, as observed on disk.
///
/// Nothing is persisted between runs; the state is re-derived from
/// filesystem probes every time, so re-running is the recovery path for an
/// interrupted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AipState {
    /// No archive, bag or output directory. A located archive is only
    /// `Unseen` if it was removed between the scan and this check; this is
    /// a race outcome, not a step of the normal lifecycle.
    Unseen,
    /// Only the compressed archive exists
    Archived,
    /// A bag directory is present and waiting to be unwrapped
    Extracted,
    /// The output directory exists and no bag is pending
    Unwrapped,
}

impl AipState {
    pub fn probe(root: &Path, archive: &ArchiveEntry) -> Self {
        if root.join(&archive.stem).is_dir() && archive.stem.contains(BAG_MARKER) {
            AipState::Extracted
        } else if archive.id.output_dir(root).exists() {
            AipState::Unwrapped
        } else if archive.path.is_file() {
            AipState::Archived
        } else {
            AipState::Unseen
        }
    }
}

fn final_segment(path: &Path) -> Result<&str> {
    path.file_name()
        .with_context(|| format!("{} has no final path segment", path.display()))?
        .to_str()
        .with_context(|| format!("{} is not valid UTF-8", path.display()))
}
