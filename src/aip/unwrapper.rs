use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::debug;
use tokio::fs;

use super::locator::find_objects_dir;
use super::structures::{AipId, OBJECTS_DIR};

/// Result of unwrapping one bag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnwrapOutcome {
    /// Every entry of `objects` was moved and the bag directory was deleted
    Unwrapped { id: AipId, moved: usize },
    /// Some entries could not be moved because the output directory already
    /// holds an entry of the same name; the bag is kept for inspection.
    Retained {
        id: AipId,
        moved: usize,
        collisions: Vec<PathBuf>,
    },
}

/// Moves the payload of bag directories into per-AIP output directories
/// directly under `root`.
pub struct BagUnwrapper<'a> {
    root: &'a Path,
}

impl<'a> BagUnwrapper<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Unwrap a single bag directory.
    ///
    /// Existing entries in the output directory are never overwritten: a
    /// colliding entry stays in `objects`, which keeps the bag on disk.
    ///
    /// # Errors
    ///
    /// Fails when the bag has no `objects` folder, when its name yields no
    /// identifier, or when a create/move/delete fails. A failure part way
    /// through leaves the bag and the output directory as they are, so a
    /// later run picks up where this one stopped.
    pub async fn unwrap_bag(&self, bag: &Path) -> Result<UnwrapOutcome> {
        let id = AipId::from_bag_dir(bag)?;
        let Some(objects) = find_objects_dir(bag)? else {
            bail!("No {OBJECTS_DIR:?} folder in bag {}", bag.display());
        };

        let output = id.output_dir(self.root);
        ensure_dir(&output).await?;

        let mut moved = 0;
        let mut collisions = Vec::new();

        for source in list_dir(&objects).await? {
            let Some(name) = source.file_name() else {
                continue;
            };
            let target = output.join(name);

            if path_taken(&target).await {
                collisions.push(source);
                continue;
            }

            debug!("Moving {} -> {}", source.display(), target.display());
            fs::rename(&source, &target)
                .await
                .with_context(|| format!("Cannot move {} to {}", source.display(), target.display()))?;
            moved += 1;
        }

        if !is_empty_dir(&objects).await? {
            return Ok(UnwrapOutcome::Retained {
                id,
                moved,
                collisions,
            });
        }

        fs::remove_dir_all(bag)
            .await
            .with_context(|| format!("Cannot delete bag {}", bag.display()))?;
        debug!("Deleted bag {}", bag.display());

        Ok(UnwrapOutcome::Unwrapped { id, moved })
    }
}

/// Create `dir` unless it already exists as a directory.
async fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::create_dir(dir).await {
        Ok(()) => {
            debug!("Created {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Cannot create {}", dir.display())),
    }
}

/// Snapshot the immediate children of `dir` before anything is moved out of it.
pub(super) async fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut children = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Cannot list {}", dir.display()))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Cannot list {}", dir.display()))?
    {
        children.push(entry.path());
    }
    children.sort();
    Ok(children)
}

// Anything at `path`, including a dangling symlink, counts as taken
pub(super) async fn path_taken(path: &Path) -> bool {
    match fs::symlink_metadata(path).await {
        Ok(_) => true,
        Err(e) => e.kind() != ErrorKind::NotFound,
    }
}

async fn is_empty_dir(dir: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("Cannot list {}", dir.display()))?;
    Ok(entries.next_entry().await?.is_none())
}
