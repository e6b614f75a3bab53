use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use tokio::fs;

use crate::archive::Unpack;

use super::locator::{find_archives, find_bags, find_staging_leftovers};
use super::structures::{AipId, AipState, ArchiveEntry, STAGING_PREFIX};
use super::unwrapper::{BagUnwrapper, UnwrapOutcome, list_dir, path_taken};

/// What a run did, for the completion report and for callers that want to
/// act on the outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub extracted: Vec<AipId>,
    pub skipped: Vec<AipId>,
    pub failed_archives: Vec<PathBuf>,
    pub unwrapped: Vec<AipId>,
    /// Bags left on disk because `objects` could not be fully drained
    pub retained: Vec<PathBuf>,
    pub failed_bags: Vec<PathBuf>,
    /// No bag directories existed after extraction; the run stopped early
    pub no_bags: bool,
}

impl RunSummary {
    /// Number of archives and bags that need attention
    pub fn problems(&self) -> usize {
        self.failed_archives.len() + self.retained.len() + self.failed_bags.len()
    }

    pub fn completion_message(&self) -> String {
        match (self.no_bags, self.problems()) {
            (true, 0) => "Finished early: no bags to unbag.".to_string(),
            (true, n) => format!("Finished early: no bags to unbag ({n} problem(s) reported above)."),
            (false, 0) => "Finished unpacking AIPs.".to_string(),
            (false, n) => format!("Finished unpacking AIPs with {n} problem(s) reported above."),
        }
    }
}

/// Unpacks every AIP archive under a root directory and unwraps the
/// resulting bags into per-AIP output directories.
///
/// Generic over the archive format through [`Unpack`].
pub struct AipUnpacker<U: Unpack> {
    root: PathBuf,
    unpacker: U,
}

impl<U: Unpack> AipUnpacker<U> {
    /// Create an unpacker for `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` does not exist or is not a directory.
    pub fn new(root: &Path, unpacker: U) -> Result<Self> {
        let metadata = std::fs::metadata(root)
            .with_context(|| format!("Cannot access AIP directory {}", root.display()))?;
        if !metadata.is_dir() {
            bail!("AIP directory {} is not a directory", root.display());
        }
        let root = std::fs::canonicalize(root)
            .with_context(|| format!("Cannot resolve AIP directory {}", root.display()))?;

        Ok(Self { root, unpacker })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extract all pending archives, then unwrap all bags.
    ///
    /// Failures of individual archives or bags are reported and recorded in
    /// the summary; only a failure to scan the root itself is returned.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for leftover in find_staging_leftovers(&self.root)? {
            warn!(
                "Leftover staging directory {} from an interrupted run; inspect and delete it",
                leftover.display()
            );
        }

        println!("Finding and unpacking AIPs...");
        let archives = self.locate_archives(&mut summary)?;
        for entry in &archives {
            self.process_archive(entry, &mut summary).await;
        }

        let bags = find_bags(&self.root, &self.unpacked_outputs(&archives))?;
        if bags.is_empty() {
            eprintln!("WARNING: No bags found in {}", self.root.display());
            summary.no_bags = true;
            return Ok(summary);
        }

        println!("Unbagging...");
        let unwrapper = BagUnwrapper::new(&self.root);
        for bag in bags {
            self.process_bag(&unwrapper, bag, &mut summary).await;
        }

        Ok(summary)
    }

    /// Locate archives, dropping those that are payload of an AIP unpacked
    /// by an earlier run.
    fn locate_archives(&self, summary: &mut RunSummary) -> Result<Vec<ArchiveEntry>> {
        let mut archives = Vec::new();
        for path in find_archives(&self.root, self.unpacker.suffix())? {
            match ArchiveEntry::new(path.clone(), self.unpacker.suffix()) {
                Ok(entry) => archives.push(entry),
                Err(err) => {
                    eprintln!(" > {}: FAILED - {err:#}", path.display());
                    summary.failed_archives.push(path);
                }
            }
        }

        let outputs = self.unpacked_outputs(&archives);
        archives.retain(|entry| {
            let own = entry.id.output_dir(&self.root);
            let payload = outputs
                .iter()
                .any(|output| *output != own && entry.path.starts_with(output));
            if payload {
                debug!("{} is AIP payload, not an AIP", entry.path.display());
            }
            !payload
        });

        Ok(archives)
    }

    /// Output directories of AIPs that are already unpacked or have a bag
    /// pending; their contents are payload and are never scanned.
    fn unpacked_outputs(&self, archives: &[ArchiveEntry]) -> Vec<PathBuf> {
        archives
            .iter()
            .filter(|entry| {
                matches!(
                    AipState::probe(&self.root, entry),
                    AipState::Extracted | AipState::Unwrapped
                )
            })
            .map(|entry| entry.id.output_dir(&self.root))
            .collect()
    }

    async fn process_archive(&self, entry: &ArchiveEntry, summary: &mut RunSummary) {
        match AipState::probe(&self.root, entry) {
            AipState::Archived => {
                println!(" > {}", entry.id);
                match self.extract(entry).await {
                    Ok(placed) => {
                        debug!("{} placed {} top-level entries", entry.path.display(), placed.len());
                        summary.extracted.push(entry.id.clone());
                    }
                    Err(err) => {
                        eprintln!(" > {}: FAILED - {err:#}", entry.id);
                        summary.failed_archives.push(entry.path.clone());
                    }
                }
            }
            AipState::Extracted => {
                println!(
                    " > {}: SKIPPED - Bag {} is already extracted and will be unbagged.",
                    entry.id, entry.stem
                );
                summary.skipped.push(entry.id.clone());
            }
            AipState::Unwrapped => {
                println!(
                    " > {}: SKIPPED - This folder already exists. To unpack it again, delete the folder and re-run.",
                    entry.id
                );
                summary.skipped.push(entry.id.clone());
            }
            AipState::Unseen => {
                eprintln!(
                    " > {}: FAILED - Archive {} disappeared before extraction",
                    entry.id,
                    entry.path.display()
                );
                summary.failed_archives.push(entry.path.clone());
            }
        }
    }

    /// Extract one archive into the root.
    ///
    /// The archive is first unpacked into a staging directory inside the
    /// root; its top-level entries are moved into the root only once the
    /// whole archive decoded and none of them would replace something
    /// already there. If a move fails part way, the entries already moved are
    /// put back into staging so the root is left as it was. Returns the paths
    /// placed in the root.
    pub async fn extract(&self, entry: &ArchiveEntry) -> Result<Vec<PathBuf>> {
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&self.root)
            .with_context(|| format!("Cannot create staging directory in {}", self.root.display()))?;
        debug!("Staging {} in {}", entry.path.display(), staging.path().display());

        self.unpacker.unpack(&entry.path, staging.path()).await?;

        let mut moves = Vec::new();
        for source in list_dir(staging.path()).await? {
            let Some(name) = source.file_name() else {
                continue;
            };
            let target = self.root.join(name);
            if path_taken(&target).await {
                bail!(
                    "{} already exists; archive {} was left unextracted",
                    target.display(),
                    entry.path.display()
                );
            }
            moves.push((source, target));
        }

        move_all(&moves).await?;

        if let Err(err) = staging.close() {
            warn!("Cannot remove staging directory: {err}");
        }

        Ok(moves.into_iter().map(|(_, target)| target).collect())
    }

    async fn process_bag(&self, unwrapper: &BagUnwrapper<'_>, bag: PathBuf, summary: &mut RunSummary) {
        match unwrapper.unwrap_bag(&bag).await {
            Ok(UnwrapOutcome::Unwrapped { id, moved }) => {
                println!(" > {id}: unbagged {moved} item(s) from {}", bag.display());
                summary.unwrapped.push(id);
            }
            Ok(UnwrapOutcome::Retained {
                id,
                moved,
                collisions,
            }) => {
                let output = id.output_dir(&self.root);
                for collision in &collisions {
                    eprintln!(
                        " > {id}: NOT MOVED - {} already holds an entry named like {}",
                        output.display(),
                        collision.display()
                    );
                }
                eprintln!(
                    " > {id}: KEPT - moved {moved} item(s) but {} still holds objects",
                    bag.display()
                );
                summary.retained.push(bag);
            }
            Err(err) => {
                eprintln!(" > {}: FAILED - {err:#}", bag.display());
                summary.failed_bags.push(bag);
            }
        }
    }
}

/// Rename every `(source, target)` pair, undoing the completed renames if
/// one fails.
async fn move_all(moves: &[(PathBuf, PathBuf)]) -> Result<()> {
    for (done, (source, target)) in moves.iter().enumerate() {
        let Err(err) = fs::rename(source, target).await else {
            continue;
        };

        for (source, target) in moves[..done].iter().rev() {
            if let Err(undo) = fs::rename(target, source).await {
                warn!("Cannot move {} back to {}: {undo}", target.display(), source.display());
            }
        }

        return Err(err)
            .with_context(|| format!("Cannot move {} to {}", source.display(), target.display()));
    }

    Ok(())
}
