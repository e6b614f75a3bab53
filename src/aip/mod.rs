//! AIP discovery, extraction and unbagging.
//!
//! ## Layout
//!
//! An AIP arrives as a compressed BagIt bag, e.g. `A001_bag.tar.bz2`, which
//! unpacks to:
//!
//! ```text
//! A001_bag/
//!   bagit.txt, manifest-*.txt, ...
//!   data/
//!     objects/        <- preservation content
//!       file1.txt
//! ```
//!
//! Unbagging moves the children of `objects` into `<root>/A001/` and
//! deletes `A001_bag/`. The archive itself is never touched.
//!
//! ## Components
//!
//! - [`structures`]: identifiers, archive entries and the per-AIP state
//! - [`locator`]: recursive scans for archives, bags and `objects` folders
//! - [`unwrapper`]: moving one bag's payload into its output directory
//! - [`unpacker`]: the end-to-end run over a root directory
//!
//! ## Re-running
//!
//! No state is kept outside the root directory. An AIP whose output
//! directory exists is skipped, a bag left over from an interrupted run is
//! unwrapped without re-extracting its archive, and a bag that could not be
//! fully drained stays on disk until the conflict is resolved.

pub mod locator;
mod structures;
mod unpacker;
mod unwrapper;

pub use structures::*;
pub use unpacker::{AipUnpacker, RunSummary};
pub use unwrapper::{BagUnwrapper, UnwrapOutcome};
