//! # unbag
//!
//! Unpacks Archival Information Packages (AIPs) stored as `.tar.bz2`
//! BagIt bags, keeping only the preservation content.
//!
//! For every archive under a root directory, the bag is extracted, the
//! contents of its `objects` folder are moved into `<root>/<AIP ID>/`, and the
//! bag metadata (manifests, tag files, wrapper folders) is deleted. Archives
//! are left where they are, so running again on the same directory is safe:
//! AIPs that already have an output folder are skipped.
//!
//! ## Features
//!
//! - Recursive discovery of archives and bag directories
//! - All-or-nothing extraction per archive through a staging directory
//! - Never overwrites existing output; conflicts keep the bag on disk
//! - One failing archive or bag never stops the rest of the batch
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use unbag::{AipUnpacker, TarBz2Unpacker};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let unpacker = AipUnpacker::new(Path::new("/data/aips"), TarBz2Unpacker)?;
//!     let summary = unpacker.run().await?;
//!
//!     for id in &summary.unwrapped {
//!         println!("{id}");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod aip;
pub mod archive;
pub mod cli;

#[cfg(test)]
mod test_fixtures;

pub use aip::{AipId, AipState, AipUnpacker, ArchiveEntry, BagUnwrapper, RunSummary, UnwrapOutcome};
pub use archive::{TarBz2Unpacker, Unpack};
pub use cli::Cli;
