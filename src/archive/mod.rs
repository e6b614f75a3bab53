mod tar_bz2;

pub use tar_bz2::TarBz2Unpacker;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for decoding an archive file into a destination directory
#[async_trait]
pub trait Unpack: Send + Sync {
    /// Unpack every entry of `archive` beneath `dest`.
    ///
    /// `dest` must already exist. On error the destination may hold a partial
    /// tree; callers that need all-or-nothing behavior should unpack into a
    /// scratch directory first.
    async fn unpack(&self, archive: &Path, dest: &Path) -> Result<()>;

    /// File name suffix of archives this unpacker understands
    fn suffix(&self) -> &'static str;
}
