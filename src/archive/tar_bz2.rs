use super::Unpack;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bzip2::read::MultiBzDecoder;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Unpacker for bzip2-compressed tarballs (`.tar.bz2`)
#[derive(Debug, Clone, Copy, Default)]
pub struct TarBz2Unpacker;

impl TarBz2Unpacker {
    pub const SUFFIX: &'static str = ".tar.bz2";

    fn unpack_blocking(archive: &Path, dest: &Path) -> Result<()> {
        let file = File::open(archive)
            .with_context(|| format!("Cannot open archive {}", archive.display()))?;

        // Multi-stream aware so archives written by parallel bzip2 tools decode fully
        let decoder = MultiBzDecoder::new(BufReader::new(file));
        let mut tarball = tar::Archive::new(decoder);
        tarball.set_preserve_permissions(false);
        tarball.set_overwrite(false);

        // Entries that would land outside `dest` are skipped by the tar crate
        tarball
            .unpack(dest)
            .with_context(|| format!("Cannot unpack archive {}", archive.display()))
    }
}

#[async_trait]
impl Unpack for TarBz2Unpacker {
    async fn unpack(&self, archive: &Path, dest: &Path) -> Result<()> {
        let archive: PathBuf = archive.to_path_buf();
        let dest: PathBuf = dest.to_path_buf();

        // Decoding is blocking; hand it off and wait so the run stays sequential
        tokio::task::spawn_blocking(move || Self::unpack_blocking(&archive, &dest))
            .await
            .context("Archive decoding task panicked")?
    }

    fn suffix(&self) -> &'static str {
        Self::SUFFIX
    }
}
