//! Common test utilities for unbag integration tests

use bzip2::Compression;
use bzip2::write::BzEncoder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch AIP root directory
pub struct TestRoot {
    #[allow(dead_code)]
    pub temp: TempDir,
    pub path: PathBuf,
}

impl TestRoot {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a `.tar.bz2` archive at `name` holding `(path, contents)` entries
    pub fn write_archive(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let path = self.path.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        let encoder = BzEncoder::new(
            File::create(&path).expect("Failed to create archive"),
            Compression::default(),
        );
        let mut builder = tar::Builder::new(encoder);
        for (entry, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            builder
                .append_data(&mut header, entry, contents.as_bytes())
                .expect("Failed to append entry");
        }
        builder
            .into_inner()
            .expect("Failed to finish tar stream")
            .finish()
            .expect("Failed to finish bzip2 stream");
        path
    }

    /// Write a standard single-file AIP archive for `id`
    pub fn write_aip(&self, id: &str, file: &str, contents: &str) -> PathBuf {
        let bag = format!("{id}_bag");
        let bagit = format!("{bag}/bagit.txt");
        let payload = format!("{bag}/data/objects/{file}");
        self.write_archive(
            &format!("{bag}.tar.bz2"),
            &[
                (bagit.as_str(), "BagIt-Version: 0.97\n"),
                (payload.as_str(), contents),
            ],
        )
    }

    pub fn write_file(&self, relative: &str, contents: &str) {
        let path = self.path.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, contents).expect("Failed to write file");
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path.join(relative).exists()
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path.join(relative)).expect("Failed to read file")
    }

    /// Every path under the root with its contents (empty for directories), sorted
    #[allow(dead_code)]
    pub fn snapshot(&self) -> Vec<(PathBuf, Vec<u8>)> {
        let mut entries = Vec::new();
        collect(&self.path, &self.path, &mut entries);
        entries.sort();
        entries
    }
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
    for entry in std::fs::read_dir(dir).expect("Failed to read directory") {
        let path = entry.expect("Failed to read entry").path();
        let relative = path.strip_prefix(root).expect("Path outside root").to_path_buf();
        if path.is_dir() {
            out.push((relative, Vec::new()));
            collect(root, &path, out);
        } else {
            out.push((relative, std::fs::read(&path).expect("Failed to read file")));
        }
    }
}
