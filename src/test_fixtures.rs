//! Builders for on-disk AIP fixtures used by unit tests

use bzip2::Compression;
use bzip2::write::BzEncoder;
use std::fs::File;
use std::path::Path;

/// Write a `.tar.bz2` archive holding `files` as `(path, contents)` pairs.
pub fn write_tar_bz2(path: &Path, files: &[(&str, &str)]) {
    let file = File::create(path).expect("Failed to create archive file");
    let encoder = BzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .expect("Failed to append archive entry");
    }

    builder
        .into_inner()
        .expect("Failed to finish tar stream")
        .finish()
        .expect("Failed to finish bzip2 stream");
}

/// Write a file under `root`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(&path, contents).expect("Failed to write file");
}
