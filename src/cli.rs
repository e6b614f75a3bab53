use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "unbag")]
#[command(version)]
#[command(about = "Unpack BagIt AIPs into folders named by AIP ID", long_about = None)]
#[command(after_help = "Finds every *.tar.bz2 AIP under ROOT, extracts it, moves the contents of\n\
  each bag's objects folder into ROOT/<AIP ID>/ and deletes the bag metadata.\n\
  Archives are left in place; AIPs whose folder already exists are skipped.\n\n\
Examples:\n  \
  unbag /data/aips               unpack every AIP under /data/aips\n  \
  RUST_LOG=debug unbag /data/aips  also log each file moved")]
pub struct Cli {
    /// Directory containing the AIPs to unpack
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,
}
