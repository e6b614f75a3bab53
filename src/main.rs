//! Main entry point for the unbag CLI application.
//!
//! Unpacks every AIP archive under the given directory and reports progress
//! on the console.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

use unbag::{AipUnpacker, Cli, TarBz2Unpacker};

/// Application entry point.
///
/// Runs on a single-threaded runtime: archives and bags are processed one at
/// a time. Only an unusable root directory ends in an error exit; problems
/// with individual AIPs are reported and counted in the completion line.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let unpacker = AipUnpacker::new(&cli.root, TarBz2Unpacker)?;
    let summary = unpacker.run().await?;

    println!("{}", summary.completion_message());

    Ok(())
}
