use chainfs::disk::types::DEFAULT_BLOCK_COUNT;
use clap::Parser;
use std::path::PathBuf;

/// Create and format a chainfs image, optionally packing host files into it
#[derive(Parser)]
#[command(version)]
pub struct Cli {
    /// Output image
    #[arg(long, short)]
    pub image: PathBuf,

    /// Image size in blocks
    #[arg(long, short, default_value_t = DEFAULT_BLOCK_COUNT)]
    pub blocks: u32,

    /// Number of inodes
    #[arg(long, short = 'n', default_value_t = 128)]
    pub inodes: u32,

    /// Files to store; the k-th file goes to inode k + 1
    pub files: Vec<PathBuf>,
}
