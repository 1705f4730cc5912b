use std::{error::Error, path::PathBuf};

use chainfs::disk::{init::DiskOptions, types::DEFAULT_BLOCK_COUNT};
use clap::Parser;

use crate::shell::start_shell;

mod shell;

/// Interactive shell over a chainfs disk image
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Disk image, created if missing
    #[arg(long, short, default_value = "disk.img")]
    image: PathBuf,

    /// Minimum image size in blocks
    #[arg(long, short, default_value_t = DEFAULT_BLOCK_COUNT)]
    blocks: u32,

    /// Inode count used when the image has to be formatted
    #[arg(long, short = 'n', default_value_t = 128)]
    inodes: u32,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    start_shell(DiskOptions {
        path: cli.image,
        blocks: cli.blocks,
        inodes: cli.inodes,
    })
}
