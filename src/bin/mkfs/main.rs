mod cli;

use std::error::Error;
use std::fs::{self, OpenOptions};

use chainfs::{utils::block_from_bytes, ChainFs, FileDisk, BLOCK_SIZE};
use clap::Parser;
use cli::Cli;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let fd = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&cli.image)?;
    fd.set_len(cli.blocks as u64 * BLOCK_SIZE as u64)?;

    let volume = ChainFs::format(FileDisk::from_file(fd), 0, cli.inodes)?;
    let inode_count = volume.inode_count()?;

    for (k, path) in cli.files.iter().enumerate() {
        let ino = k as u32 + 1;
        if ino >= inode_count {
            return Err(format!("no inode left for {}", path.display()).into());
        }

        let data = fs::read(path)?;
        log::info!("packing {} ({} bytes) into inode {}", path.display(), data.len(), ino);
        for (offset, chunk) in data.chunks(BLOCK_SIZE).enumerate() {
            volume.write(ino, offset as u32, &block_from_bytes(chunk))?;
        }
        println!("inode {}: {:?}", ino, path);
    }

    let usage = volume.check()?;
    println!(
        "{:?}: {} inodes, {} of {} data blocks free",
        cli.image, inode_count, usage.free, usage.total
    );
    Ok(())
}
