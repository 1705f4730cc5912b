use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::{error::Error, time::Duration};

use chainfs::{
    disk::{BlockStore, FileDisk},
    fs::{format, layout::Layout},
    utils::{block_from_bytes, block_to_text},
    ChainFs, BLOCK_SIZE,
};

#[derive(Debug)]
pub enum Command {
    Help,
    Stat,
    Check,
    GetSize(u32),
    SetSize(u32, u32),
    Read(u32, u32),
    Write(u32, u32, String),
    Format(u32),
    Exit,
}

pub fn execute_command(cmd: &Command, fs: &ChainFs<FileDisk>) -> Result<(), Box<dyn Error>> {
    match cmd {
        Command::Help => print_help(),
        Command::Stat => {
            let sb = fs.super_block()?;
            let layout = Layout::of(&sb);
            let device_blocks = fs.below().getsize(fs.below_ino())?;
            println!(
                "{}\n{}: {}\n{}: {} ({} inodes)\n{}: {}\n{}: {}\n{}: {}\n",
                "📊 Superblock".bright_yellow().bold(),
                "Device blocks".blue(),
                device_blocks,
                "Inode table blocks".blue(),
                sb.inode_table_block_count,
                layout.inode_capacity(),
                "Chain table blocks".blue(),
                sb.chain_table_block_count,
                "Data blocks".blue(),
                layout.data_block_count(device_blocks),
                "Free list head".blue(),
                sb.free_head()
                    .map_or_else(|| "(empty)".to_string(), |e| e.to_string()),
            );
        }
        Command::Check => {
            let usage = fs.check()?;
            println!(
                "✅ {} free, {} used, {} leaked of {} blocks",
                usage.free.to_string().green(),
                usage.used.to_string().cyan(),
                if usage.leaked == 0 {
                    usage.leaked.to_string().normal()
                } else {
                    usage.leaked.to_string().red()
                },
                usage.total
            );
        }
        Command::GetSize(ino) => {
            println!("📏 inode {}: {} blocks", ino, fs.getsize(*ino)?);
        }
        Command::SetSize(ino, nblocks) => {
            fs.setsize(*ino, *nblocks)?;
            println!(
                "✅ inode {} resized to {} blocks",
                ino,
                nblocks.to_string().green()
            );
        }
        Command::Read(ino, offset) => {
            let mut block = [0u8; BLOCK_SIZE];
            fs.read(*ino, *offset, &mut block)?;
            println!("📖 inode {} block {}:", ino, offset);
            println!("{}", block_to_text(&block).cyan());
        }
        Command::Write(ino, offset, content) => {
            if content.len() > BLOCK_SIZE {
                println!(
                    "{}",
                    format!("⚠️  Content truncated to {} bytes", BLOCK_SIZE).yellow()
                );
            }
            fs.write(*ino, *offset, &block_from_bytes(content.as_bytes()))?;
            println!("✏️  Wrote inode {} block {}", ino, offset);
        }
        Command::Format(inodes) => {
            let confirmed = Confirm::new()
                .with_prompt("Erase every file on this image?")
                .default(false)
                .interact()?;
            if !confirmed {
                println!("{}", "Format cancelled.".bright_black());
                return Ok(());
            }

            println!("💾 Formatting virtual disk...");
            let pb = ProgressBar::new_spinner();
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
            pb.enable_steady_tick(Duration::from_millis(80));
            pb.set_message("writing inode and chain tables");
            format::erase(fs.below(), fs.below_ino())?;
            format::create(fs.below(), fs.below_ino(), *inodes)?;
            pb.finish_with_message("✅ Disk formatted successfully!");
        }
        Command::Exit => println!("{}", "👋 Exiting chainfs shell...".yellow().bold()),
    }

    Ok(())
}

fn print_help() {
    println!("{}", "📘 chainfs Commands".bright_cyan().bold());
    println!(
        "{}",
        "
  stat                       Show superblock and region sizes
  check                      Verify free list and block chains
  getsize <ino>              Show inode size in blocks
  setsize <ino> <n>          Grow or shrink inode to n blocks
  read <ino> <off>           Print block <off> of inode
  write <ino> <off> <str>    Write string into block <off> of inode
  format <inodes>            Erase and reformat the image
  help                       Show this help message
  exit                       Quit the shell
"
        .bright_black()
    );
}
