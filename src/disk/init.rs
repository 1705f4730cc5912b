use std::{path::PathBuf, sync::mpsc::Sender};

use crate::{
    disk::file_disk::FileDisk,
    fs::{error::FileSystemError, ChainFs},
};

/// 启动过程中发给前台（进度条）的消息
#[derive(Debug)]
pub enum BootProgress {
    Step(&'static str),
    Progress(u64),
    Finished(Result<ChainFs<FileDisk>, FileSystemError>),
}

/// 镜像参数
#[derive(Debug, Clone)]
pub struct DiskOptions {
    pub path: PathBuf,
    pub blocks: u32,
    pub inodes: u32,
}

/// 打开磁盘镜像，必要时格式化，最后做一次一致性检查。
/// 前台可能已经退出，发送失败直接忽略。
pub fn perform_disk_initialization(tx: Sender<BootProgress>, options: DiskOptions) {
    let _ = tx.send(BootProgress::Finished(initialize(&tx, &options)));
}

fn initialize(
    tx: &Sender<BootProgress>,
    options: &DiskOptions,
) -> Result<ChainFs<FileDisk>, FileSystemError> {
    let _ = tx.send(BootProgress::Step("🧠 Initializing virtual disk..."));
    let disk = FileDisk::open(&options.path, options.blocks)?;
    let _ = tx.send(BootProgress::Progress(30));

    let _ = tx.send(BootProgress::Step("⚙️  Mounting file system..."));
    // 已格式化的镜像不会被改动
    let fs = ChainFs::format(disk, 0, options.inodes)?;
    let _ = tx.send(BootProgress::Progress(70));

    let _ = tx.send(BootProgress::Step("🔍 Checking block chains..."));
    let usage = fs.check()?;
    log::info!(
        "mounted {}: {} free / {} used of {} blocks",
        options.path.display(),
        usage.free,
        usage.used,
        usage.total
    );
    let _ = tx.send(BootProgress::Progress(100));

    Ok(fs)
}
