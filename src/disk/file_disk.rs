use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
    disk::{
        block_device::BlockStore,
        types::{Block, BLOCK_SIZE},
    },
    fs::error::Result,
};

/// 以宿主机文件作为磁盘镜像的块设备
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
}

impl FileDisk {
    /// 打开（必要时创建）镜像文件，并保证其至少有 `min_blocks` 块。
    pub fn open<P: AsRef<Path>>(path: P, min_blocks: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        let wanted = min_blocks as u64 * BLOCK_SIZE as u64;
        if file.metadata()?.len() < wanted {
            log::info!(
                "extending image {} to {} blocks",
                path.as_ref().display(),
                min_blocks
            );
            file.set_len(wanted)?;
        }

        Ok(Self::from_file(file))
    }

    pub fn from_file(file: File) -> Self {
        Self {
            file: Mutex::new(file),
        }
    }

    fn file(&self) -> MutexGuard<'_, File> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BlockStore for FileDisk {
    fn read(&self, _ino: u32, block_no: u32, buf: &mut Block) -> Result<()> {
        let mut file = self.file();
        file.seek(SeekFrom::Start(block_no as u64 * BLOCK_SIZE as u64))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write(&self, _ino: u32, block_no: u32, buf: &Block) -> Result<()> {
        let mut file = self.file();
        file.seek(SeekFrom::Start(block_no as u64 * BLOCK_SIZE as u64))?;
        file.write_all(buf)?;
        Ok(())
    }

    fn getsize(&self, _ino: u32) -> Result<u32> {
        let len = self.file().metadata()?.len();
        Ok((len / BLOCK_SIZE as u64) as u32)
    }

    fn setsize(&self, _ino: u32, nblocks: u32) -> Result<()> {
        self.file().set_len(nblocks as u64 * BLOCK_SIZE as u64)?;
        Ok(())
    }
}
