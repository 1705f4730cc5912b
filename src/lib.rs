//! 教学内核的存储层：用类似 FAT 的链表把 (inode, 块偏移) 映射到块设备上。
//!
//! 自下而上：
//! - [`disk`]：块存储接口与两个实现（镜像文件、内存）；
//! - [`fs`]：超级块、布局换算、inode 表、链表遍历、格式化与 inode 操作。

pub mod disk;
pub mod fs;
pub mod utils;

pub use disk::{Block, BlockStore, FileDisk, MemDisk, BLOCK_SIZE};
pub use fs::{check::Usage, error::FileSystemError, ChainFs};
