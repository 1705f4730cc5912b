use std::fmt;

/// 文件系统错误类型
#[derive(Debug)]
pub enum FileSystemError {
    Io(std::io::Error), // 底层块存储读写失败
    OffsetOutOfRange { ino: u32, offset: u32, size: u32 },
    ChainBroken(String),     // 链表比预期短，元数据已损坏
    NotFormatted,            // 尚未格式化
    DiskFull,                // 空闲链表不够长
    InvalidInode(u32),       // inode 编号超出 inode 表
    InvalidGeometry(String), // 设备太小或参数非法，无法格式化
    Corrupted(String),       // 一致性检查发现共享或成环的链
}

impl From<std::io::Error> for FileSystemError {
    fn from(e: std::io::Error) -> Self {
        FileSystemError::Io(e)
    }
}

impl From<bincode::Error> for FileSystemError {
    fn from(e: bincode::Error) -> Self {
        match *e {
            bincode::ErrorKind::Io(e) => FileSystemError::Io(e),
            other => FileSystemError::Corrupted(format!("bad on-disk record: {}", other)),
        }
    }
}

impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Disk I/O error: {}", e),
            Self::OffsetOutOfRange { ino, offset, size } => write!(
                f,
                "Offset {} out of range for inode {} (size {} blocks)",
                offset, ino, size
            ),
            Self::ChainBroken(desc) => write!(f, "Block chain broken: {}", desc),
            Self::NotFormatted => write!(f, "Device is not formatted"),
            Self::DiskFull => write!(f, "Disk space is full"),
            Self::InvalidInode(ino) => write!(f, "Invalid inode: {}", ino),
            Self::InvalidGeometry(desc) => write!(f, "Invalid geometry: {}", desc),
            Self::Corrupted(desc) => write!(f, "File system corrupted: {}", desc),
        }
    }
}

// 支持链式错误，方便追踪底层原因
impl std::error::Error for FileSystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;
