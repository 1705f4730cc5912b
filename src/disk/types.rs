/// 每个逻辑块（Block）的大小：512B
/// 所有层共用同一个块大小，文件系统以“块”为最小读写单位。
pub const BLOCK_SIZE: usize = 512;

/// 新建镜像时的默认块数：2048 块 = 1MB
pub const DEFAULT_BLOCK_COUNT: u32 = 2048;

/// 定义一个逻辑块类型（每块 512B 的字节数组）
/// 所有磁盘读写都以 Block 为单位进行。
pub type Block = [u8; BLOCK_SIZE];
