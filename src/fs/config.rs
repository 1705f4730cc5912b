use crate::disk::types::BLOCK_SIZE;

pub const SUPER_BLOCK_BLOCK_ID: u32 = 0;

/// 超级块记录固定 512 字节，与块大小无关
pub const SUPER_BLOCK_SIZE: usize = 512;

// 每个 inode 记录 8 字节：size + head
pub const INODE_RECORD_SIZE: usize = 8;

// 每个链表项 4 字节：next
pub const CHAIN_ENTRY_SIZE: usize = 4;

/// 一个 inode 块能容纳的 inode 数（K）
pub const INODES_PER_BLOCK: u32 = (BLOCK_SIZE / INODE_RECORD_SIZE) as u32;

/// 一个链表块能容纳的链表项数（M）
pub const ENTRIES_PER_BLOCK: u32 = (BLOCK_SIZE / CHAIN_ENTRY_SIZE) as u32;

/// 空链 / 链尾 / 空闲链表为空，统一用 -1 表示
pub const NIL: i32 = -1;

const _: () = assert!(SUPER_BLOCK_SIZE <= BLOCK_SIZE);
const _: () = assert!(BLOCK_SIZE % INODE_RECORD_SIZE == 0);
const _: () = assert!(BLOCK_SIZE % CHAIN_ENTRY_SIZE == 0);

/// 把磁盘上的链接值转换为表项下标，负数一律视为空
pub fn from_link(raw: i32) -> Option<u32> {
    u32::try_from(raw).ok()
}

pub fn to_link(entry: Option<u32>) -> i32 {
    entry.map_or(NIL, |e| e as i32)
}
