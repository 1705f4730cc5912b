use chainfs::{
    fs::{
        config::{ENTRIES_PER_BLOCK, INODES_PER_BLOCK, NIL},
        format,
        inode_table::InodeTable,
        layout::Layout,
        super_block::SuperBlock,
    },
    Block, BlockStore, ChainFs, FileSystemError, MemDisk, Usage, BLOCK_SIZE,
};

fn pattern(tag: u8) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    for (i, b) in block.iter_mut().enumerate() {
        *b = tag.wrapping_add(i as u8);
    }
    block
}

fn read(fs: &ChainFs<impl BlockStore>, ino: u32, offset: u32) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    fs.read(ino, offset, &mut block).unwrap();
    block
}

fn assert_partitioned(fs: &ChainFs<impl BlockStore>) -> Usage {
    let usage = fs.check().unwrap();
    assert_eq!(usage.leaked, 0, "{:?}", usage);
    assert_eq!(usage.free + usage.used, usage.total, "{:?}", usage);
    usage
}

#[test]
fn small_device_scenario() {
    let fs = ChainFs::format(MemDisk::new(64), 0, 16).unwrap();

    let sb = fs.super_block().unwrap();
    assert_eq!(sb.inode_table_block_count, 1);
    assert_eq!(sb.chain_table_block_count, 1);
    assert_eq!(sb.free_list_head, 0);
    assert_eq!(fs.inode_count().unwrap(), INODES_PER_BLOCK);

    for offset in 0..3 {
        fs.write(0, offset, &pattern(offset as u8)).unwrap();
    }
    assert_eq!(fs.getsize(0).unwrap(), 3);
    assert_eq!(fs.super_block().unwrap().free_list_head, 3);
    assert_eq!(
        assert_partitioned(&fs),
        Usage {
            total: 61,
            free: 58,
            used: 3,
            leaked: 0
        }
    );

    fs.setsize(0, 1).unwrap();
    assert_eq!(fs.getsize(0).unwrap(), 1);
    // 释放的两项被挂到空闲链表头
    assert_eq!(fs.super_block().unwrap().free_list_head, 1);
    assert_eq!(assert_partitioned(&fs).free, 60);
    assert_eq!(read(&fs, 0, 0), pattern(0));
}

#[test]
fn write_then_read_round_trip() {
    let fs = ChainFs::format(MemDisk::new(256), 0, 8).unwrap();

    fs.write(2, 0, &pattern(7)).unwrap();
    assert_eq!(read(&fs, 2, 0), pattern(7));

    // 原地覆盖不改变长度，也不动空闲链表
    let before = fs.super_block().unwrap();
    fs.write(2, 0, &pattern(9)).unwrap();
    assert_eq!(read(&fs, 2, 0), pattern(9));
    assert_eq!(fs.getsize(2).unwrap(), 1);
    assert_eq!(fs.super_block().unwrap(), before);
}

#[test]
fn growth_preserves_prior_content() {
    let fs = ChainFs::format(MemDisk::new(512), 0, 8).unwrap();

    // 两个文件交替增长，块链在表中交错
    for offset in 0..40u32 {
        fs.write(0, offset, &pattern(offset as u8)).unwrap();
        fs.write(1, offset, &pattern(100 + offset as u8)).unwrap();
    }
    // 跳跃写入一次扩展多个块
    fs.write(3, 5, &pattern(200)).unwrap();
    assert_eq!(fs.getsize(3).unwrap(), 6);

    for offset in 0..40u32 {
        assert_eq!(read(&fs, 0, offset), pattern(offset as u8));
        assert_eq!(read(&fs, 1, offset), pattern(100 + offset as u8));
    }
    assert_eq!(read(&fs, 3, 5), pattern(200));
    assert_eq!(assert_partitioned(&fs).used, 86);
}

#[test]
fn read_past_end_is_rejected() {
    let fs = ChainFs::format(MemDisk::new(64), 0, 4).unwrap();
    let mut block = [0u8; BLOCK_SIZE];

    assert!(matches!(
        fs.read(0, 0, &mut block),
        Err(FileSystemError::OffsetOutOfRange {
            ino: 0,
            offset: 0,
            size: 0
        })
    ));

    fs.write(0, 1, &pattern(1)).unwrap();
    assert!(fs.read(0, 0, &mut block).is_ok());
    assert!(matches!(
        fs.read(0, 2, &mut block),
        Err(FileSystemError::OffsetOutOfRange { size: 2, .. })
    ));
}

#[test]
fn operations_need_a_formatted_device() {
    let fs = ChainFs::new(MemDisk::new(64), 0);
    let mut block = [0u8; BLOCK_SIZE];

    assert!(matches!(fs.getsize(0), Err(FileSystemError::NotFormatted)));
    assert!(matches!(
        fs.read(0, 0, &mut block),
        Err(FileSystemError::NotFormatted)
    ));
    assert!(matches!(
        fs.write(0, 0, &block),
        Err(FileSystemError::NotFormatted)
    ));
    assert!(matches!(fs.check(), Err(FileSystemError::NotFormatted)));
}

#[test]
fn inode_numbers_are_bounded_by_the_table() {
    let fs = ChainFs::format(MemDisk::new(64), 0, 16).unwrap();
    let last = fs.inode_count().unwrap() - 1;

    assert_eq!(fs.getsize(last).unwrap(), 0);
    assert!(matches!(
        fs.getsize(last + 1),
        Err(FileSystemError::InvalidInode(ino)) if ino == last + 1
    ));
    assert!(matches!(
        fs.setsize(last + 1, 1),
        Err(FileSystemError::InvalidInode(_))
    ));
}

#[test]
fn disk_full_leaves_image_untouched() {
    let disk = MemDisk::new(64);
    let fs = ChainFs::format(&disk, 0, 16).unwrap();
    fs.write(0, 0, &pattern(1)).unwrap();

    let sb = fs.super_block().unwrap();
    let usage = assert_partitioned(&fs);

    assert!(matches!(fs.setsize(1, 61), Err(FileSystemError::DiskFull)));
    assert!(matches!(
        fs.write(1, 60, &pattern(2)),
        Err(FileSystemError::DiskFull)
    ));
    assert_eq!(fs.super_block().unwrap(), sb);
    assert_eq!(fs.getsize(1).unwrap(), 0);
    assert_eq!(assert_partitioned(&fs), usage);

    // 恰好用完
    fs.setsize(1, 60).unwrap();
    assert_eq!(fs.super_block().unwrap().free_list_head, NIL);
    assert!(matches!(
        fs.write(2, 0, &pattern(3)),
        Err(FileSystemError::DiskFull)
    ));
    assert_eq!(assert_partitioned(&fs).free, 0);

    // 释放之后又能分配
    fs.setsize(1, 0).unwrap();
    fs.write(2, 0, &pattern(3)).unwrap();
    assert_eq!(read(&fs, 2, 0), pattern(3));
}

#[test]
fn shrink_to_zero_returns_every_block() {
    let fs = ChainFs::format(MemDisk::new(300), 0, 8).unwrap();
    fs.setsize(4, 150).unwrap();
    assert_eq!(assert_partitioned(&fs).used, 150);

    fs.setsize(4, 0).unwrap();
    assert_eq!(fs.getsize(4).unwrap(), 0);
    let usage = assert_partitioned(&fs);
    assert_eq!(usage.used, 0);
    assert_eq!(usage.free, usage.total);

    // 空链上的 setsize(0) 什么都不做
    fs.setsize(4, 0).unwrap();
    assert_eq!(assert_partitioned(&fs), usage);
}

#[test]
fn regrowth_may_expose_stale_blocks() {
    let fs = ChainFs::format(MemDisk::new(64), 0, 4).unwrap();
    for offset in 0..4 {
        fs.write(0, offset, &pattern(10 + offset as u8)).unwrap();
    }

    fs.setsize(0, 1).unwrap();
    fs.setsize(0, 4).unwrap();

    // 释放的块没有清零，刚刚释放的块又按原顺序分配回来
    for offset in 1..4 {
        assert_eq!(read(&fs, 0, offset), pattern(10 + offset as u8));
    }
    assert_partitioned(&fs);
}

#[test]
fn format_is_idempotent() {
    let disk = MemDisk::new(128);
    let fs = ChainFs::format(&disk, 0, 32).unwrap();
    fs.write(3, 2, &pattern(5)).unwrap();
    let sb = fs.super_block().unwrap();
    let usage = fs.check().unwrap();

    format::create(&disk, 0, 32).unwrap();
    format::create(&disk, 0, 1000).unwrap();

    assert_eq!(fs.super_block().unwrap(), sb);
    assert_eq!(fs.check().unwrap(), usage);
    assert_eq!(fs.getsize(3).unwrap(), 3);
    assert_eq!(read(&fs, 3, 2), pattern(5));
}

#[test]
fn erase_allows_a_fresh_format() {
    let disk = MemDisk::new(128);
    let fs = ChainFs::format(&disk, 0, 32).unwrap();
    fs.write(0, 0, &pattern(5)).unwrap();

    format::erase(&disk, 0).unwrap();
    assert!(matches!(fs.getsize(0), Err(FileSystemError::NotFormatted)));

    format::create(&disk, 0, 200).unwrap();
    assert_eq!(fs.getsize(0).unwrap(), 0);
    assert_eq!(fs.super_block().unwrap().inode_table_block_count, 4);
    assert_partitioned(&fs);
}

#[test]
fn format_rejects_tiny_devices() {
    assert!(matches!(
        ChainFs::format(MemDisk::new(2), 0, 1),
        Err(FileSystemError::InvalidGeometry(_))
    ));
    assert!(matches!(
        ChainFs::format(MemDisk::new(64), 0, 0),
        Err(FileSystemError::InvalidGeometry(_))
    ));
}

#[test]
fn on_disk_layout() {
    let disk = MemDisk::new(64);
    let fs = ChainFs::format(&disk, 0, 16).unwrap();
    fs.write(0, 0, &pattern(42)).unwrap();

    let mut raw = [0u8; BLOCK_SIZE];
    disk.read(0, 0, &mut raw).unwrap();
    assert_eq!(&raw[..12], &[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]);
    assert!(raw[12..].iter().all(|&b| b == 0));

    // inode 0: size 1, head 0；inode 1: size 0, head -1
    disk.read(0, 1, &mut raw).unwrap();
    assert_eq!(&raw[..16], &[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]);

    // 链表：0 是 inode 0 的链尾，1 -> 2，最后一个数据块 60 是空闲链表尾
    disk.read(0, 2, &mut raw).unwrap();
    assert_eq!(&raw[..8], &[0xff, 0xff, 0xff, 0xff, 2, 0, 0, 0]);
    assert_eq!(&raw[60 * 4..61 * 4], &[0xff; 4]);
    assert_eq!(ENTRIES_PER_BLOCK as usize * 4, BLOCK_SIZE);

    // 第 0 项对应紧跟在链表之后的数据块
    disk.read(0, 3, &mut raw).unwrap();
    assert_eq!(raw, pattern(42));
}

#[test]
fn check_detects_shared_chains() {
    let disk = MemDisk::new(64);
    let fs = ChainFs::format(&disk, 0, 16).unwrap();
    fs.write(0, 1, &pattern(1)).unwrap();

    let layout = Layout::of(&fs.super_block().unwrap());
    let mut table = InodeTable::load(&disk, 0, layout.inode_block(0)).unwrap();
    let inode = table.get_inode(0).unwrap();
    table.set_inode(1, &inode).unwrap();
    table.sync(&disk, 0).unwrap();

    assert!(matches!(fs.check(), Err(FileSystemError::Corrupted(_))));
}

#[test]
fn check_reports_leaked_entries() {
    let disk = MemDisk::new(64);
    let fs = ChainFs::format(&disk, 0, 16).unwrap();

    // 模拟中途失败：空闲链表头前移，但没有任何 inode 接手
    let mut sb = SuperBlock::load(&disk, 0).unwrap();
    sb.set_free_head(Some(5));
    sb.sync(&disk, 0).unwrap();

    let usage = fs.check().unwrap();
    assert_eq!(usage.leaked, 5);
    assert_eq!(usage.free, usage.total - 5);
}

#[test]
fn check_reports_a_leaked_tail_chain() {
    let disk = MemDisk::new(64);
    let fs = ChainFs::format(&disk, 0, 16).unwrap();
    fs.setsize(3, 61).unwrap();

    // inode 3 持有全部数据块，直接清空它的记录，整条链都无人认领
    let layout = Layout::of(&fs.super_block().unwrap());
    let mut table = InodeTable::load(&disk, 0, layout.inode_block(3)).unwrap();
    let mut inode = table.get_inode(3).unwrap();
    inode.size = 0;
    inode.head = NIL;
    table.set_inode(3, &inode).unwrap();
    table.sync(&disk, 0).unwrap();

    let usage = fs.check().unwrap();
    assert_eq!(usage.total, 61);
    assert_eq!(usage.leaked, 61);
}

#[test]
fn oversized_region_counts_are_corruption() {
    let disk = MemDisk::new(64);
    let fs = ChainFs::format(&disk, 0, 16).unwrap();
    let pristine = SuperBlock::load(&disk, 0).unwrap();

    let mut sb = pristine;
    sb.inode_table_block_count = i32::MAX;
    sb.sync(&disk, 0).unwrap();
    assert!(matches!(fs.getsize(0), Err(FileSystemError::Corrupted(_))));

    let mut sb = pristine;
    sb.chain_table_block_count = i32::MAX;
    sb.sync(&disk, 0).unwrap();
    assert!(matches!(fs.check(), Err(FileSystemError::Corrupted(_))));
    assert!(matches!(
        fs.write(0, 0, &pattern(1)),
        Err(FileSystemError::Corrupted(_))
    ));

    // 区域本身不溢出，但超出了设备
    let mut sb = pristine;
    sb.chain_table_block_count = 63;
    sb.sync(&disk, 0).unwrap();
    assert!(matches!(fs.getsize(0), Err(FileSystemError::Corrupted(_))));

    pristine.sync(&disk, 0).unwrap();
    assert_partitioned(&fs);
}

#[test]
fn check_ignores_growth_after_format() {
    let disk = MemDisk::new(512);
    let fs = ChainFs::format(&disk, 0, 128).unwrap();
    let before = assert_partitioned(&fs);
    assert_eq!(before.total, 505);

    fs.write(1, 9, &pattern(9)).unwrap();
    disk.setsize(0, 2048).unwrap();

    // 最后一个链表块里多出来的槽位从未进过空闲链表
    let after = assert_partitioned(&fs);
    assert_eq!(after.total, 505);
    assert_eq!(after.used, 10);
}

#[test]
fn broken_chain_is_reported() {
    let disk = MemDisk::new(64);
    let fs = ChainFs::format(&disk, 0, 16).unwrap();
    fs.setsize(0, 3).unwrap();

    // 把 inode 0 的长度改大，链却没变
    let layout = Layout::of(&fs.super_block().unwrap());
    let mut table = InodeTable::load(&disk, 0, layout.inode_block(0)).unwrap();
    let mut inode = table.get_inode(0).unwrap();
    inode.size = 5;
    table.set_inode(0, &inode).unwrap();
    table.sync(&disk, 0).unwrap();

    let mut block = [0u8; BLOCK_SIZE];
    assert!(matches!(
        fs.read(0, 4, &mut block),
        Err(FileSystemError::ChainBroken(_))
    ));
    assert!(matches!(
        fs.setsize(0, 1),
        Err(FileSystemError::ChainBroken(_))
    ));
    assert!(matches!(fs.check(), Err(FileSystemError::ChainBroken(_))));
}

#[test]
fn lower_store_errors_propagate() {
    let disk = MemDisk::new(64);
    let fs = ChainFs::format(&disk, 0, 16).unwrap();
    fs.write(0, 10, &pattern(1)).unwrap();

    // 截掉数据区的后半部分
    disk.setsize(0, 8).unwrap();
    let mut block = [0u8; BLOCK_SIZE];
    assert!(matches!(
        fs.read(0, 10, &mut block),
        Err(FileSystemError::Io(_))
    ));
    assert!(fs.read(0, 2, &mut block).is_ok());
}

#[test]
fn random_operations_keep_the_partition() {
    let fs = ChainFs::format(MemDisk::new(400), 0, 16).unwrap();
    let inodes = 16;
    let mut sizes = vec![0u32; inodes as usize];

    // 线性同余，保证可重复
    let mut seed: u32 = 0x2545_f491;
    let mut next = |bound: u32| {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (seed >> 8) % bound
    };

    for step in 0..300 {
        let ino = next(inodes);
        let result = match next(3) {
            0 => fs.write(ino, next(40), &pattern(step as u8)),
            1 => fs.setsize(ino, next(30)),
            _ => fs.setsize(ino, 0),
        };
        match result {
            Ok(()) | Err(FileSystemError::DiskFull) => {}
            Err(e) => panic!("step {}: {}", step, e),
        }
        sizes[ino as usize] = fs.getsize(ino).unwrap();

        let usage = assert_partitioned(&fs);
        assert_eq!(usage.used, sizes.iter().sum::<u32>(), "step {}", step);
    }
}
