use crate::disk::types::{Block, BLOCK_SIZE};

/// 把任意字节拷进一个块，不足部分补零，超出部分截断
pub fn block_from_bytes(bytes: &[u8]) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    let len = bytes.len().min(BLOCK_SIZE);
    block[..len].copy_from_slice(&bytes[..len]);
    block
}

/// 块内容去掉末尾的零字节后按 UTF-8 显示
pub fn block_to_text(block: &Block) -> String {
    let end = block.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&block[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip() {
        let block = block_from_bytes(b"hello");
        assert_eq!(&block[..5], b"hello");
        assert!(block[5..].iter().all(|&b| b == 0));
        assert_eq!(block_to_text(&block), "hello");
        assert_eq!(block_to_text(&[0u8; BLOCK_SIZE]), "");
    }

    #[test]
    fn oversized_input_is_truncated() {
        let bytes = vec![b'x'; BLOCK_SIZE + 10];
        let block = block_from_bytes(&bytes);
        assert_eq!(block_to_text(&block).len(), BLOCK_SIZE);
    }
}
