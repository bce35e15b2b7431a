//! 分组工具
//!
//! 把待处理列表切成固定大小的组，两条解析分支共用：
//! 组内并发，组间严格串行。

/// 按固定大小切分切片
///
/// 最后一组可能不足 `size` 个；`size` 为 0 时按 1 处理。
/// 同一输入重复调用产生完全相同的分组。
pub fn slice_into_chunks<T>(items: &[T], size: usize) -> impl Iterator<Item = &[T]> {
    items.chunks(size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let items: Vec<u32> = (0..20).collect();
        let chunks: Vec<&[u32]> = slice_into_chunks(&items, 10).collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[1].len(), 10);
    }

    #[test]
    fn test_last_chunk_shorter() {
        let items: Vec<u32> = (0..25).collect();
        let chunks: Vec<&[u32]> = slice_into_chunks(&items, 10).collect();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 5);
        assert_eq!(chunks[2], &[20, 21, 22, 23, 24]);
    }

    #[test]
    fn test_empty_input() {
        let items: Vec<u32> = Vec::new();
        assert_eq!(slice_into_chunks(&items, 10).count(), 0);
    }

    #[test]
    fn test_zero_size_treated_as_one() {
        let items = [1, 2, 3];
        let chunks: Vec<&[i32]> = slice_into_chunks(&items, 0).collect();
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_deterministic_regrouping() {
        let items: Vec<u32> = (0..13).collect();
        let first: Vec<Vec<u32>> = slice_into_chunks(&items, 4).map(|c| c.to_vec()).collect();
        let second: Vec<Vec<u32>> = slice_into_chunks(&items, 4).map(|c| c.to_vec()).collect();
        assert_eq!(first, second);
    }
}
