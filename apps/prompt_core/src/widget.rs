//! 前端输入框的显示辅助

/// 掩码字符
pub const MASK_CHAR: char = '•';

/// 隐藏敏感内容, 仅用于显示
pub fn mask_secret(value: &str, visible: bool) -> String {
    if visible {
        return value.to_string();
    }
    value.chars().map(|_| MASK_CHAR).collect()
}

/// 文本框自适应行数
///
/// 按 `cols` 折行计算行数, 并限制在 [min_rows, max_rows]
pub fn auto_grow_rows(text: &str, cols: usize, min_rows: usize, max_rows: usize) -> usize {
    let cols = cols.max(1);
    let max_rows = max_rows.max(min_rows);

    let rows: usize = text
        .split('\n')
        .map(|line| {
            let width = line.chars().count();
            width.div_ceil(cols).max(1)
        })
        .sum();

    rows.clamp(min_rows, max_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abc", false), "•••");
        assert_eq!(mask_secret("abc", true), "abc");
        assert_eq!(mask_secret("", false), "");
    }

    #[test]
    fn test_auto_grow_rows() {
        assert_eq!(auto_grow_rows("", 40, 3, 12), 3);
        assert_eq!(auto_grow_rows("a\nb\nc\nd", 40, 2, 12), 4);
        // 100 个字符按 40 列折成 3 行
        assert_eq!(auto_grow_rows(&"x".repeat(100), 40, 1, 12), 3);
        assert_eq!(auto_grow_rows(&"line\n".repeat(50), 40, 3, 12), 12);
        assert_eq!(auto_grow_rows("abc", 0, 1, 5), 3);
    }
}
