//! 表单数值解析
//!
//! 面板输入框里的数值字段按"前缀整数"规则解析：
//! 跳过前导空白，允许一个正负号，读取随后的连续数字，其余字符忽略。
//! 例如 `"012"` -> 12，`"7章"` -> 7，`"abc"` -> None。

/// 解析字符串开头的整数
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let digits_len = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits_len == 0 {
        return None;
    }

    let value: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// 解析正整数，解析失败或为 0 时使用默认值
pub fn parse_or_default(input: &str, default: u32) -> u32 {
    match parse_leading_int(input) {
        Some(v) if v != 0 => u32::try_from(v).unwrap_or(default),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("012"), Some(12));
        assert_eq!(parse_leading_int("  7章"), Some(7));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(parse_or_default("2500", 2000), 2500);
        assert_eq!(parse_or_default("", 2000), 2000);
        assert_eq!(parse_or_default("0", 3000), 3000);
        assert_eq!(parse_or_default("-5", 3000), 3000);
    }
}
