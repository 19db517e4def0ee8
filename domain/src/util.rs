//! Shared string helpers for log lines and progress output.

/// Truncate a string to at most `max_bytes` without splitting a UTF-8
/// character boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Shorten `s` to `max_chars` characters, marking the cut with `…`.
pub fn preview(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate_str("i-0abc", 32), "i-0abc");
    }

    #[test]
    fn truncate_backs_off_multibyte_boundary() {
        let s = "€€€"; // 3 bytes each
        assert_eq!(truncate_str(s, 4), "€");
        assert_eq!(truncate_str(s, 6), "€€");
    }

    #[test]
    fn preview_marks_cut() {
        let long = "x".repeat(80);
        let p = preview(&long, 20);
        assert_eq!(p.chars().count(), 20);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn preview_passthrough() {
        assert_eq!(preview("us-east-1", 20), "us-east-1");
    }
}
