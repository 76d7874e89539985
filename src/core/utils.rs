/// Keep at most `limit` characters of `text`, on a char boundary
pub fn truncate_preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_preview() {
        assert_eq!(truncate_preview("hello", 10), "hello");
        assert_eq!(truncate_preview("hello", 3), "hel");
        assert_eq!(truncate_preview("", 3), "");
        // multi-byte characters are never split
        assert_eq!(truncate_preview("héllo", 2), "hé");
    }
}
