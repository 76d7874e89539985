//! Output checking
//!
//! Program output is compared with the expected answer after normalization:
//! CRLF line endings become LF and surrounding whitespace is trimmed. Interior
//! whitespace is significant.

/// Normalize program or expected output for comparison
pub fn normalize_output(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}

/// Compare program output with expected output
pub fn compare_output(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_output_exact_match() {
        assert!(compare_output("hello\nworld", "hello\nworld"));
    }

    #[test]
    fn test_compare_output_outer_whitespace() {
        assert!(compare_output("  5\n\n", "5"));
        assert!(compare_output("\n\thello\nworld \n", "hello\nworld"));
    }

    #[test]
    fn test_compare_output_crlf() {
        assert!(compare_output("1\r\n2\r\n", "1\n2"));
    }

    #[test]
    fn test_compare_output_interior_whitespace_matters() {
        assert!(!compare_output("1  2", "1 2"));
        assert!(!compare_output("hello \nworld", "hello\nworld"));
    }

    #[test]
    fn test_compare_output_different() {
        assert!(!compare_output("hello\nworld\n", "hello\nearth\n"));
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("\r\n 42 \r\n"), "42");
        assert_eq!(normalize_output(""), "");
    }
}
