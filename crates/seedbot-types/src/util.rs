//! UTF-8 safe string shortening.

/// Truncate `s` to at most `max_bytes`, backing off to the previous char
/// boundary so a codepoint is never split.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Shorten `s` for display, appending `...` when anything was cut.
pub fn ellipsize(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        s.to_string()
    } else {
        format!("{}...", truncate_str(s, max_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_untouched() {
        assert_eq!(truncate_str("seed", 10), "seed");
        assert_eq!(ellipsize("seed", 4), "seed");
    }

    #[test]
    fn ascii_cut() {
        assert_eq!(truncate_str("seedworld", 4), "seed");
        assert_eq!(ellipsize("seedworld", 4), "seed...");
    }

    #[test]
    fn zero_budget() {
        assert_eq!(truncate_str("seed", 0), "");
    }

    #[test]
    fn multibyte_never_split() {
        // Each emoji is 4 bytes
        let s = "\u{1F331}\u{1F332}";
        assert_eq!(truncate_str(s, 5), "\u{1F331}");
        assert_eq!(truncate_str(s, 3), "");
        // 'é' is 2 bytes
        assert_eq!(truncate_str("caf\u{00e9}", 4), "caf");
    }
}
