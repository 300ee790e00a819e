//! Line-level recognition of ATX headers and code fences.
//!
//! Only the restricted subset the extractor needs: `#`-run headers followed
//! by a space, and triple-backtick fence markers. Setext headers are not
//! recognized.

use std::sync::LazyLock;

use regex::Regex;

/// A recognized header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Number of leading `#` characters.
    pub level: usize,
    /// Header text, trimmed, original casing.
    pub title: String,
}

impl Heading {
    /// Case-insensitive substring match against an already lower-cased query.
    pub fn matches(&self, query_lower: &str) -> bool {
        self.title.to_lowercase().contains(query_lower)
    }
}

/// Parse a single line as a header.
///
/// Leading whitespace and the line terminator are ignored. The `#` run must
/// be followed by a space; `#hashtag` and a bare `##` are not headers.
pub fn parse_heading(line: &str) -> Option<Heading> {
    static H_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(#+) (.*)$").expect("valid regex"));

    let bare = strip_terminator(line).trim_start();
    H_RE.captures(bare).map(|caps| Heading {
        level: caps[1].len(),
        title: caps[2].trim().to_string(),
    })
}

/// Whether the line opens or closes a fenced code block.
pub fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_and_titles() {
        assert_eq!(
            parse_heading("## Configuration Options\n"),
            Some(Heading {
                level: 2,
                title: "Configuration Options".into()
            })
        );
        assert_eq!(parse_heading("# Top").map(|h| h.level), Some(1));
        assert_eq!(parse_heading("###### Deep\r\n").map(|h| h.level), Some(6));
    }

    #[test]
    fn leading_whitespace_is_ignored() {
        let h = parse_heading("   ### Indented  \n").unwrap();
        assert_eq!(h.level, 3);
        assert_eq!(h.title, "Indented");
    }

    #[test]
    fn requires_space_after_hashes() {
        assert_eq!(parse_heading("#hashtag"), None);
        assert_eq!(parse_heading("##\n"), None);
        assert_eq!(parse_heading("plain text"), None);
        assert_eq!(parse_heading("#\tTabbed"), None);
    }

    #[test]
    fn empty_title_is_still_a_header() {
        let h = parse_heading("## \n").unwrap();
        assert_eq!(h.level, 2);
        assert_eq!(h.title, "");
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let h = parse_heading("## My Section").unwrap();
        assert!(h.matches("my section"));
        assert!(h.matches("sect"));
        assert!(!h.matches("other"));
    }

    #[test]
    fn fence_detection() {
        assert!(is_fence("```\n"));
        assert!(is_fence("```bash"));
        assert!(is_fence("    ```"));
        assert!(!is_fence("`` not a fence"));
        assert!(!is_fence("text ```"));
    }
}
