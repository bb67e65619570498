//! Comment stripping for JSON config files
//!
//! Config files may carry `//` line comments and `/* */` block comments.
//! Comments are replaced by whitespace (newlines are kept) so serde_json
//! error positions still point at the right line.

/// Remove comments from JSON text, leaving string literals untouched
pub fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_line_and_block_comments() {
        let input = "[ // children\n  { \"name\": \"a\" /* first */ }\n]";
        let value: serde_json::Value = serde_json::from_str(&strip_comments(input)).unwrap();
        assert_eq!(value[0]["name"], "a");
    }

    #[test]
    fn test_keeps_comment_markers_inside_strings() {
        let input = r#"{"url": "http://x/*y*/", "q": "say \"//hi\""}"#;
        let value: serde_json::Value = serde_json::from_str(&strip_comments(input)).unwrap();
        assert_eq!(value["url"], "http://x/*y*/");
        assert_eq!(value["q"], "say \"//hi\"");
    }

    #[test]
    fn test_preserves_line_numbers() {
        let input = "/* a\nb */\n// c\n1";
        assert_eq!(strip_comments(input).lines().count(), 4);
    }
}
