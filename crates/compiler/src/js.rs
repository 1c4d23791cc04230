//! JavaScript source helpers shared by the emitters

/// Single-quoted JavaScript string literal
pub fn quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// Cucumber expression matching `phrase` literally, as a quoted JS string.
///
/// Parentheses, braces and slashes carry meaning in Cucumber expressions and
/// are backslash-escaped before quoting.
pub fn cucumber_expression(phrase: &str) -> String {
    let mut escaped = String::with_capacity(phrase.len());
    for c in phrase.chars() {
        if matches!(c, '(' | ')' | '{' | '}' | '/' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    quoted(&escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_escapes() {
        assert_eq!(quoted("it's"), r"'it\'s'");
        assert_eq!(quoted(r"a\b"), r"'a\\b'");
        assert_eq!(quoted("plain"), "'plain'");
    }

    #[test]
    fn test_cucumber_expression_escapes_parameters() {
        assert_eq!(cucumber_expression("user sees {count} items"), r"'user sees \\{count\\} items'");
        assert_eq!(cucumber_expression("a/b (c)"), r"'a\\/b \\(c\\)'");
        assert_eq!(cucumber_expression(r#"search for "shoes""#), r#"'search for "shoes"'"#);
    }
}
