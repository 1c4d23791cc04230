//! Brace-aware scanning of page-object sources
//!
//! Scanning works on a masked copy of the source in which the contents of
//! string literals, template literals and comments are blanked to spaces.
//! Byte offsets are preserved, so positions found in the mask index straight
//! into the original text. Regex literals are not recognized.

use once_cell::sync::Lazy;
use regex::Regex;

static METHOD_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[\s;{}])(?:static\s+)?async\s+([A-Za-z_$][\w$]*)\s*\(").expect("valid regex")
});

static LOCATOR_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"this\.([A-Za-z_$][\w$]*)\s*=\s*((?:this\.)?page\.(?:locator|getByRole|getByText|getByTestId|getByLabel|getByPlaceholder|\$))\s*\(",
    )
    .expect("valid regex")
});

/// Names that can follow `async` without being a method
const NOT_METHODS: &[&str] = &["function", "constructor"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedMethod {
    pub name: String,
    pub params: String,
    /// Full text from `async` through the closing brace
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedLocator {
    pub name: String,
    /// Factory call rooted at `page.`
    pub definition: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    LineComment,
    BlockComment,
    Quote(u8),
    Template,
}

/// Blank string, template and comment contents; delimiters stay in place.
pub fn mask(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = bytes.to_vec();
    let mut state = State::Code;
    // open-brace depth of each `${` currently being scanned as code
    let mut interpolations: Vec<usize> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        match state {
            State::Code => match b {
                b'/' if next == Some(b'/') => {
                    state = State::LineComment;
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    i += 2;
                    continue;
                }
                b'/' if next == Some(b'*') => {
                    state = State::BlockComment;
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    i += 2;
                    continue;
                }
                b'\'' | b'"' => state = State::Quote(b),
                b'`' => state = State::Template,
                b'{' => {
                    if let Some(depth) = interpolations.last_mut() {
                        *depth += 1;
                    }
                }
                b'}' => {
                    if let Some(depth) = interpolations.last_mut() {
                        if *depth == 0 {
                            interpolations.pop();
                            state = State::Template;
                        } else {
                            *depth -= 1;
                        }
                    }
                }
                _ => {}
            },
            State::LineComment => {
                if b == b'\n' {
                    state = State::Code;
                } else {
                    out[i] = b' ';
                }
            }
            State::BlockComment => {
                if b == b'*' && next == Some(b'/') {
                    out[i] = b' ';
                    out[i + 1] = b' ';
                    state = State::Code;
                    i += 2;
                    continue;
                }
                if b != b'\n' {
                    out[i] = b' ';
                }
            }
            State::Quote(quote) => {
                if b == b'\\' {
                    out[i] = b' ';
                    if let Some(escaped) = next.filter(u8::is_ascii) {
                        if escaped != b'\n' {
                            out[i + 1] = b' ';
                        }
                        i += 2;
                        continue;
                    }
                } else if b == quote || b == b'\n' {
                    // an unterminated literal ends at the line break
                    state = State::Code;
                } else {
                    out[i] = b' ';
                }
            }
            State::Template => {
                if b == b'\\' {
                    out[i] = b' ';
                    if let Some(escaped) = next.filter(u8::is_ascii) {
                        if escaped != b'\n' {
                            out[i + 1] = b' ';
                        }
                        i += 2;
                        continue;
                    }
                } else if b == b'`' {
                    state = State::Code;
                } else if b == b'$' && next == Some(b'{') {
                    interpolations.push(0);
                    state = State::Code;
                    i += 2;
                    continue;
                } else if b != b'\n' {
                    out[i] = b' ';
                }
            }
        }
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Offset of the delimiter closing the one at `open`, skipping nested pairs
fn matching_close(masked: &[u8], open: usize, open_ch: u8, close_ch: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &b) in masked[open..].iter().enumerate() {
        if b == open_ch {
            depth += 1;
        } else if b == close_ch {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(open + offset);
            }
        }
    }
    None
}

/// Every `async name(args) { ... }` method in `source`
pub fn scan_methods(source: &str) -> Vec<ScannedMethod> {
    let masked = mask(source);
    let bytes = masked.as_bytes();
    let mut methods = Vec::new();
    let mut resume = 0;

    for caps in METHOD_SIGNATURE.captures_iter(&masked) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() < resume || NOT_METHODS.contains(&name.as_str()) {
            continue;
        }

        let open_paren = whole.end() - 1;
        let Some(close_paren) = matching_close(bytes, open_paren, b'(', b')') else {
            continue;
        };

        // allow a return type annotation between `)` and `{`
        let Some(open_brace) = bytes[close_paren + 1..]
            .iter()
            .position(|&b| matches!(b, b'{' | b';' | b'}'))
            .map(|p| close_paren + 1 + p)
            .filter(|&p| bytes[p] == b'{')
        else {
            continue;
        };
        let Some(close_brace) = matching_close(bytes, open_brace, b'{', b'}') else {
            continue;
        };

        let start = masked[whole.start()..]
            .find("async")
            .or_else(|| masked[whole.start()..].find("static"))
            .map(|p| whole.start() + p)
            .unwrap_or(whole.start());

        methods.push(ScannedMethod {
            name: name.as_str().to_string(),
            params: source[open_paren + 1..close_paren].trim().to_string(),
            body: source[start..=close_brace].to_string(),
        });
        resume = close_brace + 1;
    }

    methods
}

/// Locator declarations `this.<id> = [this.]page.<factory>(...)`
pub fn scan_locators(source: &str) -> Vec<ScannedLocator> {
    let masked = mask(source);
    let bytes = masked.as_bytes();
    let mut locators: Vec<ScannedLocator> = Vec::new();

    for caps in LOCATOR_DECLARATION.captures_iter(&masked) {
        let (Some(whole), Some(name), Some(factory)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if locators.iter().any(|l| l.name == name.as_str()) {
            continue;
        }
        let open_paren = whole.end() - 1;
        let Some(close_paren) = matching_close(bytes, open_paren, b'(', b')') else {
            continue;
        };

        let call = &source[factory.start()..=close_paren];
        let definition = call.strip_prefix("this.").unwrap_or(call).to_string();
        locators.push(ScannedLocator {
            name: name.as_str().to_string(),
            definition,
        });
    }

    locators
}
