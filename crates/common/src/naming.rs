//! Naming rules shared by every emitter
//!
//! All functions here are pure: the same input always yields the same
//! identifier, no matter which emitter asks. The step-binding emitter and the
//! page emitter both call [`method_name`] independently and rely on that.

/// Longest method identifier derived from a phrase
pub const METHOD_NAME_MAX_LEN: usize = 60;

const EMPTY_METHOD_NAME: &str = "step";
const EMPTY_FILE_SLUG: &str = "generated-feature";

/// Derive a lower-camelCase method identifier from a step phrase.
///
/// Punctuation is stripped, the phrase is split on whitespace and the words
/// are joined in lower camelCase. Words are added while the identifier stays
/// within [`METHOD_NAME_MAX_LEN`]; the first word is always kept (truncated if
/// it alone is too long).
pub fn method_name(phrase: &str) -> String {
    let cleaned: String = phrase
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let mut name = String::new();
    for (i, word) in cleaned.split_whitespace().enumerate() {
        let part = if i == 0 {
            word.to_lowercase()
        } else {
            capitalize(word)
        };

        if i == 0 {
            name = part.chars().take(METHOD_NAME_MAX_LEN).collect();
            continue;
        }
        if name.chars().count() + part.chars().count() > METHOD_NAME_MAX_LEN {
            break;
        }
        name.push_str(&part);
    }

    if name.is_empty() {
        return EMPTY_METHOD_NAME.to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("{}{}", EMPTY_METHOD_NAME, name);
    }
    name
}

/// Filesystem slug: lowercase, non-alphanumeric runs collapsed to one hyphen.
pub fn file_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        EMPTY_FILE_SLUG.to_string()
    } else {
        slug
    }
}

/// PascalCase from free text ("user login!" -> "UserLogin")
pub fn pascal_case(text: &str) -> String {
    let mut out = String::new();
    for word in text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            // keep inner capitals so "myAccount" survives as "MyAccount"
            out.extend(chars);
        }
    }
    out
}

/// Class name of the page object generated for a title or override name
pub fn page_class_name(base: &str) -> String {
    let mut name = pascal_case(base);
    if name.is_empty() {
        name = "Generated".to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "Feature");
    }
    if !name.ends_with("Page") {
        name.push_str("Page");
    }
    name
}

/// Local variable name used for a page-object instance
pub fn variable_name(class_name: &str) -> String {
    let mut chars = class_name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split an identifier into lowercase words on camelCase, snake_case,
/// kebab-case and acronym boundaries.
pub fn split_identifier(identifier: &str) -> Vec<String> {
    let chars: Vec<char> = identifier.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            // "clickOk" splits before O; "HTTPServer" splits before S
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// kebab-case of an identifier ("loginButton" -> "login-button")
pub fn kebab_case(identifier: &str) -> String {
    split_identifier(identifier).join("-")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
