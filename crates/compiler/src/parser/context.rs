//! Business-context inference: domain, entities, actions and tags

use reqforge_common::naming::file_slug;
use reqforge_common::types::DEFAULT_DOMAIN;

/// Keyword family used to infer a requirement's business domain
pub struct DomainFamily {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

/// Ordered; on equal hit counts the earlier family wins.
pub const DOMAIN_FAMILIES: &[DomainFamily] = &[
    DomainFamily {
        name: "authentication",
        keywords: &[
            "login", "log in", "logout", "log out", "sign in", "sign out", "signin", "password",
            "credential", "credentials", "authenticate", "authentication", "2fa", "otp",
            "register", "sign up", "signup",
        ],
    },
    DomainFamily {
        name: "ecommerce",
        keywords: &[
            "cart", "checkout", "product", "products", "order", "payment", "purchase", "basket",
            "price", "shipping", "wishlist",
        ],
    },
    DomainFamily {
        name: "search",
        keywords: &["search", "filter", "query", "results", "keyword", "find"],
    },
    DomainFamily {
        name: "forms",
        keywords: &["form", "field", "input", "dropdown", "checkbox", "upload", "required field"],
    },
    DomainFamily {
        name: "navigation",
        keywords: &[
            "menu", "navigate", "navigation", "link", "breadcrumb", "tab", "homepage", "footer",
            "sidebar",
        ],
    },
];

const ACTION_VOCABULARY: &[&str] = &[
    "click", "enter", "submit", "search", "navigate", "select", "verify", "login", "logout",
    "register", "add", "remove", "delete", "update", "open", "close", "upload", "download",
    "filter", "sort", "view", "see", "fill", "type", "check", "scroll", "hover", "purchase",
    "checkout", "pay", "confirm", "cancel",
];

const ENTITY_VOCABULARY: &[&str] = &[
    "page", "button", "form", "field", "menu", "link", "cart", "product", "order", "account",
    "dashboard", "profile", "results", "list", "table", "modal", "dialog", "header", "footer",
    "banner", "message", "error", "notification", "password", "username", "email", "checkbox",
    "dropdown", "tab", "item", "category", "invoice", "payment", "credentials", "homepage",
];

/// Canonicalize an explicitly labeled domain ("Authentication & Login" -> "authentication")
pub fn canonical_domain(value: &str) -> String {
    let lower = value.trim().to_lowercase();
    if lower.is_empty() {
        return DEFAULT_DOMAIN.to_string();
    }
    if let Some(family) = DOMAIN_FAMILIES.iter().find(|f| lower.contains(f.name)) {
        return family.name.to_string();
    }
    if let Some(family) = DOMAIN_FAMILIES
        .iter()
        .find(|f| f.keywords.iter().any(|k| contains_word(&lower, k)))
    {
        return family.name.to_string();
    }
    file_slug(&lower)
}

/// Domain from the tags, when one of them names a known family
pub fn domain_from_tags(tags: &[String]) -> Option<String> {
    tags.iter()
        .map(|t| t.trim_start_matches('@').to_lowercase())
        .find_map(|t| DOMAIN_FAMILIES.iter().find(|f| f.name == t).map(|f| f.name.to_string()))
}

/// Family with the most keyword hits; `general` when nothing matches
pub fn infer_domain(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut best: Option<(&str, usize)> = None;

    for family in DOMAIN_FAMILIES {
        let hits = family
            .keywords
            .iter()
            .map(|k| count_words(&lower, k))
            .sum::<usize>();
        if hits > 0 && best.map(|(_, b)| hits > b).unwrap_or(true) {
            best = Some((family.name, hits));
        }
    }

    best.map(|(name, _)| name.to_string())
        .unwrap_or_else(|| DEFAULT_DOMAIN.to_string())
}

/// Action verbs found in the step texts, first-seen order
pub fn extract_actions<'a>(step_texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut actions = Vec::new();
    for text in step_texts {
        let lower = text.to_lowercase();
        let mut found: Vec<(usize, &str)> = ACTION_VOCABULARY
            .iter()
            .filter_map(|a| find_word(&lower, a).map(|pos| (pos, *a)))
            .collect();
        found.sort_unstable();
        for (_, action) in found {
            if !actions.iter().any(|a| a == action) {
                actions.push(action.to_string());
            }
        }
    }
    actions
}

/// UI/domain nouns found anywhere in the document, document order
pub fn extract_entities(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut found: Vec<(usize, &str)> = ENTITY_VOCABULARY
        .iter()
        .filter_map(|e| find_word(&lower, e).map(|pos| (pos, *e)))
        .collect();
    found.sort_unstable();
    found.into_iter().map(|(_, e)| e.to_string()).collect()
}

/// Split a tag list ("smoke, @login regression") into `@`-prefixed tags
pub fn parse_tags(value: &str) -> Vec<String> {
    if value.trim_start().starts_with('[') {
        return Vec::new();
    }
    value
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(|t| t.trim().trim_matches('`').trim_start_matches('@'))
        .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_'))
        .map(|t| format!("@{}", t))
        .collect()
}

/// Append tags not already present
pub fn merge_tags(into: &mut Vec<String>, tags: impl IntoIterator<Item = String>) {
    for tag in tags {
        if !into.contains(&tag) {
            into.push(tag);
        }
    }
}

/// Position of `word` in `haystack` (both lowercase) on word boundaries
pub fn find_word(haystack: &str, word: &str) -> Option<usize> {
    let mut start = 0;
    while let Some(offset) = haystack[start..].find(word) {
        let pos = start + offset;
        let end = pos + word.len();
        let before_ok = haystack[..pos]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        if before_ok && after_ok {
            return Some(pos);
        }
        start = pos + word.chars().next().map(char::len_utf8).unwrap_or(1);
    }
    None
}

pub fn contains_word(haystack: &str, word: &str) -> bool {
    find_word(haystack, word).is_some()
}

fn count_words(haystack: &str, word: &str) -> usize {
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = find_word(&haystack[start..], word) {
        count += 1;
        start += pos + word.len();
    }
    count
}
