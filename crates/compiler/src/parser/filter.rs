//! Denylist filter for extracted clause text
//!
//! This is a heuristic, not a grammar. It drops lines that look like template
//! scaffolding, instructions to the author, or markdown debris. Some genuine
//! steps will be rejected and some junk will get through.

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 250;

const MARKDOWN_PREFIXES: &[&str] = &["#", "|", "```", "---", ">", "<!--"];

const METADATA_LABELS: &[&str] = &[
    "title:",
    "description:",
    "priority:",
    "tags:",
    "domain:",
    "status:",
    "author:",
    "acceptance criteria",
    "user story:",
    "feature:",
    "scenario:",
];

const SCAFFOLDING_MARKERS: &[&str] = &[
    "e.g.",
    "example:",
    "describe the",
    "describe what",
    "enter your",
    "replace this",
    "placeholder",
    "todo",
    "tbd",
    "your step here",
    "lorem ipsum",
];

/// Whether an extracted clause text is usable as a step.
pub fn is_valid_step_text(text: &str) -> bool {
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if !(MIN_LEN..=MAX_LEN).contains(&len) {
        return false;
    }

    if trimmed.contains("**") || trimmed.contains("__") {
        return false;
    }
    if MARKDOWN_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return false;
    }
    if trimmed.starts_with('[') && trimmed.contains(']') {
        return false;
    }
    if trimmed.chars().any(is_pictograph) {
        return false;
    }

    let lower = trimmed.to_lowercase();
    if METADATA_LABELS.iter().any(|l| lower.starts_with(l)) {
        return false;
    }
    if SCAFFOLDING_MARKERS.iter().any(|m| contains_marker(&lower, m)) {
        return false;
    }

    // at least one real word
    trimmed.chars().filter(|c| c.is_alphabetic()).count() >= 2
}

fn contains_marker(lower: &str, marker: &str) -> bool {
    if marker.len() > 4 || marker.contains(|c: char| !c.is_alphanumeric()) {
        return lower.contains(marker);
    }
    // short markers ("todo", "tbd") only as whole words
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == marker)
}

fn is_pictograph(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1FAFF
        | 0x2600..=0x27BF
        | 0x2B00..=0x2BFF
        | 0xFE0F
        | 0x200D
        | 0x2190..=0x21FF
        | 0x2300..=0x23FF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("user is on login page" ; "plain step")]
    #[test_case("the cart contains \"2\" items" ; "quoted value")]
    #[test_case("user enters <username> and <password>" ; "outline parameters")]
    fn test_accepts(text: &str) {
        assert!(is_valid_step_text(text));
    }

    #[test_case("" ; "empty")]
    #[test_case("ok" ; "too short")]
    #[test_case("[describe the precondition]" ; "bracket placeholder")]
    #[test_case("the **user** logs in" ; "bold marker")]
    #[test_case("| username | password |" ; "table row")]
    #[test_case("## Acceptance Criteria" ; "heading")]
    #[test_case("✅ user sees the dashboard" ; "emoji")]
    #[test_case("Priority: High" ; "metadata label")]
    #[test_case("describe the expected outcome here" ; "instructional")]
    #[test_case("e.g. the user clicks save" ; "example marker")]
    #[test_case("TODO write this step" ; "todo")]
    #[test_case("123 456" ; "no words")]
    fn test_rejects(text: &str) {
        assert!(!is_valid_step_text(text));
    }

    #[test]
    fn test_short_markers_need_word_boundary() {
        assert!(is_valid_step_text("the user opens the todolist app"));
        assert!(!is_valid_step_text("result is TBD"));
    }

    #[test]
    fn test_overlong_rejected() {
        let long = "word ".repeat(60);
        assert!(!is_valid_step_text(&long));
    }
}
