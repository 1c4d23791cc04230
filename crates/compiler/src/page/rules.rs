//! Ordered method rule table
//!
//! A rule fires when any of its keywords appears in the step phrase (and,
//! for verification rules, an assertion cue too). The first rule that fires
//! supplies the method body. Templates only use inline selectors and the
//! baseline locators, so they work whatever families the page matched.

use reqforge_common::naming::split_identifier;

use crate::js::quoted;
use crate::parser::context::find_word;
use crate::steps::ASSERTION_CUES;

/// Leading words dropped when deriving a target from the phrase tail
const FILLER_WORDS: &[&str] = &[
    "the", "a", "an", "to", "on", "in", "into", "for", "with", "at", "of", "and", "is", "are", "be",
    "that", "their", "his", "her", "my", "user", "users",
];

#[derive(Debug, Clone, Copy)]
pub struct Predicate {
    /// Fires when one of these appears
    pub any: &'static [&'static str],
    /// ...and, when non-empty, one of these as well
    pub requires: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct MethodRule {
    pub id: &'static str,
    pub predicate: Predicate,
    /// Method body; `{value}`, `{pattern}` and `{path}` are substituted
    pub template: &'static str,
}

const fn rule(id: &'static str, any: &'static [&'static str], template: &'static str) -> MethodRule {
    MethodRule {
        id,
        predicate: Predicate { any, requires: &[] },
        template,
    }
}

const fn assertion(id: &'static str, any: &'static [&'static str], template: &'static str) -> MethodRule {
    MethodRule {
        id,
        predicate: Predicate {
            any,
            requires: ASSERTION_CUES,
        },
        template,
    }
}

pub const METHOD_RULES: &[MethodRule] = &[
    // verification
    assertion(
        "verify-error",
        &["error", "errors", "invalid", "fail", "fails", "failed", "failure", "denied", "incorrect"],
        "const error = this.page.locator('[role=\"alert\"], .error, .error-message, .alert-danger').first();
await error.waitFor({ state: 'visible', timeout: 5000 });
return await error.isVisible();",
    ),
    assertion(
        "verify-success",
        &["success", "successful", "successfully", "confirmation", "confirmed", "welcome"],
        "const message = this.page.locator('[role=\"status\"], .success, .success-message, .alert-success').first();
await message.waitFor({ state: 'visible', timeout: 5000 });
return await message.isVisible();",
    ),
    rule(
        "page-state",
        &["loaded", "loads", "ready", "finished loading"],
        "await this.page.waitForLoadState('domcontentloaded');
return await this.mainContent.isVisible();",
    ),
    assertion(
        "count-list",
        &["count", "number of", "results", "items", "list", "rows", "entries"],
        "await this.mainContent.waitFor({ state: 'visible' });
const items = this.page.locator('[role=\"listitem\"], [role=\"row\"], li');
return (await items.count()) > 0;",
    ),
    // catches every asserted phrase the rules above miss
    rule(
        "verify-visible",
        ASSERTION_CUES,
        "const target = this.page.getByText({pattern}).first();
await target.waitFor({ state: 'visible', timeout: 5000 });
return await target.isVisible();",
    ),
    // navigation
    rule(
        "open-url",
        &["url", "http", "https", "www"],
        "await this.page.goto({path});
await this.waitForPageReady();",
    ),
    rule(
        "navigate",
        &[
            "navigate", "navigates", "navigated", "go to", "goes to", "visit", "visits", "is on",
            "lands on", "browse", "browses", "open the", "opens the",
        ],
        "await this.page.goto({path});
await this.waitForPageReady();",
    ),
    // authentication
    rule(
        "logout",
        &["logout", "log out", "logs out", "sign out", "signs out"],
        "await this.page.getByRole('button', { name: /log ?out|sign ?out/i }).click();
await this.page.waitForLoadState('networkidle');",
    ),
    rule(
        "login",
        &["login", "log in", "logs in", "sign in", "signs in", "credentials", "authenticates"],
        "await this.page.getByLabel(/user ?name|email/i).fill(process.env.TEST_USERNAME || 'test-user');
await this.page.getByLabel(/password/i).fill(process.env.TEST_PASSWORD || 'test-password');
await this.page.getByRole('button', { name: /log ?in|sign ?in/i }).click();
await this.page.waitForLoadState('networkidle');",
    ),
    // input
    rule(
        "search",
        &["search", "searches", "searched", "looks up"],
        "const input = this.page.getByRole('searchbox').or(this.page.getByPlaceholder(/search/i)).first();
await input.fill({value});
await input.press('Enter');
await this.page.waitForLoadState('networkidle');",
    ),
    rule(
        "fill",
        &["enter", "enters", "fill", "fills", "type", "types", "input", "inputs", "provide", "provides"],
        "const field = this.page.getByLabel({pattern}).or(this.page.getByPlaceholder({pattern})).first();
await field.fill({value});",
    ),
    rule(
        "select",
        &["select", "selects", "choose", "chooses", "pick", "picks"],
        "await this.page.getByRole('combobox').first().selectOption({ label: {value} });",
    ),
    // widgets
    rule(
        "menu",
        &["menu", "hamburger", "sidebar"],
        "await this.page.getByRole('button', { name: /menu/i }).first().click();
await this.page.getByRole('menu').or(this.page.getByRole('navigation')).first().waitFor({ state: 'visible' });",
    ),
    rule(
        "tab",
        &["tab", "tabs"],
        "await this.page.getByRole('tab', { name: {pattern} }).click();",
    ),
    rule(
        "modal",
        &["modal", "dialog", "popup", "pop-up", "overlay"],
        "const dialog = this.page.getByRole('dialog');
await dialog.waitFor({ state: 'visible', timeout: 5000 });
return await dialog.isVisible();",
    ),
    rule(
        "scroll",
        &["scroll", "scrolls", "scrolled"],
        "await this.page.mouse.wheel(0, 800);
await this.page.waitForTimeout(250);",
    ),
    rule(
        "hover",
        &["hover", "hovers", "mouse over", "mouses over"],
        "await this.page.getByText({pattern}).first().hover();",
    ),
    rule(
        "ads",
        &["ad", "ads", "advert", "adverts", "advertisement", "advertisements", "sponsored"],
        "const closeButtons = this.page.locator('.ad-close, [data-dismiss=\"ad\"], [aria-label=\"Close ad\"]');
for (const button of await closeButtons.all()) {
  if (await button.isVisible()) {
    await button.click();
  }
}
return true;",
    ),
    // actions
    rule(
        "click",
        &[
            "click", "clicks", "clicked", "tap", "taps", "press", "presses", "submit", "submits",
            "button",
        ],
        "await this.page.getByRole('button', { name: {pattern} }).or(this.page.getByText({pattern})).first().click();",
    ),
    rule(
        "content-region",
        &["content", "section", "page", "header", "footer", "dashboard", "panel", "region"],
        "await this.mainContent.waitFor({ state: 'visible' });
return await this.mainContent.isVisible();",
    ),
];

/// Body used when no rule fires
pub const FALLBACK_TEMPLATE: &str = "await this.mainContent.waitFor({ state: 'visible', timeout: 10000 });
return await this.mainContent.isVisible();";

/// Methods a page gets when the requirement yields no steps
pub const SCAFFOLD_METHODS: &[(&str, &str)] = &[
    (
        "navigate",
        "await this.page.goto('/');
await this.waitForPageReady();",
    ),
    (
        "isLoaded",
        "await this.page.waitForLoadState('domcontentloaded');
return await this.mainContent.isVisible();",
    ),
    ("isDisplayed", "return await this.header.isVisible();"),
];

/// The phrase a rule is evaluated against
#[derive(Debug, Clone)]
pub struct RuleInput {
    lower: String,
    original: String,
}

impl RuleInput {
    /// Uses the phrase when there is one, otherwise the words of the method name
    pub fn new(method_name: &str, phrase: &str) -> Self {
        let original = if phrase.trim().is_empty() {
            split_identifier(method_name).join(" ")
        } else {
            phrase.trim().to_string()
        };
        Self {
            lower: original.to_lowercase(),
            original,
        }
    }

    fn position(&self, keyword: &str) -> Option<usize> {
        find_word(&self.lower, keyword)
    }

    fn contains(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.position(k).is_some())
    }

    /// First quoted literal in the phrase
    fn quoted_literal(&self) -> Option<&str> {
        for quote in ['"', '\''] {
            let mut parts = self.original.split(quote);
            parts.next();
            if let (Some(inner), Some(_)) = (parts.next(), parts.next()) {
                if !inner.trim().is_empty() {
                    return Some(inner);
                }
            }
        }
        None
    }

    /// Words after the earliest matched keyword, minus quoted parts and fillers
    fn tail(&self, rule: &MethodRule) -> String {
        let start = rule
            .predicate
            .any
            .iter()
            .filter_map(|k| self.position(k).map(|pos| pos + k.len()))
            .min()
            .unwrap_or(0);

        let unquoted: String = {
            let mut out = String::new();
            let mut in_quote: Option<char> = None;
            for c in self.original.get(start..).unwrap_or_default().chars() {
                match (in_quote, c) {
                    (None, '"' | '\'') => in_quote = Some(c),
                    (Some(q), c) if c == q => in_quote = None,
                    (None, c) => out.push(c),
                    _ => {}
                }
            }
            out
        };

        let words: Vec<&str> = unquoted
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|w| !w.is_empty())
            .skip_while(|w| FILLER_WORDS.contains(&w.to_lowercase().as_str()))
            .collect();
        if words.is_empty() {
            self.original.clone()
        } else {
            words.join(" ")
        }
    }
}

impl Predicate {
    pub fn matches(&self, input: &RuleInput) -> bool {
        input.contains(self.any) && (self.requires.is_empty() || input.contains(self.requires))
    }
}

/// First rule whose predicate holds
pub fn resolve(input: &RuleInput) -> Option<&'static MethodRule> {
    METHOD_RULES.iter().find(|rule| rule.predicate.matches(input))
}

impl MethodRule {
    /// Body with placeholders filled from the phrase
    pub fn render(&self, input: &RuleInput) -> String {
        let tail = input.tail(self);
        let value = input.quoted_literal().map(str::to_string).unwrap_or_else(|| tail.clone());
        let path = match input.quoted_literal() {
            Some(literal) if literal.starts_with('/') || literal.starts_with("http") => literal.to_string(),
            _ => "/".to_string(),
        };

        self.template
            .replace("{value}", &quoted(&value))
            .replace("{pattern}", &js_regex(&tail))
            .replace("{path}", &quoted(&path))
    }
}

/// Case-insensitive JavaScript regex literal matching `text`
fn js_regex(text: &str) -> String {
    let mut out = String::from("/");
    for c in text.chars() {
        if "\\^$.|?*+()[]{}/".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out.push_str("/i");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("an error message is displayed", "verify-error")]
    #[test_case("a success banner is shown", "verify-success")]
    #[test_case("the page is loaded", "page-state")]
    #[test_case("a result count is shown", "count-list")]
    #[test_case("user sees the dashboard", "verify-visible")]
    #[test_case("user opens the url \"https://example.com\"", "open-url")]
    #[test_case("user is on login page", "navigate")]
    #[test_case("user logs out", "logout")]
    #[test_case("user submits valid credentials", "login")]
    #[test_case("the shopper searches for \"shoes\"", "search")]
    #[test_case("user enters \"bob\" into the name field", "fill")]
    #[test_case("user selects \"Blue\" as colour", "select")]
    #[test_case("user toggles the hamburger menu", "menu")]
    #[test_case("user switches to the billing tab", "tab")]
    #[test_case("a modal asks for consent", "modal")]
    #[test_case("user scrolls down", "scroll")]
    #[test_case("user hovers over pricing", "hover")]
    #[test_case("user dismisses the ads", "ads")]
    #[test_case("user clicks the checkout button", "click")]
    #[test_case("the dashboard page", "content-region")]
    fn test_rule_resolution(phrase: &str, expected: &str) {
        let input = RuleInput::new("", phrase);
        assert_eq!(resolve(&input).map(|r| r.id), Some(expected));
    }

    #[test]
    fn test_entering_invalid_data_is_not_an_error_check() {
        let input = RuleInput::new("", "user enters an invalid password");
        assert_eq!(resolve(&input).map(|r| r.id), Some("fill"));
    }

    #[test]
    fn test_asserted_input_phrase_returns_a_value() {
        let input = RuleInput::new("", "user enters the expected password");
        let rule = resolve(&input).unwrap();
        assert_eq!(rule.id, "verify-visible");
        assert!(rule.template.contains("return "));
    }

    #[test]
    fn test_every_assertion_cue_resolves_to_a_returning_rule() {
        for cue in ASSERTION_CUES {
            let phrase = format!("user {} the name field", cue);
            let rule = resolve(&RuleInput::new("", &phrase)).unwrap();
            assert!(rule.template.contains("return "), "'{}' resolved to {}", phrase, rule.id);
        }
    }

    #[test]
    fn test_no_rule_fires() {
        assert!(resolve(&RuleInput::new("", "nothing happens here")).is_none());
    }

    #[test]
    fn test_method_name_used_without_phrase() {
        let input = RuleInput::new("userLogsOut", "");
        assert_eq!(resolve(&input).map(|r| r.id), Some("logout"));
    }

    #[test]
    fn test_render_uses_quoted_value() {
        let input = RuleInput::new("", "the shopper searches for \"shoes\"");
        let rule = resolve(&input).unwrap();
        assert!(rule.render(&input).contains("await input.fill('shoes');"));
    }

    #[test]
    fn test_render_pattern_from_tail() {
        let input = RuleInput::new("", "user clicks the Add to cart button");
        let rule = resolve(&input).unwrap();
        assert_eq!(rule.id, "click");
        assert_eq!(
            rule.render(&input),
            "await this.page.getByRole('button', { name: /Add to cart button/i }).or(this.page.getByText(/Add to cart button/i)).first().click();"
        );
    }

    #[test]
    fn test_render_path() {
        let input = RuleInput::new("", "user navigates to \"/settings\"");
        let body = resolve(&input).unwrap().render(&input);
        assert!(body.starts_with("await this.page.goto('/settings');"));

        let input = RuleInput::new("", "user is on login page");
        let body = resolve(&input).unwrap().render(&input);
        assert!(body.starts_with("await this.page.goto('/');"));
    }

    #[test]
    fn test_rule_ids_are_unique() {
        for (i, rule) in METHOD_RULES.iter().enumerate() {
            assert!(
                METHOD_RULES[i + 1..].iter().all(|other| other.id != rule.id),
                "duplicate rule id {}",
                rule.id
            );
        }
    }
}
