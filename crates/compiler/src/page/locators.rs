//! Locator bundles keyed by UI family

use crate::parser::context::contains_word;
use crate::similarity::LocatorDecl;

#[derive(Debug, Clone, Copy)]
pub struct LocatorSpec {
    pub name: &'static str,
    pub definition: &'static str,
}

/// A family of UI elements recognized by keyword
#[derive(Debug)]
pub struct LocatorFamily {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub locators: &'static [LocatorSpec],
}

const fn spec(name: &'static str, definition: &'static str) -> LocatorSpec {
    LocatorSpec { name, definition }
}

/// Declared on every page; rule templates and the fallback rely on these.
pub const BASELINE: &[LocatorSpec] = &[
    spec("header", "page.locator('header')"),
    spec("mainContent", "page.locator('main, [role=\"main\"]')"),
    spec("primaryButton", "page.getByRole('button').first()"),
];

pub const LOCATOR_FAMILIES: &[LocatorFamily] = &[
    LocatorFamily {
        name: "authentication",
        keywords: &[
            "login", "log in", "logs in", "logout", "log out", "sign in", "signs in", "sign out",
            "password", "username", "credentials", "register",
        ],
        locators: &[
            spec("usernameInput", "page.getByLabel(/user ?name|email/i)"),
            spec("passwordInput", "page.getByLabel(/password/i)"),
            spec("loginButton", "page.getByRole('button', { name: /log ?in|sign ?in/i })"),
            spec("logoutButton", "page.getByRole('button', { name: /log ?out|sign ?out/i })"),
        ],
    },
    LocatorFamily {
        name: "search",
        keywords: &["search", "searches", "query", "filter", "filters", "results", "find"],
        locators: &[
            spec("searchInput", "page.getByRole('searchbox')"),
            spec("searchButton", "page.getByRole('button', { name: /search/i })"),
            spec("searchResults", "page.locator('[data-testid=\"search-results\"], .search-results')"),
            spec("filterPanel", "page.locator('[data-testid=\"filters\"], .filters')"),
        ],
    },
    LocatorFamily {
        name: "navigation",
        keywords: &[
            "menu", "navigate", "navigates", "navigation", "link", "breadcrumb", "sidebar",
            "footer", "homepage",
        ],
        locators: &[
            spec("navigationMenu", "page.getByRole('navigation')"),
            spec("menuButton", "page.getByRole('button', { name: /menu/i })"),
            spec("breadcrumb", "page.getByRole('navigation', { name: /breadcrumb/i })"),
            spec("footer", "page.locator('footer')"),
        ],
    },
    LocatorFamily {
        name: "forms",
        keywords: &[
            "form", "field", "fields", "input", "enter", "enters", "fill", "fills", "submit",
            "submits", "dropdown", "checkbox",
        ],
        locators: &[
            spec("form", "page.locator('form')"),
            spec("submitButton", "page.locator('button[type=\"submit\"], input[type=\"submit\"]')"),
            spec("dropdown", "page.getByRole('combobox')"),
            spec("checkbox", "page.getByRole('checkbox')"),
        ],
    },
    LocatorFamily {
        name: "ecommerce",
        keywords: &[
            "cart", "checkout", "product", "products", "order", "basket", "price", "payment",
            "purchase",
        ],
        locators: &[
            spec("productList", "page.locator('[data-testid=\"product-list\"], .products')"),
            spec("addToCartButton", "page.getByRole('button', { name: /add to (cart|basket)/i })"),
            spec("cartIcon", "page.locator('[data-testid=\"cart\"], .cart-icon')"),
            spec("checkoutButton", "page.getByRole('button', { name: /checkout/i })"),
        ],
    },
    LocatorFamily {
        name: "notifications",
        keywords: &[
            "message", "notification", "alert", "toast", "error", "success", "warning", "banner",
        ],
        locators: &[
            spec("successMessage", "page.locator('[role=\"status\"], .success, .alert-success')"),
            spec("errorMessage", "page.locator('[role=\"alert\"], .error, .error-message')"),
            spec("notificationToast", "page.locator('.toast, [data-testid=\"toast\"]')"),
        ],
    },
    LocatorFamily {
        name: "tables",
        keywords: &["table", "row", "rows", "column", "grid", "list", "count"],
        locators: &[
            spec("dataTable", "page.getByRole('table')"),
            spec("tableRows", "page.getByRole('row')"),
            spec("listItems", "page.getByRole('listitem')"),
        ],
    },
    LocatorFamily {
        name: "modals",
        keywords: &["modal", "dialog", "popup", "pop-up", "overlay", "confirm"],
        locators: &[
            spec("modalDialog", "page.getByRole('dialog')"),
            spec("modalCloseButton", "page.getByRole('dialog').getByRole('button', { name: /close|cancel/i })"),
            spec("confirmButton", "page.getByRole('button', { name: /confirm|ok|yes/i })"),
        ],
    },
];

/// Families with at least one keyword in `text`, in table order
pub fn matched_families(text: &str) -> Vec<&'static LocatorFamily> {
    let lower = text.to_lowercase();
    LOCATOR_FAMILIES
        .iter()
        .filter(|family| family.keywords.iter().any(|k| contains_word(&lower, k)))
        .collect()
}

/// Baseline bundle followed by every matched family's bundle, names unique
pub fn locators_for(text: &str) -> Vec<LocatorDecl> {
    let mut locators: Vec<LocatorDecl> = Vec::new();
    let bundles = std::iter::once(BASELINE).chain(matched_families(text).into_iter().map(|f| f.locators));
    for bundle in bundles {
        for spec in bundle {
            if !locators.iter().any(|l| l.name == spec.name) {
                locators.push(LocatorDecl::new(spec.name, spec.definition));
            }
        }
    }
    locators
}
