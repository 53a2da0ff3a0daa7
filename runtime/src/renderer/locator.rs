//! Element locators and the JavaScript snippets built from them.
//!
//! A [`Locator`] is a description of where an element is, never a handle to
//! it. Every use re-resolves it against the live DOM, so a listing that was
//! re-rendered after a click is simply queried again.
//!
//! ## Security: JS encoding
//!
//! Selectors are escaped for a JS string context before being embedded and
//! only ever appear inside string literals.

use std::fmt;

/// Where to find an element on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// First element matching a CSS selector.
    Css(String),
    /// `inner` inside the `index`-th (zero-based) element matching `list`.
    Nested {
        list: String,
        index: usize,
        inner: String,
    },
    /// The `index`-th element matching `list` itself.
    Item { list: String, index: usize },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn nested(list: impl Into<String>, index: usize, inner: impl Into<String>) -> Self {
        Self::Nested {
            list: list.into(),
            index,
            inner: inner.into(),
        }
    }

    pub fn item(list: impl Into<String>, index: usize) -> Self {
        Self::Item {
            list: list.into(),
            index,
        }
    }

    /// A JS expression evaluating to the element or `null`.
    pub fn to_js(&self) -> String {
        match self {
            Self::Css(sel) => format!("document.querySelector('{}')", sanitize_js_string(sel)),
            Self::Item { list, index } => format!(
                "(document.querySelectorAll('{}')[{index}] || null)",
                sanitize_js_string(list)
            ),
            Self::Nested { list, index, inner } => format!(
                "((document.querySelectorAll('{}')[{index}] || null) && \
                 document.querySelectorAll('{}')[{index}].querySelector('{}'))",
                sanitize_js_string(list),
                sanitize_js_string(list),
                sanitize_js_string(inner)
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(sel) => write!(f, "{sel}"),
            Self::Item { list, index } => write!(f, "{list}[{index}]"),
            Self::Nested { list, index, inner } => write!(f, "{list}[{index}] {inner}"),
        }
    }
}

/// `true` when the element exists.
pub fn exists_script(target: &Locator) -> String {
    format!("(() => {{ return {} !== null; }})()", target.to_js())
}

/// `{ found, text }` with the element's trimmed text content.
pub fn text_script(target: &Locator) -> String {
    format!(
        "(() => {{ const el = {}; return {{ found: !!el, text: el ? el.textContent.trim() : '' }}; }})()",
        target.to_js()
    )
}

/// `true` when the element's trimmed text equals `expected`.
pub fn text_equals_script(target: &Locator, expected: &str) -> String {
    format!(
        "(() => {{ const el = {}; return !!el && el.textContent.trim() === '{}'; }})()",
        target.to_js(),
        sanitize_js_string(expected)
    )
}

/// `true` when the form control exists and its value is empty.
pub fn value_empty_script(target: &Locator) -> String {
    format!(
        "(() => {{ const el = {}; return !!el && (el.value || '').trim() === ''; }})()",
        target.to_js()
    )
}

/// `true` when the element exists and is not disabled.
pub fn enabled_script(target: &Locator) -> String {
    format!(
        "(() => {{ const el = {}; return !!el && !el.disabled; }})()",
        target.to_js()
    )
}

/// `true` when the element no longer exists.
pub fn gone_script(target: &Locator) -> String {
    format!("(() => {{ return {} === null; }})()", target.to_js())
}

/// Scroll the element into view; `true` if it was found.
pub fn scroll_into_view_script(target: &Locator) -> String {
    format!(
        "(() => {{ const el = {}; if (el) {{ el.scrollIntoView(true); return true; }} return false; }})()",
        target.to_js()
    )
}

/// Sanitize a string for safe injection into a JavaScript string literal.
///
/// Escapes all characters that could break out of a JS string context:
/// - Backslashes, single/double quotes, backticks
/// - Newlines, carriage returns, tabs
/// - HTML script tags
/// - Null bytes
pub fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}
