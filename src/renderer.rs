//! The page renderer seam.
//!
//! The traversal engine only ever talks to a [`Renderer`]: a single browser session with one
//! "current page" cursor. Elements are never held across calls; each operation addresses an
//! element by `(locator, index)` and the renderer resolves it against whatever is rendered at
//! that moment. An index past the current match count means the page changed underneath us and
//! is reported as [`BrowserError::StaleElement`].

use crate::browser::BrowserError;
use std::fmt;

/// How an element is found on the rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// CSS selector, matched in document order
    Css(String),
    /// Anchors whose trimmed visible text equals the given text
    LinkText(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        Locator::LinkText(text.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css `{}`", selector),
            Locator::LinkText(text) => write!(f, "link text `{}`", text),
        }
    }
}

/// A controllable browser session
pub trait Renderer {
    /// Load a URL and wait for the navigation to commit
    fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    fn current_url(&self) -> Result<String, BrowserError>;

    /// Raw markup of the current document, including script-rendered content
    fn page_source(&self) -> Result<String, BrowserError>;

    /// Number of elements currently matching the locator
    fn count(&self, locator: &Locator) -> Result<usize, BrowserError>;

    /// Trimmed visible text of the element
    fn text(&self, locator: &Locator, index: usize) -> Result<String, BrowserError>;

    fn attribute(
        &self,
        locator: &Locator,
        index: usize,
        name: &str,
    ) -> Result<Option<String>, BrowserError>;

    /// Whether the element is displayed and enabled
    fn is_clickable(&self, locator: &Locator, index: usize) -> Result<bool, BrowserError>;

    fn click(&self, locator: &Locator, index: usize) -> Result<(), BrowserError>;

    fn scroll_into_view(&self, locator: &Locator, index: usize) -> Result<(), BrowserError>;

    /// Replace the value of an input element
    fn type_text(&self, locator: &Locator, index: usize, text: &str) -> Result<(), BrowserError>;

    /// Send the Escape key to the page, closing any open modal
    fn press_escape(&self) -> Result<(), BrowserError>;

    /// Whether the document has finished loading its resources
    fn document_ready(&self) -> Result<bool, BrowserError> {
        Ok(true)
    }

    fn exists(&self, locator: &Locator) -> Result<bool, BrowserError> {
        Ok(self.count(locator)? > 0)
    }
}
