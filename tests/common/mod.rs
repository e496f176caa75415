//! In-memory catalog used by the integration tests.
//!
//! `FakeSite` is a tiny browser: pages are static HTML keyed by path, locators are evaluated
//! with `scraper` against the current page, clicking an anchor follows its href, clicking a
//! thumbnail (`img[data-full]`) opens a lightbox and Escape closes it.
//!
//! Two switches make it behave like a client-rendered site: `skeleton_reads` serves an empty
//! placeholder for the first reads after a click navigates, and `persistent_lightbox` keeps the
//! viewer in the DOM (hidden after Escape) and swaps its source only after a few reads.

#![allow(dead_code)]

use orchid_catalog_scraper::browser::BrowserError;
use orchid_catalog_scraper::config::{Config, TimingConfig};
use orchid_catalog_scraper::http_client::{FetchError, FetchedImage, ImageFetcher};
use orchid_catalog_scraper::renderer::{Locator, Renderer};
use scraper::{ElementRef, Html, Selector};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

pub const ORIGIN: &str = "https://catalog.test";
pub const LOGIN_PATH: &str = "/login/";
pub fn fast_timing() -> TimingConfig {
    TimingConfig {
        page_load_wait_ms: 1,
        next_page_wait_ms: 1,
        image_download_wait_ms: 1,
        lightbox_close_wait_ms: 1,
        retry_wait_ms: 1,
        max_retries: 3,
    }
}

pub fn origin() -> reqwest::Url {
    reqwest::Url::parse(ORIGIN).unwrap()
}

pub fn test_config(image_dir: &std::path::Path) -> Config {
    Config {
        username: "grower".to_string(),
        password: "s3cret".to_string(),
        login_url: format!("{}{}", ORIGIN, LOGIN_PATH),
        base_url: format!("{}/hybrids/A/1", ORIGIN),
        logout_url: format!("{}/logout/", ORIGIN),
        site_origin: ORIGIN.to_string(),
        image_dir: image_dir.display().to_string(),
        output_prefix: "test".to_string(),
        timing: fast_timing(),
        ..Config::default()
    }
}

/* ---------------- Markup builders ---------------- */

pub enum Next {
    Absent,
    Enabled(String),
    Disabled,
}

pub fn hybrid_row(name: &str, href: Option<&str>, parents: &[&str], images: &str) -> String {
    let name_cell = match href {
        Some(href) => format!("<a href=\"{}\">{}</a>", href, name),
        None => name.to_string(),
    };
    let parentage: Vec<String> = parents.iter().map(|p| format!("<a href=\"#\">{}</a>", p)).collect();
    format!(
        "<tr><td>{}</td><td>{}</td><td>Registrant</td><td>Originator</td><td>1950</td><td>4</td><td>10</td><td>{}</td></tr>",
        name_cell,
        parentage.join(" x "),
        images
    )
}

pub fn species_row(name: &str, href: Option<&str>, photos: &str) -> String {
    let name_cell = match href {
        Some(href) => format!("<a href=\"{}\">{}</a>", href, name),
        None => name.to_string(),
    };
    format!(
        "<tr><td>{}</td><td>Lindl.</td><td>1821</td><td>Cattleya</td><td>Brazil</td><td>120</td><td>{}</td></tr>",
        name_cell, photos
    )
}

/// Alphabet index nested the way the live listing nests it
pub fn index_list(letters: &[(&str, &str)]) -> String {
    let items: String = letters
        .iter()
        .map(|(label, href)| format!("<li><a href=\"{}\">{}</a></li>", href, label))
        .collect();
    format!(
        "<div class=\"justify-content-left align-items-center\"><div>\
         <div></div><div></div>\
         <div><div></div><div><ul>{}</ul></div></div>\
         </div></div>",
        items
    )
}

pub fn listing_page(rows: &[String], next: Next, extra: &str) -> String {
    let next = match next {
        Next::Absent => String::new(),
        Next::Enabled(href) => format!("<a class=\"page-link\" href=\"{}\">Next</a>", href),
        Next::Disabled => "<a class=\"page-link Disabled\" href=\"#\">Next</a>".to_string(),
    };
    format!(
        "<html><body>{}<table><thead><tr><th>Name</th></tr></thead><tbody>{}</tbody></table><nav>{}</nav></body></html>",
        extra,
        rows.join(""),
        next
    )
}

pub fn detail_page(full_urls: &[&str]) -> String {
    let thumbs: Vec<String> = full_urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            format!(
                "<div class=\"box\"><a href=\"#\"><img src=\"/thumb/{}.jpg\" data-full=\"{}\"></a></div>",
                i, url
            )
        })
        .collect();
    format!("<html><body><h1>Detail</h1>{}</body></html>", thumbs.join(""))
}

fn login_page() -> String {
    "<html><body><form><input name=\"username\"><input name=\"password\" type=\"password\"><button type=\"submit\">Sign in</button></form></body></html>".to_string()
}

/* ---------------- Fake renderer ---------------- */

enum ClickAction {
    OpenLightbox(String),
    Submit,
    Follow(String),
    Nothing,
}

pub struct FakeSite {
    pages: HashMap<String, String>,
    current: RefCell<String>,
    lightbox: RefCell<Option<String>>,
    lightbox_visible: Cell<bool>,
    persistent_lightbox: Option<usize>,
    pending_source: RefCell<Option<(String, usize)>>,
    skeleton_reads: usize,
    skeleton_left: Cell<usize>,
    credentials: Option<(String, String)>,
    logged_in: Cell<bool>,
    inputs: RefCell<HashMap<String, String>>,
    click_failures: RefCell<VecDeque<BrowserError>>,
    escape_failures: RefCell<VecDeque<BrowserError>>,
    pub clicks: RefCell<Vec<String>>,
    pub navigations: RefCell<Vec<String>>,
    pub sources_read: Cell<usize>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            current: RefCell::new("/".to_string()),
            lightbox: RefCell::new(None),
            lightbox_visible: Cell::new(false),
            persistent_lightbox: None,
            pending_source: RefCell::new(None),
            skeleton_reads: 0,
            skeleton_left: Cell::new(0),
            credentials: None,
            logged_in: Cell::new(false),
            inputs: RefCell::new(HashMap::new()),
            click_failures: RefCell::new(VecDeque::new()),
            escape_failures: RefCell::new(VecDeque::new()),
            clicks: RefCell::new(Vec::new()),
            navigations: RefCell::new(Vec::new()),
            sources_read: Cell::new(0),
        }
    }

    pub fn page(mut self, path: &str, html: String) -> Self {
        self.pages.insert(path.to_string(), html);
        self
    }

    /// Require a login before any page other than the login form is served
    pub fn with_login(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some((username.to_string(), password.to_string()));
        self.pages.insert(LOGIN_PATH.to_string(), login_page());
        self.pages
            .entry("/".to_string())
            .or_insert_with(|| "<html><body>Home</body></html>".to_string());
        self
    }

    pub fn start_at(self, path: &str) -> Self {
        *self.current.borrow_mut() = path.to_string();
        self
    }

    /// Every navigation caused by a click shows a placeholder for the next `reads` reads
    pub fn skeleton_reads(mut self, reads: usize) -> Self {
        self.skeleton_reads = reads;
        self
    }

    /// Keep the lightbox node after Escape and show a new source only `delay` reads after a click
    pub fn persistent_lightbox(mut self, delay: usize) -> Self {
        self.persistent_lightbox = Some(delay);
        self
    }

    /// The next clicks fail with these errors, in order
    pub fn fail_clicks(self, errors: Vec<BrowserError>) -> Self {
        self.click_failures.borrow_mut().extend(errors);
        self
    }

    pub fn fail_escapes(self, errors: Vec<BrowserError>) -> Self {
        self.escape_failures.borrow_mut().extend(errors);
        self
    }

    pub fn current_path(&self) -> String {
        self.current.borrow().clone()
    }

    pub fn clicked(&self, label: &str) -> usize {
        self.clicks.borrow().iter().filter(|c| c.as_str() == label).count()
    }

    fn path_of(url: &str) -> String {
        let path = url.strip_prefix(ORIGIN).unwrap_or(url);
        if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        }
    }

    fn go(&self, url: &str) -> Result<(), BrowserError> {
        let path = Self::path_of(url);
        self.navigations.borrow_mut().push(path.clone());
        *self.lightbox.borrow_mut() = None;
        *self.pending_source.borrow_mut() = None;
        self.lightbox_visible.set(false);

        if self.credentials.is_some() && !self.logged_in.get() && path != LOGIN_PATH {
            *self.current.borrow_mut() = LOGIN_PATH.to_string();
            return Ok(());
        }
        if !self.pages.contains_key(&path) {
            return Err(BrowserError::NavigationError(format!("404 for {}", path)));
        }
        *self.current.borrow_mut() = path;
        Ok(())
    }

    fn with_elements<T>(
        &self,
        locator: &Locator,
        f: impl FnOnce(Vec<ElementRef<'_>>) -> T,
    ) -> Result<T, BrowserError> {
        let html = self.render();
        let document = Html::parse_document(&html);
        let elements: Vec<ElementRef<'_>> = match locator {
            Locator::Css(css) => {
                let selector = Selector::parse(css)
                    .map_err(|e| BrowserError::JavaScriptError(e.to_string()))?;
                document.select(&selector).collect()
            }
            Locator::LinkText(text) => {
                let anchors = Selector::parse("a").unwrap();
                document
                    .select(&anchors)
                    .filter(|a| a.text().collect::<String>().trim() == text)
                    .collect()
            }
        };
        Ok(f(elements))
    }

    fn with_element<T>(
        &self,
        locator: &Locator,
        index: usize,
        f: impl FnOnce(ElementRef<'_>) -> T,
    ) -> Result<T, BrowserError> {
        self.with_elements(locator, |elements| {
            if elements.is_empty() {
                return Err(BrowserError::ElementNotFound(locator.to_string()));
            }
            match elements.get(index) {
                Some(el) => Ok(f(*el)),
                None => Err(BrowserError::StaleElement(format!("{} [{}]", locator, index))),
            }
        })?
    }

    fn render(&self) -> String {
        let left = self.skeleton_left.get();
        if left > 0 {
            self.skeleton_left.set(left - 1);
            return "<html><body><div class=\"spinner\"></div><table><tbody></tbody></table></body></html>"
                .to_string();
        }

        let swapped = match self.pending_source.borrow_mut().as_mut() {
            Some((src, 0)) => Some(src.clone()),
            Some((_, delay)) => {
                *delay -= 1;
                None
            }
            None => None,
        };
        if let Some(src) = swapped {
            *self.pending_source.borrow_mut() = None;
            *self.lightbox.borrow_mut() = Some(src);
        }

        let html = self
            .pages
            .get(self.current.borrow().as_str())
            .cloned()
            .unwrap_or_default();
        match self.lightbox.borrow().as_ref() {
            Some(src) => {
                let hidden = if self.lightbox_visible.get() { "" } else { " hidden" };
                let lightbox = format!("<div id=\"lightbox\"{}><img src=\"{}\"></div>", hidden, src);
                match html.rfind("</body>") {
                    Some(pos) => format!("{}{}{}", &html[..pos], lightbox, &html[pos..]),
                    None => format!("{}{}", html, lightbox),
                }
            }
            None => html,
        }
    }
}

fn displayed(el: &ElementRef<'_>) -> bool {
    el.value().attr("hidden").is_none()
        && el
            .ancestors()
            .filter_map(|node| node.value().as_element())
            .all(|ancestor| ancestor.attr("hidden").is_none())
}

impl Renderer for FakeSite {
    fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.go(url)
    }

    fn current_url(&self) -> Result<String, BrowserError> {
        Ok(format!("{}{}", ORIGIN, self.current.borrow()))
    }

    fn page_source(&self) -> Result<String, BrowserError> {
        self.sources_read.set(self.sources_read.get() + 1);
        Ok(self.render())
    }

    fn count(&self, locator: &Locator) -> Result<usize, BrowserError> {
        self.with_elements(locator, |elements| elements.len())
    }

    fn text(&self, locator: &Locator, index: usize) -> Result<String, BrowserError> {
        self.with_element(locator, index, |el| el.text().collect::<String>().trim().to_string())
    }

    fn attribute(
        &self,
        locator: &Locator,
        index: usize,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        self.with_element(locator, index, |el| el.value().attr(name).map(str::to_string))
    }

    fn is_clickable(&self, locator: &Locator, index: usize) -> Result<bool, BrowserError> {
        self.with_element(locator, index, |el| {
            el.value().attr("disabled").is_none() && displayed(&el)
        })
    }

    fn click(&self, locator: &Locator, index: usize) -> Result<(), BrowserError> {
        if let Some(error) = self.click_failures.borrow_mut().pop_front() {
            return Err(error);
        }

        let (label, action) = self.with_element(locator, index, |el| {
            let label = el.text().collect::<String>().trim().to_string();
            let value = el.value();
            let action = if value.name() == "img" {
                value
                    .attr("data-full")
                    .map(|src| ClickAction::OpenLightbox(src.to_string()))
                    .unwrap_or(ClickAction::Nothing)
            } else if value.name() == "button" && value.attr("type") == Some("submit") {
                ClickAction::Submit
            } else {
                let href = if value.name() == "a" {
                    value.attr("href").map(str::to_string)
                } else {
                    let anchors = Selector::parse("a").unwrap();
                    el.select(&anchors)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                        .map(str::to_string)
                };
                match href {
                    Some(href) if href != "#" => ClickAction::Follow(href),
                    _ => ClickAction::Nothing,
                }
            };
            (label, action)
        })?;

        self.clicks.borrow_mut().push(label);
        match action {
            ClickAction::OpenLightbox(src) => {
                self.lightbox_visible.set(true);
                match self.persistent_lightbox {
                    Some(delay) => *self.pending_source.borrow_mut() = Some((src, delay)),
                    None => *self.lightbox.borrow_mut() = Some(src),
                }
            }
            ClickAction::Submit => {
                let inputs = self.inputs.borrow();
                let accepted = self.credentials.as_ref().is_some_and(|(user, pass)| {
                    inputs.get("username") == Some(user) && inputs.get("password") == Some(pass)
                });
                if accepted {
                    self.logged_in.set(true);
                    *self.current.borrow_mut() = "/".to_string();
                }
            }
            ClickAction::Follow(href) => {
                self.go(&href)?;
                self.skeleton_left.set(self.skeleton_reads);
            }
            ClickAction::Nothing => {}
        }
        Ok(())
    }

    fn scroll_into_view(&self, locator: &Locator, index: usize) -> Result<(), BrowserError> {
        self.with_element(locator, index, |_| ())
    }

    fn type_text(&self, locator: &Locator, index: usize, text: &str) -> Result<(), BrowserError> {
        let name = self.with_element(locator, index, |el| {
            el.value().attr("name").unwrap_or_default().to_string()
        })?;
        self.inputs.borrow_mut().insert(name, text.to_string());
        Ok(())
    }

    fn press_escape(&self) -> Result<(), BrowserError> {
        if let Some(error) = self.escape_failures.borrow_mut().pop_front() {
            return Err(error);
        }
        if self.persistent_lightbox.is_some() {
            self.lightbox_visible.set(false);
        } else {
            *self.lightbox.borrow_mut() = None;
        }
        Ok(())
    }
}

/* ---------------- Fake fetcher ---------------- */

/// Serves canned responses; unknown URLs answer 404
pub struct FakeFetcher {
    responses: HashMap<String, (u16, Vec<u8>)>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn respond(mut self, url: &str, status: u16, bytes: &[u8]) -> Self {
        self.responses.insert(url.to_string(), (status, bytes.to_vec()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        self.calls.borrow_mut().push(url.to_string());
        let (status, bytes) = self
            .responses
            .get(url)
            .cloned()
            .unwrap_or((404, Vec::new()));
        Ok(FetchedImage { status, bytes })
    }
}
