use crate::browser::BrowserError;
use crate::cancel::CancelToken;
use crate::extract::{extract_page, RowSchema, ROW_SELECTOR};
use crate::renderer::{Locator, Renderer};
use crate::wait::{page_fingerprint, wait_for_render};
use reqwest::Url;
use serde::Serialize;
use std::time::Duration;

/// Visible text of the pagination control that advances the listing
pub const NEXT_LINK_TEXT: &str = "Next";

/// Why a paginated traversal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// No "Next" control on the page
    NoNextControl,
    /// "Next" present but disabled
    LastPage,
    /// Page had no table rows at all
    EmptyPage,
    /// Locating or invoking "Next" failed; handled like an absent control
    ControlError,
    Cancelled,
}

/// Records collected by one traversal unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination<R> {
    pub records: Vec<R>,
    pub pages: usize,
    pub stop: StopReason,
}

enum Advance {
    Clicked,
    Absent,
    Disabled,
}

/// Walks a listing from its current page to the last, extracting every page on the way.
/// Holds no state between runs.
pub struct PaginationDriver<'a, Rn: Renderer + ?Sized> {
    renderer: &'a Rn,
    origin: &'a Url,
    settle: Duration,
    cancel: &'a CancelToken,
    stop_when_empty: bool,
}

impl<'a, Rn: Renderer + ?Sized> PaginationDriver<'a, Rn> {
    /// `settle` bounds the wait for the next page's rows to render after "Next"
    pub fn new(renderer: &'a Rn, origin: &'a Url, settle: Duration, cancel: &'a CancelToken) -> Self {
        Self {
            renderer,
            origin,
            settle,
            cancel,
            stop_when_empty: false,
        }
    }

    /// End traversal on a page without table rows
    pub fn stop_when_empty(mut self, stop: bool) -> Self {
        self.stop_when_empty = stop;
        self
    }

    pub async fn run<R: RowSchema>(&self) -> Pagination<R> {
        let mut records = Vec::new();
        let mut pages = 0;

        let stop = loop {
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            let html = match self.renderer.page_source() {
                Ok(html) => html,
                Err(e) => {
                    log::warn!("Could not read listing page {}: {}", pages + 1, e);
                    break StopReason::ControlError;
                }
            };
            let page = extract_page::<R>(&html, self.origin);
            pages += 1;

            if page.looks_malformed() {
                log::warn!(
                    "Page {} had {} {} rows but none with at least {} cells; listing markup may have changed",
                    pages,
                    page.rows_seen,
                    R::KIND,
                    R::MIN_CELLS
                );
            }
            log::debug!("Page {}: {} {} records", pages, page.records.len(), R::KIND);

            let empty = page.rows_seen == 0;
            records.extend(page.records);
            if self.stop_when_empty && empty {
                break StopReason::EmptyPage;
            }

            match self.advance().await {
                Ok(Advance::Clicked) => continue,
                Ok(Advance::Absent) => break StopReason::NoNextControl,
                Ok(Advance::Disabled) => break StopReason::LastPage,
                Err(e) => {
                    log::debug!("'Next' control failed: {}", e);
                    break StopReason::ControlError;
                }
            }
        };

        match stop {
            StopReason::LastPage => {
                log::info!("No more pages to scrape. Total pages: {}", pages)
            }
            StopReason::NoNextControl | StopReason::ControlError => {
                log::info!("No 'Next' button found after page {}. Stopping.", pages)
            }
            StopReason::EmptyPage => log::info!("Page {} has no rows. Stopping.", pages),
            StopReason::Cancelled => log::warn!("Pagination cancelled after {} pages", pages),
        }

        Pagination {
            records,
            pages,
            stop,
        }
    }

    async fn advance(&self) -> Result<Advance, BrowserError> {
        let next = Locator::link_text(NEXT_LINK_TEXT);
        if self.renderer.count(&next)? == 0 {
            return Ok(Advance::Absent);
        }

        let class = self.renderer.attribute(&next, 0, "class")?.unwrap_or_default();
        if class.to_lowercase().contains("disabled") {
            return Ok(Advance::Disabled);
        }

        let before = page_fingerprint(self.renderer);
        self.renderer.click(&next, 0)?;
        wait_for_render(self.renderer, before, &Locator::css(ROW_SELECTOR), self.settle).await;
        Ok(Advance::Clicked)
    }
}
