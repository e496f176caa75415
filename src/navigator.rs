//! Alphabet index traversal.
//!
//! The hybrid listing is partitioned by starting letter through an index control. The listing
//! opens on the first letter, so that letter is paginated before any entry is clicked; the last
//! entry is an "All" aggregate that would repeat every other letter and is never visited.
//!
//! Entries are addressed by position and re-resolved before every click because the index is
//! re-rendered along with the listing. Progress is tracked by a cursor over the positions found
//! at the start, so a failing letter is retried in place and never restarts the alphabet.

use crate::browser::BrowserError;
use crate::cancel::CancelToken;
use crate::config::TimingConfig;
use crate::extract::{RowSchema, ROW_SELECTOR};
use crate::pagination::{Pagination, PaginationDriver, StopReason};
use crate::renderer::{Locator, Renderer};
use crate::retry::Backoff;
use crate::wait::{page_fingerprint, pause, wait_for_clickable, wait_for_render};
use reqwest::Url;
use serde::Serialize;

/// Entries of the alphabet index on the hybrid listing
pub const INDEX_ENTRY_SELECTOR: &str =
    "body > div.justify-content-left.align-items-center > div > div:nth-child(3) > div:nth-child(2) > ul > li";

/// Leading entries already shown when the listing opens
pub const LEADING_ENTRIES_COVERED: usize = 1;

/// Trailing aggregate entries ("All") skipped to avoid duplicating every letter
pub const TRAILING_AGGREGATE_ENTRIES: usize = 1;

/// Label used for the initial letter when the index cannot be read
const INITIAL_LABEL: &str = "initial";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LetterOutcome {
    pub label: String,
    pub records: usize,
    pub pages: usize,
    pub stop: StopReason,
    pub attempts: u32,
}

/// A letter given up on after exhausting its attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LetterFailure {
    pub position: usize,
    /// Most recent label read for the entry
    pub label: String,
    pub attempts: u32,
    pub error: String,
}

/// Accumulator for a whole-alphabet run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal<R> {
    pub records: Vec<R>,
    pub letters: Vec<LetterOutcome>,
    pub failures: Vec<LetterFailure>,
    pub cancelled: bool,
}

impl<R> Default for Traversal<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            letters: Vec::new(),
            failures: Vec::new(),
            cancelled: false,
        }
    }
}

impl<R> Traversal<R> {
    fn absorb(&mut self, label: String, pagination: Pagination<R>, attempts: u32) {
        self.letters.push(LetterOutcome {
            label,
            records: pagination.records.len(),
            pages: pagination.pages,
            stop: pagination.stop,
            attempts,
        });
        if pagination.stop == StopReason::Cancelled {
            self.cancelled = true;
        }
        self.records.extend(pagination.records);
    }
}

pub struct AlphabetNavigator<'a, Rn: Renderer + ?Sized> {
    renderer: &'a Rn,
    origin: &'a Url,
    timing: &'a TimingConfig,
    cancel: &'a CancelToken,
    index: Locator,
}

impl<'a, Rn: Renderer + ?Sized> AlphabetNavigator<'a, Rn> {
    pub fn new(
        renderer: &'a Rn,
        origin: &'a Url,
        timing: &'a TimingConfig,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            renderer,
            origin,
            timing,
            cancel,
            index: Locator::css(INDEX_ENTRY_SELECTOR),
        }
    }

    fn max_attempts(&self) -> u32 {
        self.timing.max_retries.max(1)
    }

    fn backoff(&self) -> Backoff {
        let base = self.timing.retry_wait();
        Backoff::new(base, base.saturating_mul(8))
    }

    /// Traverse every letter, starting with the one already on screen
    pub async fn run<R: RowSchema>(&self) -> Traversal<R> {
        let mut traversal = Traversal::default();

        let initial = self
            .renderer
            .text(&self.index, 0)
            .unwrap_or_else(|_| INITIAL_LABEL.to_string());
        log::info!("Scraping initial letter: {}", initial);
        let pagination = self.paginate::<R>().await;
        traversal.absorb(initial, pagination, 1);

        let positions = match self.remaining_positions().await {
            Ok(positions) => positions,
            Err(e) => {
                log::error!("Could not read the alphabet index: {}", e);
                traversal.failures.push(LetterFailure {
                    position: 0,
                    label: "index".to_string(),
                    attempts: self.max_attempts(),
                    error: e.to_string(),
                });
                return traversal;
            }
        };
        log::info!("{} index entries left to visit", positions.len());

        let mut cursor = 0;
        while cursor < positions.len() && !traversal.cancelled {
            if self.cancel.is_cancelled() {
                log::warn!("Cancelled before index entry {}", positions[cursor]);
                traversal.cancelled = true;
                break;
            }
            self.collect_letter(positions[cursor], &mut traversal).await;
            cursor += 1;
        }

        log::info!(
            "Alphabet traversal finished: {} records over {} letters, {} letters failed",
            traversal.records.len(),
            traversal.letters.len(),
            traversal.failures.len()
        );
        traversal
    }

    /// Positions of the entries still to click, read with the same retry budget as a letter
    async fn remaining_positions(&self) -> Result<Vec<usize>, BrowserError> {
        let backoff = self.backoff();
        let mut attempt = 1;
        loop {
            match self.renderer.count(&self.index) {
                Ok(total) => {
                    let end = total.saturating_sub(TRAILING_AGGREGATE_ENTRIES);
                    return Ok((LEADING_ENTRIES_COVERED..end).collect());
                }
                Err(e) if attempt < self.max_attempts() => {
                    log::warn!("Error reading index entries (attempt {}): {}", attempt, e);
                    backoff.wait(attempt - 1).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Open the letter at `position` and paginate it, retrying the whole letter on failure
    async fn collect_letter<R: RowSchema>(&self, position: usize, traversal: &mut Traversal<R>) {
        let backoff = self.backoff();
        let max_attempts = self.max_attempts();
        let mut label = format!("#{}", position);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.open_letter(position, &mut label).await {
                Ok(()) => {
                    let pagination = self.paginate::<R>().await;
                    log::info!(
                        "Letter {}: {} records over {} pages",
                        label,
                        pagination.records.len(),
                        pagination.pages
                    );
                    traversal.absorb(label, pagination, attempt);
                    return;
                }
                Err(e) => {
                    if e.is_transient() {
                        log::warn!(
                            "Retrying click for letter {} due to exception: {} (attempt {}/{})",
                            label,
                            e,
                            attempt,
                            max_attempts
                        );
                    } else {
                        log::error!(
                            "Error navigating to letter {}: {} (attempt {}/{})",
                            label,
                            e,
                            attempt,
                            max_attempts
                        );
                    }
                    last_error = e.to_string();
                }
            }

            if attempt < max_attempts {
                if self.cancel.is_cancelled() {
                    traversal.cancelled = true;
                    return;
                }
                backoff.wait(attempt - 1).await;
            }
        }

        log::error!("Giving up on letter {} after {} attempts", label, max_attempts);
        traversal.failures.push(LetterFailure {
            position,
            label,
            attempts: max_attempts,
            error: last_error,
        });
    }

    /// Scroll to, wait for and click the entry, then wait for the letter's rows to render
    async fn open_letter(&self, position: usize, label: &mut String) -> Result<(), BrowserError> {
        let total = self.renderer.count(&self.index)?;
        if position + TRAILING_AGGREGATE_ENTRIES >= total {
            return Err(BrowserError::StaleElement(format!(
                "index entry {} of {}",
                position, total
            )));
        }

        *label = self.renderer.text(&self.index, position)?;
        log::info!("Clicking on letter: {}", label);

        self.renderer.scroll_into_view(&self.index, position)?;
        pause(self.timing.lightbox_close_wait()).await;

        let link = Locator::link_text(label.clone());
        if !wait_for_clickable(self.renderer, &link, self.timing.page_load_wait()).await {
            return Err(BrowserError::Timeout(format!("letter {} to become clickable", label)));
        }

        let before = page_fingerprint(self.renderer);
        self.renderer.click(&self.index, position)?;
        wait_for_render(
            self.renderer,
            before,
            &Locator::css(ROW_SELECTOR),
            self.timing.page_load_wait(),
        )
        .await;
        Ok(())
    }

    async fn paginate<R: RowSchema>(&self) -> Pagination<R> {
        PaginationDriver::new(self.renderer, self.origin, self.timing.next_page_wait(), self.cancel)
            .run::<R>()
            .await
    }
}
