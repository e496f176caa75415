use crate::browser::BrowserError;
use crate::cancel::CancelToken;
use crate::config::TimingConfig;
use crate::models::SpeciesRecord;
use crate::pagination::{Pagination, PaginationDriver, StopReason};
use crate::renderer::{Locator, Renderer};
use crate::extract::ROW_SELECTOR;
use crate::wait::{page_fingerprint, wait_for_clickable, wait_for_render};
use reqwest::Url;

/// Toggle on the hybrid listing that switches it to species
pub const SHOW_SPECIES_LINK_TEXT: &str = "Show species";

/// Index entry listing every species at once
pub const ALL_ENTRY_LINK_TEXT: &str = "All";

/// Switch the listing to species, select "All" and paginate until a page comes back empty.
/// A missing toggle yields an empty result, not an error.
pub async fn collect_species<Rn: Renderer + ?Sized>(
    renderer: &Rn,
    origin: &Url,
    timing: &TimingConfig,
    cancel: &CancelToken,
) -> Pagination<SpeciesRecord> {
    let rows = Locator::css(ROW_SELECTOR);
    for text in [SHOW_SPECIES_LINK_TEXT, ALL_ENTRY_LINK_TEXT] {
        if cancel.is_cancelled() {
            return Pagination {
                records: Vec::new(),
                pages: 0,
                stop: StopReason::Cancelled,
            };
        }
        if let Err(e) = click_link(renderer, text, &rows, timing).await {
            log::error!("Error clicking '{}': {}", text, e);
            return Pagination {
                records: Vec::new(),
                pages: 0,
                stop: StopReason::ControlError,
            };
        }
    }

    let species = PaginationDriver::new(renderer, origin, timing.next_page_wait(), cancel)
        .stop_when_empty(true)
        .run::<SpeciesRecord>()
        .await;
    log::info!(
        "Species listing finished: {} records over {} pages",
        species.records.len(),
        species.pages
    );
    species
}

/// Click the link with `text`, then wait until `ready` shows up on the re-rendered page
async fn click_link<Rn: Renderer + ?Sized>(
    renderer: &Rn,
    text: &str,
    ready: &Locator,
    timing: &TimingConfig,
) -> Result<(), BrowserError> {
    let link = Locator::link_text(text);
    if !wait_for_clickable(renderer, &link, timing.page_load_wait()).await {
        return Err(BrowserError::ElementNotFound(format!("'{}' link", text)));
    }
    let before = page_fingerprint(renderer);
    renderer.click(&link, 0)?;
    wait_for_render(renderer, before, ready, timing.page_load_wait()).await;
    Ok(())
}
