//! Condition-polling waits.
//!
//! Every action that re-renders the page (navigation, a letter or "Next" click, opening or
//! closing the lightbox) is followed by one of these before the next read. Each polls a
//! condition until it holds or the configured duration runs out, so a fast page costs a single
//! poll and a slow one costs at most the old fixed pause.

use crate::browser::BrowserError;
use crate::renderer::{Locator, Renderer};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `condition` until it returns `Ok(true)` or `timeout` elapses.
/// The condition is always checked at least once; errors count as "not yet".
pub async fn wait_until<R, F>(renderer: &R, timeout: Duration, mut condition: F) -> bool
where
    R: Renderer + ?Sized,
    F: FnMut(&R) -> Result<bool, BrowserError>,
{
    let start = Instant::now();
    loop {
        if let Ok(true) = condition(renderer) {
            return true;
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL.min(timeout - elapsed)).await;
    }
}

/// Hash of the current document, taken before an action that should change it
pub fn page_fingerprint<R: Renderer + ?Sized>(renderer: &R) -> Option<u64> {
    let source = renderer.page_source().ok()?;
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    Some(hasher.finish())
}

/// Wait until the document differs from `before` and has finished loading.
/// Without a fingerprint this is a plain pause.
pub async fn wait_for_change<R: Renderer + ?Sized>(
    renderer: &R,
    before: Option<u64>,
    timeout: Duration,
) -> bool {
    let Some(before) = before else {
        pause(timeout).await;
        return false;
    };
    let changed = wait_until(renderer, timeout, |r| {
        Ok(differs_from(r, before) && r.document_ready()?)
    })
    .await;
    if !changed {
        log::debug!("Page did not change within {:?}", timeout);
    }
    changed
}

/// Wait until the document differs from `before`, has loaded, and shows `ready`.
///
/// Client-rendered listings pass through placeholder states (an empty table body, a spinner)
/// between the old content and the new. Any of those already differs from `before`, so the
/// change alone does not mean the new content is there.
pub async fn wait_for_render<R: Renderer + ?Sized>(
    renderer: &R,
    before: Option<u64>,
    ready: &Locator,
    timeout: Duration,
) -> bool {
    let rendered = wait_until(renderer, timeout, |r| {
        let changed = before.map_or(true, |before| differs_from(r, before));
        Ok(changed && r.document_ready()? && r.exists(ready)?)
    })
    .await;
    if !rendered {
        log::debug!("No {} rendered within {:?}", ready, timeout);
    }
    rendered
}

fn differs_from<R: Renderer + ?Sized>(renderer: &R, before: u64) -> bool {
    page_fingerprint(renderer).is_some_and(|now| now != before)
}

pub async fn wait_for_element<R: Renderer + ?Sized>(
    renderer: &R,
    locator: &Locator,
    timeout: Duration,
) -> bool {
    wait_until(renderer, timeout, |r| r.exists(locator)).await
}

/// Wait until nothing matching `locator` is displayed. Elements that stay in the DOM but are
/// hidden count as gone.
pub async fn wait_for_hidden<R: Renderer + ?Sized>(
    renderer: &R,
    locator: &Locator,
    timeout: Duration,
) -> bool {
    wait_until(renderer, timeout, |r| {
        Ok(!r.exists(locator)? || !r.is_clickable(locator, 0)?)
    })
    .await
}

/// Wait until the first element matching `locator` is displayed and enabled
pub async fn wait_for_clickable<R: Renderer + ?Sized>(
    renderer: &R,
    locator: &Locator,
    timeout: Duration,
) -> bool {
    wait_until(renderer, timeout, |r| {
        Ok(r.exists(locator)? && r.is_clickable(locator, 0)?)
    })
    .await
}

pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
