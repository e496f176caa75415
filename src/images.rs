//! Lightbox-driven image downloads.
//!
//! For every record that advertises images, open its detail page, click each thumbnail to open
//! the lightbox, read the full-size image URL from it, fetch the bytes over plain HTTP and close
//! the lightbox again. Failures are contained at the smallest scope: a broken thumbnail skips
//! only that image, a broken detail page skips only that record.

use crate::browser::BrowserError;
use crate::cancel::CancelToken;
use crate::config::TimingConfig;
use crate::error::ScrapeError;
use crate::http_client::ImageFetcher;
use crate::models::{CatalogRecord, RecordKind};
use crate::renderer::{Locator, Renderer};
use crate::storage::{image_file_name, write_image};
use crate::wait::{wait_for_element, wait_for_hidden, wait_until};
use reqwest::Url;
use serde::Serialize;
use std::path::Path;

/// Thumbnails on a detail page
pub const THUMBNAIL_SELECTOR: &str = "div.box a img";

/// Full-size image inside the open lightbox
pub const LIGHTBOX_IMAGE_SELECTOR: &str = "#lightbox img";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadSummary {
    pub kind: RecordKind,
    pub records_seen: usize,
    /// No link or no advertised images
    pub records_skipped: usize,
    /// Detail page showed no thumbnails
    pub records_without_thumbnails: usize,
    pub records_failed: usize,
    pub images_saved: usize,
    pub images_failed: usize,
    pub saved: Vec<String>,
    pub cancelled: bool,
}

impl DownloadSummary {
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            records_seen: 0,
            records_skipped: 0,
            records_without_thumbnails: 0,
            records_failed: 0,
            images_saved: 0,
            images_failed: 0,
            saved: Vec::new(),
            cancelled: false,
        }
    }
}

pub struct ImageDownloader<'a, Rn: Renderer + ?Sized, F: ImageFetcher> {
    renderer: &'a Rn,
    fetcher: &'a F,
    output_dir: &'a Path,
    timing: &'a TimingConfig,
    cancel: &'a CancelToken,
}

impl<'a, Rn: Renderer + ?Sized, F: ImageFetcher> ImageDownloader<'a, Rn, F> {
    pub fn new(
        renderer: &'a Rn,
        fetcher: &'a F,
        output_dir: &'a Path,
        timing: &'a TimingConfig,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            renderer,
            fetcher,
            output_dir,
            timing,
            cancel,
        }
    }

    /// Download every image of every record, in record order
    pub async fn download_all<R: CatalogRecord>(&self, records: &[R]) -> DownloadSummary {
        let mut summary = DownloadSummary::new(R::KIND);
        log::info!("Downloading images for {} {} records", records.len(), R::KIND);

        for record in records {
            if self.cancel.is_cancelled() {
                log::warn!("Image download cancelled at {}", record.name());
                summary.cancelled = true;
                break;
            }
            summary.records_seen += 1;
            if let Err(e) = self.download_record(record, &mut summary).await {
                log::error!("Error processing {}: {}", record.name(), e);
                summary.records_failed += 1;
            }
        }

        log::info!(
            "{} images: {} saved, {} failed, {} records skipped",
            R::KIND,
            summary.images_saved,
            summary.images_failed,
            summary.records_skipped
        );
        summary
    }

    async fn download_record<R: CatalogRecord>(
        &self,
        record: &R,
        summary: &mut DownloadSummary,
    ) -> Result<(), ScrapeError> {
        let advertised = record.image_count();
        if !record.has_link() || advertised == 0 {
            log::info!("Skipping {} as it has no images.", record.name());
            summary.records_skipped += 1;
            return Ok(());
        }

        self.renderer.navigate(record.link())?;
        let thumbnails = Locator::css(THUMBNAIL_SELECTOR);
        wait_for_element(self.renderer, &thumbnails, self.timing.page_load_wait()).await;

        let found = self.renderer.count(&thumbnails)?;
        if found == 0 {
            log::info!("No images found for {}", record.name());
            summary.records_without_thumbnails += 1;
            return Ok(());
        }
        if found != advertised as usize {
            log::debug!(
                "{} lists {} images but its page shows {}",
                record.name(),
                advertised,
                found
            );
        }

        for index in 0..found {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            match self.download_thumbnail(record.name(), index).await {
                Ok(Some(path)) => {
                    summary.images_saved += 1;
                    summary.saved.push(path);
                }
                Ok(None) => summary.images_failed += 1,
                Err(e) => {
                    log::error!(
                        "Error downloading image {} for {}: {}",
                        index + 1,
                        record.name(),
                        e
                    );
                    summary.images_failed += 1;
                    // Leave no lightbox open over the next thumbnail
                    if let Err(e) = self.renderer.press_escape() {
                        log::warn!("Could not close the lightbox after image {}: {}", index + 1, e);
                    }
                }
            }
        }
        Ok(())
    }

    /// Saved path, or `None` when the server answered with a non-200 status
    async fn download_thumbnail(&self, name: &str, index: usize) -> Result<Option<String>, ScrapeError> {
        let thumbnails = Locator::css(THUMBNAIL_SELECTOR);
        let lightbox = Locator::css(LIGHTBOX_IMAGE_SELECTOR);

        // The viewer may keep its node around between images and only swap the source once
        // the next image has loaded, so a new image is one that is displayed with a new source
        let previous = self.lightbox_source();
        self.renderer.click(&thumbnails, index)?;
        let opened = wait_until(self.renderer, self.timing.image_download_wait(), |r| {
            if !r.exists(&lightbox)? || !r.is_clickable(&lightbox, 0)? {
                return Ok(false);
            }
            let src = visible_source(r.attribute(&lightbox, 0, "src")?);
            Ok(src.is_some() && src != previous)
        })
        .await;
        if !opened {
            return Err(BrowserError::Timeout(format!(
                "lightbox to show image {} of {}",
                index + 1,
                name
            ))
            .into());
        }

        let src = visible_source(self.renderer.attribute(&lightbox, 0, "src")?)
            .ok_or_else(|| BrowserError::ElementNotFound("lightbox image source".to_string()))?;
        let url = self.absolute_url(&src);

        let image = self.fetcher.fetch(&url).await?;
        let saved = if image.is_ok() {
            let file_name = image_file_name(name, index);
            let path = write_image(self.output_dir, &file_name, &image.bytes)?;
            log::info!("Downloaded {} image {} to {}", name, index + 1, path.display());
            Some(path.display().to_string())
        } else {
            log::error!(
                "Failed to download image {} for {} (status {})",
                index + 1,
                name,
                image.status
            );
            None
        };

        self.renderer.press_escape()?;
        wait_for_hidden(self.renderer, &lightbox, self.timing.lightbox_close_wait()).await;
        Ok(saved)
    }

    /// Source of the lightbox image currently in the DOM, shown or not
    fn lightbox_source(&self) -> Option<String> {
        let lightbox = Locator::css(LIGHTBOX_IMAGE_SELECTOR);
        match self.renderer.count(&lightbox) {
            Ok(0) | Err(_) => None,
            Ok(_) => self
                .renderer
                .attribute(&lightbox, 0, "src")
                .ok()
                .and_then(visible_source),
        }
    }

    /// Lightbox sources may be relative to the detail page
    fn absolute_url(&self, src: &str) -> String {
        if let Ok(url) = Url::parse(src) {
            return url.to_string();
        }
        self.renderer
            .current_url()
            .ok()
            .and_then(|page| Url::parse(&page).ok())
            .and_then(|page| page.join(src).ok())
            .map(|url| url.to_string())
            .unwrap_or_else(|| src.to_string())
    }
}

fn visible_source(src: Option<String>) -> Option<String> {
    src.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
