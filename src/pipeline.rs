use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::ScrapeError;
use crate::extract::ROW_SELECTOR;
use crate::http_client::ImageFetcher;
use crate::images::ImageDownloader;
use crate::models::{HybridRecord, SpeciesRecord};
use crate::navigator::AlphabetNavigator;
use crate::pagination::StopReason;
use crate::renderer::{Locator, Renderer};
use crate::report::RunReport;
use crate::session;
use crate::species::collect_species;
use crate::storage::ensure_dir;
use crate::wait::wait_for_element;
use reqwest::Url;
use std::path::Path;

/// Everything a run collected, complete or not
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub hybrids: Vec<HybridRecord>,
    pub species: Vec<SpeciesRecord>,
    pub report: RunReport,
}

impl RunOutput {
    fn new() -> Self {
        Self {
            hybrids: Vec::new(),
            species: Vec::new(),
            report: RunReport::start(),
        }
    }
}

/// One catalog run over a single rendering session
pub struct Pipeline<'a, Rn: Renderer + ?Sized, F: ImageFetcher> {
    renderer: &'a Rn,
    fetcher: &'a F,
    config: &'a Config,
    cancel: CancelToken,
}

impl<'a, Rn: Renderer + ?Sized, F: ImageFetcher> Pipeline<'a, Rn, F> {
    pub fn new(renderer: &'a Rn, fetcher: &'a F, config: &'a Config, cancel: CancelToken) -> Self {
        Self {
            renderer,
            fetcher,
            config,
            cancel,
        }
    }

    /// Log in, collect hybrids and species, then download their images.
    ///
    /// Only setup and authentication failures are returned as errors. Anything that goes wrong
    /// afterwards is logged and recorded in the report, and the records gathered so far are
    /// still returned for persistence.
    pub async fn run(&self) -> Result<RunOutput, ScrapeError> {
        let origin = Url::parse(&self.config.site_origin).map_err(|e| {
            ScrapeError::Configuration(format!("invalid site_origin {}: {}", self.config.site_origin, e))
        })?;
        let image_dir = Path::new(&self.config.image_dir);
        ensure_dir(image_dir)?;

        session::login(self.renderer, self.config)
            .await
            .map_err(|e| match e {
                ScrapeError::Authentication(_) => e,
                other => ScrapeError::Authentication(other.to_string()),
            })?;

        let mut output = RunOutput::new();
        match self.execute(&origin, image_dir, &mut output).await {
            Ok(()) => {}
            Err(ScrapeError::Cancelled) => {
                log::warn!(
                    "Run cancelled; keeping {} hybrids and {} species collected so far",
                    output.hybrids.len(),
                    output.species.len()
                );
                output.report.cancelled = true;
            }
            Err(e) => {
                log::error!("An error occurred during the main execution: {}", e);
                output.report.error = Some(e.to_string());
            }
        }
        output.report.cancelled |= self.cancel.is_cancelled();
        output.report.finish();
        log::info!("Run finished: {}", output.report.summary_line());
        Ok(output)
    }

    async fn execute(
        &self,
        origin: &Url,
        image_dir: &Path,
        output: &mut RunOutput,
    ) -> Result<(), ScrapeError> {
        let timing = &self.config.timing;

        log::info!("Opening hybrid listing {}", self.config.base_url);
        self.renderer.navigate(&self.config.base_url)?;
        wait_for_element(self.renderer, &Locator::css(ROW_SELECTOR), timing.page_load_wait()).await;

        let traversal = AlphabetNavigator::new(self.renderer, origin, timing, &self.cancel)
            .run::<HybridRecord>()
            .await;
        output.hybrids = traversal.records;
        output.report.hybrids = output.hybrids.len();
        output.report.letters = traversal.letters;
        output.report.letter_failures = traversal.failures;
        if traversal.cancelled || self.cancel.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }

        let species = collect_species(self.renderer, origin, timing, &self.cancel).await;
        output.species = species.records;
        output.report.species = output.species.len();
        if species.stop == StopReason::Cancelled || self.cancel.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }

        let downloader =
            ImageDownloader::new(self.renderer, self.fetcher, image_dir, timing, &self.cancel);

        let species_images = downloader.download_all(&output.species).await;
        let cancelled = species_images.cancelled;
        output.report.species_images = Some(species_images);
        if cancelled {
            return Err(ScrapeError::Cancelled);
        }

        let hybrid_images = downloader.download_all(&output.hybrids).await;
        let cancelled = hybrid_images.cancelled;
        output.report.hybrid_images = Some(hybrid_images);
        if cancelled {
            return Err(ScrapeError::Cancelled);
        }
        Ok(())
    }
}
