use log::{error, info, warn};
use orchid_catalog_scraper::browser::{BrowserManager, BrowserScraper};
use orchid_catalog_scraper::cancel::CancelToken;
use orchid_catalog_scraper::config::Config;
use orchid_catalog_scraper::error::ScrapeError;
use orchid_catalog_scraper::pipeline::{Pipeline, RunOutput};
use orchid_catalog_scraper::{logging, session, storage};
use std::path::Path;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let cfg = Config::load();
    info!("Catalog scraper starting:");
    info!("  Listing: {}", cfg.base_url);
    info!("  Image directory: {}", cfg.image_dir);
    info!("  Headless: {}", cfg.browser.headless);
    info!("  Max letter retries: {}", cfg.timing.max_retries);

    let cancel = CancelToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing the current step and saving what was collected");
            signal_token.cancel();
        }
    });

    match run(&cfg, cancel).await {
        Ok(output) => {
            persist(&cfg, &output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Launch Chrome, run the pipeline and tear the session down whatever happened
async fn run(cfg: &Config, cancel: CancelToken) -> Result<RunOutput, ScrapeError> {
    let client = cfg
        .http
        .create_image_client()
        .map_err(|e| ScrapeError::Configuration(format!("HTTP client: {}", e)))?;

    let manager = BrowserManager::new(cfg.browser_config())?;
    let scraper = BrowserScraper::with_timeout(manager.new_tab()?, cfg.browser_config().timeout());

    let result = Pipeline::new(&scraper, &client, cfg, cancel).run().await;

    if !matches!(result, Err(ref e) if e.is_fatal()) {
        session::logout(&scraper, cfg);
    }
    drop(scraper);
    drop(manager);
    result
}

/// Write both CSVs and the report; each output is attempted even if another fails
fn persist(cfg: &Config, output: &RunOutput) {
    let hybrids_path = cfg.hybrids_csv_path();
    if let Err(e) = storage::write_records(Path::new(&hybrids_path), &output.hybrids) {
        error!("Could not write {}: {}", hybrids_path, e);
    }

    let species_path = cfg.species_csv_path();
    if let Err(e) = storage::write_records(Path::new(&species_path), &output.species) {
        error!("Could not write {}: {}", species_path, e);
    }

    let report_path = cfg.report_path();
    if let Err(e) = storage::write_report(Path::new(&report_path), &output.report) {
        error!("Could not write {}: {}", report_path, e);
    }

    info!("Hybrids: {} records, species: {} records", output.hybrids.len(), output.species.len());
}
