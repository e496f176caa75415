//! Headless Chrome session for JavaScript-rendered catalog pages
//!
//! The catalog's listing tables, alphabet index and lightbox are all rendered client side, so
//! the scraper drives a real Chrome tab rather than fetching HTML directly.
//!
//! # Example
//!
//! ```no_run
//! use orchid_catalog_scraper::browser::{BrowserConfig, BrowserManager, BrowserScraper};
//! use orchid_catalog_scraper::renderer::{Locator, Renderer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = BrowserManager::new(BrowserConfig::default())?;
//! let scraper = BrowserScraper::new(manager.new_tab()?);
//!
//! scraper.navigate("https://example.com")?;
//! let rows = scraper.count(&Locator::css("table tbody tr"))?;
//! println!("{} rows rendered", rows);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod manager;
pub mod scraper;

pub use config::BrowserConfig;
pub use manager::{BrowserError, BrowserManager};
pub use scraper::BrowserScraper;
