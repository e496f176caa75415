// Library interface for orchid_catalog_scraper
// The binary wires these together; tests drive them against in-memory renderers

pub mod browser;
pub mod cancel;
pub mod config;
pub mod error;
pub mod extract;
pub mod http_client;
pub mod images;
pub mod logging;
pub mod models;
pub mod navigator;
pub mod pagination;
pub mod pipeline;
pub mod renderer;
pub mod report;
pub mod retry;
pub mod session;
pub mod species;
pub mod storage;
pub mod wait;
