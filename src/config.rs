use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const USERNAME_ENV: &str = "ORCHID_SCRAPER_USERNAME";
pub const PASSWORD_ENV: &str = "ORCHID_SCRAPER_PASSWORD";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Hybrid listing the run starts from; its initial state is the first index letter
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_logout_url")]
    pub logout_url: String,
    /// Origin that relative record links are resolved against
    #[serde(default = "default_site_origin")]
    pub site_origin: String,
    #[serde(default = "default_image_dir")]
    pub image_dir: String,
    /// Prefix of the `_hybrids.csv`, `_species.csv` and `_report.json` outputs
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub http: HttpSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserSettings {
    #[serde(default = "default_false")]
    pub headless: bool,

    /// Timeout for a single browser call in seconds
    #[serde(default = "default_browser_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

/// Upper bounds for the condition waits between an action and the next read
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TimingConfig {
    /// After navigation, letter clicks and login submission
    #[serde(default = "default_page_load_wait")]
    pub page_load_wait_ms: u64,

    /// After clicking "Next"
    #[serde(default = "default_next_page_wait")]
    pub next_page_wait_ms: u64,

    /// After opening the lightbox, until the full-size image is present
    #[serde(default = "default_image_download_wait")]
    pub image_download_wait_ms: u64,

    /// After closing the lightbox; also the scroll settle pause
    #[serde(default = "default_lightbox_close_wait")]
    pub lightbox_close_wait_ms: u64,

    /// Base delay before retrying a letter
    #[serde(default = "default_retry_wait")]
    pub retry_wait_ms: u64,

    /// Attempts per index letter before it is reported as failed
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_http_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_initial_retry_delay")]
    pub initial_retry_delay_ms: u64,

    #[serde(default = "default_max_retry_delay")]
    pub max_retry_delay_ms: u64,

    #[serde(default = "default_true")]
    pub enable_compression: bool,
}

fn default_true() -> bool { true }
fn default_false() -> bool { false }
fn default_username() -> String { "username".to_string() }
fn default_password() -> String { "password".to_string() }
fn default_login_url() -> String { "https://www.orchidroots.com/login/?next=/".to_string() }
fn default_base_url() -> String {
    "https://www.orchidroots.com/orchidaceae/hybrid/?app=orchidaceae&role=pri&family=Orchidaceae&genus=Cattleya".to_string()
}
fn default_logout_url() -> String { "https://orchidroots.com/logout/?next=/".to_string() }
fn default_site_origin() -> String { "https://www.orchidroots.com".to_string() }
fn default_image_dir() -> String { "orchid_images".to_string() }
fn default_output_prefix() -> String { "orchidroots_cattleya".to_string() }
fn default_browser_timeout() -> u64 { 30 }
fn default_window_width() -> u32 { 1920 }
fn default_window_height() -> u32 { 1080 }
fn default_page_load_wait() -> u64 { 5000 }
fn default_next_page_wait() -> u64 { 5000 }
fn default_image_download_wait() -> u64 { 3000 }
fn default_lightbox_close_wait() -> u64 { 2000 }
fn default_retry_wait() -> u64 { 2000 }
fn default_max_retries() -> u32 { 5 }
fn default_http_timeout() -> u64 { 30 }
fn default_http_max_retries() -> usize { 3 }
fn default_initial_retry_delay() -> u64 { 500 }
fn default_max_retry_delay() -> u64 { 8000 }

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            timeout_secs: default_browser_timeout(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            page_load_wait_ms: default_page_load_wait(),
            next_page_wait_ms: default_next_page_wait(),
            image_download_wait_ms: default_image_download_wait(),
            lightbox_close_wait_ms: default_lightbox_close_wait(),
            retry_wait_ms: default_retry_wait(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            max_retries: default_http_max_retries(),
            initial_retry_delay_ms: default_initial_retry_delay(),
            max_retry_delay_ms: default_max_retry_delay(),
            enable_compression: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
            login_url: default_login_url(),
            base_url: default_base_url(),
            logout_url: default_logout_url(),
            site_origin: default_site_origin(),
            image_dir: default_image_dir(),
            output_prefix: default_output_prefix(),
            browser: BrowserSettings::default(),
            timing: TimingConfig::default(),
            http: HttpSettings::default(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to defaults
    pub fn load() -> Self {
        let mut cfg = Self::load_from(Path::new("config.toml"));
        cfg.apply_env_overrides(
            std::env::var(USERNAME_ENV).ok(),
            std::env::var(PASSWORD_ENV).ok(),
        );
        cfg
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No {} found, using default configuration", path.display());
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("Invalid {} ({}), using default configuration", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read {} ({}), using default configuration", path.display(), e);
                Self::default()
            }
        }
    }

    /// Credentials from the environment take precedence over the file
    pub fn apply_env_overrides(&mut self, username: Option<String>, password: Option<String>) {
        if let Some(username) = username.filter(|u| !u.is_empty()) {
            self.username = username;
        }
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            self.password = password;
        }
    }

    pub fn hybrids_csv_path(&self) -> String {
        format!("{}_hybrids.csv", self.output_prefix)
    }

    pub fn species_csv_path(&self) -> String {
        format!("{}_species.csv", self.output_prefix)
    }

    pub fn report_path(&self) -> String {
        format!("{}_report.json", self.output_prefix)
    }

    /// Create the browser configuration for this run
    pub fn browser_config(&self) -> crate::browser::BrowserConfig {
        crate::browser::BrowserConfig {
            headless: self.browser.headless,
            window_size: (self.browser.window_width, self.browser.window_height),
            timeout_seconds: self.browser.timeout_secs,
            ..crate::browser::BrowserConfig::default()
        }
    }
}

impl TimingConfig {
    pub fn page_load_wait(&self) -> Duration {
        Duration::from_millis(self.page_load_wait_ms)
    }

    pub fn next_page_wait(&self) -> Duration {
        Duration::from_millis(self.next_page_wait_ms)
    }

    pub fn image_download_wait(&self) -> Duration {
        Duration::from_millis(self.image_download_wait_ms)
    }

    pub fn lightbox_close_wait(&self) -> Duration {
        Duration::from_millis(self.lightbox_close_wait_ms)
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }
}

impl HttpSettings {
    /// Create the image HTTP client from this configuration
    pub fn create_image_client(&self) -> Result<crate::http_client::ImageClient, reqwest::Error> {
        use crate::http_client::{HttpClientConfig, ImageClient};

        let config = HttpClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            initial_retry_delay_ms: self.initial_retry_delay_ms,
            max_retry_delay_ms: self.max_retry_delay_ms,
            enable_gzip: self.enable_compression,
        };

        ImageClient::with_config(config)
    }
}
