use crate::retry::Backoff;
use rand::Rng;
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use std::time::Duration;

/// User agents to rotate through between attempts
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

/// A fetched image: the final status and, for any status, the body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl FetchedImage {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Retrieves full-size images over plain HTTP(S), outside the browser session
#[allow(async_fn_in_trait)]
pub trait ImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

#[derive(Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub max_retries: usize,
    pub initial_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    pub enable_gzip: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_retry_delay_ms: 500,
            max_retry_delay_ms: 8000,
            enable_gzip: true,
        }
    }
}

/// HTTP client for image downloads with bounded retry and exponential backoff
pub struct ImageClient {
    client: Client,
    config: HttpClientConfig,
    backoff: Backoff,
}

impl ImageClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(
                "image/avif,image/webp,image/apng,image/*,*/*;q=0.8",
            ),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
        );

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(Self::random_user_agent())
            .gzip(config.enable_gzip)
            .brotli(config.enable_gzip)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .redirect(reqwest::redirect::Policy::limited(10))
            .default_headers(headers)
            .build()?;

        let backoff = Backoff::new(
            Duration::from_millis(config.initial_retry_delay_ms),
            Duration::from_millis(config.max_retry_delay_ms),
        );

        Ok(Self {
            client,
            config,
            backoff,
        })
    }

    /// Get a random user agent from the pool
    fn random_user_agent() -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())]
    }

    /// Check if a status code is worth another attempt
    fn is_retryable_status(status: StatusCode) -> bool {
        matches!(
            status.as_u16(),
            // Rate limiting
            429 |
            // Server errors
            500 | 502 | 503 | 504 |
            // Cloudflare errors
            520 | 521 | 522 | 523 | 524
        )
    }

    fn is_retryable_error(e: &reqwest::Error) -> bool {
        e.is_timeout() || e.is_connect() || e.is_request()
    }

    /// Fetch a URL, retrying transport failures and retryable statuses.
    /// Any other status, including 404, is returned as-is.
    pub async fn get_with_retry(&self, url: &str) -> Result<Response, reqwest::Error> {
        let mut attempt = 0;
        loop {
            let result = self
                .client
                .get(url)
                .header(reqwest::header::USER_AGENT, Self::random_user_agent())
                .send()
                .await;
            let exhausted = attempt >= self.config.max_retries;

            match result {
                Ok(response) if Self::is_retryable_status(response.status()) && !exhausted => {
                    log::warn!(
                        "Received retryable status {} for {}, attempt {}/{}",
                        response.status(),
                        url,
                        attempt + 1,
                        self.config.max_retries + 1
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) if Self::is_retryable_error(&e) && !exhausted => {
                    log::warn!(
                        "Request failed for {}, attempt {}/{}: {}",
                        url,
                        attempt + 1,
                        self.config.max_retries + 1,
                        e
                    );
                }
                Err(e) => return Err(e),
            }

            self.backoff.wait(attempt as u32).await;
            attempt += 1;
        }
    }
}

impl ImageFetcher for ImageClient {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let response = self.get_with_retry(url).await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?.to_vec();
        Ok(FetchedImage { status, bytes })
    }
}
