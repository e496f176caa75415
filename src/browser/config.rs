use std::time::Duration;

/// Configuration for the Chrome session that renders the catalog
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,

    /// Browser window size
    pub window_size: (u32, u32),

    /// Custom user agent
    pub user_agent: Option<String>,

    /// Timeout for a single DevTools call, in seconds
    pub timeout_seconds: u64,

    /// How long the DevTools connection may stay silent before Chrome is considered gone.
    /// Must outlast the longest wait between two browser calls.
    pub idle_timeout_seconds: u64,

    /// Additional Chrome flags
    pub chrome_flags: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            timeout_seconds: 30,
            idle_timeout_seconds: 600,
            chrome_flags: vec![
                "--disable-blink-features=AutomationControlled".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
        }
    }
}

impl BrowserConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    /// Chrome flags including the user agent override, if any
    pub fn launch_flags(&self) -> Vec<String> {
        let mut flags = self.chrome_flags.clone();
        if let Some(ua) = &self.user_agent {
            flags.push(format!("--user-agent={}", ua));
        }
        flags
    }
}
