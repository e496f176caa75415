use crate::browser::BrowserError;
use crate::config::{Config, TimingConfig};
use crate::error::ScrapeError;
use crate::renderer::{Locator, Renderer};
use crate::extract::ROW_SELECTOR;
use crate::wait::{page_fingerprint, wait_for_change, wait_for_element, wait_until};

pub const USERNAME_INPUT: &str = "input[name='username']";
pub const PASSWORD_INPUT: &str = "input[name='password']";
pub const SUBMIT_BUTTON: &str = "button[type='submit']";

/// The site bounces unauthenticated visitors of the listing to its login page
pub async fn is_logged_in<Rn: Renderer + ?Sized>(
    renderer: &Rn,
    base_url: &str,
    timing: &TimingConfig,
) -> Result<bool, BrowserError> {
    renderer.navigate(base_url)?;
    // The bounce to the login form can happen client side after load, so wait for one of the
    // two outcomes to be visible
    let listing = Locator::css(ROW_SELECTOR);
    wait_until(renderer, timing.page_load_wait(), |r| {
        Ok(r.document_ready()? && (on_login_page(r)? || r.exists(&listing)?))
    })
    .await;
    Ok(!on_login_page(renderer)?)
}

fn on_login_page<Rn: Renderer + ?Sized>(renderer: &Rn) -> Result<bool, BrowserError> {
    Ok(renderer.current_url()?.to_lowercase().contains("login"))
}

/// Authenticate the session. Failure is fatal for the run.
pub async fn login<Rn: Renderer + ?Sized>(renderer: &Rn, config: &Config) -> Result<(), ScrapeError> {
    let timing = &config.timing;

    if is_logged_in(renderer, &config.base_url, timing).await? {
        log::info!("Already logged in. Proceeding...");
        return Ok(());
    }

    log::info!("Logging in...");
    renderer.navigate(&config.login_url)?;

    let username = Locator::css(USERNAME_INPUT);
    if !wait_for_element(renderer, &username, timing.page_load_wait()).await {
        return Err(ScrapeError::Authentication(format!(
            "login form not found at {}",
            config.login_url
        )));
    }
    renderer.type_text(&username, 0, &config.username)?;
    renderer.type_text(&Locator::css(PASSWORD_INPUT), 0, &config.password)?;

    let before = page_fingerprint(renderer);
    renderer.click(&Locator::css(SUBMIT_BUTTON), 0)?;
    wait_for_change(renderer, before, timing.page_load_wait()).await;

    if !is_logged_in(renderer, &config.base_url, timing).await? {
        log::error!("Login failed!");
        return Err(ScrapeError::Authentication(format!(
            "still redirected to login after submitting credentials for {}",
            config.username
        )));
    }

    log::info!("Login successful!");
    Ok(())
}

/// Best-effort logout during teardown
pub fn logout<Rn: Renderer + ?Sized>(renderer: &Rn, config: &Config) {
    match renderer.navigate(&config.logout_url) {
        Ok(()) => log::info!("Logged out"),
        Err(e) => log::warn!("Logout failed: {}", e),
    }
}
