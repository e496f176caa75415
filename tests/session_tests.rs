mod common;

use common::{hybrid_row, listing_page, test_config, FakeSite, Next, LOGIN_PATH};
use orchid_catalog_scraper::error::ScrapeError;
use orchid_catalog_scraper::session::{is_logged_in, login, logout};

fn catalog() -> FakeSite {
    let rows = vec![hybrid_row("C. Bob Betts", Some("/grex/1/"), &["A", "B"], "1")];
    FakeSite::new().page("/hybrids/A/1", listing_page(&rows, Next::Absent, ""))
}

#[tokio::test]
async fn test_login_with_valid_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let site = catalog().with_login("grower", "s3cret");

    login(&site, &config).await.unwrap();

    assert!(is_logged_in(&site, &config.base_url, &config.timing).await.unwrap());
    assert_eq!(site.current_path(), "/hybrids/A/1");
    assert!(site.navigations.borrow().iter().any(|p| p == LOGIN_PATH));
}

#[tokio::test]
async fn test_wrong_password_is_an_authentication_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let site = catalog().with_login("grower", "not-the-password");

    let err = login(&site, &config).await.unwrap_err();

    assert!(matches!(err, ScrapeError::Authentication(_)));
    assert!(err.is_fatal());
    assert_eq!(site.current_path(), LOGIN_PATH);
}

#[tokio::test]
async fn test_existing_session_skips_the_form() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let site = catalog();

    login(&site, &config).await.unwrap();

    assert_eq!(*site.navigations.borrow(), vec!["/hybrids/A/1"]);
    assert_eq!(site.clicked("Sign in"), 0);
}

#[tokio::test]
async fn test_missing_login_form() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    // The listing itself sits under a login-looking URL and the login page has no form
    config.base_url = format!("{}/login/elsewhere", common::ORIGIN);
    let site = FakeSite::new()
        .page("/login/elsewhere", "<html></html>".to_string())
        .page(LOGIN_PATH, "<html><body>Maintenance</body></html>".to_string());

    let err = login(&site, &config).await.unwrap_err();

    assert!(matches!(err, ScrapeError::Authentication(ref msg) if msg.contains("login form")));
}

#[tokio::test]
async fn test_logout_is_best_effort() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let site = catalog();

    // No logout page is served; the failure is only logged
    logout(&site, &config);

    assert_eq!(*site.navigations.borrow(), vec!["/logout/"]);
}
