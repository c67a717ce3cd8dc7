//! Rendered page tests.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use kc_duo_mfa::Page;
use kc_duo_integration_tests::{valid_config, TestEnv, API_HOST};

/// The challenge page carries everything the Duo script needs.
#[tokio::test]
async fn test_challenge_page_renders() -> anyhow::Result<()> {
    let env = TestEnv::new().await;

    let result = env.authenticate("alice", valid_config()).await?;
    let page = result.page().expect("challenge page").clone();
    let html = page.render()?;

    assert!(html.contains(&format!("data-host=\"{API_HOST}\"")));
    assert!(html.contains("Duo-Web-v2.js"));
    assert!(html.contains("/realms/test/login-actions/authenticate"));
    assert!(html.contains("name=\"cancel\""));

    let response = page.into_response();
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

/// Configuration errors render a generic 500 page without key material.
#[tokio::test]
async fn test_config_error_page() -> anyhow::Result<()> {
    let env = TestEnv::new().await;
    let secret = "s3cr3t-application-key";

    let result = env
        .authenticate("alice", valid_config().with_value("duo.akey", secret))
        .await?;
    let page: Page = result.page().expect("error page").clone();

    assert_eq!(page.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = page.render()?;
    assert!(html.contains("Duo MFA configuration error."));
    assert!(!html.contains(secret));

    let response = page.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    Ok(())
}
