//! Duo challenge/verification flow tests.

use kc_duo_mfa::{AuthError, AuthFlowError, DuoWebError, EventOutcome, EventType, Page};
use kc_duo_integration_tests::{valid_config, TestEnv, API_HOST};

/// A valid response for the expected user completes the step.
#[tokio::test]
async fn test_valid_response_succeeds() -> anyhow::Result<()> {
    let env = TestEnv::new().await;

    let challenge = env.authenticate("alice", valid_config()).await?;
    assert!(challenge.is_challenge());

    env.duo.verifies_as(Some("alice"));
    let result = env
        .submit("alice", valid_config(), &[("sig_response", "AUTH|alice:APP|alice")])
        .await?;

    assert!(result.is_success(), "Expected success, got {result:?}");
    assert!(result.page().is_none());
    assert_eq!(env.duo.verified(), vec!["AUTH|alice:APP|alice"]);

    let events = env.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::Login);
    assert_eq!(events[0].outcome, EventOutcome::Success);
    assert_eq!(events[0].username.as_deref(), Some("alice"));
    assert_eq!(events[0].realm_id, Some(env.realm_id));
    assert_eq!(events[0].session_id, Some(env.session_id));

    Ok(())
}

/// A failing verification primitive yields a recoverable failure.
#[tokio::test]
async fn test_verification_failure_reissues_challenge() -> anyhow::Result<()> {
    let env = TestEnv::new().await;
    env.duo.fails_verification(DuoWebError::SignatureMismatch);

    let result = env
        .submit("alice", valid_config(), &[("sig_response", "AUTH|forged:APP|forged")])
        .await?;

    assert_eq!(result.flow_error(), Some(AuthFlowError::InvalidCredentials));
    let form = result
        .page()
        .and_then(Page::challenge_form)
        .expect("failure challenge should carry a new form");
    assert_eq!(form.error.as_deref(), Some("Duo verification failed."));
    assert_eq!(form.api_host, API_HOST);

    // A fresh challenge is signed for the retry
    assert_eq!(env.duo.signed(), vec!["alice"]);

    let events = env.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::LoginError);
    assert_eq!(events[0].error.as_deref(), Some("duo_verification_failed"));

    Ok(())
}

/// Duo vouching for another user is a mismatch, not a success.
#[tokio::test]
async fn test_identity_mismatch_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await;
    env.duo.verifies_as(Some("bob"));

    let result = env
        .submit("alice", valid_config(), &[("sig_response", "AUTH|bob:APP|bob")])
        .await?;

    assert_eq!(result.flow_error(), Some(AuthFlowError::InvalidCredentials));
    let form = result.page().and_then(Page::challenge_form).expect("form");
    assert_eq!(form.error.as_deref(), Some("Duo authentication mismatch."));

    let events = env.events.events();
    assert_eq!(events[0].username.as_deref(), Some("alice"));
    assert_eq!(events[0].verified_username.as_deref(), Some("bob"));
    assert_eq!(events[0].error.as_deref(), Some("duo_identity_mismatch"));

    Ok(())
}

/// Username comparison is exact.
#[tokio::test]
async fn test_identity_comparison_is_exact() -> anyhow::Result<()> {
    let env = TestEnv::new().await;

    for verified in [Some("Alice"), Some("alice "), None] {
        env.duo.verifies_as(verified);
        let result = env
            .submit("alice", valid_config(), &[("sig_response", "AUTH|x:APP|x")])
            .await?;
        assert_eq!(
            result.flow_error(),
            Some(AuthFlowError::InvalidCredentials),
            "{verified:?} must not match alice"
        );
    }

    Ok(())
}

/// A short application key stops the step before anything is signed.
#[tokio::test]
async fn test_short_application_key_is_internal_error() -> anyhow::Result<()> {
    let env = TestEnv::new().await;
    let config = valid_config().with_value("duo.akey", "a".repeat(39));

    let result = env.authenticate("alice", config).await?;

    assert_eq!(result.flow_error(), Some(AuthFlowError::InternalError));
    let page = result.page().expect("error page");
    assert!(page.challenge_form().is_none());
    assert_eq!(page.error_message(), Some("Duo MFA configuration error."));
    assert!(env.duo.signed().is_empty(), "Signer must not be called");

    Ok(())
}

/// Cancelling restarts the flow without verifying anything.
#[tokio::test]
async fn test_cancel_resets_flow() -> anyhow::Result<()> {
    let env = TestEnv::new().await;
    env.duo.verifies_as(Some("alice"));

    let result = env
        .submit(
            "alice",
            valid_config(),
            &[("cancel", "Cancel"), ("sig_response", "AUTH|alice:APP|alice")],
        )
        .await?;

    assert!(result.is_flow_reset());
    assert!(env.duo.verified().is_empty(), "Verifier must not be called");

    let events = env.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::ResetFlow);

    Ok(())
}

/// A post without `sig_response` never reaches the verifier.
#[tokio::test]
async fn test_missing_response_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await;

    let result = env.submit("alice", valid_config(), &[]).await?;

    assert_eq!(result.flow_error(), Some(AuthFlowError::InvalidCredentials));
    let form = result.page().and_then(Page::challenge_form).expect("form");
    assert_eq!(form.error.as_deref(), Some("Missing sig_response from Duo."));
    assert!(env.duo.verified().is_empty());

    Ok(())
}

/// The signed request reaches the form verbatim.
#[tokio::test]
async fn test_signed_request_is_passed_verbatim() -> anyhow::Result<()> {
    let env = TestEnv::new().await;

    for username in ["alice", "bob@example.com", "名前"] {
        let result = env.authenticate(username, valid_config()).await?;
        let form = result.page().and_then(Page::challenge_form).expect("form");
        let count = env.duo.signed().len();
        assert_eq!(
            form.sig_request,
            format!("TX|DIXXXXXXXXXXXXXXXXXX|{username}|{count}:APP|{username}")
        );
        assert!(form.error.is_none());
    }

    Ok(())
}

/// A refused signing still renders the form, with a generic error.
#[tokio::test]
async fn test_signing_refusal_shows_error() -> anyhow::Result<()> {
    let env = TestEnv::new().await;
    env.duo.refuses_signing();

    let result = env.authenticate("alice", valid_config()).await?;

    assert!(result.is_challenge());
    let form = result.page().and_then(Page::challenge_form).expect("form");
    assert!(form.sig_request.starts_with("ERR|"));
    assert_eq!(form.error.as_deref(), Some("Duo signRequest failed."));

    Ok(())
}

/// Reaching the step without an identified user is a host error.
#[tokio::test]
async fn test_missing_user_is_invalid_state() -> anyhow::Result<()> {
    let env = TestEnv::new().await;
    let mut context = kc_duo_mfa::AuthContext::new(env.realm_id, env.session_id)
        .with_config(std::sync::Arc::new(valid_config()));

    let err = env
        .authenticator
        .authenticate(&mut context)
        .await
        .expect_err("no user");
    assert_eq!(err, AuthError::InvalidState);
    assert!(env.duo.signed().is_empty());

    Ok(())
}
