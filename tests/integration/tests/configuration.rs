//! Configuration validation tests.

use kc_duo_mfa::{AuthFlowError, ConfigError, ConfigValidator, ProviderCredentials};
use kc_duo_integration_tests::{valid_config, TestEnv, AKEY, API_HOST, IKEY, SKEY};

/// Every broken setting fails closed and nothing is signed.
#[tokio::test]
async fn test_invalid_settings_fail_closed() -> anyhow::Result<()> {
    let cases = [
        ("duo.ikey", "   "),
        ("duo.skey", ""),
        ("duo.akey", "tooshort"),
        ("duo.apihost", "https://api-12345678.duosecurity.com"),
        ("duo.apihost", "api.duosecurity.com/path"),
        ("duo.apihost", "api_host.duosecurity.com"),
        ("duo.apihost", ""),
    ];

    for (key, value) in cases {
        let env = TestEnv::new().await;
        let result = env.authenticate("alice", valid_config().with_value(key, value)).await?;

        assert_eq!(
            result.flow_error(),
            Some(AuthFlowError::InternalError),
            "{key}={value:?} should be rejected"
        );
        assert!(env.duo.signed().is_empty(), "{key}={value:?} must not sign");
        assert_eq!(env.events.events()[0].error.as_deref(), Some("duo_config_invalid"));
    }

    Ok(())
}

/// The action phase re-validates configuration.
#[tokio::test]
async fn test_action_revalidates_settings() -> anyhow::Result<()> {
    let env = TestEnv::new().await;
    env.duo.verifies_as(Some("alice"));

    let config = valid_config().with_value("duo.ikey", "");
    let result = env
        .submit("alice", config, &[("sig_response", "AUTH|alice:APP|alice")])
        .await?;

    assert_eq!(result.flow_error(), Some(AuthFlowError::InternalError));
    assert!(env.duo.verified().is_empty());

    Ok(())
}

/// Surrounding whitespace is ignored for every setting.
#[test]
fn test_padded_settings_are_trimmed() {
    let credentials = ProviderCredentials::new(
        &format!("  {IKEY}\n"),
        &format!("\t{SKEY} "),
        &format!(" {AKEY} "),
        &format!("{API_HOST}   "),
    );

    assert!(ConfigValidator::validate(&credentials).is_ok());
    assert_eq!(credentials.api_host(), API_HOST);
    assert_eq!(credentials.integration_key(), IKEY);
}

/// Rules are checked in order and report the first failure.
#[test]
fn test_first_failing_rule_is_reported() {
    let credentials = ProviderCredentials::new("", "", "short", "bad host");
    assert_eq!(
        ConfigValidator::validate(&credentials),
        Err(ConfigError::MissingIntegrationKey)
    );

    let credentials = ProviderCredentials::new(IKEY, SKEY, "short", "bad host");
    assert_eq!(
        ConfigValidator::validate(&credentials),
        Err(ConfigError::ApplicationKeyTooShort { min: 40 })
    );
}

/// Secrets never show up in errors or debug output.
#[test]
fn test_secrets_are_not_exposed() {
    let credentials = ProviderCredentials::from_config(Some(&valid_config()));
    let debug = format!("{credentials:?}");
    assert!(!debug.contains(SKEY));
    assert!(!debug.contains(AKEY));

    let config_debug = format!("{:?}", valid_config());
    assert!(!config_debug.contains(SKEY));

    let err = ConfigValidator::validate(&ProviderCredentials::new(IKEY, SKEY, &AKEY[..39], API_HOST))
        .expect_err("39 characters is too short");
    assert!(!err.to_string().contains(&AKEY[..39]));
}
