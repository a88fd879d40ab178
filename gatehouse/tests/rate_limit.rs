mod common;

use std::time::Duration;

use gatehouse::{AuthConfig, Error, RateQuota};

fn quota_config(limit: u32, window: Duration) -> AuthConfig {
    AuthConfig::new(common::TEST_SECRET)
        .unwrap()
        .with_login_quota(RateQuota::new(limit, window))
}

#[tokio::test]
async fn test_sixth_login_attempt_in_window_is_rejected() {
    let (gatehouse, _, _) =
        common::setup_with_config(quota_config(5, Duration::from_secs(900))).await;

    let ip = Some("203.0.113.9".to_string());

    for _ in 0..5 {
        // Unknown email: each attempt fails authentication but is allowed
        // through the limiter
        let err = gatehouse
            .login("nobody@example.com", "whatever-pw", false, None, ip.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    let err = gatehouse
        .login("nobody@example.com", "whatever-pw", false, None, ip)
        .await
        .unwrap_err();
    match err {
        Error::RateLimited { retry_after } => assert!(retry_after > Duration::ZERO),
        other => panic!("expected rate limit, got {other}"),
    }
}

#[tokio::test]
async fn test_window_resets_after_elapse() {
    let (gatehouse, _, _) =
        common::setup_with_config(quota_config(2, Duration::from_millis(200))).await;

    let ip = Some("203.0.113.9".to_string());

    for _ in 0..2 {
        let _ = gatehouse
            .login("nobody@example.com", "whatever-pw", false, None, ip.clone())
            .await;
    }
    assert!(matches!(
        gatehouse
            .login("nobody@example.com", "whatever-pw", false, None, ip.clone())
            .await
            .unwrap_err(),
        Error::RateLimited { .. }
    ));

    tokio::time::sleep(Duration::from_millis(250)).await;

    // Fresh window, back to authentication errors
    assert!(matches!(
        gatehouse
            .login("nobody@example.com", "whatever-pw", false, None, ip)
            .await
            .unwrap_err(),
        Error::Auth(_)
    ));
}

#[tokio::test]
async fn test_limits_are_per_client_address() {
    let (gatehouse, _, _) =
        common::setup_with_config(quota_config(2, Duration::from_secs(900))).await;

    for _ in 0..2 {
        let _ = gatehouse
            .login(
                "nobody@example.com",
                "whatever-pw",
                false,
                None,
                Some("203.0.113.9".to_string()),
            )
            .await;
    }
    assert!(matches!(
        gatehouse
            .login(
                "nobody@example.com",
                "whatever-pw",
                false,
                None,
                Some("203.0.113.9".to_string()),
            )
            .await
            .unwrap_err(),
        Error::RateLimited { .. }
    ));

    // A different address still has its full quota
    assert!(matches!(
        gatehouse
            .login(
                "nobody@example.com",
                "whatever-pw",
                false,
                None,
                Some("198.51.100.4".to_string()),
            )
            .await
            .unwrap_err(),
        Error::Auth(_)
    ));
}

#[tokio::test]
async fn test_limiter_runs_before_account_lookup() {
    let (gatehouse, _, provider) =
        common::setup_with_config(quota_config(1, Duration::from_secs(900))).await;

    gatehouse
        .register("dave@example.com", "dave", "a-strong-password", None, None)
        .await
        .unwrap();

    let ip = Some("203.0.113.9".to_string());
    let _ = gatehouse
        .login("dave@example.com", "wrong-password", false, None, ip.clone())
        .await;

    // Rate limited: no lockout counter movement, so the limiter fired
    // before any per-account work
    assert!(matches!(
        gatehouse
            .login("dave@example.com", "wrong-password", false, None, ip)
            .await
            .unwrap_err(),
        Error::RateLimited { .. }
    ));

    use gatehouse_core::repositories::{UserRepository, UserRepositoryProvider};
    let row = provider
        .user()
        .find_by_email("dave@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.failed_login_attempts, 1);
}
