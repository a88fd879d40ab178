mod common;

use gatehouse::{AuthDecision, Error};
use gatehouse_core::error::AuthError;
use gatehouse_core::repositories::{UserRepository, UserRepositoryProvider};

#[tokio::test]
async fn test_full_reset_flow() {
    let (gatehouse, mailer, _) = common::setup().await;

    gatehouse
        .register("erin@example.com", "erin", "original-pass-1", None, None)
        .await
        .unwrap();

    gatehouse
        .request_password_reset("erin@example.com", None)
        .await
        .unwrap();
    let token = mailer.last_reset_token().expect("reset email sent");

    assert!(gatehouse.verify_reset_token(&token).await.unwrap());

    let (user, session) = gatehouse
        .confirm_password_reset(&token, "brand-new-pass-2", None, None)
        .await
        .unwrap();
    assert_eq!(user.email, "erin@example.com");

    // The emailed token proved account control: the reset logs the client in
    assert!(matches!(
        gatehouse.authorize(&session.token).await.unwrap(),
        AuthDecision::Authenticated(u) if u.id == user.id
    ));

    assert!(
        gatehouse
            .login("erin@example.com", "original-pass-1", false, None, None)
            .await
            .is_err()
    );
    gatehouse
        .login("erin@example.com", "brand-new-pass-2", false, None, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let (gatehouse, mailer, _) = common::setup().await;

    gatehouse
        .register("erin@example.com", "erin", "original-pass-1", None, None)
        .await
        .unwrap();
    gatehouse
        .request_password_reset("erin@example.com", None)
        .await
        .unwrap();
    let token = mailer.last_reset_token().unwrap();

    gatehouse
        .confirm_password_reset(&token, "brand-new-pass-2", None, None)
        .await
        .unwrap();

    // Consumed: the verify probe and a second confirm both fail
    assert!(!gatehouse.verify_reset_token(&token).await.unwrap());
    let err = gatehouse
        .confirm_password_reset(&token, "yet-another-pass-3", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_unknown_email_is_silent() {
    let (gatehouse, mailer, _) = common::setup().await;

    gatehouse
        .request_password_reset("ghost@example.com", None)
        .await
        .unwrap();

    assert!(mailer.reset_links.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reset_revokes_sessions_and_clears_lockout() {
    let (gatehouse, mailer, provider) =
        common::setup_with_config(common::generous_quota_config()).await;

    let (user, session) = gatehouse
        .register("erin@example.com", "erin", "original-pass-1", None, None)
        .await
        .unwrap();

    // Lock the account
    for _ in 0..5 {
        let _ = gatehouse
            .login("erin@example.com", "wrong-password", false, None, None)
            .await;
    }

    gatehouse
        .request_password_reset("erin@example.com", None)
        .await
        .unwrap();
    let token = mailer.last_reset_token().unwrap();
    gatehouse
        .confirm_password_reset(&token, "brand-new-pass-2", None, None)
        .await
        .unwrap();

    // Old session gone
    assert!(matches!(
        gatehouse.authorize(&session.token).await.unwrap(),
        AuthDecision::SessionRevoked
    ));

    // Lock cleared: login with the new password works immediately
    gatehouse
        .login("erin@example.com", "brand-new-pass-2", false, None, None)
        .await
        .unwrap();

    let row = provider.user().find_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(row.failed_login_attempts, 0);
    assert!(row.locked_until.is_none());
}

#[tokio::test]
async fn test_reset_request_is_rate_limited() {
    let (gatehouse, _, _) = common::setup().await;

    let ip = Some("203.0.113.9".to_string());
    for _ in 0..5 {
        gatehouse
            .request_password_reset("ghost@example.com", ip.clone())
            .await
            .unwrap();
    }

    assert!(matches!(
        gatehouse
            .request_password_reset("ghost@example.com", ip)
            .await
            .unwrap_err(),
        Error::RateLimited { .. }
    ));
}
