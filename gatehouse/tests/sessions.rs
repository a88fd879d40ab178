mod common;

use gatehouse::{AuthDecision, Error};
use gatehouse_core::error::AuthError;
use gatehouse_core::repositories::{UserRepository, UserRepositoryProvider};

#[tokio::test]
async fn test_exactly_one_session_row_after_repeated_logins() {
    let (gatehouse, _, provider) =
        common::setup_with_config(common::generous_quota_config()).await;

    let (user, _) = gatehouse
        .register("carol@example.com", "carol", "a-strong-password", None, None)
        .await
        .unwrap();

    let mut last_session = None;
    for _ in 0..4 {
        let (_, session) = gatehouse
            .login("carol@example.com", "a-strong-password", false, None, None)
            .await
            .unwrap();
        last_session = Some(session);
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = ?1")
        .bind(user.id.as_str())
        .fetch_one(provider.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);

    // Only the most recent token maps to the surviving row
    let session = last_session.unwrap();
    assert!(matches!(
        gatehouse.authorize(&session.token).await.unwrap(),
        AuthDecision::Authenticated(_)
    ));
}

#[tokio::test]
async fn test_new_login_revokes_the_previous_token() {
    let (gatehouse, _, _) = common::setup().await;

    gatehouse
        .register("carol@example.com", "carol", "a-strong-password", None, None)
        .await
        .unwrap();

    let (_, first) = gatehouse
        .login("carol@example.com", "a-strong-password", false, None, None)
        .await
        .unwrap();
    let (_, second) = gatehouse
        .login("carol@example.com", "a-strong-password", false, None, None)
        .await
        .unwrap();

    assert!(matches!(
        gatehouse.authorize(&first.token).await.unwrap(),
        AuthDecision::SessionRevoked
    ));
    assert!(matches!(
        gatehouse.authorize(&second.token).await.unwrap(),
        AuthDecision::Authenticated(_)
    ));
}

#[tokio::test]
async fn test_revocation_beats_embedded_token_expiry() {
    let (gatehouse, _, _) = common::setup().await;

    let (_, session) = gatehouse
        .register("carol@example.com", "carol", "a-strong-password", None, None)
        .await
        .unwrap();

    assert!(matches!(
        gatehouse.authorize(&session.token).await.unwrap(),
        AuthDecision::Authenticated(_)
    ));

    gatehouse.logout(&session.token, None, None).await.unwrap();

    // The JWT itself is still days from expiry; the missing ledger row is
    // what revokes it
    assert!(matches!(
        gatehouse.authorize(&session.token).await.unwrap(),
        AuthDecision::SessionRevoked
    ));
}

#[tokio::test]
async fn test_deactivated_user_rejected_despite_valid_token() {
    let (gatehouse, _, provider) = common::setup().await;

    let (user, session) = gatehouse
        .register("carol@example.com", "carol", "a-strong-password", None, None)
        .await
        .unwrap();

    provider.user().set_active(&user.id, false).await.unwrap();

    assert!(matches!(
        gatehouse.authorize(&session.token).await.unwrap(),
        AuthDecision::AccountDeactivated
    ));

    let err = gatehouse
        .login("carol@example.com", "a-strong-password", false, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth(AuthError::AccountDeactivated)));
}

#[tokio::test]
async fn test_password_change_kills_the_old_token() {
    let (gatehouse, mailer, _) = common::setup().await;

    let (user, _) = gatehouse
        .register("carol@example.com", "carol", "old-password-1", None, None)
        .await
        .unwrap();

    let (_, old_session) = gatehouse
        .login("carol@example.com", "old-password-1", false, None, None)
        .await
        .unwrap();

    let new_session = gatehouse
        .change_password(&user.id, "old-password-1", "new-password-2", None, None)
        .await
        .unwrap();

    assert!(matches!(
        gatehouse.authorize(&old_session.token).await.unwrap(),
        AuthDecision::SessionRevoked
    ));
    assert!(matches!(
        gatehouse.authorize(&new_session.token).await.unwrap(),
        AuthDecision::Authenticated(_)
    ));

    // Old password dead, new one live
    assert!(
        gatehouse
            .login("carol@example.com", "old-password-1", false, None, None)
            .await
            .is_err()
    );
    gatehouse
        .login("carol@example.com", "new-password-2", false, None, None)
        .await
        .unwrap();

    assert_eq!(
        mailer.password_changed.lock().unwrap().as_slice(),
        ["carol@example.com"]
    );
}

#[tokio::test]
async fn test_garbage_token_is_unauthenticated() {
    let (gatehouse, _, _) = common::setup().await;

    let decision = gatehouse
        .authorize(&gatehouse::SessionToken::new("not-a-jwt"))
        .await
        .unwrap();
    assert!(matches!(decision, AuthDecision::Unauthenticated));
}
