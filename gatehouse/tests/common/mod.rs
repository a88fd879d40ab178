// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse::{AuthConfig, Error, Gatehouse, SqliteRepositoryProvider};
use gatehouse_core::services::AuthMailer;

pub const TEST_SECRET: &str = "this_is_a_test_secret_key_for_hs256_tokens_not_for_prod";

/// Mailer that records every outbound message so tests can pull raw tokens
/// out of the links instead of scraping a real inbox.
#[derive(Default)]
pub struct CapturingMailer {
    pub reset_links: Mutex<Vec<(String, String)>>,
    pub verification_links: Mutex<Vec<(String, String)>>,
    pub password_changed: Mutex<Vec<String>>,
    pub lockout_alerts: Mutex<Vec<String>>,
}

#[async_trait]
impl AuthMailer for CapturingMailer {
    async fn send_password_reset_email(&self, to: &str, reset_link: &str) -> Result<(), Error> {
        self.reset_links
            .lock()
            .unwrap()
            .push((to.to_string(), reset_link.to_string()));
        Ok(())
    }

    async fn send_verification_email(&self, to: &str, verify_link: &str) -> Result<(), Error> {
        self.verification_links
            .lock()
            .unwrap()
            .push((to.to_string(), verify_link.to_string()));
        Ok(())
    }

    async fn send_password_changed_email(&self, to: &str) -> Result<(), Error> {
        self.password_changed.lock().unwrap().push(to.to_string());
        Ok(())
    }

    async fn send_lockout_email(&self, to: &str, _until: DateTime<Utc>) -> Result<(), Error> {
        self.lockout_alerts.lock().unwrap().push(to.to_string());
        Ok(())
    }
}

impl CapturingMailer {
    pub fn last_reset_token(&self) -> Option<String> {
        self.reset_links
            .lock()
            .unwrap()
            .last()
            .map(|(_, link)| token_from_link(link))
    }

    pub fn last_verification_token(&self) -> Option<String> {
        self.verification_links
            .lock()
            .unwrap()
            .last()
            .map(|(_, link)| token_from_link(link))
    }
}

pub fn token_from_link(link: &str) -> String {
    link.split("token=")
        .nth(1)
        .expect("link should carry a token parameter")
        .to_string()
}

/// Config with the rate limiter effectively disabled, for tests that
/// exercise per-account behavior with more attempts than the default
/// network quota allows.
pub fn generous_quota_config() -> AuthConfig {
    AuthConfig::new(TEST_SECRET)
        .unwrap()
        .with_login_quota(gatehouse::RateQuota::new(10_000, std::time::Duration::from_secs(900)))
}

pub async fn setup() -> (
    Gatehouse<SqliteRepositoryProvider>,
    Arc<CapturingMailer>,
    Arc<SqliteRepositoryProvider>,
) {
    setup_with_config(AuthConfig::new(TEST_SECRET).unwrap()).await
}

pub async fn setup_with_config(
    config: AuthConfig,
) -> (
    Gatehouse<SqliteRepositoryProvider>,
    Arc<CapturingMailer>,
    Arc<SqliteRepositoryProvider>,
) {
    let provider = Arc::new(
        SqliteRepositoryProvider::connect("sqlite::memory:")
            .await
            .unwrap(),
    );
    let mailer = Arc::new(CapturingMailer::default());

    let gatehouse = Gatehouse::new(provider.clone(), config)
        .unwrap()
        .with_mailer(mailer.clone());
    gatehouse.migrate().await.unwrap();

    (gatehouse, mailer, provider)
}
