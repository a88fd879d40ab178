use crate::{Error, User, UserId, repositories::UserRepository};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Whether a login attempt may proceed to a password check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutGate {
    Open,
    Locked { until: DateTime<Utc> },
}

/// Service enforcing the account lockout policy
///
/// A consecutive-failure counter and a lock timestamp live on the user
/// row. The gate runs before any password hash comparison, so a locked
/// account costs no hashing work and a correct password during a lock
/// changes nothing. Expired locks are cleared lazily on the next attempt;
/// no background job is involved.
pub struct LockoutService<U: UserRepository> {
    repository: Arc<U>,
    max_failed_attempts: u32,
    lockout_duration: Duration,
}

impl<U: UserRepository> LockoutService<U> {
    pub fn new(repository: Arc<U>, max_failed_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            repository,
            max_failed_attempts,
            lockout_duration,
        }
    }

    /// Gate a login attempt for a loaded user row.
    ///
    /// Clears an expired lock (and the failure counter) before answering,
    /// so an attempt after the lock window starts from a clean slate.
    pub async fn gate(&self, user: &User) -> Result<LockoutGate, Error> {
        match user.locked_until {
            Some(until) if until > Utc::now() => Ok(LockoutGate::Locked { until }),
            Some(_) => {
                self.repository.reset_lockout(&user.id).await?;
                Ok(LockoutGate::Open)
            }
            None => Ok(LockoutGate::Open),
        }
    }

    /// Record a failed password check.
    ///
    /// Returns the lock expiry if this failure crossed the threshold.
    pub async fn record_failure(&self, user_id: &UserId) -> Result<Option<DateTime<Utc>>, Error> {
        let failures = self.repository.record_login_failure(user_id).await?;

        if failures >= self.max_failed_attempts {
            let until = Utc::now() + self.lockout_duration;
            self.repository.lock_until(user_id, until).await?;
            return Ok(Some(until));
        }

        Ok(None)
    }

    /// Record a successful login: counter reset, lock cleared, login stamped.
    pub async fn record_success(&self, user_id: &UserId) -> Result<(), Error> {
        self.repository.record_login_success(user_id).await
    }
}
