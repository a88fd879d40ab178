//! Service layer for business logic
//!
//! This module contains concrete service implementations that encapsulate
//! authentication, lockout, and user management logic.

pub mod lockout;
pub mod mailer;
pub mod password;
pub mod reset;
pub mod session;
pub mod user;
pub mod verification;

pub use lockout::{LockoutGate, LockoutService};
pub use mailer::{AuthMailer, NoopMailer};
pub use password::PasswordService;
pub use reset::PasswordResetService;
pub use session::SessionService;
pub use user::UserService;
pub use verification::EmailVerificationService;
