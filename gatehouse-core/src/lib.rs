//! Core functionality for the gatehouse authentication stack.
//!
//! This crate contains the domain types, repository traits, and services
//! that the storage backends and HTTP integration build on. Application
//! code normally depends on the `gatehouse` facade crate instead of this
//! one.
//!
//! See [`User`] for the core user struct, [`Session`] for the session
//! ledger row, and [`TokenCodec`] for the signed bearer credential.

pub mod audit;
pub mod config;
pub mod crypto;
pub mod error;
pub mod id;
pub mod rate_limit;
pub mod repositories;
pub mod services;
pub mod session;
pub mod token;
pub mod user;
pub mod validation;

pub use audit::{SecurityEvent, SecurityEventKind};
pub use config::AuthConfig;
pub use error::Error;
pub use rate_limit::{RateLimitDecision, RateLimiter, RateQuota};
pub use repositories::RepositoryProvider;
pub use session::{Session, SessionToken};
pub use token::{TokenClaims, TokenCodec};
pub use user::{NewUser, User, UserId};
