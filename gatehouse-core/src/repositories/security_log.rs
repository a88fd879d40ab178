use crate::{Error, audit::SecurityEvent};
use async_trait::async_trait;

/// Repository for the append-only security audit trail
///
/// There is deliberately no update or delete operation.
#[async_trait]
pub trait SecurityLogRepository: Send + Sync + 'static {
    /// Append a single event
    async fn append(&self, event: SecurityEvent) -> Result<(), Error>;
}
