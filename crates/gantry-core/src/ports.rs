//! Port traits between the core domain and external adapters.

use crate::Result;
use crate::events::Event;
use async_trait::async_trait;

/// Sink for lifecycle events. Implementations decide where events go: an
/// in-memory broadcast for the local CLI, or nothing at all.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish an event.
    async fn publish(&self, event: Event) -> Result<()>;
}

/// Sink that discards everything.
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn publish(&self, _event: Event) -> Result<()> {
        Ok(())
    }
}
