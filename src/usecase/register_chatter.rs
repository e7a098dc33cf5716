//! UseCase: chatter registration.

use crate::domain::{ChatterId, OutboundSink, RegistryError, SharedRegistry};

/// Register a chatter under a unique identity.
pub struct RegisterChatterUseCase {
    registry: SharedRegistry,
}

impl RegisterChatterUseCase {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    /// Register a new chatter.
    ///
    /// An empty `identity` requests a server-generated one. A duplicate
    /// identity is rejected without any partial registration; the existing
    /// chatter is unaffected.
    pub async fn execute(
        &self,
        identity: &str,
        display_name: &str,
        sink: OutboundSink,
    ) -> Result<ChatterId, RegistryError> {
        let mut registry = self.registry.lock().await;
        registry.register_chatter(identity, display_name, sink)
    }
}
