use crate::command::{ClientAction, CommandEnvelope, SideEffect};
use crate::error::HostError;
use crate::types::{EntityId, ServiceName};
use async_trait::async_trait;
use serde::Serialize;

/// Context handed to a stateless action while it handles one command.
///
/// Collects side effects; the terminal action is the handler's return value.
#[derive(Debug, Default)]
pub struct ActionContext {
    side_effects: Vec<SideEffect>,
}

impl ActionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a side effect onto another registered service.
    pub fn effect<T: Serialize>(
        &mut self,
        service: ServiceName,
        entity_id: Option<EntityId>,
        command: impl Into<String>,
        request: &T,
        synchronous: bool,
    ) -> Result<(), HostError> {
        self.side_effects.push(SideEffect {
            service,
            entity_id,
            command: CommandEnvelope::new(command, request)?,
            synchronous,
        });
        Ok(())
    }

    pub fn side_effects(&self) -> &[SideEffect] {
        &self.side_effects
    }

    pub(crate) fn take_side_effects(&mut self) -> Vec<SideEffect> {
        std::mem::take(&mut self.side_effects)
    }
}

/// A stateless action handler registered against a service.
///
/// Actions have no entity id and no persisted state; every command is
/// handled on its own.
#[async_trait]
pub trait Action: Send + Sync + 'static {
    async fn handle_command(
        &self,
        command: CommandEnvelope,
        ctx: &mut ActionContext,
    ) -> Result<ClientAction, HostError>;
}
