use crate::command::{ClientAction, CommandEnvelope, SideEffect};
use crate::error::HostError;
use crate::types::{EntityId, ServiceName};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Pending change to a value entity's persisted state.
#[derive(Debug, Clone, PartialEq)]
pub enum StateOperation<S> {
    Update(S),
    Delete,
}

/// Context handed to a value entity while it handles one command.
///
/// The handler mutates state through `update_state`/`delete_state`; the last
/// operation recorded during a command wins. Nothing is persisted if the
/// handler returns an error.
#[derive(Debug)]
pub struct ValueCommandContext<S> {
    entity_id: EntityId,
    side_effects: Vec<SideEffect>,
    state_op: Option<StateOperation<S>>,
}

impl<S> ValueCommandContext<S> {
    pub fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            side_effects: Vec::new(),
            state_op: None,
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Replace the persisted state with the given value.
    pub fn update_state(&mut self, state: S) {
        self.state_op = Some(StateOperation::Update(state));
    }

    /// Remove the persisted state.
    pub fn delete_state(&mut self) {
        self.state_op = Some(StateOperation::Delete);
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

    pub fn state_operation(&self) -> Option<&StateOperation<S>> {
        self.state_op.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Vec<SideEffect>, Option<StateOperation<S>>) {
        (self.side_effects, self.state_op)
    }
}

/// A value-based entity: state is stored and replaced wholesale.
///
/// One implementation serves all entity ids of its service; per-instance
/// state is loaded before each command and persisted according to the
/// context's state operation afterwards.
#[async_trait]
pub trait ValueEntity: Send + Sync + 'static {
    type State: Serialize + DeserializeOwned + Send + Sync + 'static;

    async fn handle_command(
        &self,
        entity_id: &EntityId,
        state: Option<Self::State>,
        command: CommandEnvelope,
        ctx: &mut ValueCommandContext<Self::State>,
    ) -> Result<ClientAction, HostError>;
}
