use crate::command::{ClientAction, CommandEnvelope, SideEffect};
use crate::error::HostError;
use crate::types::{EntityId, ServiceName};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Context handed to an event-sourced entity while it handles one command.
///
/// Events accumulate through `emit`; they are applied to the live state in
/// order only after the handler returns successfully. A failed command
/// persists nothing.
#[derive(Debug)]
pub struct EventSourcedContext<E> {
    entity_id: EntityId,
    events: Vec<E>,
    side_effects: Vec<SideEffect>,
}

impl<E> EventSourcedContext<E> {
    pub fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            events: Vec::new(),
            side_effects: Vec::new(),
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    /// Emit an event to be persisted and applied after the command succeeds.
    pub fn emit(&mut self, event: E) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[E] {
        &self.events
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

    pub(crate) fn into_parts(self) -> (Vec<E>, Vec<SideEffect>) {
        (self.events, self.side_effects)
    }
}

/// An event-sourced entity: state is derived by folding events.
///
/// On activation the host restores the latest snapshot (if any) and replays
/// the events recorded after it; `apply_event` must therefore be pure.
#[async_trait]
pub trait EventSourcedEntity: Send + Sync + 'static {
    type State: Serialize + DeserializeOwned + Send + Sync + 'static;
    type Event: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// State of a fresh instance, before any event has been applied.
    fn initial_state(&self, entity_id: &EntityId) -> Self::State;

    /// Fold one event into the state. Called during replay and after every
    /// successful command, in emission order.
    fn apply_event(&self, state: &mut Self::State, event: &Self::Event);

    async fn handle_command(
        &self,
        entity_id: &EntityId,
        state: &Self::State,
        command: CommandEnvelope,
        ctx: &mut EventSourcedContext<Self::Event>,
    ) -> Result<ClientAction, HostError>;

    /// Snapshot cadence override. `None` = use the host default.
    fn snapshot_every(&self) -> Option<u64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tally {
        total: i64,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Added {
        amount: i64,
    }

    struct TallyEntity;

    #[async_trait]
    impl EventSourcedEntity for TallyEntity {
        type State = Tally;
        type Event = Added;

        fn initial_state(&self, _entity_id: &EntityId) -> Tally {
            Tally { total: 0 }
        }

        fn apply_event(&self, state: &mut Tally, event: &Added) {
            state.total += event.amount;
        }

        async fn handle_command(
            &self,
            _entity_id: &EntityId,
            state: &Tally,
            command: CommandEnvelope,
            ctx: &mut EventSourcedContext<Added>,
        ) -> Result<ClientAction, HostError> {
            let amount: i64 = command.decode()?;
            ctx.emit(Added { amount });
            ClientAction::reply(&(state.total + amount))
        }

        fn snapshot_every(&self) -> Option<u64> {
            Some(5)
        }
    }

    #[tokio::test]
    async fn emitted_events_accumulate_in_context() {
        let entity = TallyEntity;
        let mut ctx = EventSourcedContext::new(EntityId::new("t-1"));
        let state = entity.initial_state(&EntityId::new("t-1"));
        let command = CommandEnvelope::new("Add", &7i64).unwrap();

        let action = entity
            .handle_command(&EntityId::new("t-1"), &state, command, &mut ctx)
            .await
            .unwrap();
        assert!(matches!(action, ClientAction::Reply(_)));
        assert_eq!(ctx.events().len(), 1);
    }

    #[test]
    fn replay_folds_events_in_order() {
        let entity = TallyEntity;
        let mut state = entity.initial_state(&EntityId::new("t-1"));
        for amount in [1, 2, 3] {
            entity.apply_event(&mut state, &Added { amount });
        }
        assert_eq!(state.total, 6);
    }

    #[test]
    fn snapshot_cadence_override() {
        assert_eq!(TallyEntity.snapshot_every(), Some(5));
    }
}
