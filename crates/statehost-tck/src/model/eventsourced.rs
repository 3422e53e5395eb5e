//! Event-sourced entity models.
//!
//! `EventSourcedTckModel` keeps its state as the concatenation of every
//! emitted value and replies with the state as the command leaves it. It
//! snapshots every five events. Forwards and effects target
//! `EventSourcedTwo.Call` on the scripted entity id.

use crate::model::Response;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statehost::command::{ClientAction, CommandEnvelope, ForwardTarget};
use statehost::error::HostError;
use statehost::event_sourced::{EventSourcedContext, EventSourcedEntity};
use statehost::types::{EntityId, ServiceName};

const EVENT_SOURCED_TWO: &str = "tck.model.eventsourced.EventSourcedTwo";

const SNAPSHOT_EVERY: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    #[serde(default)]
    pub actions: Vec<EventSourcedAction>,
}

impl Request {
    pub fn plain(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            actions: Vec::new(),
        }
    }
}

/// One scripted step of an event-sourced model request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventSourcedAction {
    Emit { value: String },
    Forward { id: String },
    Effect { id: String, synchronous: bool },
    Fail { message: String },
}

/// The folded state of the model: every emitted value, concatenated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Persisted {
    pub value: String,
}

/// One emitted value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emitted {
    pub value: String,
}

pub struct EventSourcedTckModelEntity;

#[async_trait]
impl EventSourcedEntity for EventSourcedTckModelEntity {
    type State = Persisted;
    type Event = Emitted;

    fn initial_state(&self, _entity_id: &EntityId) -> Persisted {
        Persisted::default()
    }

    fn apply_event(&self, state: &mut Persisted, event: &Emitted) {
        state.value.push_str(&event.value);
    }

    async fn handle_command(
        &self,
        _entity_id: &EntityId,
        state: &Persisted,
        command: CommandEnvelope,
        ctx: &mut EventSourcedContext<Emitted>,
    ) -> Result<ClientAction, HostError> {
        let request: Request = command.decode()?;
        let mut projected = state.value.clone();
        let mut terminal = None;
        for step in request.actions {
            match step {
                EventSourcedAction::Emit { value } => {
                    projected.push_str(&value);
                    ctx.emit(Emitted { value });
                }
                EventSourcedAction::Forward { id } => {
                    terminal = Some(ClientAction::Forward(ForwardTarget {
                        service: ServiceName::new(EVENT_SOURCED_TWO),
                        entity_id: Some(EntityId::new(id.clone())),
                        command: CommandEnvelope::new("Call", &Request::plain(id))?,
                    }));
                }
                EventSourcedAction::Effect { id, synchronous } => {
                    ctx.effect(
                        ServiceName::new(EVENT_SOURCED_TWO),
                        Some(EntityId::new(id.clone())),
                        "Call",
                        &Request::plain(id),
                        synchronous,
                    )?;
                }
                EventSourcedAction::Fail { message } => {
                    terminal = Some(ClientAction::Failure(message));
                }
            }
        }
        match terminal {
            Some(action) => Ok(action),
            None => ClientAction::reply(&Response::with_message(projected)),
        }
    }

    fn snapshot_every(&self) -> Option<u64> {
        Some(SNAPSHOT_EVERY)
    }
}

/// Target of the model's forwards and effects: `Call` replies empty.
pub struct EventSourcedTwoEntity;

#[async_trait]
impl EventSourcedEntity for EventSourcedTwoEntity {
    type State = Persisted;
    type Event = Emitted;

    fn initial_state(&self, _entity_id: &EntityId) -> Persisted {
        Persisted::default()
    }

    fn apply_event(&self, state: &mut Persisted, event: &Emitted) {
        state.value.push_str(&event.value);
    }

    async fn handle_command(
        &self,
        _entity_id: &EntityId,
        _state: &Persisted,
        _command: CommandEnvelope,
        _ctx: &mut EventSourcedContext<Emitted>,
    ) -> Result<ClientAction, HostError> {
        ClientAction::reply(&Response::default())
    }
}
