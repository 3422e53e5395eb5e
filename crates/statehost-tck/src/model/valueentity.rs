//! Value-based entity models.
//!
//! `ValueEntityTckModel` interprets scripted state actions against its
//! persisted string value and replies with the value as the command leaves
//! it. Forwards and effects target `ValueEntityTwo.Call` on the scripted
//! entity id.

use crate::model::Response;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statehost::command::{ClientAction, CommandEnvelope, ForwardTarget};
use statehost::error::HostError;
use statehost::types::{EntityId, ServiceName};
use statehost::value_entity::{ValueCommandContext, ValueEntity};

const VALUE_ENTITY_TWO: &str = "tck.model.valueentity.ValueEntityTwo";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    #[serde(default)]
    pub actions: Vec<ValueAction>,
}

impl Request {
    pub fn plain(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            actions: Vec::new(),
        }
    }
}

/// One scripted step of a value entity model request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValueAction {
    Update { value: String },
    Delete,
    Forward { id: String },
    Effect { id: String, synchronous: bool },
    Fail { message: String },
}

/// The persisted state of the model: a single string value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Persisted {
    pub value: String,
}

pub struct ValueEntityTckModelEntity;

#[async_trait]
impl ValueEntity for ValueEntityTckModelEntity {
    type State = Persisted;

    async fn handle_command(
        &self,
        _entity_id: &EntityId,
        state: Option<Persisted>,
        command: CommandEnvelope,
        ctx: &mut ValueCommandContext<Persisted>,
    ) -> Result<ClientAction, HostError> {
        let request: Request = command.decode()?;
        let mut value = state.unwrap_or_default().value;
        let mut terminal = None;
        for step in request.actions {
            match step {
                ValueAction::Update { value: next } => {
                    value = next.clone();
                    ctx.update_state(Persisted { value: next });
                }
                ValueAction::Delete => {
                    value.clear();
                    ctx.delete_state();
                }
                ValueAction::Forward { id } => {
                    terminal = Some(ClientAction::Forward(ForwardTarget {
                        service: ServiceName::new(VALUE_ENTITY_TWO),
                        entity_id: Some(EntityId::new(id.clone())),
                        command: CommandEnvelope::new("Call", &Request::plain(id))?,
                    }));
                }
                ValueAction::Effect { id, synchronous } => {
                    ctx.effect(
                        ServiceName::new(VALUE_ENTITY_TWO),
                        Some(EntityId::new(id.clone())),
                        "Call",
                        &Request::plain(id),
                        synchronous,
                    )?;
                }
                ValueAction::Fail { message } => {
                    terminal = Some(ClientAction::Failure(message));
                }
            }
        }
        match terminal {
            Some(action) => Ok(action),
            None => ClientAction::reply(&Response::with_message(value)),
        }
    }
}

/// Target of the model's forwards and effects: `Call` replies empty.
pub struct ValueEntityTwoEntity;

#[async_trait]
impl ValueEntity for ValueEntityTwoEntity {
    type State = Persisted;

    async fn handle_command(
        &self,
        _entity_id: &EntityId,
        _state: Option<Persisted>,
        _command: CommandEnvelope,
        _ctx: &mut ValueCommandContext<Persisted>,
    ) -> Result<ClientAction, HostError> {
        ClientAction::reply(&Response::default())
    }
}
