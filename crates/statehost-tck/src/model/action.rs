//! Stateless action models.
//!
//! `ActionTckModel` interprets every scripted step: effects accumulate,
//! and the last reply, forward, or fail becomes the terminal action. With
//! no terminal step the reply is an empty `Response`. Forwards and effects
//! both target `ActionTwo.Call`.

use crate::model::Response;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statehost::action::{Action, ActionContext};
use statehost::command::{ClientAction, CommandEnvelope, ForwardTarget};
use statehost::error::HostError;
use statehost::types::ServiceName;

const ACTION_TWO: &str = "tck.model.ActionTwo";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    #[serde(default)]
    pub actions: Vec<ProcessAction>,
}

impl Request {
    /// A request that scripts no further steps, used as the body of
    /// forwards and effects.
    pub fn plain(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            actions: Vec::new(),
        }
    }
}

/// One scripted step of an action model request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProcessAction {
    ReplyWith { message: String },
    Forward { id: String },
    Effect { id: String, synchronous: bool },
    Fail { message: String },
}

pub struct ActionTckModelBehavior;

#[async_trait]
impl Action for ActionTckModelBehavior {
    async fn handle_command(
        &self,
        command: CommandEnvelope,
        ctx: &mut ActionContext,
    ) -> Result<ClientAction, HostError> {
        let request: Request = command.decode()?;
        let mut terminal = ClientAction::reply(&Response::default())?;
        for step in request.actions {
            match step {
                ProcessAction::ReplyWith { message } => {
                    terminal = ClientAction::reply(&Response { message })?;
                }
                ProcessAction::Forward { id } => {
                    terminal = ClientAction::Forward(ForwardTarget {
                        service: ServiceName::new(ACTION_TWO),
                        entity_id: None,
                        command: CommandEnvelope::new("Call", &Request::plain(id))?,
                    });
                }
                ProcessAction::Effect { id, synchronous } => {
                    ctx.effect(
                        ServiceName::new(ACTION_TWO),
                        None,
                        "Call",
                        &Request::plain(id),
                        synchronous,
                    )?;
                }
                ProcessAction::Fail { message } => {
                    terminal = ClientAction::Failure(message);
                }
            }
        }
        Ok(terminal)
    }
}

/// Target of the model's forwards and effects: `Call` replies empty.
pub struct ActionTwoBehavior;

#[async_trait]
impl Action for ActionTwoBehavior {
    async fn handle_command(
        &self,
        _command: CommandEnvelope,
        _ctx: &mut ActionContext,
    ) -> Result<ClientAction, HostError> {
        ClientAction::reply(&Response::default())
    }
}
