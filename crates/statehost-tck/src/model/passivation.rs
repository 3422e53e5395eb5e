//! Passivation model.
//!
//! A value entity that counts how often each entity id is activated over
//! the host's lifetime. It is registered with a 2-second passivation
//! timeout, so an idle sweep drops the instance while the persisted count
//! survives; the conformance suite activates, waits out the timeout, and
//! activates again to observe a count of two.

use crate::model::Response;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statehost::command::{ClientAction, CommandEnvelope};
use statehost::error::HostError;
use statehost::types::EntityId;
use statehost::value_entity::{ValueCommandContext, ValueEntity};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivationCount {
    pub count: u64,
}

pub struct PassivationTckModelEntity;

#[async_trait]
impl ValueEntity for PassivationTckModelEntity {
    type State = ActivationCount;

    async fn handle_command(
        &self,
        _entity_id: &EntityId,
        state: Option<ActivationCount>,
        _command: CommandEnvelope,
        ctx: &mut ValueCommandContext<ActivationCount>,
    ) -> Result<ClientAction, HostError> {
        let count = state.unwrap_or_default().count + 1;
        ctx.update_state(ActivationCount { count });
        ClientAction::reply(&Response::with_message(count.to_string()))
    }
}
