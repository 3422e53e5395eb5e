use crate::error::HostError;
use crate::types::{EntityId, ServiceName};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A named command with a MessagePack-encoded payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Command name within the target service (e.g., "AddItem").
    pub name: String,
    /// MessagePack-encoded request body.
    pub payload: Vec<u8>,
}

impl CommandEnvelope {
    /// Build an envelope by encoding the given request.
    pub fn new<T: Serialize>(name: impl Into<String>, request: &T) -> Result<Self, HostError> {
        let payload = rmp_serde::to_vec(request).map_err(|e| HostError::MalformedPayload {
            reason: format!("failed to encode command payload: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(Self {
            name: name.into(),
            payload,
        })
    }

    /// Decode the payload into the expected request type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, HostError> {
        rmp_serde::from_slice(&self.payload).map_err(|e| HostError::MalformedPayload {
            reason: format!("failed to decode payload of command {}: {e}", self.name),
            source: Some(Box::new(e)),
        })
    }
}

/// Terminal action of a handled command: exactly one of reply, forward, or
/// user-signalled failure.
#[derive(Debug, Clone)]
pub enum ClientAction {
    /// MessagePack-encoded reply body.
    Reply(Vec<u8>),
    /// Hand the command off to another registered service.
    Forward(ForwardTarget),
    /// A failure the entity chose to report. Distinct from `HostError`:
    /// the command was handled, the outcome is a failure message.
    Failure(String),
}

impl ClientAction {
    /// Build a reply action by encoding the given response.
    pub fn reply<T: Serialize>(response: &T) -> Result<Self, HostError> {
        let bytes = rmp_serde::to_vec(response).map_err(|e| HostError::MalformedPayload {
            reason: format!("failed to encode reply: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(Self::Reply(bytes))
    }
}

/// Target of a forward: another service's command, with a fresh payload.
///
/// `entity_id` selects the target instance when the target service is an
/// entity; it is ignored for stateless actions. When absent, the forwarding
/// entity's own id is reused.
#[derive(Debug, Clone)]
pub struct ForwardTarget {
    pub service: ServiceName,
    pub entity_id: Option<EntityId>,
    pub command: CommandEnvelope,
}

/// A side effect: a call onto another service that does not influence the
/// reply of the command that produced it.
#[derive(Debug, Clone)]
pub struct SideEffect {
    pub service: ServiceName,
    pub entity_id: Option<EntityId>,
    pub command: CommandEnvelope,
    /// Recorded ordering intent. In-process, effects are dispatched inline
    /// in recording order before the terminal action resolves, whichever
    /// value is set; the flag is carried for runtimes that defer
    /// asynchronous effects until after the reply.
    pub synchronous: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Ping {
        message: String,
    }

    #[test]
    fn envelope_encode_decode_round_trip() {
        let ping = Ping {
            message: "hello".into(),
        };
        let envelope = CommandEnvelope::new("Ping", &ping).unwrap();
        assert_eq!(envelope.name, "Ping");
        let decoded: Ping = envelope.decode().unwrap();
        assert_eq!(decoded, ping);
    }

    #[test]
    fn decode_wrong_type_is_malformed_payload() {
        let envelope = CommandEnvelope::new("Ping", &42u32).unwrap();
        let err = envelope.decode::<Ping>().unwrap_err();
        assert!(matches!(err, HostError::MalformedPayload { .. }));
        assert!(err.to_string().contains("Ping"));
    }

    #[test]
    fn reply_action_encodes_response() {
        let action = ClientAction::reply(&Ping {
            message: "pong".into(),
        })
        .unwrap();
        match action {
            ClientAction::Reply(bytes) => {
                let decoded: Ping = rmp_serde::from_slice(&bytes).unwrap();
                assert_eq!(decoded.message, "pong");
            }
            _ => panic!("expected Reply"),
        }
    }
}
