use serde::de::DeserializeOwned;
use serde::Serialize;
use statehost::command::CommandEnvelope;
use statehost::error::HostError;
use statehost::host::RunningHost;
use statehost::testing::TestHost;
use statehost::types::{EntityId, ServiceName};
use statehost_tck::build_tck_host;
use statehost_tck::model::eventsourced::{EventSourcedAction, Request as EsRequest};
use statehost_tck::model::valueentity::{Request as VeRequest, ValueAction};
use statehost_tck::model::{action, Response};

const ACTION_MODEL: &str = "tck.model.ActionTckModel";
const VALUE_MODEL: &str = "tck.model.valueentity.ValueEntityTckModel";
const EVENT_SOURCED_MODEL: &str = "tck.model.eventsourced.EventSourcedTckModel";

fn start() -> RunningHost {
    build_tck_host().unwrap().start().unwrap()
}

async fn call<Req: Serialize, Res: DeserializeOwned>(
    host: &RunningHost,
    service: &str,
    entity_id: &str,
    command: &str,
    request: &Req,
) -> Result<Res, HostError> {
    let reply = host
        .dispatch(
            &ServiceName::new(service),
            &EntityId::new(entity_id),
            CommandEnvelope::new(command, request)?,
        )
        .await?;
    Ok(rmp_serde::from_slice(&reply).unwrap())
}

fn value_request(id: &str, actions: Vec<ValueAction>) -> VeRequest {
    VeRequest {
        id: id.into(),
        actions,
    }
}

fn es_request(id: &str, actions: Vec<EventSourcedAction>) -> EsRequest {
    EsRequest {
        id: id.into(),
        actions,
    }
}

#[tokio::test]
async fn action_model_replies_with_the_last_scripted_message() {
    let host = start();
    let request = action::Request {
        id: "a-1".into(),
        actions: vec![
            action::ProcessAction::ReplyWith {
                message: "first".into(),
            },
            action::ProcessAction::ReplyWith {
                message: "last".into(),
            },
        ],
    };
    let reply = host
        .call_action(
            &ServiceName::new(ACTION_MODEL),
            CommandEnvelope::new("Process", &request).unwrap(),
        )
        .await
        .unwrap();
    let response: Response = rmp_serde::from_slice(&reply).unwrap();
    assert_eq!(response.message, "last");
}

#[tokio::test]
async fn action_model_forward_resolves_to_an_empty_response() {
    let host = start();
    let request = action::Request {
        id: "a-1".into(),
        actions: vec![action::ProcessAction::Forward { id: "a-2".into() }],
    };
    let reply = host
        .call_action(
            &ServiceName::new(ACTION_MODEL),
            CommandEnvelope::new("Process", &request).unwrap(),
        )
        .await
        .unwrap();
    let response: Response = rmp_serde::from_slice(&reply).unwrap();
    assert_eq!(response.message, "");
}

#[tokio::test]
async fn action_model_fail_surfaces_the_scripted_message() {
    let host = start();
    let request = action::Request {
        id: "a-1".into(),
        actions: vec![action::ProcessAction::Fail {
            message: "expected failure".into(),
        }],
    };
    let err = host
        .call_action(
            &ServiceName::new(ACTION_MODEL),
            CommandEnvelope::new("Process", &request).unwrap(),
        )
        .await
        .unwrap_err();
    match err {
        HostError::CommandFailed { message, .. } => assert_eq!(message, "expected failure"),
        other => panic!("expected CommandFailed, got {other}"),
    }
}

#[tokio::test]
async fn value_model_updates_persist_across_commands() {
    let host = start();
    let response: Response = call(
        &host,
        VALUE_MODEL,
        "v-1",
        "Process",
        &value_request(
            "v-1",
            vec![ValueAction::Update {
                value: "stored".into(),
            }],
        ),
    )
    .await
    .unwrap();
    assert_eq!(response.message, "stored");

    let response: Response = call(
        &host,
        VALUE_MODEL,
        "v-1",
        "Process",
        &value_request("v-1", vec![]),
    )
    .await
    .unwrap();
    assert_eq!(response.message, "stored");

    // Entity ids isolate state.
    let response: Response = call(
        &host,
        VALUE_MODEL,
        "v-2",
        "Process",
        &value_request("v-2", vec![]),
    )
    .await
    .unwrap();
    assert_eq!(response.message, "");
}

#[tokio::test]
async fn value_model_failed_command_persists_nothing() {
    let host = start();
    let _: Response = call(
        &host,
        VALUE_MODEL,
        "v-1",
        "Process",
        &value_request(
            "v-1",
            vec![ValueAction::Update {
                value: "before".into(),
            }],
        ),
    )
    .await
    .unwrap();

    let err = call::<_, Response>(
        &host,
        VALUE_MODEL,
        "v-1",
        "Process",
        &value_request(
            "v-1",
            vec![
                ValueAction::Update {
                    value: "discarded".into(),
                },
                ValueAction::Fail {
                    message: "expected failure".into(),
                },
            ],
        ),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HostError::CommandFailed { .. }));

    let response: Response = call(
        &host,
        VALUE_MODEL,
        "v-1",
        "Process",
        &value_request("v-1", vec![]),
    )
    .await
    .unwrap();
    assert_eq!(response.message, "before");
}

#[tokio::test]
async fn value_model_delete_clears_persisted_state() {
    let host = start();
    let _: Response = call(
        &host,
        VALUE_MODEL,
        "v-1",
        "Process",
        &value_request(
            "v-1",
            vec![ValueAction::Update {
                value: "gone soon".into(),
            }],
        ),
    )
    .await
    .unwrap();
    let _: Response = call(
        &host,
        VALUE_MODEL,
        "v-1",
        "Process",
        &value_request("v-1", vec![ValueAction::Delete]),
    )
    .await
    .unwrap();
    let response: Response = call(
        &host,
        VALUE_MODEL,
        "v-1",
        "Process",
        &value_request("v-1", vec![]),
    )
    .await
    .unwrap();
    assert_eq!(response.message, "");
}

#[tokio::test]
async fn value_model_forward_reaches_value_entity_two() {
    let host = start();
    let response: Response = call(
        &host,
        VALUE_MODEL,
        "v-1",
        "Process",
        &value_request("v-1", vec![ValueAction::Forward { id: "v-2".into() }]),
    )
    .await
    .unwrap();
    assert_eq!(response.message, "");
}

#[tokio::test]
async fn value_model_effect_reaches_value_entity_two() {
    let host = start();
    let response: Response = call(
        &host,
        VALUE_MODEL,
        "v-1",
        "Process",
        &value_request(
            "v-1",
            vec![ValueAction::Effect {
                id: "v-2".into(),
                synchronous: false,
            }],
        ),
    )
    .await
    .unwrap();
    assert_eq!(response.message, "");

    // The effect activated the target instance before the reply came back.
    assert_eq!(host.active_entity_count(), 2);
}

#[tokio::test]
async fn event_sourced_model_concatenates_emitted_values() {
    let host = start();
    let response: Response = call(
        &host,
        EVENT_SOURCED_MODEL,
        "e-1",
        "Process",
        &es_request(
            "e-1",
            vec![
                EventSourcedAction::Emit { value: "a".into() },
                EventSourcedAction::Emit { value: "b".into() },
            ],
        ),
    )
    .await
    .unwrap();
    assert_eq!(response.message, "ab");

    let response: Response = call(
        &host,
        EVENT_SOURCED_MODEL,
        "e-1",
        "Process",
        &es_request("e-1", vec![EventSourcedAction::Emit { value: "c".into() }]),
    )
    .await
    .unwrap();
    assert_eq!(response.message, "abc");
}

#[tokio::test]
async fn event_sourced_model_failed_command_persists_no_events() {
    let host = start();
    let _: Response = call(
        &host,
        EVENT_SOURCED_MODEL,
        "e-1",
        "Process",
        &es_request("e-1", vec![EventSourcedAction::Emit { value: "a".into() }]),
    )
    .await
    .unwrap();

    let err = call::<_, Response>(
        &host,
        EVENT_SOURCED_MODEL,
        "e-1",
        "Process",
        &es_request(
            "e-1",
            vec![
                EventSourcedAction::Emit { value: "x".into() },
                EventSourcedAction::Fail {
                    message: "expected failure".into(),
                },
            ],
        ),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, HostError::CommandFailed { .. }));

    let response: Response = call(
        &host,
        EVENT_SOURCED_MODEL,
        "e-1",
        "Process",
        &es_request("e-1", vec![]),
    )
    .await
    .unwrap();
    assert_eq!(response.message, "a");
}

#[tokio::test]
async fn event_sourced_model_state_survives_passivation_past_snapshots() {
    let host = start();
    // Eight events: a snapshot lands at five, the journal carries the rest.
    for value in ["1", "2", "3", "4", "5", "6", "7", "8"] {
        let _: Response = call(
            &host,
            EVENT_SOURCED_MODEL,
            "e-1",
            "Process",
            &es_request(
                "e-1",
                vec![EventSourcedAction::Emit {
                    value: value.into(),
                }],
            ),
        )
        .await
        .unwrap();
    }

    let far_future = TestHost::now_ms() + 86_400_000;
    assert_eq!(host.passivate_idle_at(far_future), 1);

    let response: Response = call(
        &host,
        EVENT_SOURCED_MODEL,
        "e-1",
        "Process",
        &es_request("e-1", vec![]),
    )
    .await
    .unwrap();
    assert_eq!(response.message, "12345678");
}

#[tokio::test]
async fn missing_entity_id_is_rejected_for_entity_services() {
    let host = start();
    let err = host
        .call_action(
            &ServiceName::new(VALUE_MODEL),
            CommandEnvelope::new("Process", &value_request("v-1", vec![])).unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HostError::MissingEntityId { .. }));
}
