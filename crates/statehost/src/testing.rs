//! In-memory test host for unit and integration testing.
//!
//! Wraps a started [`RunningHost`] with typed send helpers so tests can
//! register services, issue commands, and drive passivation without any
//! external dependencies.

use crate::action::Action;
use crate::command::CommandEnvelope;
use crate::config::HostConfig;
use crate::descriptor::ServiceDescriptor;
use crate::error::HostError;
use crate::event_sourced::EventSourcedEntity;
use crate::host::{EntityHost, RunningHost};
use crate::options::EntityOptions;
use crate::types::{EntityId, ServiceName};
use crate::value_entity::ValueEntity;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A single-process in-memory host for testing.
///
/// Registration happens up front through the builder methods, then
/// [`start`](TestHostBuilder::start) yields a [`TestHost`] whose `call`
/// helpers encode the request, dispatch it, and decode the reply.
///
/// # Example
///
/// ```ignore
/// let host = TestHost::builder()
///     .value_entity(MyEntity, &descriptor, EntityOptions::defaults())?
///     .start()?;
/// let reply: String = host.call("pkg.MyService", "greet", "e-1", &"hello").await?;
/// ```
pub struct TestHost {
    running: RunningHost,
}

/// Collects registrations for a [`TestHost`].
pub struct TestHostBuilder {
    host: EntityHost,
}

impl TestHost {
    /// Start building a test host with default configuration.
    pub fn builder() -> TestHostBuilder {
        Self::builder_with_config(HostConfig::default())
    }

    /// Start building a test host with custom configuration.
    pub fn builder_with_config(config: HostConfig) -> TestHostBuilder {
        let host = EntityHost::new(config).expect("TestHost config should be valid");
        TestHostBuilder { host }
    }

    /// Send a typed command to an entity service and decode the reply.
    pub async fn call<Req, Res>(
        &self,
        service: &str,
        command: &str,
        entity_id: &str,
        request: &Req,
    ) -> Result<Res, HostError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let reply = self
            .running
            .dispatch(
                &ServiceName::new(service),
                &EntityId::new(entity_id),
                CommandEnvelope::new(command, request)?,
            )
            .await?;
        decode_reply(&reply)
    }

    /// Send a typed command to a stateless action service and decode the reply.
    pub async fn call_action<Req, Res>(
        &self,
        service: &str,
        command: &str,
        request: &Req,
    ) -> Result<Res, HostError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let reply = self
            .running
            .call_action(&ServiceName::new(service), CommandEnvelope::new(command, request)?)
            .await?;
        decode_reply(&reply)
    }

    /// Number of active entity instances.
    pub fn active_entity_count(&self) -> usize {
        self.running.active_entity_count()
    }

    /// Sweep idle instances as if the clock read `now_ms`.
    pub fn passivate_idle_at(&self, now_ms: i64) -> usize {
        self.running.passivate_idle_at(now_ms)
    }

    /// Current time in milliseconds, as the host measures idleness.
    pub fn now_ms() -> i64 {
        crate::dispatch::now_millis()
    }

    /// Get the underlying [`RunningHost`].
    pub fn running(&self) -> &RunningHost {
        &self.running
    }

    /// Shut the host down. Idempotent.
    pub fn shutdown(&self) {
        self.running.shutdown();
    }
}

impl TestHostBuilder {
    /// Register a stateless action.
    pub fn action(
        self,
        action: impl Action,
        descriptor: &ServiceDescriptor,
    ) -> Result<Self, HostError> {
        Ok(Self {
            host: self.host.register_action(action, descriptor)?,
        })
    }

    /// Register a value-based entity.
    pub fn value_entity(
        self,
        entity: impl ValueEntity,
        descriptor: &ServiceDescriptor,
        options: EntityOptions,
    ) -> Result<Self, HostError> {
        Ok(Self {
            host: self.host.register_value_entity(entity, descriptor, options)?,
        })
    }

    /// Register an event-sourced entity.
    pub fn event_sourced_entity(
        self,
        entity: impl EventSourcedEntity,
        descriptor: &ServiceDescriptor,
        options: EntityOptions,
    ) -> Result<Self, HostError> {
        Ok(Self {
            host: self
                .host
                .register_event_sourced_entity(entity, descriptor, options)?,
        })
    }

    /// Start the host.
    pub fn start(self) -> Result<TestHost, HostError> {
        Ok(TestHost {
            running: self.host.start()?,
        })
    }
}

fn decode_reply<Res: DeserializeOwned>(reply: &[u8]) -> Result<Res, HostError> {
    rmp_serde::from_slice(reply).map_err(|e| HostError::MalformedPayload {
        reason: format!("failed to decode reply: {e}"),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionContext;
    use crate::command::ClientAction;
    use crate::event_sourced::EventSourcedContext;
    use crate::value_entity::ValueCommandContext;
    use async_trait::async_trait;
    use serde::Deserialize;

    // -- Test entity: Counter (value-based) --

    struct CounterEntity;

    #[async_trait]
    impl ValueEntity for CounterEntity {
        type State = u64;

        async fn handle_command(
            &self,
            _entity_id: &EntityId,
            state: Option<u64>,
            command: CommandEnvelope,
            ctx: &mut ValueCommandContext<u64>,
        ) -> Result<ClientAction, HostError> {
            let current = state.unwrap_or(0);
            match command.name.as_str() {
                "Increment" => {
                    let amount: u64 = command.decode()?;
                    let next = current + amount;
                    ctx.update_state(next);
                    ClientAction::reply(&next)
                }
                "Get" => ClientAction::reply(&current),
                "Reset" => {
                    ctx.delete_state();
                    ClientAction::reply(&0u64)
                }
                other => Err(HostError::CommandFailed {
                    service: ServiceName::new("test.Counter"),
                    message: format!("unknown command: {other}"),
                }),
            }
        }
    }

    // -- Test entity: Ledger (event-sourced) --

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Deposited {
        amount: i64,
    }

    struct LedgerEntity;

    #[async_trait]
    impl EventSourcedEntity for LedgerEntity {
        type State = i64;
        type Event = Deposited;

        fn initial_state(&self, _entity_id: &EntityId) -> i64 {
            0
        }

        fn apply_event(&self, state: &mut i64, event: &Deposited) {
            *state += event.amount;
        }

        async fn handle_command(
            &self,
            _entity_id: &EntityId,
            state: &i64,
            command: CommandEnvelope,
            ctx: &mut EventSourcedContext<Deposited>,
        ) -> Result<ClientAction, HostError> {
            match command.name.as_str() {
                "Deposit" => {
                    let amount: i64 = command.decode()?;
                    ctx.emit(Deposited { amount });
                    ClientAction::reply(&(state + amount))
                }
                _ => ClientAction::reply(state),
            }
        }
    }

    // -- Test action: Echo --

    struct EchoAction;

    #[async_trait]
    impl Action for EchoAction {
        async fn handle_command(
            &self,
            command: CommandEnvelope,
            _ctx: &mut ActionContext,
        ) -> Result<ClientAction, HostError> {
            Ok(ClientAction::Reply(command.payload))
        }
    }

    fn counter_descriptor() -> ServiceDescriptor {
        ServiceDescriptor::new("test", "Counter", ["Increment", "Get", "Reset"])
    }

    fn ledger_descriptor() -> ServiceDescriptor {
        ServiceDescriptor::new("test", "Ledger", ["Deposit", "Balance"])
    }

    fn echo_descriptor() -> ServiceDescriptor {
        ServiceDescriptor::new("test", "Echo", ["Call"])
    }

    #[tokio::test]
    async fn counter_accumulates_per_entity() {
        let host = TestHost::builder()
            .value_entity(CounterEntity, &counter_descriptor(), EntityOptions::defaults())
            .unwrap()
            .start()
            .unwrap();

        let val: u64 = host.call("test.Counter", "Increment", "c-1", &1u64).await.unwrap();
        assert_eq!(val, 1);
        let val: u64 = host.call("test.Counter", "Increment", "c-1", &5u64).await.unwrap();
        assert_eq!(val, 6);
        let val: u64 = host.call("test.Counter", "Get", "c-2", &()).await.unwrap();
        assert_eq!(val, 0);
        assert_eq!(host.active_entity_count(), 2);
    }

    #[tokio::test]
    async fn delete_resets_value_state() {
        let host = TestHost::builder()
            .value_entity(CounterEntity, &counter_descriptor(), EntityOptions::defaults())
            .unwrap()
            .start()
            .unwrap();

        let _: u64 = host.call("test.Counter", "Increment", "c-1", &7u64).await.unwrap();
        let _: u64 = host.call("test.Counter", "Reset", "c-1", &()).await.unwrap();
        let val: u64 = host.call("test.Counter", "Get", "c-1", &()).await.unwrap();
        assert_eq!(val, 0);
    }

    #[tokio::test]
    async fn event_sourced_state_survives_passivation() {
        let host = TestHost::builder()
            .event_sourced_entity(LedgerEntity, &ledger_descriptor(), EntityOptions::defaults())
            .unwrap()
            .start()
            .unwrap();

        let balance: i64 = host.call("test.Ledger", "Deposit", "l-1", &100i64).await.unwrap();
        assert_eq!(balance, 100);
        let balance: i64 = host.call("test.Ledger", "Deposit", "l-1", &50i64).await.unwrap();
        assert_eq!(balance, 150);

        // Force the instance out, then replay from the journal.
        let far_future = TestHost::now_ms() + 86_400_000;
        assert_eq!(host.passivate_idle_at(far_future), 1);
        assert_eq!(host.active_entity_count(), 0);

        let balance: i64 = host.call("test.Ledger", "Balance", "l-1", &()).await.unwrap();
        assert_eq!(balance, 150);
    }

    #[tokio::test]
    async fn action_round_trip() {
        let host = TestHost::builder()
            .action(EchoAction, &echo_descriptor())
            .unwrap()
            .start()
            .unwrap();

        let echoed: String = host
            .call_action("test.Echo", "Call", &"ping".to_string())
            .await
            .unwrap();
        assert_eq!(echoed, "ping");
    }

    #[tokio::test]
    async fn unknown_service_rejected() {
        let host = TestHost::builder()
            .action(EchoAction, &echo_descriptor())
            .unwrap()
            .start()
            .unwrap();

        let result: Result<String, _> = host.call_action("test.Missing", "Call", &()).await;
        assert!(matches!(result, Err(HostError::ServiceNotRegistered { .. })));
    }

    #[tokio::test]
    async fn custom_config_snapshot_cadence() {
        let config = HostConfig {
            snapshot_every: 2,
            ..Default::default()
        };
        let host = TestHost::builder_with_config(config)
            .event_sourced_entity(LedgerEntity, &ledger_descriptor(), EntityOptions::defaults())
            .unwrap()
            .start()
            .unwrap();

        for _ in 0..5 {
            let _: i64 = host.call("test.Ledger", "Deposit", "l-1", &10i64).await.unwrap();
        }
        let balance: i64 = host.call("test.Ledger", "Balance", "l-1", &()).await.unwrap();
        assert_eq!(balance, 50);
    }
}
