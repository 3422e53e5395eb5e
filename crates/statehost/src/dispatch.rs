//! In-process command dispatch over registered services.
//!
//! Activates entity instances on first command, runs commands serially per
//! instance, follows forwards against the registry, and sweeps idle
//! instances on demand. Mailboxes, crash recovery, and remote transport are
//! deliberately absent; those belong to a hosting runtime, not to this
//! support layer.

use crate::action::ActionContext;
use crate::command::{ClientAction, CommandEnvelope, SideEffect};
use crate::config::HostConfig;
use crate::error::HostError;
use crate::event_sourced::{EventSourcedContext, EventSourcedEntity};
use crate::metrics::HostMetrics;
use crate::registry::{HandlerRef, ServiceRegistry};
use crate::state_store::StateStore;
use crate::types::{EntityId, ServiceName};
use crate::value_entity::{StateOperation, ValueCommandContext, ValueEntity};
use async_trait::async_trait;
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, HostError> {
    rmp_serde::to_vec(value).map_err(|e| HostError::MalformedPayload {
        reason: format!("failed to encode entity state: {e}"),
        source: Some(Box::new(e)),
    })
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, HostError> {
    rmp_serde::from_slice(bytes).map_err(|e| HostError::MalformedPayload {
        reason: format!("failed to decode entity state: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Pending state change, with the typed value already encoded.
pub(crate) enum RawStateOp {
    Update(Vec<u8>),
    Delete,
}

/// Result of one value-entity command, type-erased.
pub(crate) struct ValueOutcome {
    pub action: ClientAction,
    pub state_op: Option<RawStateOp>,
    pub side_effects: Vec<SideEffect>,
}

/// Result of one event-sourced command, type-erased.
pub(crate) struct EventSourcedOutcome {
    pub action: ClientAction,
    pub events: Vec<Vec<u8>>,
    pub side_effects: Vec<SideEffect>,
}

/// Type-erased value entity, operating on encoded state.
#[async_trait]
pub(crate) trait ValueEntityDyn: Send + Sync {
    async fn handle(
        &self,
        entity_id: &EntityId,
        state: Option<&[u8]>,
        command: CommandEnvelope,
    ) -> Result<ValueOutcome, HostError>;
}

/// Type-erased event-sourced entity, operating on encoded state and events.
#[async_trait]
pub(crate) trait EventSourcedDyn: Send + Sync {
    fn initial_state(&self, entity_id: &EntityId) -> Result<Vec<u8>, HostError>;

    /// Fold encoded events into encoded state.
    fn apply_events(&self, state: &[u8], events: &[Vec<u8>]) -> Result<Vec<u8>, HostError>;

    async fn handle(
        &self,
        entity_id: &EntityId,
        state: &[u8],
        command: CommandEnvelope,
    ) -> Result<EventSourcedOutcome, HostError>;

    fn snapshot_every(&self) -> Option<u64>;
}

/// Bridges a typed [`ValueEntity`] onto the erased dispatch interface.
pub(crate) struct ValueEntityAdapter<E> {
    entity: E,
}

impl<E> ValueEntityAdapter<E> {
    pub fn new(entity: E) -> Self {
        Self { entity }
    }
}

#[async_trait]
impl<E: ValueEntity> ValueEntityDyn for ValueEntityAdapter<E> {
    async fn handle(
        &self,
        entity_id: &EntityId,
        state: Option<&[u8]>,
        command: CommandEnvelope,
    ) -> Result<ValueOutcome, HostError> {
        let state = state.map(decode::<E::State>).transpose()?;
        let mut ctx = ValueCommandContext::new(entity_id.clone());
        let action = self
            .entity
            .handle_command(entity_id, state, command, &mut ctx)
            .await?;
        let (side_effects, state_op) = ctx.into_parts();
        let state_op = match state_op {
            Some(StateOperation::Update(state)) => Some(RawStateOp::Update(encode(&state)?)),
            Some(StateOperation::Delete) => Some(RawStateOp::Delete),
            None => None,
        };
        Ok(ValueOutcome {
            action,
            state_op,
            side_effects,
        })
    }
}

/// Bridges a typed [`EventSourcedEntity`] onto the erased dispatch interface.
pub(crate) struct EventSourcedAdapter<E> {
    entity: E,
}

impl<E> EventSourcedAdapter<E> {
    pub fn new(entity: E) -> Self {
        Self { entity }
    }
}

#[async_trait]
impl<E: EventSourcedEntity> EventSourcedDyn for EventSourcedAdapter<E> {
    fn initial_state(&self, entity_id: &EntityId) -> Result<Vec<u8>, HostError> {
        encode(&self.entity.initial_state(entity_id))
    }

    fn apply_events(&self, state: &[u8], events: &[Vec<u8>]) -> Result<Vec<u8>, HostError> {
        let mut state: E::State = decode(state)?;
        for event in events {
            let event: E::Event = decode(event)?;
            self.entity.apply_event(&mut state, &event);
        }
        encode(&state)
    }

    async fn handle(
        &self,
        entity_id: &EntityId,
        state: &[u8],
        command: CommandEnvelope,
    ) -> Result<EventSourcedOutcome, HostError> {
        let state: E::State = decode(state)?;
        let mut ctx = EventSourcedContext::new(entity_id.clone());
        let action = self
            .entity
            .handle_command(entity_id, &state, command, &mut ctx)
            .await?;
        let (events, side_effects) = ctx.into_parts();
        let events = events.iter().map(encode).collect::<Result<_, _>>()?;
        Ok(EventSourcedOutcome {
            action,
            events,
            side_effects,
        })
    }

    fn snapshot_every(&self) -> Option<u64> {
        self.entity.snapshot_every()
    }
}

/// A live entity instance: its cached state behind a per-instance lock,
/// plus idle tracking for passivation.
struct Instance {
    state: Mutex<InstanceState>,
    last_active_ms: AtomicI64,
}

impl Instance {
    fn touch(&self) {
        self.last_active_ms.store(now_millis(), Ordering::Release);
    }
}

enum InstanceState {
    Value {
        cached: Option<Vec<u8>>,
    },
    EventSourced {
        state: Vec<u8>,
        sequence: u64,
        snapshot_seq: u64,
    },
}

type InstanceKey = (ServiceName, EntityId);

/// Dispatches commands onto registered services.
pub(crate) struct Dispatcher {
    registry: Arc<ServiceRegistry>,
    store: Arc<StateStore>,
    config: Arc<HostConfig>,
    metrics: Arc<HostMetrics>,
    instances: DashMap<InstanceKey, Arc<Instance>>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        store: Arc<StateStore>,
        config: Arc<HostConfig>,
        metrics: Arc<HostMetrics>,
    ) -> Self {
        Self {
            registry,
            store,
            config,
            metrics,
            instances: DashMap::new(),
        }
    }

    pub fn active_count(&self) -> usize {
        self.instances.len()
    }

    /// Dispatch a command, following forwards until a reply or failure.
    ///
    /// The initial hop is free; each forward and each nested side effect
    /// consumes one unit of the shared `max_forward_depth` budget.
    pub async fn dispatch(
        &self,
        service: ServiceName,
        entity_id: Option<EntityId>,
        command: CommandEnvelope,
    ) -> Result<Vec<u8>, HostError> {
        self.dispatch_depth(service, entity_id, command, self.config.max_forward_depth)
            .await
    }

    /// One dispatch subtree with `depth` forward/effect hops remaining.
    ///
    /// Boxed because side effects re-enter dispatch recursively; the budget
    /// shrinks on every nesting level, so forward and effect cycles bottom
    /// out in `ForwardDepthExceeded` instead of overflowing the stack.
    fn dispatch_depth<'a>(
        &'a self,
        service: ServiceName,
        entity_id: Option<EntityId>,
        command: CommandEnvelope,
        depth: u32,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, HostError>> + Send + 'a>> {
        Box::pin(async move {
            let mut service = service;
            let mut entity_id = entity_id;
            let mut command = command;
            let mut remaining = depth;

            loop {
                self.metrics.commands.inc();
                let outcome = match self.dispatch_once(&service, entity_id.as_ref(), command).await
                {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        self.metrics.command_failures.inc();
                        return Err(err);
                    }
                };
                self.run_side_effects(outcome.side_effects, remaining).await;
                match outcome.action {
                    ClientAction::Reply(bytes) => return Ok(bytes),
                    ClientAction::Failure(message) => {
                        self.metrics.command_failures.inc();
                        return Err(HostError::CommandFailed { service, message });
                    }
                    ClientAction::Forward(target) => {
                        if remaining == 0 {
                            self.metrics.command_failures.inc();
                            return Err(HostError::ForwardDepthExceeded {
                                service: target.service,
                                depth: self.config.max_forward_depth,
                            });
                        }
                        remaining -= 1;
                        debug!(
                            from = %service,
                            to = %target.service,
                            command = %target.command.name,
                            "following forward"
                        );
                        service = target.service;
                        if let Some(id) = target.entity_id {
                            entity_id = Some(id);
                        }
                        command = target.command;
                    }
                }
            }
        })
    }

    /// Run one command against one service, without following forwards.
    #[instrument(skip(self, command), fields(service = %service, command = %command.name))]
    async fn dispatch_once(
        &self,
        service: &ServiceName,
        entity_id: Option<&EntityId>,
        command: CommandEnvelope,
    ) -> Result<Outcome, HostError> {
        let registration = self.registry.get(service)?;
        if !registration.descriptor.has_command(&command.name) {
            return Err(HostError::UnknownCommand {
                service: service.clone(),
                command: command.name,
            });
        }

        match &registration.handler {
            HandlerRef::Action(action) => {
                let mut ctx = ActionContext::new();
                let result = action.handle_command(command, &mut ctx).await?;
                Ok(Outcome {
                    action: result,
                    side_effects: ctx.take_side_effects(),
                })
            }
            HandlerRef::Value(handler) => {
                let entity_id = entity_id
                    .cloned()
                    .ok_or_else(|| missing_entity_id(service, &command))?;
                let handler = Arc::clone(handler);
                let instance = self.activate_value(service, &entity_id)?;
                let mut state = instance.state.lock().await;
                instance.touch();

                let cached = match &*state {
                    InstanceState::Value { cached } => cached.clone(),
                    _ => None,
                };
                let outcome = handler
                    .handle(&entity_id, cached.as_deref(), command)
                    .await?;

                // A user failure persists nothing and performs no effects.
                if matches!(outcome.action, ClientAction::Failure(_)) {
                    instance.touch();
                    return Ok(Outcome {
                        action: outcome.action,
                        side_effects: Vec::new(),
                    });
                }

                match outcome.state_op {
                    Some(RawStateOp::Update(bytes)) => {
                        self.store.set_value(service, &entity_id, bytes.clone());
                        *state = InstanceState::Value {
                            cached: Some(bytes),
                        };
                    }
                    Some(RawStateOp::Delete) => {
                        self.store.delete_value(service, &entity_id);
                        *state = InstanceState::Value { cached: None };
                    }
                    None => {}
                }
                instance.touch();
                Ok(Outcome {
                    action: outcome.action,
                    side_effects: outcome.side_effects,
                })
            }
            HandlerRef::EventSourced(handler) => {
                let entity_id = entity_id
                    .cloned()
                    .ok_or_else(|| missing_entity_id(service, &command))?;
                let handler = Arc::clone(handler);
                let instance = self.activate_event_sourced(service, &entity_id, handler.as_ref())?;
                let mut guard = instance.state.lock().await;
                instance.touch();

                let (current, sequence, snapshot_seq) = match &*guard {
                    InstanceState::EventSourced {
                        state,
                        sequence,
                        snapshot_seq,
                    } => (state.clone(), *sequence, *snapshot_seq),
                    _ => {
                        return Err(HostError::MalformedPayload {
                            reason: format!("instance kind mismatch for {service}"),
                            source: None,
                        })
                    }
                };

                let outcome = handler.handle(&entity_id, &current, command).await?;

                // A user failure persists no events and performs no effects.
                if matches!(outcome.action, ClientAction::Failure(_)) {
                    instance.touch();
                    return Ok(Outcome {
                        action: outcome.action,
                        side_effects: Vec::new(),
                    });
                }

                let mut sequence = sequence;
                let mut snapshot_seq = snapshot_seq;
                let mut new_state = current;
                if !outcome.events.is_empty() {
                    new_state = handler.apply_events(&new_state, &outcome.events)?;
                    sequence = self
                        .store
                        .append_events(service, &entity_id, outcome.events);

                    let cadence = handler
                        .snapshot_every()
                        .unwrap_or(self.config.snapshot_every);
                    if sequence - snapshot_seq >= cadence {
                        self.store
                            .save_snapshot(service, &entity_id, sequence, new_state.clone());
                        snapshot_seq = sequence;
                        debug!(service = %service, entity_id = %entity_id, sequence, "snapshot saved");
                    }
                }
                *guard = InstanceState::EventSourced {
                    state: new_state,
                    sequence,
                    snapshot_seq,
                };
                instance.touch();
                Ok(Outcome {
                    action: outcome.action,
                    side_effects: outcome.side_effects,
                })
            }
        }
    }

    fn activate_value(
        &self,
        service: &ServiceName,
        entity_id: &EntityId,
    ) -> Result<Arc<Instance>, HostError> {
        let key = (service.clone(), entity_id.clone());
        if let Some(instance) = self.instances.get(&key) {
            return Ok(Arc::clone(&instance));
        }
        let instance = self
            .instances
            .entry(key)
            .or_insert_with(|| {
                let cached = self.store.get_value(service, entity_id);
                Arc::new(Instance {
                    state: Mutex::new(InstanceState::Value { cached }),
                    last_active_ms: AtomicI64::new(now_millis()),
                })
            })
            .clone();
        self.metrics.active_entities.set(self.instances.len() as i64);
        Ok(instance)
    }

    fn activate_event_sourced(
        &self,
        service: &ServiceName,
        entity_id: &EntityId,
        handler: &dyn EventSourcedDyn,
    ) -> Result<Arc<Instance>, HostError> {
        let key = (service.clone(), entity_id.clone());
        if let Some(instance) = self.instances.get(&key) {
            return Ok(Arc::clone(&instance));
        }

        // Restore: latest snapshot, then replay the events recorded after it.
        let (snapshot_seq, base) = match self.store.load_snapshot(service, entity_id) {
            Some((seq, bytes)) => (seq, bytes),
            None => (0, handler.initial_state(entity_id)?),
        };
        let events = self.store.events_after(service, entity_id, snapshot_seq);
        let replayed = events.len() as u64;
        let state = if events.is_empty() {
            base
        } else {
            handler.apply_events(&base, &events)?
        };
        if replayed > 0 {
            debug!(service = %service, entity_id = %entity_id, replayed, "replayed events on activation");
        }

        let instance = self
            .instances
            .entry(key)
            .or_insert_with(|| {
                Arc::new(Instance {
                    state: Mutex::new(InstanceState::EventSourced {
                        state,
                        sequence: snapshot_seq + replayed,
                        snapshot_seq,
                    }),
                    last_active_ms: AtomicI64::new(now_millis()),
                })
            })
            .clone();
        self.metrics.active_entities.set(self.instances.len() as i64);
        Ok(instance)
    }

    /// Dispatch side effects fire-and-forget: a failed effect is logged,
    /// never propagated into the reply of the command that produced it.
    /// Each effect spends one unit of the remaining depth budget, so a
    /// chain of effects terminates like a chain of forwards does.
    async fn run_side_effects(&self, effects: Vec<SideEffect>, depth: u32) {
        for effect in effects {
            let service = effect.service.clone();
            let result = if depth == 0 {
                Err(HostError::ForwardDepthExceeded {
                    service: service.clone(),
                    depth: self.config.max_forward_depth,
                })
            } else {
                self.dispatch_depth(effect.service, effect.entity_id, effect.command, depth - 1)
                    .await
            };
            if let Err(err) = result {
                warn!(service = %service, error = %err, "side effect failed");
            }
        }
    }

    /// Sweep instances idle past their resolved passivation timeout, as of
    /// `now_ms`. Returns the number passivated. State survives in the store
    /// and is restored on the next command.
    pub fn passivate_idle_at(&self, now_ms: i64) -> usize {
        let mut candidates: Vec<(InstanceKey, i64)> = Vec::new();
        for entry in self.instances.iter() {
            let (service, _) = entry.key();
            let Ok(registration) = self.registry.get(service) else {
                continue;
            };
            let timeout = registration
                .options
                .idle_timeout(self.config.default_passivation_timeout);
            let last_active = entry.value().last_active_ms.load(Ordering::Acquire);
            if now_ms - last_active >= timeout.as_millis() as i64 {
                candidates.push((entry.key().clone(), last_active));
            }
        }

        let mut passivated = 0;
        for (key, snapshot_last_active) in candidates {
            // Only remove if the instance has not been touched since the scan;
            // a concurrent command resets the idle clock.
            let removed = self
                .instances
                .remove_if(&key, |_, instance| {
                    instance.last_active_ms.load(Ordering::Acquire) == snapshot_last_active
                })
                .is_some();
            if removed {
                debug!(service = %key.0, entity_id = %key.1, "passivated idle entity");
                passivated += 1;
            }
        }
        if passivated > 0 {
            self.metrics.passivated.inc_by(passivated as u64);
            self.metrics.active_entities.set(self.instances.len() as i64);
        }
        passivated
    }

    /// Sweep idle instances against the wall clock.
    pub fn passivate_idle(&self) -> usize {
        self.passivate_idle_at(now_millis())
    }
}

/// Terminal action plus effects of one dispatch hop.
struct Outcome {
    action: ClientAction,
    side_effects: Vec<SideEffect>,
}

fn missing_entity_id(service: &ServiceName, command: &CommandEnvelope) -> HostError {
    HostError::MissingEntityId {
        service: service.clone(),
        command: command.name.clone(),
    }
}
