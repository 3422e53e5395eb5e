//! Registration entry point and running host handle.
//!
//! A composition root builds an [`EntityHost`], registers each
//! implementation against a service descriptor in a fixed order, then calls
//! [`EntityHost::start`] and blocks on [`RunningHost::wait_for_shutdown`].
//! There is no recovery path: any registration or startup failure
//! propagates out of `main` and terminates the process.

use crate::action::Action;
use crate::command::CommandEnvelope;
use crate::config::HostConfig;
use crate::descriptor::ServiceDescriptor;
use crate::dispatch::{Dispatcher, EventSourcedAdapter, ValueEntityAdapter};
use crate::error::HostError;
use crate::event_sourced::EventSourcedEntity;
use crate::metrics::HostMetrics;
use crate::options::EntityOptions;
use crate::registry::{HandlerRef, Registration, ServiceRegistry};
use crate::state_store::StateStore;
use crate::types::{EntityId, ServiceName};
use crate::value_entity::ValueEntity;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Builder for an entity host: collects registrations, then starts.
///
/// Registration calls consume and return the builder so a composition root
/// can chain them, propagating the first failure with `?`.
#[derive(Debug)]
pub struct EntityHost {
    config: Arc<HostConfig>,
    registry: ServiceRegistry,
    metrics: Arc<HostMetrics>,
}

impl EntityHost {
    /// Create a host builder. Fails on invalid configuration.
    pub fn new(config: HostConfig) -> Result<Self, HostError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            registry: ServiceRegistry::new(),
            metrics: Arc::new(HostMetrics::unregistered()),
        })
    }

    /// Use metrics registered against a shared prometheus registry.
    pub fn with_metrics(mut self, metrics: Arc<HostMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Register a stateless action against the given service.
    pub fn register_action(
        mut self,
        action: impl Action,
        descriptor: &ServiceDescriptor,
    ) -> Result<Self, HostError> {
        self.registry.insert(Registration {
            descriptor: descriptor.clone(),
            options: EntityOptions::defaults(),
            handler: HandlerRef::Action(Arc::new(action)),
        })?;
        Ok(self)
    }

    /// Register a value-based entity against the given service.
    pub fn register_value_entity(
        mut self,
        entity: impl ValueEntity,
        descriptor: &ServiceDescriptor,
        options: EntityOptions,
    ) -> Result<Self, HostError> {
        self.registry.insert(Registration {
            descriptor: descriptor.clone(),
            options,
            handler: HandlerRef::Value(Arc::new(ValueEntityAdapter::new(entity))),
        })?;
        Ok(self)
    }

    /// Register an event-sourced entity against the given service.
    pub fn register_event_sourced_entity(
        mut self,
        entity: impl EventSourcedEntity,
        descriptor: &ServiceDescriptor,
        options: EntityOptions,
    ) -> Result<Self, HostError> {
        self.registry.insert(Registration {
            descriptor: descriptor.clone(),
            options,
            handler: HandlerRef::EventSourced(Arc::new(EventSourcedAdapter::new(entity))),
        })?;
        Ok(self)
    }

    /// Service names in registration order.
    pub fn service_names(&self) -> Vec<ServiceName> {
        self.registry.service_names().to_vec()
    }

    /// Finish registration and start the host.
    pub fn start(self) -> Result<RunningHost, HostError> {
        let registry = Arc::new(self.registry);
        self.metrics.services.set(registry.len() as i64);
        for registration in registry.iter() {
            info!(
                service = %registration.descriptor.full_name(),
                kind = registration.handler.kind(),
                commands = registration.descriptor.commands().len(),
                "registered service"
            );
        }

        let store = Arc::new(StateStore::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&registry),
            store,
            Arc::clone(&self.config),
            Arc::clone(&self.metrics),
        ));

        info!(services = registry.len(), "entity host started");
        Ok(RunningHost {
            registry,
            dispatcher,
            cancel: CancellationToken::new(),
        })
    }
}

/// A started host: dispatches commands in-process and waits for shutdown.
pub struct RunningHost {
    registry: Arc<ServiceRegistry>,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
}

impl RunningHost {
    /// Service names in registration order.
    pub fn service_names(&self) -> &[ServiceName] {
        self.registry.service_names()
    }

    /// Dispatch a command to an entity service.
    pub async fn dispatch(
        &self,
        service: &ServiceName,
        entity_id: &EntityId,
        command: CommandEnvelope,
    ) -> Result<Vec<u8>, HostError> {
        if self.cancel.is_cancelled() {
            return Err(HostError::ShuttingDown);
        }
        self.dispatcher
            .dispatch(service.clone(), Some(entity_id.clone()), command)
            .await
    }

    /// Dispatch a command to a stateless action service.
    pub async fn call_action(
        &self,
        service: &ServiceName,
        command: CommandEnvelope,
    ) -> Result<Vec<u8>, HostError> {
        if self.cancel.is_cancelled() {
            return Err(HostError::ShuttingDown);
        }
        self.dispatcher
            .dispatch(service.clone(), None, command)
            .await
    }

    /// Number of active entity instances.
    pub fn active_entity_count(&self) -> usize {
        self.dispatcher.active_count()
    }

    /// Sweep idle instances against the wall clock.
    pub fn passivate_idle(&self) -> usize {
        self.dispatcher.passivate_idle()
    }

    /// Sweep idle instances as of the given time (milliseconds since the
    /// Unix epoch). Lets a driver, or a test, decide what "now" is.
    pub fn passivate_idle_at(&self, now_ms: i64) -> usize {
        self.dispatcher.passivate_idle_at(now_ms)
    }

    /// Request shutdown. Idempotent.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Block until ctrl-c or [`shutdown`](Self::shutdown).
    pub async fn wait_for_shutdown(&self) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    tracing::error!(error = %err, "failed to listen for shutdown signal");
                }
                self.cancel.cancel();
            }
        }
        info!("entity host shut down");
    }
}
