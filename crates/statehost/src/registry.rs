use crate::descriptor::ServiceDescriptor;
use crate::dispatch::{EventSourcedDyn, ValueEntityDyn};
use crate::action::Action;
use crate::error::HostError;
use crate::options::EntityOptions;
use crate::types::ServiceName;
use std::collections::HashMap;
use std::sync::Arc;

/// The registered implementation behind a service, type-erased.
#[derive(Clone)]
pub(crate) enum HandlerRef {
    Action(Arc<dyn Action>),
    Value(Arc<dyn ValueEntityDyn>),
    EventSourced(Arc<dyn EventSourcedDyn>),
}

impl std::fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}

impl HandlerRef {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            HandlerRef::Action(_) => "action",
            HandlerRef::Value(_) => "value-entity",
            HandlerRef::EventSourced(_) => "event-sourced-entity",
        }
    }
}

/// One registration: a service descriptor paired with its implementation
/// and resolved entity options.
#[derive(Debug, Clone)]
pub(crate) struct Registration {
    pub descriptor: ServiceDescriptor,
    pub options: EntityOptions,
    pub handler: HandlerRef,
}

/// Ordered ledger of service registrations.
///
/// Keyed by fully-qualified service name; registration order is preserved
/// so the startup sequence can be observed and logged as it was declared.
#[derive(Debug, Default)]
pub(crate) struct ServiceRegistry {
    entries: HashMap<ServiceName, Registration>,
    order: Vec<ServiceName>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration. Duplicate service names are a wiring bug and
    /// abort startup.
    pub fn insert(&mut self, registration: Registration) -> Result<(), HostError> {
        registration.options.validate()?;
        let name = registration.descriptor.full_name();
        if self.entries.contains_key(&name) {
            return Err(HostError::DuplicateService { service: name });
        }
        self.order.push(name.clone());
        self.entries.insert(name, registration);
        Ok(())
    }

    pub fn get(&self, service: &ServiceName) -> Result<&Registration, HostError> {
        self.entries
            .get(service)
            .ok_or_else(|| HostError::ServiceNotRegistered {
                service: service.clone(),
            })
    }

    /// Service names in registration order.
    pub fn service_names(&self) -> &[ServiceName] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.order.iter().filter_map(|name| self.entries.get(name))
    }
}
