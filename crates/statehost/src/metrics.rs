use prometheus::{IntCounter, IntGauge, Opts, Registry};

/// Host-level prometheus metrics.
#[derive(Debug)]
pub struct HostMetrics {
    /// Number of registered services.
    pub services: IntGauge,
    /// Number of active entity instances.
    pub active_entities: IntGauge,
    /// Commands dispatched.
    pub commands: IntCounter,
    /// Commands that ended in an error or a user-signalled failure.
    pub command_failures: IntCounter,
    /// Entity instances passivated.
    pub passivated: IntCounter,
}

impl HostMetrics {
    /// Create metrics and register them with the given prometheus registry.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let services = IntGauge::with_opts(Opts::new(
            "statehost_services",
            "Number of registered services",
        ))?;
        let active_entities = IntGauge::with_opts(Opts::new(
            "statehost_active_entities",
            "Number of active entity instances",
        ))?;
        let commands =
            IntCounter::with_opts(Opts::new("statehost_commands_total", "Commands dispatched"))?;
        let command_failures = IntCounter::with_opts(Opts::new(
            "statehost_command_failures_total",
            "Commands that ended in an error or failure",
        ))?;
        let passivated = IntCounter::with_opts(Opts::new(
            "statehost_passivated_total",
            "Entity instances passivated",
        ))?;

        registry.register(Box::new(services.clone()))?;
        registry.register(Box::new(active_entities.clone()))?;
        registry.register(Box::new(commands.clone()))?;
        registry.register(Box::new(command_failures.clone()))?;
        registry.register(Box::new(passivated.clone()))?;

        Ok(Self {
            services,
            active_entities,
            commands,
            command_failures,
            passivated,
        })
    }

    /// Create metrics without registering (for testing).
    pub fn unregistered() -> Self {
        Self {
            services: IntGauge::new("statehost_services", "services").expect("valid metric name"),
            active_entities: IntGauge::new("statehost_active_entities", "active")
                .expect("valid metric name"),
            commands: IntCounter::new("statehost_commands_total", "commands")
                .expect("valid metric name"),
            command_failures: IntCounter::new("statehost_command_failures_total", "failures")
                .expect("valid metric name"),
            passivated: IntCounter::new("statehost_passivated_total", "passivated")
                .expect("valid metric name"),
        }
    }
}
