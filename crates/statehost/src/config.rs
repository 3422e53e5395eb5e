use crate::error::HostError;
use std::time::Duration;

/// Configuration for the entity host.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Idle time before an entity instance is passivated when its
    /// registration does not override it. Default: 30s.
    pub default_passivation_timeout: Duration,
    /// Snapshot cadence for event-sourced entities that do not override it.
    /// A snapshot is written after every N persisted events. Default: 100.
    pub snapshot_every: u64,
    /// Maximum number of forward hops a single command may take after its
    /// initial dispatch; nested side-effect dispatch draws on the same
    /// budget. Guards against forward and effect cycles. Default: 8.
    pub max_forward_depth: u32,
}

impl HostConfig {
    /// Validate configuration values. Returns an error if any value is invalid.
    pub fn validate(&self) -> Result<(), HostError> {
        if self.default_passivation_timeout.is_zero() {
            return Err(HostError::InvalidConfig {
                reason: "default_passivation_timeout must be > 0".to_string(),
            });
        }
        if self.snapshot_every == 0 {
            return Err(HostError::InvalidConfig {
                reason: "snapshot_every must be >= 1".to_string(),
            });
        }
        if self.max_forward_depth == 0 {
            return Err(HostError::InvalidConfig {
                reason: "max_forward_depth must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            default_passivation_timeout: Duration::from_secs(30),
            snapshot_every: 100,
            max_forward_depth: 8,
        }
    }
}
