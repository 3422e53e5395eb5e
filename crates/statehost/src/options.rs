use crate::error::HostError;
use std::time::Duration;

/// When an idle entity instance may be deactivated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassivationStrategy {
    /// Use the host's configured default timeout.
    RuntimeDefault,
    /// Deactivate after the given idle duration.
    Timeout(Duration),
}

impl PassivationStrategy {
    /// Timeout-based passivation after the given idle duration.
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout(after)
    }
}

impl Default for PassivationStrategy {
    fn default() -> Self {
        Self::RuntimeDefault
    }
}

/// Options applied to an entity registration.
#[derive(Debug, Clone, Default)]
pub struct EntityOptions {
    passivation_strategy: PassivationStrategy,
}

impl EntityOptions {
    /// Options with all defaults.
    pub fn defaults() -> Self {
        Self::default()
    }

    pub fn with_passivation_strategy(mut self, strategy: PassivationStrategy) -> Self {
        self.passivation_strategy = strategy;
        self
    }

    pub fn passivation_strategy(&self) -> &PassivationStrategy {
        &self.passivation_strategy
    }

    /// Resolve the effective idle timeout given the host default.
    pub fn idle_timeout(&self, default_timeout: Duration) -> Duration {
        match self.passivation_strategy {
            PassivationStrategy::RuntimeDefault => default_timeout,
            PassivationStrategy::Timeout(after) => after,
        }
    }

    /// Reject options that can never be honored.
    pub fn validate(&self) -> Result<(), HostError> {
        if let PassivationStrategy::Timeout(after) = self.passivation_strategy {
            if after.is_zero() {
                return Err(HostError::InvalidConfig {
                    reason: "passivation timeout must be > 0".to_string(),
                });
            }
        }
        Ok(())
    }
}
