use crate::types::ServiceName;

/// Errors that can occur in the entity host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("service {name} not found in descriptor file {file}")]
    UnknownService { file: String, name: String },

    #[error("service {service} is already registered")]
    DuplicateService { service: ServiceName },

    #[error("service {service} is not registered")]
    ServiceNotRegistered { service: ServiceName },

    #[error("unknown command {command} for service {service}")]
    UnknownCommand {
        service: ServiceName,
        command: String,
    },

    #[error("malformed payload: {reason}")]
    MalformedPayload {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("command failed on {service}: {message}")]
    CommandFailed {
        service: ServiceName,
        message: String,
    },

    #[error("command {command} on {service} requires an entity id")]
    MissingEntityId {
        service: ServiceName,
        command: String,
    },

    #[error("forward depth exceeded ({depth}) while dispatching to {service}")]
    ForwardDepthExceeded { service: ServiceName, depth: u32 },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("host is shutting down")]
    ShuttingDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = HostError::UnknownService {
            file: "tck/action".into(),
            name: "ActionThree".into(),
        };
        assert_eq!(
            err.to_string(),
            "service ActionThree not found in descriptor file tck/action"
        );

        let err = HostError::DuplicateService {
            service: ServiceName::new("tck.model.ActionTwo"),
        };
        assert_eq!(
            err.to_string(),
            "service tck.model.ActionTwo is already registered"
        );

        let err = HostError::CommandFailed {
            service: ServiceName::new("tck.model.valueentity.ValueEntityTckModel"),
            message: "expected failure".into(),
        };
        assert!(err.to_string().contains("expected failure"));
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HostError>();
    }
}
