use crate::error::HostError;
use crate::types::ServiceName;

/// Describes one registrable service: its package, simple name, and the
/// commands it accepts.
///
/// Descriptors are plain data built by the application. They play the role
/// protocol descriptors play in the registration API: registration pairs an
/// implementation with a named service looked up out of a descriptor file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    name: String,
    package: String,
    commands: Vec<String>,
}

impl ServiceDescriptor {
    pub fn new(
        package: impl Into<String>,
        name: impl Into<String>,
        commands: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// The unqualified service name (e.g., "ShoppingCart").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The package-qualified service name used as the registration key.
    pub fn full_name(&self) -> ServiceName {
        if self.package.is_empty() {
            ServiceName::new(self.name.clone())
        } else {
            ServiceName::new(format!("{}.{}", self.package, self.name))
        }
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn has_command(&self, command: &str) -> bool {
        self.commands.iter().any(|c| c == command)
    }
}

/// A file of service descriptors sharing a package.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    file: String,
    services: Vec<ServiceDescriptor>,
}

impl FileDescriptor {
    pub fn new(file: impl Into<String>, services: impl IntoIterator<Item = ServiceDescriptor>) -> Self {
        Self {
            file: file.into(),
            services: services.into_iter().collect(),
        }
    }

    /// The descriptor file name (for error messages).
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// Look up a service by its unqualified name. Unknown names are an
    /// error rather than an Option: registration against a missing service
    /// is a wiring bug that should abort startup.
    pub fn find_service_by_name(&self, name: &str) -> Result<&ServiceDescriptor, HostError> {
        self.services
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| HostError::UnknownService {
                file: self.file.clone(),
                name: name.to_string(),
            })
    }
}
