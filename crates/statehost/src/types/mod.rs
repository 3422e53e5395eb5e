mod entity_id;
mod service_name;

pub use entity_id::EntityId;
pub use service_name::ServiceName;
