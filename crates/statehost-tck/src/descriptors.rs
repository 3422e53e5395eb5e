//! Service descriptor files for the TCK services.
//!
//! Plain-data equivalents of the protobuf descriptors the conformance
//! protocol is defined against: each file groups the services of one
//! package, and the composition root looks services up by simple name.

use statehost::descriptor::{FileDescriptor, ServiceDescriptor};

/// `tck.model` — the stateless action models.
pub fn action_model_file() -> FileDescriptor {
    FileDescriptor::new(
        "tck/model/action.proto",
        [
            ServiceDescriptor::new("tck.model", "ActionTckModel", ["Process"]),
            ServiceDescriptor::new("tck.model", "ActionTwo", ["Call"]),
        ],
    )
}

/// `tck.model.valueentity` — the value-based entity models.
pub fn value_entity_model_file() -> FileDescriptor {
    FileDescriptor::new(
        "tck/model/valueentity.proto",
        [
            ServiceDescriptor::new("tck.model.valueentity", "ValueEntityTckModel", ["Process"]),
            ServiceDescriptor::new("tck.model.valueentity", "ValueEntityTwo", ["Call"]),
        ],
    )
}

/// `tck.model.eventsourced` — the event-sourced entity models.
pub fn event_sourced_model_file() -> FileDescriptor {
    FileDescriptor::new(
        "tck/model/eventsourced.proto",
        [
            ServiceDescriptor::new("tck.model.eventsourced", "EventSourcedTckModel", ["Process"]),
            ServiceDescriptor::new("tck.model.eventsourced", "EventSourcedTwo", ["Call"]),
        ],
    )
}

/// `tck.model.entitypassivation` — the passivation model.
pub fn entity_passivation_file() -> FileDescriptor {
    FileDescriptor::new(
        "tck/model/entitypassivation.proto",
        [ServiceDescriptor::new(
            "tck.model.entitypassivation",
            "PassivationTckModel",
            ["Activate"],
        )],
    )
}

/// `samples.valueentity.shoppingcart` — the value-based sample cart.
pub fn value_shopping_cart_file() -> FileDescriptor {
    FileDescriptor::new(
        "samples/valueentity/shoppingcart.proto",
        [ServiceDescriptor::new(
            "samples.valueentity.shoppingcart",
            "ShoppingCart",
            ["AddItem", "RemoveItem", "GetCart"],
        )],
    )
}

/// `samples.eventsourced.shoppingcart` — the event-sourced sample cart.
pub fn event_sourced_shopping_cart_file() -> FileDescriptor {
    FileDescriptor::new(
        "samples/eventsourced/shoppingcart.proto",
        [ServiceDescriptor::new(
            "samples.eventsourced.shoppingcart",
            "ShoppingCart",
            ["AddItem", "RemoveItem", "GetCart"],
        )],
    )
}
