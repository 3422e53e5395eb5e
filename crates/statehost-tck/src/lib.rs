//! Conformance services for the statehost entity host.
//!
//! Wires the TCK model services and the sample shopping carts against
//! their service descriptors, in the order the conformance suite expects.
//! The binary starts the wired host and blocks; [`build_tck_host`] exposes
//! the same wiring so integration tests can drive it in-process.

pub mod descriptors;
pub mod model;
pub mod shoppingcart;

use statehost::config::HostConfig;
use statehost::error::HostError;
use statehost::host::EntityHost;
use statehost::options::{EntityOptions, PassivationStrategy};
use std::time::Duration;

/// Passivation timeout the passivation model is registered with.
pub const PASSIVATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Build the TCK host with every service registered, in order.
pub fn build_tck_host() -> Result<EntityHost, HostError> {
    let actions = descriptors::action_model_file();
    let value_entities = descriptors::value_entity_model_file();
    let event_sourced = descriptors::event_sourced_model_file();
    let passivation = descriptors::entity_passivation_file();
    let value_cart = descriptors::value_shopping_cart_file();
    let event_sourced_cart = descriptors::event_sourced_shopping_cart_file();

    EntityHost::new(HostConfig::default())?
        .register_action(
            model::action::ActionTckModelBehavior,
            actions.find_service_by_name("ActionTckModel")?,
        )?
        .register_action(
            model::action::ActionTwoBehavior,
            actions.find_service_by_name("ActionTwo")?,
        )?
        .register_value_entity(
            model::valueentity::ValueEntityTckModelEntity,
            value_entities.find_service_by_name("ValueEntityTckModel")?,
            EntityOptions::defaults(),
        )?
        .register_value_entity(
            model::valueentity::ValueEntityTwoEntity,
            value_entities.find_service_by_name("ValueEntityTwo")?,
            EntityOptions::defaults(),
        )?
        .register_value_entity(
            shoppingcart::value::ShoppingCartEntity,
            value_cart.find_service_by_name("ShoppingCart")?,
            EntityOptions::defaults(),
        )?
        .register_event_sourced_entity(
            model::eventsourced::EventSourcedTckModelEntity,
            event_sourced.find_service_by_name("EventSourcedTckModel")?,
            EntityOptions::defaults(),
        )?
        .register_event_sourced_entity(
            model::eventsourced::EventSourcedTwoEntity,
            event_sourced.find_service_by_name("EventSourcedTwo")?,
            EntityOptions::defaults(),
        )?
        .register_event_sourced_entity(
            shoppingcart::eventsourced::ShoppingCartEntity,
            event_sourced_cart.find_service_by_name("ShoppingCart")?,
            EntityOptions::defaults(),
        )?
        .register_value_entity(
            model::passivation::PassivationTckModelEntity,
            passivation.find_service_by_name("PassivationTckModel")?,
            EntityOptions::defaults()
                .with_passivation_strategy(PassivationStrategy::timeout(PASSIVATION_TIMEOUT)),
        )
}
