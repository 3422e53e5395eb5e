//! Event-sourced shopping cart: the cart is folded from item events, and
//! the snapshot state is the cart itself.

use crate::shoppingcart::{AddLineItem, Cart, LineItem, RemoveLineItem};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statehost::command::{ClientAction, CommandEnvelope};
use statehost::error::HostError;
use statehost::event_sourced::{EventSourcedContext, EventSourcedEntity};
use statehost::types::EntityId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CartEvent {
    ItemAdded { item: LineItem },
    ItemRemoved { product_id: String },
}

pub struct ShoppingCartEntity;

#[async_trait]
impl EventSourcedEntity for ShoppingCartEntity {
    type State = Cart;
    type Event = CartEvent;

    fn initial_state(&self, _entity_id: &EntityId) -> Cart {
        Cart::default()
    }

    fn apply_event(&self, state: &mut Cart, event: &CartEvent) {
        match event {
            CartEvent::ItemAdded { item } => {
                state.add(&item.product_id, &item.name, item.quantity);
            }
            CartEvent::ItemRemoved { product_id } => {
                state.remove(product_id);
            }
        }
    }

    async fn handle_command(
        &self,
        _entity_id: &EntityId,
        state: &Cart,
        command: CommandEnvelope,
        ctx: &mut EventSourcedContext<CartEvent>,
    ) -> Result<ClientAction, HostError> {
        match command.name.as_str() {
            "AddItem" => {
                let item: AddLineItem = command.decode()?;
                if item.quantity <= 0 {
                    return Ok(ClientAction::Failure(format!(
                        "Cannot add negative quantity of item {}",
                        item.product_id
                    )));
                }
                let mut projected = state.clone();
                projected.add(&item.product_id, &item.name, item.quantity);
                ctx.emit(CartEvent::ItemAdded {
                    item: LineItem {
                        product_id: item.product_id,
                        name: item.name,
                        quantity: item.quantity,
                    },
                });
                ClientAction::reply(&projected)
            }
            "RemoveItem" => {
                let item: RemoveLineItem = command.decode()?;
                let mut projected = state.clone();
                if !projected.remove(&item.product_id) {
                    return Ok(ClientAction::Failure(format!(
                        "Cannot remove item {} because it is not in the cart",
                        item.product_id
                    )));
                }
                ctx.emit(CartEvent::ItemRemoved {
                    product_id: item.product_id,
                });
                ClientAction::reply(&projected)
            }
            _ => ClientAction::reply(state),
        }
    }
}
