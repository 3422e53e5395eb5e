//! Value-based shopping cart: the whole cart is the persisted value.

use crate::shoppingcart::{AddLineItem, Cart, RemoveLineItem};
use async_trait::async_trait;
use statehost::command::{ClientAction, CommandEnvelope};
use statehost::error::HostError;
use statehost::types::EntityId;
use statehost::value_entity::{ValueCommandContext, ValueEntity};

pub struct ShoppingCartEntity;

#[async_trait]
impl ValueEntity for ShoppingCartEntity {
    type State = Cart;

    async fn handle_command(
        &self,
        _entity_id: &EntityId,
        state: Option<Cart>,
        command: CommandEnvelope,
        ctx: &mut ValueCommandContext<Cart>,
    ) -> Result<ClientAction, HostError> {
        let mut cart = state.unwrap_or_default();
        match command.name.as_str() {
            "AddItem" => {
                let item: AddLineItem = command.decode()?;
                if item.quantity <= 0 {
                    return Ok(ClientAction::Failure(format!(
                        "Cannot add negative quantity of item {}",
                        item.product_id
                    )));
                }
                cart.add(&item.product_id, &item.name, item.quantity);
                ctx.update_state(cart.clone());
                ClientAction::reply(&cart)
            }
            "RemoveItem" => {
                let item: RemoveLineItem = command.decode()?;
                if !cart.remove(&item.product_id) {
                    return Ok(ClientAction::Failure(format!(
                        "Cannot remove item {} because it is not in the cart",
                        item.product_id
                    )));
                }
                ctx.update_state(cart.clone());
                ClientAction::reply(&cart)
            }
            _ => ClientAction::reply(&cart),
        }
    }
}
