//! Checkout and order history.

use shopwire_client::remote::types::ShippingAddress;
use shopwire_client::{ClientError, Storefront};

use crate::output;
use crate::{AddressArgs, CheckoutAction, OrdersAction};

pub async fn checkout(storefront: &Storefront, action: CheckoutAction) -> Result<(), ClientError> {
    // The mirror starts empty in a fresh process.
    storefront.cart().load().await?;
    let preview = storefront.checkout().preview()?;

    match action {
        CheckoutAction::Preview => output::preview(&preview),
        CheckoutAction::Place { address, payment } => {
            let address = fill_address(address, preview.address);
            let placed = storefront.checkout().place_order(&address, &payment).await?;

            output::notice(&format!(
                "Order placed successfully! Order number: {}",
                placed.order.order_number
            ));
            if let Some(delta) = placed.mismatch {
                output::notice(&format!(
                    "Note: the store charged {} ({delta:+} from the estimate).",
                    shopwire_core::Price::store(placed.order.total_amount)
                ));
            }
            output::order(&placed.order);
        }
    }
    Ok(())
}

fn fill_address(args: AddressArgs, prefill: ShippingAddress) -> ShippingAddress {
    ShippingAddress {
        street: args.street.unwrap_or(prefill.street),
        city: args.city.unwrap_or(prefill.city),
        state: args.state.unwrap_or(prefill.state),
        zip_code: args.zip.unwrap_or(prefill.zip_code),
        country: args.country.unwrap_or(prefill.country),
    }
}

pub async fn orders(storefront: &Storefront, action: OrdersAction) -> Result<(), ClientError> {
    match action {
        OrdersAction::List { status } => {
            let orders = storefront.orders().list(status).await?;
            output::orders(&orders);
        }
        OrdersAction::Show { id } => {
            let order = storefront.orders().get(&id).await?;
            output::order(&order);
        }
    }
    Ok(())
}
