//! Store administration.

use shopwire_client::remote::types::{ProductInput, StatusUpdate};
use shopwire_client::{ClientError, Storefront};

use crate::output;
use crate::{AdminAction, ProductArgs};

impl From<ProductArgs> for ProductInput {
    fn from(args: ProductArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            category: args.category,
            quantity: args.quantity,
            unit_price: args.price,
            image_url: args.image_url,
            active: args.active,
        }
    }
}

pub async fn run(storefront: &Storefront, action: AdminAction) -> Result<(), ClientError> {
    let admin = storefront.admin();

    match action {
        AdminAction::Dashboard => {
            let summary = admin.dashboard().await?;
            output::dashboard(&summary);
        }
        AdminAction::Orders { status } => {
            let orders = admin.list_orders(status).await?;
            output::orders(&orders);
        }
        AdminAction::OrderStatus {
            id,
            status,
            tracking,
            note,
        } => {
            let order = admin
                .update_order_status(
                    &id,
                    &StatusUpdate {
                        status,
                        tracking_number: tracking,
                        note,
                    },
                )
                .await?;
            output::notice("Order status updated.");
            output::order(&order);
        }
        AdminAction::Users => {
            let users = admin.list_users().await?;
            output::users(&users);
        }
        AdminAction::Role { user_id, role } => {
            admin.set_user_role(&user_id, role).await?;
            output::notice(&format!("User {user_id} is now {role}."));
        }
        AdminAction::DeleteUser { user_id } => {
            admin.delete_user(&user_id).await?;
            output::notice("User deleted.");
        }
        AdminAction::ProductAdd { product } => {
            let product = admin.create_product(&product.into()).await?;
            output::notice(&format!("Product created: {}", product.id));
        }
        AdminAction::ProductEdit { id, product } => {
            let product = admin.update_product(&id, &product.into()).await?;
            output::notice(&format!("Product updated: {}", product.name));
        }
        AdminAction::ProductDelete { id } => {
            admin.delete_product(&id).await?;
            output::notice("Product deleted.");
        }
    }
    Ok(())
}
