//! Catalog browsing, cart and wishlist.

use shopwire_client::catalog::{ProductFilter, SortOrder};
use shopwire_client::{ClientError, Storefront};

use crate::output;
use crate::{CartAction, WishlistAction};

pub async fn products(
    storefront: &Storefront,
    filter: &ProductFilter,
    sort: Option<SortOrder>,
    limit: Option<usize>,
) -> Result<(), ClientError> {
    let catalog = storefront.catalog().ensure_loaded().await?;
    let mut products = catalog.view(filter, sort);
    if let Some(limit) = limit {
        products.truncate(limit);
    }
    output::products(&products);
    Ok(())
}

pub async fn categories(storefront: &Storefront) -> Result<(), ClientError> {
    let catalog = storefront.catalog().ensure_loaded().await?;
    output::categories(catalog.categories());
    Ok(())
}

pub async fn cart(storefront: &Storefront, action: CartAction) -> Result<(), ClientError> {
    let cart = storefront.cart();

    let snapshot = match action {
        CartAction::Show => {
            let snapshot = cart.load().await?;
            cart.refresh_count().await?;
            snapshot
        }
        CartAction::Add {
            product_id,
            quantity,
        } => {
            let snapshot = cart.add(&product_id, quantity).await?;
            output::notice("Added to cart.");
            snapshot
        }
        CartAction::Update {
            product_id,
            quantity,
        } => cart.update_quantity(&product_id, quantity).await?,
        CartAction::Remove { product_id } => {
            let snapshot = cart.remove(&product_id).await?;
            output::notice("Item removed.");
            snapshot
        }
        CartAction::Discount { code } => {
            let snapshot = cart.apply_discount(&code).await?;
            output::notice("Discount applied.");
            snapshot
        }
        CartAction::Clear => {
            let snapshot = cart.clear().await?;
            output::notice("Cart cleared.");
            snapshot
        }
        CartAction::Save { name } => {
            cart.save(&name).await?;
            output::notice(&format!("Cart saved as \"{}\".", name.trim()));
            return Ok(());
        }
    };

    output::cart(&snapshot, storefront.mirror().badges());
    Ok(())
}

pub async fn wishlist(storefront: &Storefront, action: WishlistAction) -> Result<(), ClientError> {
    let wishlist = storefront.wishlist();

    let snapshot = match action {
        WishlistAction::Show => wishlist.load().await?,
        WishlistAction::Add { product_id } => {
            let snapshot = wishlist.add(&product_id).await?;
            output::notice("Added to wishlist.");
            snapshot
        }
        WishlistAction::Remove { product_id } => {
            let snapshot = wishlist.remove(&product_id).await?;
            output::notice("Removed from wishlist.");
            snapshot
        }
        WishlistAction::Move {
            product_id,
            quantity,
        } => {
            let (cart, snapshot) = wishlist.move_to_cart(&product_id, quantity).await?;
            output::notice(&format!(
                "Moved to cart. Cart now has {} line(s).",
                cart.items.len()
            ));
            snapshot
        }
    };

    output::wishlist(&snapshot);
    Ok(())
}
