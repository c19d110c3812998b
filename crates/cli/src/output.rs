//! Terminal rendering of storefront data.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use rust_decimal::Decimal;

use shopwire_client::admin::DashboardSummary;
use shopwire_client::checkout::CheckoutPreview;
use shopwire_client::mirror::Badges;
use shopwire_client::remote::types::{
    Address, CartSnapshot, Order, Product, ShippingAddress, User, WishlistSnapshot,
};
use shopwire_core::{CheckoutTotals, Price};

fn money(amount: Decimal) -> String {
    Price::store(amount).display()
}

/// A one-line confirmation.
pub fn notice(message: &str) {
    println!("{message}");
}

/// A failure notice on stderr.
pub fn failure(message: &str) {
    eprintln!("error: {message}");
}

pub fn user(user: &User) {
    println!("{} <{}>", user.full_name(), user.email);
    println!("  id:    {}", user.id);
    println!("  role:  {}", user.role);
    if let Some(phone) = user.phone.as_deref().filter(|p| !p.is_empty()) {
        println!("  phone: {phone}");
    }
}

pub fn users(users: &[User]) {
    if users.is_empty() {
        println!("No users.");
        return;
    }
    for user in users {
        println!("{:<26} {:<9} {} <{}>", user.id, user.role, user.full_name(), user.email);
    }
}

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for product in products {
        let stock = if product.in_stock() {
            format!("{} in stock", product.quantity)
        } else {
            "out of stock".to_string()
        };
        println!(
            "{:<26} {:<32} {:>12}  {:<14} {}",
            product.id,
            product.name,
            money(product.unit_price),
            product.category.as_deref().unwrap_or("-"),
            stock
        );
    }
}

pub fn categories(categories: &[String]) {
    for category in categories {
        println!("{category}");
    }
}

pub fn cart(cart: &CartSnapshot, badges: Badges) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for item in &cart.items {
        println!(
            "{:<26} {:<32} {:>3} x {:>12} = {:>12}",
            item.product_id,
            item.name,
            item.quantity,
            money(item.unit_price),
            money(item.total_price)
        );
    }
    println!("Subtotal: {}", money(cart.total_amount));
    if !cart.discount.is_zero() {
        println!("Discount: -{}", money(cart.discount));
    }
    println!("Payable:  {}", money(cart.payable()));
    println!("({} item(s) in cart)", badges.cart);
}

pub fn wishlist(wishlist: &WishlistSnapshot) {
    if wishlist.items.is_empty() {
        println!("Your wishlist is empty.");
        return;
    }
    for item in &wishlist.items {
        println!("{:<26} {:<32} {:>12}", item.product_id, item.name, money(item.unit_price));
    }
}

pub fn totals(totals: &CheckoutTotals) {
    println!("Subtotal:     {:>12}", money(totals.subtotal));
    println!("Tax (12%):    {:>12}", money(totals.tax));
    println!("Shipping:     {:>12}", money(totals.shipping_fee));
    println!("Discount:     {:>12}", money(-totals.discount));
    println!("Total:        {:>12}", money(totals.total));
}

fn shipping_address(address: &ShippingAddress) {
    println!(
        "{}, {}, {} {}, {}",
        address.street, address.city, address.state, address.zip_code, address.country
    );
}

pub fn preview(preview: &CheckoutPreview) {
    cart(&preview.cart, Badges::default());
    println!();
    totals(&preview.totals);
    println!();
    print!("Ship to: ");
    shipping_address(&preview.address);
}

pub fn addresses(addresses: &[Address]) {
    if addresses.is_empty() {
        println!("No saved addresses.");
        return;
    }
    for address in addresses {
        let marker = if address.is_default { "*" } else { " " };
        println!(
            "{marker} {:<26} {:<10} {}, {}, {} {}, {}",
            address.id,
            address.label,
            address.street,
            address.city,
            address.state,
            address.zip_code,
            address.country
        );
    }
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders yet.");
        return;
    }
    for order in orders {
        let placed = order
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:<26} {:<16} {:<11} {:>12}  {}",
            order.id,
            order.order_number,
            order.status,
            money(order.total_amount),
            placed
        );
    }
}

pub fn order(order: &Order) {
    println!("Order {} ({})", order.order_number, order.id);
    println!("  status:   {}", order.status);
    if let Some(tracking) = order.tracking_number.as_deref().filter(|t| !t.is_empty()) {
        println!("  tracking: {tracking}");
    }
    if !order.payment_method.is_empty() {
        println!("  payment:  {}", order.payment_method);
    }
    if let Some(address) = &order.shipping_address {
        print!("  ship to:  ");
        shipping_address(address);
    }
    for item in &order.items {
        println!(
            "  {:>3} x {:<32} {:>12}",
            item.quantity,
            item.name,
            money(item.total_price)
        );
    }
    println!("  total:    {}", money(order.total_amount));
}

pub fn dashboard(summary: &DashboardSummary) {
    let count = |n: Option<usize>| n.map_or_else(|| "unavailable".to_string(), |n| n.to_string());
    println!("Orders:   {}", count(summary.total_orders));
    println!("Pending:  {}", count(summary.pending_orders));
    println!(
        "Revenue:  {}",
        summary
            .revenue
            .map_or_else(|| "unavailable".to_string(), money)
    );
    println!("Products: {}", count(summary.total_products));
    println!("Users:    {}", count(summary.total_users));
}
