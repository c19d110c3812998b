//! Shopwire CLI - a command-line storefront.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is kept in $SHOPWIRE_DATA_DIR/session.json)
//! shopwire login maria@example.ph --password secret
//!
//! # Browse
//! shopwire products --category Footwear --in-stock --sort price-asc
//!
//! # Shop
//! shopwire cart add 65f0c1a2 --quantity 2
//! shopwire cart discount save10
//! shopwire checkout place --payment cod
//!
//! # Administer
//! shopwire admin dashboard
//! ```
//!
//! Every invocation resumes the stored session. A failing command prints a
//! short notice and exits with status 1.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopwire_client::catalog::SortOrder;
use shopwire_client::{ClientConfig, ClientError, Storefront};
use shopwire_core::{AddressId, OrderId, OrderStatus, ProductId, Role, UserId};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "shopwire")]
#[command(author, version, about = "Shopwire command-line storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Create an account
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Show the signed-in user
    Whoami,
    /// List catalog products
    Products {
        /// Exact category name
        #[arg(short, long)]
        category: Option<String>,
        /// Only products with stock
        #[arg(long)]
        in_stock: bool,
        /// Only active products
        #[arg(long)]
        active: bool,
        /// Case-insensitive text search
        #[arg(short, long)]
        search: Option<String>,
        /// name-asc, name-desc, price-asc or price-desc
        #[arg(long)]
        sort: Option<SortOrder>,
        /// Show at most this many products
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// List catalog categories
    Categories,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Review totals and place an order
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// Order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Profile, password and address book
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Store administration
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product_id: ProductId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Update { product_id: ProductId, quantity: u32 },
    /// Remove a line
    Remove { product_id: ProductId },
    /// Apply a discount code
    Discount { code: String },
    /// Empty the cart
    Clear,
    /// Save the cart under a name
    Save { name: String },
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show the wishlist
    Show,
    /// Save a product
    Add { product_id: ProductId },
    /// Remove a saved product
    Remove { product_id: ProductId },
    /// Move a saved product into the cart
    Move {
        product_id: ProductId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Show totals and the prefilled shipping address
    Preview,
    /// Place an order for the cart
    Place {
        #[command(flatten)]
        address: AddressArgs,
        /// Payment method, e.g. cod or gcash
        #[arg(long)]
        payment: String,
    },
}

/// Shipping address fields; omitted ones come from the default address.
#[derive(Args)]
struct AddressArgs {
    #[arg(long)]
    street: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    zip: Option<String>,
    #[arg(long)]
    country: Option<String>,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders
    List {
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// Show one order
    Show { id: OrderId },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Update name, email and phone
    Update {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Change the password
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    /// List saved addresses
    Addresses,
    /// Add an address
    AddAddress {
        #[arg(long)]
        label: String,
        #[arg(long)]
        street: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        zip: String,
        #[arg(long, default_value = "Philippines")]
        country: String,
        /// Make this the default address
        #[arg(long)]
        default: bool,
    },
    /// Delete an address
    DeleteAddress { id: AddressId },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Order, revenue, product and user counts
    Dashboard,
    /// All orders
    Orders {
        #[arg(short, long)]
        status: Option<OrderStatus>,
    },
    /// Move an order to a new status
    OrderStatus {
        id: OrderId,
        status: OrderStatus,
        #[arg(long, default_value = "")]
        tracking: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// All users
    Users,
    /// Set a user's role
    Role { user_id: UserId, role: Role },
    /// Delete a user
    DeleteUser { user_id: UserId },
    /// Create a product
    ProductAdd {
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Replace a product's fields
    ProductEdit {
        id: ProductId,
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Delete a product
    ProductDelete { id: ProductId },
}

#[derive(Args)]
struct ProductArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    category: String,
    #[arg(long, default_value_t = 0)]
    quantity: u32,
    #[arg(long)]
    price: Decimal,
    #[arg(long, default_value = "")]
    image_url: String,
    #[arg(long)]
    active: bool,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            output::failure(&format!("Configuration error: {e}"));
            std::process::exit(1);
        }
    };

    // Sentry must be initialised before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopwire_client=info,shopwire_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let storefront = match Storefront::new(config) {
        Ok(storefront) => storefront,
        Err(e) => {
            output::failure(e.notice());
            std::process::exit(1);
        }
    };
    storefront.session().restore();

    if let Err(e) = run(cli, &storefront).await {
        tracing::debug!(error = %e, "Command failed");
        output::failure(e.notice());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, storefront: &Storefront) -> Result<(), ClientError> {
    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(storefront, &email, &password).await
        }
        Commands::Logout => {
            commands::session::logout(storefront);
            Ok(())
        }
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            phone,
        } => {
            commands::session::register(
                storefront,
                shopwire_client::remote::types::Registration {
                    first_name,
                    last_name,
                    email,
                    password,
                    phone,
                },
            )
            .await
        }
        Commands::Whoami => commands::session::whoami(storefront),
        Commands::Products {
            category,
            in_stock,
            active,
            search,
            sort,
            limit,
        } => {
            let filter = shopwire_client::catalog::ProductFilter {
                category,
                in_stock_only: in_stock,
                active_only: active,
                search_term: search,
            };
            commands::shop::products(storefront, &filter, sort, limit).await
        }
        Commands::Categories => commands::shop::categories(storefront).await,
        Commands::Cart { action } => commands::shop::cart(storefront, action).await,
        Commands::Wishlist { action } => commands::shop::wishlist(storefront, action).await,
        Commands::Checkout { action } => commands::orders::checkout(storefront, action).await,
        Commands::Orders { action } => commands::orders::orders(storefront, action).await,
        Commands::Profile { action } => commands::profile::run(storefront, action).await,
        Commands::Admin { action } => commands::admin::run(storefront, action).await,
    }
}
