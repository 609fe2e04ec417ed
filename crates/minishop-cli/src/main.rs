mod client;
mod local_storage;
mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use minishop_core::storefront::DEFAULT_MAX_PRICE;
use minishop_core::{
    AppConfig, BillingDetails, CardInput, Session, TestModeGateway, UserProfile,
};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use crate::client::ShopClient;
use crate::local_storage::FileLocalStorage;

#[derive(Debug, Parser)]
#[command(name = "minishop-cli")]
#[command(about = "Terminal storefront for the minishop API")]
struct Cli {
    /// Overrides `MINISHOP_API_URL`.
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List catalog products, optionally filtered.
    Products {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value_t = DEFAULT_MAX_PRICE)]
        max_price: Decimal,
    },
    /// Show one product.
    Show { id: String },
    /// Decrement server stock directly.
    Purchase {
        id: String,
        #[arg(long, default_value_t = 1)]
        qty: u32,
    },
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Confirm the cart without payment.
    Checkout {
        /// Decrement server stock for every cart line first.
        #[arg(long)]
        reserve_stock: bool,
    },
    /// Pay for the cart with a test-mode card.
    Pay {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        card: String,
        /// Expiry as MM/YY.
        #[arg(long)]
        exp: String,
        #[arg(long)]
        cvc: String,
        #[arg(long)]
        reserve_stock: bool,
    },
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,
    },
    /// Show purchase history.
    History,
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Debug, Subcommand)]
enum CartAction {
    Show,
    Add {
        id: String,
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        qty: i64,
    },
    Remove { id: String },
}

#[derive(Debug, Subcommand)]
enum ProfileAction {
    Show,
    /// Update the given profile fields and keep the rest.
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ThemeAction {
    Show,
    Toggle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = minishop_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli, &config).await
}

async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let api_url = cli.api_url.as_deref().unwrap_or(&config.api_url);
    let client = ShopClient::new(api_url, config.http_timeout_secs)?;
    let storage = FileLocalStorage::open(&config.client_state_path).with_context(|| {
        format!(
            "failed to open client state at {}",
            config.client_state_path.display()
        )
    })?;
    let mut session = Session::load(storage);

    match cli.command {
        Commands::Products { search, max_price } => {
            load_catalog(&client, &mut session).await?;
            let products = session.filter_products(&search, max_price);
            print!("{}", render::product_list(products));
        }
        Commands::Show { id } => {
            load_catalog(&client, &mut session).await?;
            let product = session
                .find_product(&id)
                .with_context(|| format!("Product not found: {id}"))?;
            print!("{}", render::product_detail(product));
        }
        Commands::Purchase { id, qty } => {
            let product = client.purchase(&id, qty).await?;
            println!("Purchased {qty} × {}. {} left.", product.name, product.quantity);
        }
        Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
            CartAction::Show => print_cart(&session),
            CartAction::Add { id, qty } => {
                load_catalog(&client, &mut session).await?;
                let line = session.add_to_cart(&id, qty)?;
                println!("Added {qty} × {} to cart ({} total)", line.name, line.qty);
                print_cart(&session);
            }
            CartAction::Remove { id } => {
                if session.remove_from_cart(&id)? {
                    println!("Removed {id} from cart");
                } else {
                    println!("{id} was not in the cart");
                }
                print_cart(&session);
            }
        },
        Commands::Checkout { reserve_stock } => {
            if reserve_stock {
                reserve_cart_stock(&client, &session).await?;
            }
            let order = session.checkout()?;
            println!("{}", order.message());
        }
        Commands::Pay {
            name,
            email,
            card,
            exp,
            cvc,
            reserve_stock,
        } => {
            let card = CardInput {
                number: card,
                expiry: exp,
                cvc,
            };
            let billing = BillingDetails { name, email };
            let token =
                session.authorize_payment(&TestModeGateway::new(), &card, &billing)?;
            if reserve_stock {
                reserve_cart_stock(&client, &session).await?;
            }
            let confirmation = session.complete_payment(token)?;
            tracing::debug!(token = %confirmation.token, "payment token issued");
            println!("{}", confirmation.message());
        }
        Commands::Profile { action } => match action.unwrap_or(ProfileAction::Show) {
            ProfileAction::Show => print!("{}", render::profile(session.profile())),
            ProfileAction::Set {
                name,
                email,
                phone,
                address,
            } => {
                let current = session.profile().clone();
                let updated = UserProfile {
                    name: name.unwrap_or(current.name),
                    email: email.unwrap_or(current.email),
                    phone: phone.unwrap_or(current.phone),
                    address: address.unwrap_or(current.address),
                };
                session.save_profile(updated)?;
                println!("Profile saved successfully!");
                print!("{}", render::profile(session.profile()));
            }
        },
        Commands::History => print!("{}", render::history(session.purchase_history())),
        Commands::Theme { action } => match action.unwrap_or(ThemeAction::Show) {
            ThemeAction::Show => println!("{}", session.theme()),
            ThemeAction::Toggle => println!("{}", session.toggle_theme()?),
        },
    }

    Ok(())
}

async fn load_catalog(
    client: &ShopClient,
    session: &mut Session<FileLocalStorage>,
) -> anyhow::Result<()> {
    let products = client
        .fetch_products()
        .await
        .context("Failed to load products")?;
    tracing::debug!(count = products.len(), "catalog loaded");
    session.set_catalog(products);
    Ok(())
}

/// Calls the purchase endpoint for every cart line, stopping at the first
/// rejection. Lines already reserved are not rolled back.
async fn reserve_cart_stock(
    client: &ShopClient,
    session: &Session<FileLocalStorage>,
) -> anyhow::Result<()> {
    for item in session.cart() {
        let product = client
            .purchase(&item.id, item.qty)
            .await
            .with_context(|| format!("failed to reserve stock for {}", item.name))?;
        tracing::info!(
            product_id = %item.id,
            qty = item.qty,
            remaining = product.quantity,
            "stock reserved"
        );
    }
    Ok(())
}

fn print_cart(session: &Session<FileLocalStorage>) {
    print!(
        "{}",
        render::cart(session.cart(), session.cart_count(), session.cart_total())
    );
}
