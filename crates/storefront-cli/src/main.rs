use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;
use storefront_client::{ClientConfig, Storefront};
use storefront_core::format::{category_image_alt, format_price, image_alt, DEFAULT_CURRENCY};
use storefront_core::{CategoryId, Product, ProductId, SessionState};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn cli() -> Command {
    Command::new("storefront")
        .version(storefront_client::VERSION)
        .about("Browse the storefront catalog and manage the local session")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("products")
                .about("List products")
                .arg(
                    Arg::new("search")
                        .long("search")
                        .help("Only titles containing this text"),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .value_parser(value_parser!(u64))
                        .help("Only products of this category"),
                ),
        )
        .subcommand(Command::new("categories").about("List categories"))
        .subcommand(
            Command::new("product")
                .about("Show one product with related products")
                .arg(
                    Arg::new("id")
                        .required(true)
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            Command::new("search")
                .about("Search product titles on the server")
                .arg(Arg::new("query").required(true)),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in with an identity provider access token")
                .arg(Arg::new("token").long("token").required(true)),
        )
        .subcommand(Command::new("logout").about("Sign out and forget the saved session"))
        .subcommand(Command::new("whoami").about("Show the saved session"))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<ClientConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(ClientConfig::default()),
    }
}

fn print_products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found");
        return;
    }
    for product in products {
        println!(
            "{:>5}  {:<40}  {:>12}  {}",
            product.id,
            product.title,
            format_price(product.price, DEFAULT_CURRENCY),
            product.category.name
        );
    }
}

fn print_session(state: &SessionState) {
    match state.user() {
        Some(user) => {
            println!("Signed in as {} <{}>", user.name, user.email);
            println!("  User ID: {}", user.id);
            if let Some(avatar) = &user.avatar {
                println!("  Avatar: {avatar}");
            }
        }
        None => println!("Not signed in"),
    }
}

async fn run(matches: ArgMatches) -> Result<()> {
    let config = load_config(&matches)?;
    let storefront = Storefront::from_config(config).context("building storefront client")?;
    let catalog = storefront.catalog();
    let session = storefront.session();

    match matches.subcommand() {
        Some(("products", args)) => {
            catalog.load_products().await?;
            if let Some(id) = args.get_one::<u64>("category") {
                catalog.select_category(CategoryId(*id)).await?;
            }
            if let Some(query) = args.get_one::<String>("search") {
                // Category results are not in the product list; filter them directly
                let view = catalog.state().filtered_products;
                print_products(&storefront_core::filter_by_title(&view, query));
            } else {
                print_products(&catalog.state().filtered_products);
            }
        }
        Some(("categories", _)) => {
            for category in catalog.categories().await? {
                println!("{:>5}  {:<30}  {}", category.id, category.name, category_image_alt(&category));
            }
        }
        Some(("product", args)) => {
            let id = args
                .get_one::<u64>("id")
                .copied()
                .context("product id is required")?;
            let detail = catalog.product_detail(ProductId(id)).await?;
            let product = &detail.product;

            println!("{}", product.title);
            println!("  Price: {}", format_price(product.price, DEFAULT_CURRENCY));
            println!("  Category: {}", product.category.name);
            if !product.description.is_empty() {
                println!("  {}", product.description);
            }
            for image in &product.images {
                println!("  Image: {image} ({})", image_alt(product));
            }
            if !detail.related.is_empty() {
                println!();
                println!("Related products:");
                print_products(&detail.related);
            }
        }
        Some(("search", args)) => {
            let query = args
                .get_one::<String>("query")
                .context("search query is required")?;
            catalog.search_remote(query).await?;
            print_products(&catalog.state().filtered_products);
        }
        Some(("login", args)) => {
            let token = args
                .get_one::<String>("token")
                .context("--token is required")?;
            session.restore_session().await?;
            if !session.state().is_authenticated() {
                session.sign_in_with_token(token).await?;
            }
            print_session(&session.state());
        }
        Some(("logout", _)) => {
            session.restore_session().await?;
            session.sign_out().await;
            println!("Signed out");
        }
        Some(("whoami", _)) => {
            session.restore_session().await?;
            print_session(&session.state());
        }
        _ => {}
    }

    catalog.settle().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    run(cli().get_matches()).await
}
