mod config;

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use quadmart_app::{ListingBrowser, ListingForm};
use quadmart_db::{FileKv, KvBackend, ListingStore, SqliteKv};
use quadmart_types::{CategoryCatalog, CategoryFilter, CategoryId, Listing, ListingId, ListingStatus};

use crate::config::{BackendKind, Config};

/// Campus marketplace listings on this device.
#[derive(Parser)]
#[command(name = "quadmart", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the category catalog
    Categories,

    /// Browse published listings
    List {
        /// Case-insensitive text to look for in titles
        #[arg(long, default_value = "")]
        query: String,

        /// Category id; 0 shows every category
        #[arg(long, default_value_t = 0)]
        category: u32,
    },

    /// Print saved drafts
    Drafts,

    /// Validate and publish a new listing
    Publish(ListingArgs),

    /// Validate and save a new listing as a draft
    Draft(ListingArgs),

    /// Delete a listing by id
    Remove { id: String },

    /// Delete every stored listing
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct ListingArgs {
    #[arg(long)]
    title: String,

    #[arg(long)]
    description: String,

    #[arg(long)]
    price: String,

    /// Category id; 0 leaves it unselected
    #[arg(long, default_value_t = 0)]
    category: u32,

    /// Accept offers below the asking price
    #[arg(long)]
    offer: bool,

    /// Photo URI; repeat for several
    #[arg(long = "photo")]
    photos: Vec<String>,
}

impl ListingArgs {
    fn into_form(self, catalog: CategoryCatalog) -> ListingForm {
        let mut form = ListingForm::with_catalog(catalog);
        form.set_title(self.title);
        form.set_description(self.description);
        form.set_price(self.price);
        form.set_category(CategoryId(self.category));
        form.set_open_to_offer(self.offer);
        for uri in self.photos {
            form.add_photo(uri);
        }
        form
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so listing output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quadmart=info,quadmart_db=info,quadmart_app=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match config.backend {
        BackendKind::Sqlite => {
            let kv = SqliteKv::open(&config.db_path)?;
            run(ListingStore::new(kv), &config, cli.command).await
        }
        BackendKind::File => {
            let kv = FileKv::new(config.data_dir.clone()).await?;
            run(ListingStore::new(kv), &config, cli.command).await
        }
    }
}

async fn run<B: KvBackend>(store: ListingStore<B>, config: &Config, command: Command) -> Result<()> {
    let catalog = CategoryCatalog::default();

    match command {
        Command::Categories => {
            for category in catalog.iter() {
                println!("{:>3}  {}", category.id.0, category.name);
            }
        }

        Command::List { query, category } => {
            let mut browser = ListingBrowser::new(Arc::new(store));
            browser.set_text(query);
            browser.set_category(CategoryFilter::from_raw(category));
            browser.on_focus().await;

            for listing in browser.results() {
                print_listing(listing, &catalog);
            }
            match browser.empty_state() {
                Some(empty) => println!("{}\n{}", empty.title, empty.hint),
                None => println!("{}", browser.count_label()),
            }
        }

        Command::Drafts => {
            let drafts: Vec<Listing> = store
                .load_all()
                .await
                .into_iter()
                .filter(|l| l.status == ListingStatus::Draft)
                .collect();
            for listing in &drafts {
                print_listing(listing, &catalog);
            }
            println!("{} drafts", drafts.len());
        }

        Command::Publish(args) => {
            save(&store, config, args.into_form(catalog), ListingStatus::Published).await?;
        }

        Command::Draft(args) => {
            save(&store, config, args.into_form(catalog), ListingStatus::Draft).await?;
        }

        Command::Remove { id } => {
            let user = config.require_user()?;
            if !store.remove_by_id(&ListingId(id.clone())).await? {
                bail!("No listing with id {id}");
            }
            info!("{} removed listing {}", user, id);
            println!("Removed {id}");
        }

        Command::Clear { yes } => {
            let user = config.require_user()?;
            if !yes {
                bail!("Refusing to delete every listing without --yes");
            }
            store.clear_all().await?;
            info!("{} cleared all listings", user);
            println!("Cleared all listings");
        }
    }

    Ok(())
}

async fn save<B: KvBackend>(
    store: &ListingStore<B>,
    config: &Config,
    mut form: ListingForm,
    status: ListingStatus,
) -> Result<()> {
    let user = config.require_user()?;
    let listing = form.save(store, status).await?;
    info!("{} saved listing {}", user, listing.id);
    println!("Saved {} as {}", listing.id, listing.status);
    Ok(())
}

fn print_listing(listing: &Listing, catalog: &CategoryCatalog) {
    let category = catalog
        .name_of(listing.category_id)
        .unwrap_or("Uncategorized");
    let offers = if listing.open_to_offer { "  (open to offers)" } else { "" };
    println!(
        "{}  {}  ${}  [{}]{}",
        listing.id, listing.title, listing.price, category, offers
    );
}
