mod listing;
mod records;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dropship")]
#[command(about = "Supplier to marketplace listing sync")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import one supplier product and publish it
    Import {
        /// Supplier product id
        product_id: String,
        /// Markup percent; defaults to DROPSHIP_MARKUP_PERCENT
        #[arg(long)]
        markup: Option<Decimal>,
    },
    /// Re-sync products; all known products when no ids are given
    Sync {
        /// Only push current supplier stock
        #[arg(long)]
        stock_only: bool,
        product_ids: Vec<String>,
    },
    /// List recent marketplace orders
    Orders {
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    /// Show sync records, or one record in detail
    Records { product_id: Option<String> },
    /// Print the public (affiliate) link for a supplier product
    AffiliateLink { product_id: String },
    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check connectivity
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("dropship: no command given; see --help");
        return Ok(());
    };

    let config = dropship_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Import { product_id, markup } => {
            let pool = connect(&config).await?;
            listing::run_import(&config, pool, &product_id, markup).await?;
        }
        Commands::Sync {
            stock_only,
            product_ids,
        } => {
            let pool = connect(&config).await?;
            listing::run_sync(&config, pool, product_ids, stock_only).await?;
        }
        Commands::Orders { limit } => {
            let pool = connect(&config).await?;
            listing::run_orders(&config, pool, limit).await?;
        }
        Commands::Records { product_id } => {
            let pool = connect(&config).await?;
            match product_id {
                Some(id) => records::run_record_detail(&pool, &id).await?,
                None => records::run_records(&pool).await?,
            }
        }
        Commands::AffiliateLink { product_id } => records::run_affiliate_link(&config, &product_id),
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Migrate => {
                    let applied = dropship_db::run_migrations(&pool).await?;
                    println!("migrations applied: {applied}");
                }
                DbCommands::Ping => {
                    dropship_db::health_check(&pool).await?;
                    println!("database reachable");
                }
            }
        }
    }

    Ok(())
}

async fn connect(config: &dropship_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    Ok(dropship_db::connect_pool_from_config(config).await?)
}
