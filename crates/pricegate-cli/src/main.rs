//! Offline pricing resolution for operators: run the same discount cascade
//! the server uses against a product dump, without touching the storefront.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use pricegate_core::{Product, RuleStore};
use pricegate_pricing::apply_pricing_rules;

#[derive(Debug, Parser)]
#[command(name = "pricegate-cli")]
#[command(about = "Pricegate command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve prices for a product dump as a given user.
    Price {
        /// Path to the YAML pricing rules file.
        #[arg(long)]
        rules: PathBuf,
        /// Username to resolve prices for.
        #[arg(long)]
        user: String,
        /// Path to a JSON file holding an array of products.
        #[arg(long)]
        products: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Price {
            rules,
            user,
            products,
        } => price(&rules, &user, &products),
    }
}

fn price(rules_path: &Path, user: &str, products_path: &Path) -> anyhow::Result<()> {
    let store = RuleStore::load(rules_path)
        .with_context(|| format!("loading rules from {}", rules_path.display()))?;

    let raw = std::fs::read_to_string(products_path)
        .with_context(|| format!("reading products from {}", products_path.display()))?;
    let products: Vec<Product> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing products from {}", products_path.display()))?;

    let priced = apply_pricing_rules(&store, user, products);
    println!("{}", serde_json::to_string_pretty(&priced)?);
    Ok(())
}
