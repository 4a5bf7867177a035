use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use olist_core::{MetricsConfig, OrderMetrics, ProductMetrics, SellerMetrics};
use olist_data::{load_csv_dir, RawTables};
use polars::prelude::DataFrame;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Olist marketplace training tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Health check
    Ping,
    /// Compute every training table and print its shape
    Summary(SourceArgs),
    /// Print the first rows of one training table
    TrainingData(TrainingDataArgs),
}

#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// Directory holding the Olist CSV exports (defaults to OLIST_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// TOML file overriding the cost model and order options
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TrainingDataArgs {
    #[arg(value_enum)]
    entity: Entity,
    #[command(flatten)]
    source: SourceArgs,
    /// Number of rows to print
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Entity {
    Orders,
    Products,
    Sellers,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Ping => {
            println!("{}", olist_data::ping());
            Ok(())
        }
        Command::Summary(args) => handle_summary(args),
        Command::TrainingData(args) => handle_training_data(args),
    }
}

fn handle_summary(args: SourceArgs) -> Result<()> {
    let (tables, config) = load_inputs(&args)?;

    let mut table = Table::new();
    table.set_header(vec!["table", "rows", "columns"]);
    for entity in [Entity::Orders, Entity::Products, Entity::Sellers] {
        let df = training_data(entity, tables.clone(), &config)?;
        table.add_row(vec![
            entity.label().to_string(),
            df.height().to_string(),
            df.width().to_string(),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn handle_training_data(args: TrainingDataArgs) -> Result<()> {
    let (tables, config) = load_inputs(&args.source)?;
    let df = training_data(args.entity, tables, &config)?;

    info!(
        entity = args.entity.label(),
        rows = df.height(),
        limit = args.limit,
        "printing training data"
    );
    println!("{}", df.head(Some(args.limit)));
    Ok(())
}

fn training_data(entity: Entity, tables: RawTables, config: &MetricsConfig) -> Result<DataFrame> {
    let df = match entity {
        Entity::Orders => OrderMetrics::with_options(tables, config.orders).training_data()?,
        Entity::Products => ProductMetrics::new(tables, config)?.training_data()?,
        Entity::Sellers => SellerMetrics::new(tables, config)?.training_data()?,
    };
    Ok(df)
}

fn load_inputs(args: &SourceArgs) -> Result<(RawTables, MetricsConfig)> {
    dotenvy::dotenv().ok();

    let data_dir = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => env::var("OLIST_DATA_DIR")
            .map(PathBuf::from)
            .context("--data-dir or OLIST_DATA_DIR must be set")?,
    };

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => MetricsConfig::default(),
    };

    let tables = load_csv_dir(&data_dir)
        .with_context(|| format!("failed to load CSV tables from {}", data_dir.display()))?;
    info!(dir = %data_dir.display(), tables = tables.names().len(), "loaded raw tables");

    Ok((tables, config))
}

fn load_config(path: &Path) -> Result<MetricsConfig> {
    MetricsConfig::from_toml_file(path)
        .with_context(|| format!("failed to read config {}", path.display()))
}

impl Entity {
    fn label(self) -> &'static str {
        match self {
            Entity::Orders => "orders",
            Entity::Products => "products",
            Entity::Sellers => "sellers",
        }
    }
}
