//! KSQL DDL generator
//!
//! Renders `CREATE STREAM` / `CREATE TABLE` statements from an entity model
//! described in YAML:
//!
//! ```yaml
//! type_name: Order
//! topic: orders
//! key_properties: [Id]
//! properties:
//!   - { name: Id, type: Int }
//!   - { name: Amount, type: Decimal, decimal: { precision: 18, scale: 2 } }
//! ```
//!
//! Usage:
//!   ksql-ddl --entity order.yaml
//!   ksql-ddl --entity order.yaml --table --name ORDERS_TABLE --config ddl.yaml

use clap::Parser;
use ksql_linq::ksql::{DdlGenerator, EntityModel, GeneratorConfig, KsqlResult, ModelCreationScope};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "ksql-ddl")]
#[command(about = "Generate KSQL CREATE STREAM/TABLE statements from entity models")]
#[command(version)]
struct Cli {
    /// Entity model YAML file
    #[arg(short, long)]
    entity: PathBuf,

    /// Generator configuration YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit CREATE TABLE instead of CREATE STREAM
    #[arg(long)]
    table: bool,

    /// Object name (defaults to the upper-cased entity type name)
    #[arg(short, long)]
    name: Option<String>,

    /// Kafka topic (defaults to the entity topic)
    #[arg(short, long)]
    topic: Option<String>,
}

fn run(cli: &Cli) -> KsqlResult<String> {
    let config = match &cli.config {
        Some(path) => GeneratorConfig::from_yaml_file(path)?,
        None => GeneratorConfig::default(),
    };
    let content = std::fs::read_to_string(&cli.entity)?;
    let model = EntityModel::from_yaml_str(&content)?;

    let name = cli
        .name
        .clone()
        .unwrap_or_else(|| model.type_name.to_uppercase());
    let topic = cli.topic.clone().unwrap_or_else(|| model.topic_name());
    log::info!(
        "Generating {} {} for topic '{}'",
        if cli.table { "TABLE" } else { "STREAM" },
        name,
        topic
    );

    let generator = DdlGenerator::new(config);
    ModelCreationScope::within(|| {
        if cli.table {
            generator.generate_create_table(&name, &topic, &model)
        } else {
            generator.generate_create_stream(&name, &topic, &model)
        }
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(statement) => println!("{};", statement),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
