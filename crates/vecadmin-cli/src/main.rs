//! VecAdmin CLI - Command-line interface
//!
//! Usage:
//!   vecadmin health
//!   vecadmin databases list
//!   vecadmin collections show <name>
//!   vecadmin documents add <collection> <text>
//!   vecadmin search <collection> <query> -n 10
//!
//! Every command prints pretty JSON on stdout.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vecadmin_core::{AppConfig, Connection, DocumentBatch, LoggingConfig, Metadata};
use vecadmin_vector::{EmbeddingClient, OpenAiEmbedding, VectorStoreClient};

#[derive(Parser)]
#[command(name = "vecadmin")]
#[command(about = "Administer a tenant/database scoped vector store")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    target: Target,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the configured connection
#[derive(Args, Debug, Default)]
struct Target {
    /// TOML configuration file
    #[arg(long, global = true, env = "VECADMIN_CONFIG")]
    config: Option<PathBuf>,

    /// Vector store address
    #[arg(long, global = true)]
    url: Option<String>,

    /// Bearer credential for the vector store
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[arg(long, global = true)]
    tenant: Option<String>,

    #[arg(long, global = true)]
    database: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the server's readiness
    Health,
    /// Manage databases of the tenant
    Databases {
        #[command(subcommand)]
        action: DatabaseAction,
    },
    /// Manage collections of the database
    Collections {
        #[command(subcommand)]
        action: CollectionAction,
    },
    /// Manage documents of a collection
    Documents {
        #[command(subcommand)]
        action: DocumentAction,
    },
    /// Search a collection by meaning
    Search {
        collection: String,
        query: String,
        /// Number of hits
        #[arg(short = 'n', long, default_value_t = 5)]
        n_results: usize,
        /// Metadata equality filter (JSON object)
        #[arg(long)]
        filter: Option<String>,
    },
}

#[derive(Subcommand)]
enum DatabaseAction {
    List,
    Create { name: String },
    Delete { name: String },
}

#[derive(Subcommand)]
enum CollectionAction {
    List,
    Create {
        name: String,
        /// Collection metadata (JSON object)
        #[arg(long)]
        metadata: Option<String>,
    },
    Delete { name: String },
    /// Show a collection and its document count
    Show { name: String },
}

#[derive(Subcommand)]
enum DocumentAction {
    List {
        collection: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Embed and add one document
    Add {
        collection: String,
        text: String,
        /// Document id (generated when absent)
        #[arg(long)]
        id: Option<String>,
        /// Document metadata (JSON object)
        #[arg(long)]
        metadata: Option<String>,
    },
    Delete {
        collection: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

impl Target {
    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let config = match &self.config {
            Some(path) => AppConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?
                .with_env_override()?,
            None => AppConfig::from_env()?,
        };
        Ok(config)
    }

    /// Configured connection with command-line overrides applied
    fn connection(&self, config: &AppConfig) -> Connection {
        let defaults = &config.vector_db;
        Connection::new(
            self.url.as_deref().unwrap_or(defaults.url.as_str()),
            self.tenant.as_deref().unwrap_or(defaults.tenant.as_str()),
            self.database.as_deref().unwrap_or(defaults.database.as_str()),
        )
        .with_api_key(self.api_key.clone().or_else(|| defaults.api_key.clone()))
    }
}

fn parse_metadata(raw: Option<&str>) -> anyhow::Result<Option<Metadata>> {
    raw.map(|raw| {
        serde_json::from_str::<Metadata>(raw).with_context(|| format!("invalid JSON object: {raw}"))
    })
    .transpose()
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Default filter when `RUST_LOG` is unset
fn default_filter(logging: &LoggingConfig) -> String {
    format!(
        "vecadmin={level},vecadmin_vector={level}",
        level = logging.level
    )
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(logging)));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let connection = cli.target.connection(&config);
    let mut client = VectorStoreClient::new(connection).with_health_timeout(
        std::time::Duration::from_secs(config.vector_db.health_timeout_secs),
    );

    match cli.command {
        Commands::Health => {
            let ready = client.health_check().await?;
            print_json(&json!({
                "server": client.connection().base_url(),
                "ready": ready,
            }))?;
        }
        Commands::Databases { action } => match action {
            DatabaseAction::List => {
                let tenant = client.connection().tenant.clone();
                print_json(&client.list_databases(&tenant).await?)?;
            }
            DatabaseAction::Create { name } => {
                client.create_database(&name).await?;
                print_json(&json!({ "created": name }))?;
            }
            DatabaseAction::Delete { name } => {
                client.delete_database(&name).await?;
                print_json(&json!({ "deleted": name }))?;
            }
        },
        Commands::Collections { action } => match action {
            CollectionAction::List => print_json(&client.list_collections().await?)?,
            CollectionAction::Create { name, metadata } => {
                let metadata = parse_metadata(metadata.as_deref())?;
                let collection = client.create_collection(&name, metadata.as_ref()).await?;
                print_json(&collection)?;
            }
            CollectionAction::Delete { name } => {
                client.delete_collection(&name).await?;
                print_json(&json!({ "deleted": name }))?;
            }
            CollectionAction::Show { name } => {
                let collection = client.get_collection(&name).await?;
                let count = client.count_documents(&name).await?;
                print_json(&json!({ "collection": collection, "count": count }))?;
            }
        },
        Commands::Documents { action } => match action {
            DocumentAction::List {
                collection,
                limit,
                offset,
            } => {
                let result = client.get_documents(&collection, &[], limit, offset).await?;
                print_json(&result.into_documents())?;
            }
            DocumentAction::Add {
                collection,
                text,
                id,
                metadata,
            } => {
                let metadata = parse_metadata(metadata.as_deref())?;
                let embedder = OpenAiEmbedding::from_config(&config.embedding)?;
                let embedding = embedder.embed(&text).await?;
                let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());

                let mut batch = DocumentBatch::new();
                batch.push(id.as_str(), text, embedding, metadata);
                client.add_documents(&collection, &batch).await?;
                print_json(&json!({ "added": id }))?;
            }
            DocumentAction::Delete { collection, ids } => {
                client.delete_documents(&collection, &ids).await?;
                print_json(&json!({ "deleted": ids }))?;
            }
        },
        Commands::Search {
            collection,
            query,
            n_results,
            filter,
        } => {
            let filter = parse_metadata(filter.as_deref())?;
            let embedder = OpenAiEmbedding::from_config(&config.embedding)?;
            let embedding = embedder.embed(&query).await?;
            let result = client
                .query_collection(&collection, &[embedding], n_results, filter.as_ref())
                .await?;
            print_json(&result.rows(0))?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.target.load_config()?;
    init_tracing(&config.logging);

    run(cli, config).await
}
