//! Schema Cache CLI
//!
//! Query a schema registry through the version cache.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use schema_version_cache::{
    AvroParser, AvroValidator, CacheConfig, HttpRegistry, SchemaFormat, SchemaVersionCache,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-cache")]
#[command(about = "Look up schema versions and IDs through a read-through registry cache")]
struct Cli {
    /// Config file (in addition to the default locations)
    #[arg(short, long)]
    config: Option<String>,

    /// Registry URL, overriding the configured one
    #[arg(short, long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the version numbers of a subject
    Versions {
        subject: String,
    },

    /// Find the version registered under a schema ID
    VersionForId {
        subject: String,
        id: u32,
    },

    /// Show the highest schema ID of a subject
    CurrentId {
        subject: String,
    },

    /// Print the schema text of a subject version
    Schema {
        subject: String,
        version: u32,
    },

    /// Show the schema ID of a subject version
    IdForVersion {
        subject: String,
        version: u32,
    },

    /// Find the highest version whose schema accepts a JSON payload
    Resolve {
        subject: String,
        /// JSON data file, or "-" for stdin
        data: PathBuf,
        /// Schema format (defaults to the configured one)
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },
}

/// Command-line spelling of [`SchemaFormat`]
#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    JsonSchema,
    Avro,
}

impl From<FormatArg> for SchemaFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::JsonSchema => SchemaFormat::JsonSchema,
            FormatArg::Avro => SchemaFormat::Avro,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = CacheConfig::load_from(cli.config.as_deref()).context("failed to load config")?;
    if let Some(url) = cli.url {
        config.registry.url = url;
    }

    let registry = HttpRegistry::new(&config.registry)?;
    let mut cache = SchemaVersionCache::new(registry);

    if !config.cache.preload.is_empty() {
        tracing::info!(subjects = config.cache.preload.len(), "Preloading subjects");
        cache.preload(&config.cache.preload)?;
    }

    match cli.command {
        Commands::Versions { subject } => {
            let versions = cache.version_numbers(&subject)?;
            if versions.is_empty() {
                println!("No versions registered for {}", subject);
            } else {
                println!("📚 Versions of {}:", subject);
                for version in versions {
                    let id = cache.schema_id_for_version(&subject, version)?;
                    println!("  v{} (id {})", version, id);
                }
            }
        }

        Commands::VersionForId { subject, id } => {
            let version = cache.version_for_schema_id(&subject, id)?;
            println!("{}", version);
        }

        Commands::CurrentId { subject } => {
            let id = cache.current_id(&subject)?;
            println!("{}", id);
        }

        Commands::Schema { subject, version } => {
            let text = cache.schema_text(&subject, version)?;
            match serde_json::from_str::<serde_json::Value>(text) {
                Ok(document) => println!("{}", serde_json::to_string_pretty(&document)?),
                Err(_) => println!("{}", text),
            }
        }

        Commands::IdForVersion { subject, version } => {
            let id = cache.schema_id_for_version(&subject, version)?;
            println!("{}", id);
        }

        Commands::Resolve { subject, data, format } => {
            let data = read_data(&data)?;
            let format = format.map_or(config.cache.format, SchemaFormat::from);

            let version = match format {
                SchemaFormat::JsonSchema => cache.find_compatible_version(&subject, &data)?,
                SchemaFormat::Avro => {
                    cache.find_compatible_version_with(&subject, &data, &AvroParser, &AvroValidator)?
                }
            };
            let id = cache.schema_id_for_version(&subject, version)?;
            println!("✅ {} v{} (id {}) accepts the payload ({})", subject, version, id, format);
        }
    }

    Ok(())
}

fn read_data(path: &Path) -> anyhow::Result<serde_json::Value> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?
    };

    serde_json::from_str(&content).context("payload is not valid JSON")
}
