use std::{error::Error, path::PathBuf};

use clap::Parser;
use llm_registry::{
    catalog::{NormalizedModel, QueryOptions, Registry, SizeTier, SortKey, SortOrder},
    client::CatalogClient,
    config::RegistryConfig,
    jobs, observability,
    sources::{ApiSource, parse_model_list},
};

type CliResult = Result<(), Box<dyn Error>>;

/// CLI arguments for the model registry
#[derive(Parser, Debug)]
#[command(version, about = "Normalized LLM model catalog", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to built-in settings)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Load the registry through the fallback chain and print a summary (default)
    Fetch {
        /// Write the raw upstream model list to this file instead
        /// (used to refresh the bundled snapshot)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Filter and sort models
    Query(QueryArgs),
    /// Resolve a model by exact id, suffix, or substring
    Find {
        query: String,
    },
    /// Show aggregate statistics
    Stats,
    /// List providers present in the registry
    Providers,
    /// Keep the registry loaded, refreshing on the configured interval
    Watch,
    /// Export the JSON schema for the configuration file
    Schema {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct QueryArgs {
    /// Provider id or name (repeatable or comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    provider: Vec<String>,

    /// Minimum context length (inclusive)
    #[arg(long)]
    min_context: Option<u64>,

    /// Maximum context length (inclusive)
    #[arg(long)]
    max_context: Option<u64>,

    /// Size tier: tiny, small, medium, large, massive
    #[arg(short, long, value_delimiter = ',')]
    tier: Vec<SizeTier>,

    /// Only free (true) or only paid (false) models
    #[arg(long)]
    free: Option<bool>,

    /// Only models that do (true) or do not (false) accept images
    #[arg(long)]
    images: Option<bool>,

    /// Case-insensitive text search
    #[arg(short, long)]
    search: Option<String>,

    #[arg(long, value_enum)]
    sort: Option<SortArg>,

    /// Sort descending
    #[arg(long)]
    desc: bool,

    #[arg(short, long)]
    limit: Option<usize>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Context,
    Price,
    Name,
    Provider,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Context => SortKey::Context,
            SortArg::Price => SortKey::Price,
            SortArg::Name => SortKey::Name,
            SortArg::Provider => SortKey::Provider,
        }
    }
}

impl QueryArgs {
    fn to_options(&self) -> QueryOptions {
        let mut options = QueryOptions::new();
        if !self.provider.is_empty() {
            options = options.provider(self.provider.clone());
        }
        if let Some(min) = self.min_context {
            options = options.min_context(min);
        }
        if let Some(max) = self.max_context {
            options = options.max_context(max);
        }
        if !self.tier.is_empty() {
            options = options.tier(self.tier.clone());
        }
        if let Some(free) = self.free {
            options = options.free(free);
        }
        if let Some(images) = self.images {
            options = options.supports_images(images);
        }
        if let Some(search) = &self.search {
            options = options.search(search.clone());
        }
        if let Some(sort) = self.sort {
            let order = if self.desc {
                SortOrder::Desc
            } else {
                SortOrder::Asc
            };
            options = options.sort(sort.into(), order);
        }
        if let Some(limit) = self.limit {
            options = options.limit(limit);
        }
        options
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> CliResult {
    let config = load_config(args.config.as_deref())?;
    let command = args.command.unwrap_or(Command::Fetch { output: None });

    match command {
        Command::Schema { output } => run_schema_export(output),
        command => {
            let _tracing_guard = observability::init_tracing(&config.observability)?;
            run_command(command, &config, args.json).await
        }
    }
}

async fn run_command(command: Command, config: &RegistryConfig, json: bool) -> CliResult {
    match command {
        Command::Fetch {
            output: Some(output),
        } => run_snapshot_export(config, &output).await,
        Command::Fetch { output: None } => {
            let client = CatalogClient::from_config(config)?;
            let registry = client.refresh().await;
            let error = client.last_error();
            print_summary(&registry, error.as_deref(), json)
        }
        Command::Query(query) => {
            let client = CatalogClient::from_config(config)?;
            client.ensure_loaded().await;
            let models = client.query(&query.to_options());
            print_models(&models, json)
        }
        Command::Find { query } => {
            let client = CatalogClient::from_config(config)?;
            client.ensure_loaded().await;
            match client.find_model(&query) {
                Some(model) => print_models(std::slice::from_ref(&model), json),
                None => Err(format!("no model matches {query:?}").into()),
            }
        }
        Command::Stats => {
            let client = CatalogClient::from_config(config)?;
            let registry = client.ensure_loaded().await;
            print_stats(&registry, json)
        }
        Command::Providers => {
            let client = CatalogClient::from_config(config)?;
            let registry = client.ensure_loaded().await;
            print_providers(&registry, json)
        }
        Command::Watch => run_watch(config).await,
        Command::Schema { output } => run_schema_export(output),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<RegistryConfig, Box<dyn Error>> {
    let config = match path {
        Some(path) => RegistryConfig::from_file(path)
            .map_err(|e| format!("Failed to load config from {}: {e}", path.display()))?,
        None => RegistryConfig::default(),
    };
    Ok(config)
}

/// Fetch the live model list and write it verbatim (pretty-printed) to `output`.
async fn run_snapshot_export(config: &RegistryConfig, output: &std::path::Path) -> CliResult {
    let api = ApiSource::from_config(&config.upstream)?;
    tracing::info!(url = %api.url(), "Fetching model list for snapshot");

    let body = api.fetch_body().await?;
    let models = parse_model_list(&body)?;
    let value: serde_json::Value = serde_json::from_str(&body)?;

    tokio::fs::write(output, serde_json::to_string_pretty(&value)?).await?;
    eprintln!("Wrote {} models to {}", models.len(), output.display());
    Ok(())
}

async fn run_watch(config: &RegistryConfig) -> CliResult {
    let client = CatalogClient::from_config(config)?;
    let mut refresh = config.refresh.clone();
    refresh.enabled = true;

    tokio::select! {
        _ = jobs::start_catalog_refresh_worker(client, refresh) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutting down catalog refresh worker");
        }
    }
    Ok(())
}

#[cfg(feature = "json-schema")]
fn run_schema_export(output: Option<PathBuf>) -> CliResult {
    let content = RegistryConfig::json_schema_string()?;

    match output {
        Some(path) => {
            std::fs::write(&path, &content)
                .map_err(|e| format!("Failed to write to {}: {e}", path.display()))?;
            eprintln!("Config JSON schema written to {}", path.display());
        }
        None => {
            println!("{content}");
        }
    }
    Ok(())
}

#[cfg(not(feature = "json-schema"))]
fn run_schema_export(_output: Option<PathBuf>) -> CliResult {
    Err("JSON schema export requires the 'json-schema' feature".into())
}

fn print_summary(registry: &Registry, error: Option<&str>, json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string_pretty(registry.metadata())?);
        return Ok(());
    }

    let metadata = registry.metadata();
    println!("source:     {}", metadata.source);
    println!("models:     {}", metadata.model_count);
    println!("providers:  {}", metadata.provider_count);
    println!("fetched at: {}", metadata.fetched_at.to_rfc3339());
    println!("expires at: {}", metadata.expires_at.to_rfc3339());
    if let Some(error) = error {
        println!("degraded:   {error}");
    }
    Ok(())
}

fn print_models(models: &[NormalizedModel], json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string_pretty(models)?);
        return Ok(());
    }

    let id_width = models.iter().map(|m| m.id.len()).max().unwrap_or(2).max(2);
    println!(
        "{:<id_width$}  {:>9}  {:<7}  {:>10}  {:>10}",
        "ID", "CONTEXT", "TIER", "PROMPT/M", "COMPL/M"
    );
    for model in models {
        println!(
            "{:<id_width$}  {:>9}  {:<7}  {:>10}  {:>10}",
            model.id,
            model.context_length,
            model.size_tier.as_str(),
            format_price(model.pricing.prompt_per_million),
            format_price(model.pricing.completion_per_million),
        );
    }
    Ok(())
}

fn format_price(price: f64) -> String {
    if price == 0.0 {
        "free".to_string()
    } else {
        format!("${price:.2}")
    }
}

fn print_stats(registry: &Registry, json: bool) -> CliResult {
    let stats = registry.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("source:          {}", registry.source());
    println!("models:          {}", stats.total_models);
    println!("providers:       {}", stats.provider_count);
    println!("average context: {:.0}", stats.average_context);
    println!("min context:     {}", stats.min_context);
    println!("max context:     {}", stats.max_context);
    println!("free:            {}", stats.free_models);
    println!("image input:     {}", stats.image_capable_models);
    for (tier, count) in registry.tier_counts() {
        println!("  {:<8} {count}", tier.as_str());
    }
    Ok(())
}

fn print_providers(registry: &Registry, json: bool) -> CliResult {
    let providers = registry.providers();
    if json {
        println!("{}", serde_json::to_string_pretty(&providers)?);
        return Ok(());
    }

    for provider in providers {
        let count = registry.by_provider(&provider.id).len();
        println!(
            "{:<16} {:<24} {:<8} {count}",
            provider.id, provider.name, provider.color
        );
    }
    Ok(())
}
