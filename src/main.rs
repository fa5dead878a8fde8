use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mygene_query::config::{find_config_file, get_config, load_config, Config, ConfigFile};
use mygene_query::models::SearchOptions;
use mygene_query::taxonomy::{EsTaxonomyStore, TaxonomyExpander};
use mygene_query::QueryBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// MyGene Query - Build gene search requests for a search engine
#[derive(Parser, Debug)]
#[command(name = "mygene-query")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build gene search requests and resolve taxonomy trees", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Filtering options shared by `query` and `lookup`
#[derive(Args, Debug, Default)]
struct OptionArgs {
    /// Species to restrict to: taxon ids, common names, or "all"
    #[arg(long, short, value_delimiter = ',')]
    species: Vec<String>,

    /// Species applied after aggregation
    #[arg(long, value_delimiter = ',')]
    species_facet_filter: Vec<String>,

    /// Fields that must exist
    #[arg(long, value_delimiter = ',')]
    exists: Vec<String>,

    /// Fields that must be missing
    #[arg(long, value_delimiter = ',')]
    missing: Vec<String>,

    /// Only genes with an Entrez id
    #[arg(long)]
    entrezonly: bool,

    /// Only genes with an Ensembl gene id
    #[arg(long)]
    ensemblonly: bool,

    /// Aggregations are requested
    #[arg(long)]
    aggs: bool,

    /// Allow "__any__" to return random genes
    #[arg(long)]
    allow_random: bool,

    /// Expand species to all descendant taxa
    #[arg(long)]
    include_tax_tree: bool,
}

impl OptionArgs {
    fn to_options(&self, config: &Config) -> SearchOptions {
        let mut options = SearchOptions::new()
            .entrezonly(self.entrezonly)
            .ensemblonly(self.ensemblonly)
            .aggs(self.aggs)
            .allow_random_query(self.allow_random || config.query.allow_random_query)
            .include_tax_tree(self.include_tax_tree);

        if !self.species.is_empty() {
            options = options.species(self.species.iter().cloned());
        }
        if !self.species_facet_filter.is_empty() {
            options = options.species_facet_filter(self.species_facet_filter.iter().cloned());
        }
        if !self.exists.is_empty() {
            options = options.exists(self.exists.iter().cloned());
        }
        if !self.missing.is_empty() {
            options = options.missing(self.missing.iter().cloned());
        }

        options.translate_species(&config.species_catalog())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a free-text gene search
    #[command(alias = "q")]
    Query {
        /// Query string, e.g. "cdk2", "chr1:1000-2000", "symbol:cdk*"
        query: String,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Build an identifier lookup over one or more fields
    #[command(alias = "l")]
    Lookup {
        /// Identifier to look up
        query: String,

        /// Fields to search (default: configured scopes)
        #[arg(long, value_delimiter = ',')]
        scopes: Vec<String>,

        #[command(flatten)]
        options: OptionArgs,
    },

    /// Show a taxon from the taxonomy store
    Taxon {
        /// NCBI taxon id
        taxid: u64,

        /// Attach descendant taxon ids
        #[arg(long)]
        include_children: bool,
    },

    /// Expand taxon ids to their descendant trees
    Expand {
        /// NCBI taxon ids
        #[arg(required = true)]
        taxids: Vec<u64>,

        /// Maximum size of the expanded list (default: configured limit)
        #[arg(long)]
        max: Option<usize>,
    },

    /// Write a configuration file with default settings
    InitConfig {
        /// Output path
        #[arg(default_value = mygene_query::config::CONFIG_FILE_NAME)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(cli: &Cli, config: &Config) {
    let log_level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("mygene_query={}", env_filter)),
    );

    let layer = if config.logging.format.as_deref() == Some("json") {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
}

fn expander(config: &Config) -> Result<TaxonomyExpander> {
    let store = EsTaxonomyStore::new(&config.taxonomy)?;
    Ok(TaxonomyExpander::new(Arc::new(store)).with_result_size(config.taxonomy.result_size))
}

fn builder(config: &Config) -> QueryBuilder {
    QueryBuilder::new()
        .with_species(config.species_catalog())
        .with_default_scopes(config.query.default_scopes.clone())
}

/// Expand the species tree when requested; needs the taxonomy store
async fn resolve_options(options: SearchOptions, config: &Config) -> Result<SearchOptions> {
    if !options.include_tax_tree || options.all_species() {
        return Ok(options);
    }
    let expanded = expander(config)?
        .expand_options(&options, config.taxonomy.max_expanded)
        .await?;
    Ok(expanded)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = match &config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => get_config(),
    };

    init_tracing(&cli, &config);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    match cli.command {
        Commands::Query { query, options } => {
            let options = resolve_options(options.to_options(&config), &config).await?;
            let search = builder(&config).build_free_text_query(&query, &options)?;
            print_json(&search)?;
        }

        Commands::Lookup {
            query,
            scopes,
            options,
        } => {
            let options = resolve_options(options.to_options(&config), &config).await?;
            let search =
                builder(&config).build_field_match_query(&query, scopes.as_slice(), &options)?;
            print_json(&search)?;
        }

        Commands::Taxon {
            taxid,
            include_children,
        } => match expander(&config)?
            .get_species_info(taxid, include_children)
            .await?
        {
            Some(node) => print_json(&node)?,
            None => anyhow::bail!("Taxon {} not found", taxid),
        },

        Commands::Expand { taxids, max } => {
            let max = max.unwrap_or(config.taxonomy.max_expanded);
            let expanded = expander(&config)?
                .get_expanded_species_list(&taxids, max)
                .await?;
            print_json(&expanded)?;
        }

        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            ConfigFile::from(config).save(&path)?;
            if !cli.quiet {
                eprintln!("Wrote {}", path.display());
            }
        }
    }

    Ok(())
}
