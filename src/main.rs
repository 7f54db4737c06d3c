use std::path::PathBuf;
use std::process;

use clap::Parser;

use graphload::config::{ConnectionConfig, LoaderConfig, DEFAULT_MAX_MUTATIONS};
use graphload::manifest::LoadManifest;
use graphload::pipeline::Loader;
use graphload::store::ClickHouseStore;

#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Graphload - load CSV entity and relationship tables into a ClickHouse
/// property graph
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the YAML load manifest
    manifest: PathBuf,

    /// Directory holding the source CSV files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Name the published graph views are derived from
    #[arg(long, default_value = "graph")]
    graph_name: String,

    /// Per-transaction mutation limit of the target engine
    #[arg(long, default_value_t = DEFAULT_MAX_MUTATIONS)]
    max_mutations: usize,

    /// Transform and report without writing to ClickHouse
    #[arg(long)]
    dry_run: bool,

    /// Skip schema teardown before loading
    #[arg(long)]
    keep_schema: bool,
}

impl From<&Cli> for LoaderConfig {
    fn from(cli: &Cli) -> Self {
        LoaderConfig {
            data_dir: cli.data_dir.clone(),
            graph_name: cli.graph_name.clone(),
            max_mutations: cli.max_mutations,
            dry_run: cli.dry_run,
            keep_schema: cli.keep_schema,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logger - defaults to INFO level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    println!("\nGraphload v{}\n", env!("CARGO_PKG_VERSION"));

    let config = match LoaderConfig::from(&cli).validated() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let manifest = match LoadManifest::from_yaml_file(&cli.manifest) {
        Ok(manifest) => manifest,
        Err(e) => {
            eprintln!("Manifest error: {}", e);
            process::exit(1);
        }
    };

    // A dry run never touches the store, so a missing environment is fine
    // there; a real run requires the full connection settings.
    let connection = if cli.dry_run {
        ConnectionConfig::from_env().unwrap_or_default()
    } else {
        match ConnectionConfig::from_env() {
            Ok(connection) => connection,
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                process::exit(1);
            }
        }
    };

    let store = ClickHouseStore::connect(&connection);
    let loader = Loader::new(store, &connection.database, config, manifest);

    match loader.run().await {
        Ok(report) => {
            let failed = report.failed_tables().len();
            if failed > 0 {
                eprintln!("Load finished with {} failed tables", failed);
                process::exit(1);
            }
            println!("Load complete");
        }
        Err(e) => {
            eprintln!("Load failed: {:#}", e);
            process::exit(1);
        }
    }
}
