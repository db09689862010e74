use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tokio::net::TcpListener;

use api_ingress::{ApiIngress, ApiIngressConfig};
use runtime::{AppConfig, CliArgs};
use users_info::{
    api::rest::routes::register_routes, config::UsersInfoConfig, domain::repo::UsersStore,
    domain::service::Service, infra::storage::JsonFileStore,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USERS_INFO_MODULE: &str = "users_info";
const API_INGRESS_MODULE: &str = "api_ingress";

/// Users Server - CRUD over a flat JSON file
#[derive(Parser)]
#[command(name = "users-server")]
#[command(about = "Users Server - CRUD over a flat JSON file")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration and data file
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    // Print config and exit if requested
    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new("."));
    tracing::info!("Users Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config).await,
    }
}

async fn build_store(config: &AppConfig, seed: bool) -> Result<JsonFileStore> {
    let users_cfg: UsersInfoConfig = config.module_config(USERS_INFO_MODULE)?;
    let store = JsonFileStore::new(&users_cfg.data_file);

    if seed && users_cfg.create_if_missing && store.ensure_exists().await? {
        tracing::info!("Seeded empty user collection at {}", store.path().display());
    }
    Ok(store)
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");

    let ingress_cfg: ApiIngressConfig = config.module_config(API_INGRESS_MODULE)?;
    let store = build_store(&config, true).await?;
    tracing::info!("Using data file {}", store.path().display());

    let service = Arc::new(Service::new(Arc::new(store)));
    let ingress =
        ApiIngress::new(ingress_cfg).with_routes(register_routes(Default::default(), service));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    ingress.serve(listener, runtime::shutdown::shutdown_token()).await?;
    tracing::info!("Users Server stopped");
    Ok(())
}

async fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let _: ApiIngressConfig = config.module_config(API_INGRESS_MODULE)?;
    let store = build_store(&config, false).await?;
    let users = store
        .load()
        .await
        .with_context(|| format!("data file {} is not usable", store.path().display()))?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Data file: {} ({} users)", store.path().display(), users.len());
    println!("{}", config.to_yaml()?);

    Ok(())
}
