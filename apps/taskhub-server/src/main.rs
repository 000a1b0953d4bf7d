use anyhow::{anyhow, bail, Context, Result};
use api_ingress::{ApiIngress, ApiIngressConfig};
use axum::Router;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use workboard::config::WorkboardConfig;
use workboard::Workboard;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
/// - Adds `mode=rwc` so a missing database file is created.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create database dir {}", dir.display()))?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    match query {
        Some(q) if q.split('&').any(|kv| kv.starts_with("mode=")) => {
            out.push('?');
            out.push_str(q);
        }
        Some(q) => {
            out.push('?');
            out.push_str(q);
            out.push_str("&mode=rwc");
        }
        None => out.push_str("?mode=rwc"),
    }
    Ok(out)
}

/// TaskHub Server - project and task workboard
#[derive(Parser)]
#[command(name = "taskhub-server")]
#[command(about = "TaskHub Server - project and task workboard")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("TaskHub Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config),
        Commands::Migrate => migrate(config, args).await,
    }
}

/// Detect DB backend from URL scheme.
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if raw.eq_ignore_ascii_case(MEMORY_DSN) {
        return Ok("sqlite");
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// DSN to connect to: in-memory SQLite under `--mock`, otherwise the
/// configured URL with relative sqlite paths resolved against home_dir.
fn resolve_dsn(config: &AppConfig, args: &CliArgs) -> Result<String> {
    if args.mock {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_config = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("No database configuration found (use --mock for in-memory)"))?;
    detect_from_dsn(db_config)?;

    let dsn = db_config.url.trim();
    if dsn.starts_with("sqlite") {
        absolutize_sqlite_dsn(dsn, Path::new(&config.server.home_dir), true)
    } else {
        Ok(dsn.to_string())
    }
}

async fn connect_database(config: &AppConfig, args: &CliArgs) -> Result<DatabaseConnection> {
    let dsn = resolve_dsn(config, args)?;
    let db_config = config.database.as_ref();

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.acquire_timeout(Duration::from_secs(5));
    if dsn == MEMORY_DSN {
        // Every pooled connection would otherwise get its own empty database.
        opts.max_connections(1);
    } else if let Some(max) = db_config.and_then(|c| c.max_conns) {
        opts.max_connections(max);
    }
    if dsn.starts_with("sqlite") {
        if let Some(ms) = db_config.and_then(|c| c.busy_timeout_ms) {
            opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(Duration::from_millis(ms.into())));
        }
    }

    let redacted = redact_dsn(&dsn);
    tracing::info!("Connecting to database: {}", redacted);
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("failed to connect to {redacted}"))?;
    tracing::info!("Connected DB backend: {:?}", db.get_database_backend());
    Ok(db)
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        _ => dsn.to_string(),
    }
}

fn bind_addr(config: &AppConfig) -> Result<SocketAddr> {
    let raw = format!("{}:{}", config.server.host, config.server.port);
    raw.parse()
        .map_err(|e| anyhow!("Invalid bind address '{}': {}", raw, e))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    let workboard_cfg: WorkboardConfig = config.module_config("workboard")?;
    let ingress_cfg: ApiIngressConfig = config.module_config("api_ingress")?;
    let addr = bind_addr(&config)?;

    let db = connect_database(&config, &args).await?;
    Workboard::migrate(&db).await?;
    let workboard = Workboard::init(&workboard_cfg, db)?;

    let ingress = ApiIngress::new(ingress_cfg, config.server.timeout_sec);
    let router = ingress.build_router(workboard.register_routes(Router::new()));
    let listener = ApiIngress::bind(addr).await?;

    let cancel = CancellationToken::new();
    let signals = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = apikit::shutdown::wait_for_shutdown().await {
                tracing::error!("Failed to listen for shutdown signals: {e:#}");
            }
            cancel.cancel();
        })
    };

    let served = ingress.serve(listener, router, cancel).await;
    signals.abort();
    workboard.shutdown().await?;
    served?;

    tracing::info!("TaskHub Server stopped");
    Ok(())
}

async fn migrate(config: AppConfig, args: CliArgs) -> Result<()> {
    let db = connect_database(&config, &args).await?;
    Workboard::migrate(&db).await?;
    println!("Migrations applied");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let mut problems = Vec::new();
    if let Err(e) = bind_addr(&config) {
        problems.push(e.to_string());
    }
    match &config.database {
        Some(db) => {
            if let Err(e) = detect_from_dsn(db) {
                problems.push(e.to_string());
            }
        }
        None => problems.push("database section is missing".to_string()),
    }
    if let Err(e) = config.module_config::<ApiIngressConfig>("api_ingress") {
        problems.push(format!("{e:#}"));
    }
    match config.module_config::<WorkboardConfig>("workboard") {
        Ok(cfg) => problems.extend(cfg.validate()),
        Err(e) => problems.push(format!("{e:#}")),
    }

    if !problems.is_empty() {
        for p in &problems {
            eprintln!("config problem: {p}");
        }
        bail!("configuration is invalid ({} problem(s))", problems.len());
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
