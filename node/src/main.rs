// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # KARMA Ledger Node
//!
//! Entry point for the `karma-node` binary. Parses CLI arguments,
//! initializes logging and metrics, opens the ledger store, and serves
//! the HTTP API.
//!
//! The binary supports six subcommands:
//!
//! - `run`     — start the ledger node and serve the API
//! - `init`    — create the data directory and write the root account
//! - `invoke`  — run one mutating function against a local store
//! - `query`   — run one read-only function against a local store
//! - `status`  — query a running node's status endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;

use karma_ledger::dispatch::{dispatch, Invocation};
use karma_ledger::ledger::{Ledger, ReadMode};
use karma_ledger::storage::{LedgerRepository, SledStore};

use cli::{Commands, KarmaNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = KarmaNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_ledger(args),
        Commands::Invoke(args) => one_shot(args, true),
        Commands::Query(args) => one_shot(args, false),
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Opens the sled store under `<data_dir>/db`, creating the directory
/// tree on first use.
fn open_store(data_dir: &Path) -> Result<SledStore> {
    let data_dir = expand_home(data_dir);
    let db_path = data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    let store = SledStore::open(&db_path)
        .with_context(|| format!("failed to open ledger store at {}", db_path.display()))?;
    Ok(store)
}

/// Resolves a leading `~` against `$HOME`. sled has no opinion about
/// shell conventions, so the default `~/.karma` is expanded here.
fn expand_home(path: &Path) -> PathBuf {
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    if let Some(rest) = s.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

/// Starts the full ledger node: API server plus metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "karma_node=info,karma_ledger=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        data_dir = %args.data_dir.display(),
        lenient_reads = args.lenient_reads,
        "starting karma-node"
    );

    let store = open_store(&args.data_dir)?;
    let read_mode = if args.lenient_reads {
        ReadMode::Lenient
    } else {
        ReadMode::Strict
    };
    let ledger = Ledger::with_read_mode(LedgerRepository::new(store), read_mode);

    let node_metrics = Arc::new(NodeMetrics::new());
    let app_state = api::AppState::new(
        ledger,
        Arc::clone(&node_metrics),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    let ledger = Arc::clone(&app_state.ledger);

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    // Make sure the last accepted writes are durable before the process
    // goes away.
    ledger
        .repository()
        .flush()
        .context("failed to flush ledger store on shutdown")?;
    tracing::info!("karma-node stopped");
    Ok(())
}

/// Initializes a new ledger data directory and writes the root account.
fn init_ledger(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("karma_node=info", LogFormat::Pretty);

    let store = open_store(&args.data_dir)?;
    let ledger = Ledger::new(LedgerRepository::new(store));
    let root = ledger
        .initialize(&args.name, args.total)
        .context("failed to write root account")?;
    ledger
        .repository()
        .flush()
        .context("failed to flush ledger store")?;

    println!("Ledger initialized successfully.");
    println!("  Data directory : {}", expand_home(&args.data_dir).display());
    println!("  Root id        : {}", root.id);
    println!("  Root name      : {}", root.name);
    println!("  Total integral : {}", root.total_integral);

    Ok(())
}

/// Runs a single wire function against a local store and prints the
/// resulting record as JSON on stdout.
///
/// `mutating` distinguishes `invoke` from `query`: a query refuses to run
/// write functions so operators cannot move value with the read verb.
fn one_shot(args: cli::CallArgs, mutating: bool) -> Result<()> {
    logging::init_logging("karma_node=warn,karma_ledger=warn", LogFormat::Pretty);

    let writes = matches!(
        args.function.as_str(),
        "init" | "additional" | "createUser" | "exchange" | "transfer"
    );
    if writes && !mutating {
        anyhow::bail!(
            "{:?} changes ledger state; use `karma-node invoke`",
            args.function
        );
    }
    if !writes && mutating {
        anyhow::bail!(
            "{:?} is read-only; use `karma-node query`",
            args.function
        );
    }

    let store = open_store(&args.data_dir)?;
    let ledger = Ledger::new(LedgerRepository::new(store));

    let call_id = uuid::Uuid::new_v4().to_string();
    let call = Invocation::new(args.function.clone(), args.args, call_id);
    let reply = dispatch(&ledger, &call)
        .with_context(|| format!("{} failed", args.function))?;

    if writes {
        ledger
            .repository()
            .flush()
            .context("failed to flush ledger store")?;
    }

    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

/// Queries a running node's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.rpc_url.trim_end_matches('/'));
    let body = http_get(&url).await?;
    println!("{}", body);
    Ok(())
}

/// Minimal HTTP/1.1 GET over a raw TCP stream. The status subcommand is
/// the binary's only outbound HTTP call; a full client crate is not worth
/// carrying for it.
async fn http_get(url: &str) -> Result<String> {
    let parsed: url::Url = url
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid URL: {}", e))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("missing host in URL"))?;
    let port = parsed.port().unwrap_or(80);
    let path = parsed.path();

    let addr = format!("{}:{}", host, port);
    let mut stream = tokio::net::TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host,
    );

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    // Strip HTTP headers — everything after the first blank line is the body.
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_else(|| response.to_string());

    Ok(body)
}

/// Prints version information to stdout.
fn print_version() {
    println!("karma-node {}", env!("CARGO_PKG_VERSION"));
    println!("ledger     {}", karma_ledger::config::LEDGER_VERSION);
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Minimal URL parser — just enough to extract host/port/path.
/// Avoids pulling in the `url` crate for a single use.
mod url {
    pub struct Url {
        host: String,
        port: Option<u16>,
        path: String,
    }

    impl Url {
        pub fn host_str(&self) -> Option<&str> {
            Some(&self.host)
        }

        pub fn port(&self) -> Option<u16> {
            self.port
        }

        pub fn path(&self) -> &str {
            &self.path
        }
    }

    impl std::str::FromStr for Url {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            // Strip scheme.
            let rest = s
                .strip_prefix("http://")
                .or_else(|| s.strip_prefix("https://"))
                .unwrap_or(s);

            let (authority, path) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, "/"),
            };

            let (host, port) = match authority.rfind(':') {
                Some(i) => {
                    let p = authority[i + 1..]
                        .parse::<u16>()
                        .map_err(|e| format!("bad port: {}", e))?;
                    (authority[..i].to_string(), Some(p))
                }
                None => (authority.to_string(), None),
            };

            Ok(Url {
                host,
                port,
                path: path.to_string(),
            })
        }
    }
}
