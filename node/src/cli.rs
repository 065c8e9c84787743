//! # CLI Interface
//!
//! Defines the command-line argument structure for `karma-node` using
//! `clap` derive. Supports six subcommands: `run`, `init`, `invoke`,
//! `query`, `status`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// KARMA merit-point ledger node.
///
/// A single-writer ledger node. Serves the JSON-RPC and REST API over
/// a local sled store, exposes Prometheus metrics, and doubles as a
/// one-shot command-line client for offline invocations.
#[derive(Parser, Debug)]
#[command(
    name = "karma-node",
    about = "KARMA merit-point ledger node",
    version,
    propagate_version = true
)]
pub struct KarmaNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the KARMA node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the ledger node and serve the API.
    Run(RunArgs),
    /// Initialize a new ledger — creates the data directory and writes
    /// the root account.
    Init(InitArgs),
    /// Execute a single mutating function against a local data
    /// directory, without a running node.
    Invoke(CallArgs),
    /// Execute a single read-only function against a local data
    /// directory, without a running node.
    Query(CallArgs),
    /// Query the status of a running node via its RPC endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the node data directory where the ledger store lives.
    ///
    /// Created on first run if it does not exist.
    #[arg(long, short = 'd', env = "KARMA_DATA_DIR", default_value = "~/.karma")]
    pub data_dir: PathBuf,

    /// Port for the JSON-RPC and REST API.
    #[arg(long, env = "KARMA_RPC_PORT", default_value_t = 9650)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "KARMA_METRICS_PORT", default_value_t = 9651)]
    pub metrics_port: u16,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "KARMA_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Serve reads of absent records as zero-valued records instead of
    /// errors, the way the previous deployment did.
    #[arg(long, env = "KARMA_LENIENT_READS", default_value_t = false)]
    pub lenient_reads: bool,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to the data directory to initialize.
    #[arg(long, short = 'd', env = "KARMA_DATA_DIR", default_value = "~/.karma")]
    pub data_dir: PathBuf,

    /// Display name of the root account.
    #[arg(long, default_value = "karma")]
    pub name: String,

    /// Starting integral supply held by the root account.
    #[arg(long, default_value_t = 0)]
    pub total: i64,
}

/// Arguments shared by the `invoke` and `query` subcommands.
#[derive(Parser, Debug)]
pub struct CallArgs {
    /// Path to the node data directory.
    #[arg(long, short = 'd', env = "KARMA_DATA_DIR", default_value = "~/.karma")]
    pub data_dir: PathBuf,

    /// Wire function name, e.g. `exchange` or `getUser`.
    pub function: String,

    /// Positional string arguments for the function.
    pub args: Vec<String>,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// RPC endpoint of the running node.
    #[arg(long, default_value = "http://127.0.0.1:9650")]
    pub rpc_url: String,
}
