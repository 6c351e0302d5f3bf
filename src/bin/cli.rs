//! Riorita CLI Client
//!
//! Command-line interface for issuing single operations against a server.

use clap::{Parser, Subcommand};
use riorita::{Client, Config};
use tracing_subscriber::{fmt, EnvFilter};

/// Riorita CLI
#[derive(Parser, Debug)]
#[command(name = "riorita-cli")]
#[command(about = "CLI for the Riorita key-value store")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "8024")]
    port: u16,

    /// Key namespace prefix
    #[arg(long, default_value = "")]
    prefix: String,

    /// Fail immediately instead of reconnecting and retrying
    #[arg(long)]
    no_reconnect: bool,

    /// Maximum attempts per operation when reconnecting
    #[arg(long, default_value = "100")]
    max_attempts: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// Check whether a key exists
    Has {
        /// The key to check
        key: String,
    },

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .key_prefix(&args.prefix)
        .reconnect(!args.no_reconnect)
        .max_attempts(args.max_attempts)
        .build();

    let mut client = match Client::with_config(config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    tracing::debug!("Riorita CLI v{} -> {}", riorita::VERSION, client.endpoint());

    let outcome = match &args.command {
        Commands::Ping => client.ping().map(|v| v.to_string()),
        Commands::Has { key } => client.has(key).map(|v| v.to_string()),
        Commands::Get { key } => client.get(key).map(|value| match value {
            Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            None => "(not found)".to_string(),
        }),
        Commands::Put { key, value } => client.put(key, value.as_bytes()).map(|v| v.to_string()),
        Commands::Del { key } => client.delete(key).map(|v| v.to_string()),
    };

    match outcome {
        Ok(line) => println!("{}", line),
        Err(e) => {
            tracing::error!("{} failed: {}", command_name(&args.command), e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Ping => "ping",
        Commands::Has { .. } => "has",
        Commands::Get { .. } => "get",
        Commands::Put { .. } => "put",
        Commands::Del { .. } => "del",
    }
}
