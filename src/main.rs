//! blocknet command line.
//!
//! ```text
//! blocknet [--config blocknet.toml] serve-files [--base-path DIR]
//! blocknet [--config blocknet.toml] echo
//! blocknet [--config blocknet.toml] ping <MESSAGE>
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use blocknet::config::{apply_overrides, load_config, Endpoint, NetConfig};
use blocknet::echo::echo_session;
use blocknet::file_server::FileServer;
use blocknet::net::{self, Acceptor, Connector};
use blocknet::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "blocknet")]
#[command(about = "Blocking TCP links and remote file server", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults apply when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the address (acceptor bind or connector target).
    #[arg(long)]
    ip: Option<String>,

    /// Override the port (acceptor bind or connector target).
    #[arg(short, long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve files under a base path to one client
    ServeFiles {
        #[arg(long)]
        base_path: Option<String>,
    },
    /// Accept one client and echo its strings back
    Echo,
    /// Send a string and print the reply
    Ping { message: String },
}

/// Longest string the echo and ping commands accept.
const MAX_MESSAGE: usize = 64 * 1024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => NetConfig::default(),
    };
    let endpoint = match cli.command {
        Commands::ServeFiles { .. } | Commands::Echo => Endpoint::Acceptor,
        Commands::Ping { .. } => Endpoint::Connector,
    };
    let mut config = apply_overrides(config, endpoint, cli.ip.as_deref(), cli.port)?;

    init_logging(&config.logging);
    tracing::info!("blocknet v{} starting", env!("CARGO_PKG_VERSION"));

    let _network = net::subsystem::init()?;
    let read_deadline = config.stream.read_deadline();

    match cli.command {
        Commands::ServeFiles { base_path } => {
            if let Some(base_path) = base_path {
                config.file_server.base_path = base_path;
            }
            let mut acceptor = Acceptor::new().with_read_deadline(read_deadline);
            acceptor.start_with(&config.acceptor)?;
            FileServer::new(&config.file_server).run(acceptor)?;
        }
        Commands::Echo => {
            let mut acceptor = Acceptor::new().with_read_deadline(read_deadline);
            acceptor.start_with(&config.acceptor)?;
            let mut stream = acceptor.accept()?;
            let result = echo_session(&mut stream, MAX_MESSAGE);
            acceptor.close(stream);
            result?;
        }
        Commands::Ping { message } => {
            let connector = Connector::from_config(&config.connector, read_deadline);
            let mut stream = connector.connect_with(&config.connector)?;
            stream.write_string(&message)?;
            let reply = stream.read_str_bounded(MAX_MESSAGE)?;
            println!("{}", reply);
            connector.close(stream);
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
