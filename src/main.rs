use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;

use wirewizard::census;
use wirewizard::config::load_settings;
use wirewizard::provision;
use wirewizard::store::ConfigStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = load_settings(cli.config.map(PathBuf::from))?;
    let store = ConfigStore::open(&settings.store_dir, &settings.scratch_dir)?;
    match cli.cmd {
        Cmd::AddServer => {
            let _ = provision::add_server(&settings, &store)?;
        }
        Cmd::AddClient { name, dns } => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            let _ = provision::add_client(&settings, &store, &name, dns, &mut input, &mut output)?;
        }
        Cmd::List => {
            let servers = census::list_servers_with_counts(&store)?;
            census::write_census(&mut io::stdout(), &servers);
        }
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "ww")]
#[command(version, about = "WireGuard fleet provisioning")]
struct Cli {
    /// Path to the settings file (default: wirewizard.toml)
    #[arg(long)]
    config: Option<String>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Provision the next free wg interface
    AddServer,
    /// Provision a client on an existing interface
    AddClient {
        /// Client name, becomes <name>.conf
        name: String,
        /// Write a DNS line into the client config
        #[arg(long)]
        dns: bool,
    },
    /// List servers with their client counts
    List,
}
