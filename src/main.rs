// ipfs-stac - IPFS-backed STAC asset client
// Command-line entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use ipfs_stac::api::AddOptions;
use ipfs_stac::catalog::SearchParams;
use ipfs_stac::cid::Cid;
use ipfs_stac::client::Client;
use ipfs_stac::config::load_config;
use ipfs_stac::fetch::IndicatifReporter;

#[derive(Parser, Debug)]
#[command(name = "ipfs-stac")]
#[command(about = "IPFS-backed STAC asset client", version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Do not probe or launch a local daemon
    #[arg(long = "no-daemon")]
    no_daemon: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Fetch a CID and print its bytes to stdout
    Fetch {
        /// Content identifier to fetch
        cid: String,
    },
    /// Fetch a CID and write it to a file
    Get {
        cid: String,
        /// Output path
        output: PathBuf,
    },
    /// Add a local file to the node and print its CID
    Add {
        path: PathBuf,
        /// Skip pinning the added content
        #[arg(long = "no-pin")]
        no_pin: bool,
    },
    /// Pin a CID on the node
    Pin { cid: String },
    /// List pinned CIDs
    Pins,
    /// Search the configured STAC catalog by bounding box
    Search {
        /// Bounding box: west,south,east,north
        #[arg(long, value_delimiter = ',', num_args = 4)]
        bbox: Vec<f64>,
        /// Collection names to filter by
        #[arg(long, value_delimiter = ',')]
        collections: Vec<String>,
        /// Maximum number of items
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Ensure the local daemon is running
    DaemonStart,
    /// Stop a daemon launched by this client
    DaemonStop,
    /// Show whether the local node answers its identity endpoint
    DaemonStatus,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let mut config = load_config().context("Failed to load configuration")?;
    if args.no_daemon {
        config.auto_spawn = false;
    }

    match args.command {
        Command::Fetch { cid } => {
            let client = Client::connect(config).await?;
            let reporter = IndicatifReporter::new();
            let payload = client
                .fetch_with_progress(&Cid::new(cid), &reporter)
                .await?;
            use std::io::Write;
            std::io::stdout().write_all(&payload)?;
        }
        Command::Get { cid, output } => {
            let client = Client::connect(config).await?;
            let cid = Cid::new(cid);
            client.write_cid(&cid, &output).await?;
            println!("Wrote {} to {}", cid, output.display());
        }
        Command::Add { path, no_pin } => {
            let client = Client::connect(config).await?;
            let opts = AddOptions {
                pin: !no_pin,
                ..AddOptions::default()
            };
            let cid = client.add_file(&path, &opts).await?;
            println!("{cid}");
        }
        Command::Pin { cid } => {
            let client = Client::connect(config).await?;
            client.pin(&Cid::new(cid)).await?;
            println!("Pinned");
        }
        Command::Pins => {
            let client = Client::connect(config).await?;
            for cid in client.pinned_list().await? {
                println!("{cid}");
            }
        }
        Command::Search {
            bbox,
            collections,
            limit,
        } => {
            let client = Client::connect(config).await?;
            let mut params = SearchParams::default().limit(limit);
            if bbox.len() == 4 {
                params = params.bbox([bbox[0], bbox[1], bbox[2], bbox[3]]);
            }
            if !collections.is_empty() {
                params = params.collections(collections);
            }
            let items = client.search(&params).await?;
            for item in &items.features {
                println!("{}", item.id);
            }
        }
        Command::DaemonStart => {
            let client = Client::connect(config).await?;
            println!("Daemon running at {}", client.config().api_url());
        }
        Command::DaemonStop => {
            let api = ipfs_stac::api::NodeApi::new(&config)?;
            api.shutdown().await?;
            println!("Daemon stopping");
        }
        Command::DaemonStatus => {
            // Status should never launch a daemon as a side effect.
            let api = ipfs_stac::api::NodeApi::new(&config)?;
            match api.id().await {
                Ok(identity) => {
                    let id = identity
                        .get("ID")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown");
                    println!("Daemon reachable (peer {id})");
                }
                Err(err) => {
                    println!("Daemon unreachable: {err}");
                }
            }
        }
    }

    Ok(())
}
