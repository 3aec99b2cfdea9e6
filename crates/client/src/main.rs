pub mod net;
mod tui;

use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::{Builder, Env, Target};

use net::ClientConfig;

#[derive(Parser)]
#[command(name = "gambit")]
#[command(about = "Terminal client for online chess")]
struct Args {
    #[arg(
        short,
        long,
        env = "GAMBIT_SERVER",
        help = "WebSocket URL of the game server (e.g., ws://localhost:8080)"
    )]
    server: Option<String>,

    #[arg(short, long, help = "Register with this username on connect")]
    username: Option<String>,

    #[arg(short, long, help = "Search for a game with this many seconds per side")]
    time_control: Option<u32>,

    #[arg(short, long, help = "JSON config file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Write logs to this file instead of stderr")]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match &args.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            Builder::from_env(Env::default().default_filter_or("info"))
                .target(Target::Pipe(Box::new(file)))
                .init();
        }
        None => env_logger::init(),
    }

    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(server) = args.server {
        config.server_url = server;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    log::info!("Starting client for {}", config.server_url);

    let autostart = tui::Autostart {
        username: args.username,
        time_control: args.time_control,
    };
    tui::run(runtime.handle().clone(), config, autostart)?;

    log::info!("Exiting");
    Ok(())
}
