use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use rings_chord::delegate::LoggingDelegate;
use rings_chord::ring::Ring;
use rings_chord::ring::RingEvent;
use rings_chord::transport::MemoryTransport;
use rings_chord_node::config;
use rings_chord_node::logging::init_logging;
use rings_chord_node::logging::LogLevel;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser, Debug)]
#[command(about, version, author)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(
        long,
        value_enum,
        global = true,
        env,
        help = "Log level. If not provided, use log_level in config file or info"
    )]
    log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Command {
    #[command(about = "Writes a default configuration file.")]
    Init(InitCommand),
    #[command(about = "Starts a long-running ring of local vnodes.")]
    Run(RunCommand),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[arg(
        long,
        short = 'c',
        env,
        default_value = config::DEFAULT_CONFIG_LOCATION,
        help = "Config file location"
    )]
    pub config: String,
}

#[derive(Args, Debug)]
struct InitCommand {
    #[arg(
        long,
        default_value = config::DEFAULT_CONFIG_LOCATION,
        help = "The location of config file"
    )]
    pub location: String,

    #[arg(
        long,
        help = "Address host:port of this node. If not provided, use 127.0.0.1:30001"
    )]
    pub hostname: Option<String>,
}

#[derive(Args, Debug)]
struct RunCommand {
    #[command(flatten)]
    config_args: ConfigArgs,
}

fn inspect(ring: &Ring) {
    for local in ring.vnodes() {
        match local.export().and_then(|s| s.to_json()) {
            Ok(json) => tracing::info!("vnode {} topology {}", local.vnode(), json),
            Err(e) => tracing::warn!("failed to export vnode {}: {}", local.vnode(), e),
        }
    }
}

async fn daemon_run(c: config::Config) -> anyhow::Result<()> {
    let ring = Ring::new(
        c.ring.clone(),
        Arc::new(MemoryTransport::new()),
        Arc::new(LoggingDelegate),
    )?;
    ring.create()?;
    let mut events = ring.subscribe();
    ring.start()?;
    for local in ring.vnodes() {
        println!("Vnode: {} at {}", local.vnode(), local.vnode().host);
    }

    let mut inspect_timer = tokio::time::interval(c.inspect_interval());
    loop {
        tokio::select! {
            _ = inspect_timer.tick() => inspect(&ring),
            event = events.recv() => match event {
                Ok(RingEvent::Isolated(vnode)) => {
                    ring.shutdown().await?;
                    anyhow::bail!("vnode {} is isolated from the ring", vnode);
                }
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("missed {} ring events", n);
                }
                Err(RecvError::Closed) => {
                    ring.shutdown().await?;
                    return Ok(());
                }
            },
            ret = tokio::signal::ctrl_c() => {
                ret?;
                tracing::info!("received ctrl-c, leaving the ring");
                if let Err(e) = ring.leave().await {
                    tracing::warn!("leave finished with errors: {}", e);
                }
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init(args) => {
            init_logging(cli.log_level.unwrap_or_default());
            let config = match args.hostname {
                Some(hostname) => config::Config::new(&hostname),
                None => config::Config::default(),
            };
            config.validate()?;
            let p = config.write_fs(args.location.as_str())?;
            println!("Your config file has saved to: {}", p);
            Ok(())
        }
        Command::Run(args) => {
            let c = config::Config::read_fs(args.config_args.config.as_str())?;
            init_logging(cli.log_level.unwrap_or(c.log_level));
            daemon_run(c).await
        }
    }
}
