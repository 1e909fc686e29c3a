//! raidd - raid coordination daemon
//!
//! `serve` runs the expiry sweep against the configured storage. The other
//! subcommands are one-shot operator tools against the same storage; with
//! the in-memory backend they only see the raids they create themselves.

use clap::{Parser, Subcommand};
use raid_daemon::{Daemon, DaemonResult, RaiddConfig};
use raid_runtime::Summary;
use raid_types::{parse_boosted, Action, RaidId, UserId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// raidd CLI
#[derive(Parser)]
#[command(name = "raidd")]
#[command(about = "Raid coordination daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "RAIDD_CONFIG")]
    config: Option<String>,

    /// Log level, overrides the configured one
    #[arg(long, env = "RAIDD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "RAIDD_LOG_JSON")]
    json: bool,

    /// Print summaries as JSON
    #[arg(long, global = true)]
    output_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the daemon until interrupted
    Serve,

    /// Open a raid
    Open {
        /// Raid boss or subject
        #[arg(long)]
        subject: String,

        /// yes / no
        #[arg(long, default_value = "no", value_parser = parse_boosted)]
        boosted: bool,

        /// Invite window in minutes
        #[arg(long)]
        minutes: Option<u64>,

        /// Initiator user id
        #[arg(long)]
        initiator: String,
    },

    /// Record a response: join, leave, maybe, plus1
    Respond {
        #[arg(long)]
        raid: RaidId,

        #[arg(long)]
        user: String,

        #[arg(long)]
        action: Action,
    },

    /// Close a raid now
    Close {
        #[arg(long)]
        raid: RaidId,
    },

    /// List raids still accepting responses
    List,

    /// Show a raid's summary
    Show {
        #[arg(long)]
        raid: RaidId,
    },
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    let mut config = RaiddConfig::load(cli.config.as_deref())?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json {
        config.logging.json = true;
    }

    init_tracing(&config);

    let daemon = Daemon::new(config.clone()).await?;
    let result = run(&cli, &config, &daemon).await;
    daemon.shutdown().await;
    result
}

fn init_tracing(config: &RaiddConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn run(cli: &Cli, config: &RaiddConfig, daemon: &Daemon) -> DaemonResult<()> {
    let coordinator = daemon.coordinator();

    match &cli.command {
        Command::Serve => daemon.run().await,
        Command::Open {
            subject,
            boosted,
            minutes,
            initiator,
        } => {
            let opened = coordinator
                .open_raid(
                    subject,
                    *boosted,
                    config.raids.invite_window(*minutes),
                    UserId::new(initiator.as_str()),
                )
                .await?;
            print_summary(&opened.summary, cli.output_json)
        }
        Command::Respond { raid, user, action } => {
            let summary = coordinator
                .respond_action(raid, &UserId::new(user.as_str()), *action, coordinator.now())
                .await?;
            print_summary(&summary, cli.output_json)
        }
        Command::Close { raid } => {
            let summary = coordinator.close_raid(raid).await?;
            print_summary(&summary, cli.output_json)
        }
        Command::List => {
            let now = coordinator.now();
            let lines = coordinator.open_raids_listing(now).await?;
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&lines)?);
            } else {
                println!("{}", coordinator.renderer().render_listing(&lines));
            }
            Ok(())
        }
        Command::Show { raid } => {
            let summary = coordinator.summary(raid, coordinator.now()).await?;
            print_summary(&summary, cli.output_json)
        }
    }
}

fn print_summary(summary: &Summary, json: bool) -> DaemonResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}
