use alloy::primitives::Address;
use alloy::providers::ProviderBuilder;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hunty_indexer::{IndexerConfig, LeaderboardService, RpcLogSource};
use hunty_leaderboard::{
    format_cusd, GlobalLeaderboardEntry, HuntLeaderboardEntry, Leaderboard, MAX_LEADERBOARD_SIZE,
};
use tabled::{builder::Builder, settings::Style};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hunty-leaderboard")]
#[command(about = "Builds Hunty treasure hunt leaderboards from on-chain events")]
struct Cli {
    #[command(flatten)]
    config: IndexerConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank the players of one hunt
    Hunt {
        hunt_id: u64,

        /// Number of entries to show
        #[arg(long, default_value_t = MAX_LEADERBOARD_SIZE)]
        limit: usize,

        /// Also report this player's position
        #[arg(long)]
        player: Option<Address>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Rank players across every hunt
    Global {
        /// Number of entries to show
        #[arg(long, default_value_t = MAX_LEADERBOARD_SIZE)]
        limit: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli.config.validate().context("invalid configuration")?;

    let provider = ProviderBuilder::new()
        .connect(&cli.config.rpc_url)
        .await
        .with_context(|| format!("failed to connect provider to {}", cli.config.rpc_url))?;
    let service = LeaderboardService::from_config(RpcLogSource::new(provider), &cli.config);

    match cli.command {
        Command::Hunt {
            hunt_id,
            limit,
            player,
            json,
        } => {
            let entries = service
                .hunt_leaderboard(hunt_id)
                .await
                .with_context(|| format!("failed to build leaderboard for hunt {hunt_id}"))?;
            let statistics = Leaderboard::hunt_statistics(&entries);
            let rank = player.map(|player| (player, Leaderboard::player_rank(&entries, &player)));
            let shown = Leaderboard::top(&entries, limit);

            if json {
                let output = serde_json::json!({
                    "hunt_id": hunt_id,
                    "entries": shown,
                    "statistics": statistics,
                    "player_rank": rank.and_then(|(_, rank)| rank),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            if shown.is_empty() {
                println!("No players found for hunt {hunt_id}");
            } else {
                println!("{}", hunt_table(&shown));
            }
            println!(
                "Players: {}  Completed: {} ({}%)  Average clues: {}  Rewards paid: {} cUSD",
                statistics.total_players,
                statistics.completed_count,
                statistics.completion_rate_percent,
                statistics.average_clues_solved,
                format_cusd(statistics.total_rewards_paid),
            );
            if let Some(fastest) = statistics.fastest_time {
                println!("Fastest completion: {}", format_duration(fastest));
            }
            match rank {
                Some((player, Some(rank))) => println!("{player} is ranked #{rank}"),
                Some((player, None)) => println!("{player} has not played hunt {hunt_id}"),
                None => {}
            }
        }
        Command::Global { limit, json } => {
            let entries = service
                .global_leaderboard()
                .await
                .context("failed to build global leaderboard")?;
            let shown = Leaderboard::top(&entries, limit);

            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else if shown.is_empty() {
                println!("No players found");
            } else {
                println!("{}", global_table(&shown));
            }
        }
    }

    Ok(())
}

fn hunt_table(entries: &[HuntLeaderboardEntry]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Rank", "Player", "Clues", "Time", "Status", "Reward"]);
    for entry in entries {
        builder.push_record([
            entry.rank.to_string(),
            entry.player.to_string(),
            entry.clues_completed.to_string(),
            entry.total_time.map(format_duration).unwrap_or_else(|| "-".into()),
            if entry.is_completed { "Completed" } else { "In progress" }.to_string(),
            format!("{} cUSD", format_cusd(entry.reward)),
        ]);
    }
    builder.build().with(Style::modern()).to_string()
}

fn global_table(entries: &[GlobalLeaderboardEntry]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Rank", "Player", "Hunts", "Rewards", "Clues", "Best completion"]);
    for entry in entries {
        builder.push_record([
            entry.rank.to_string(),
            entry.player.to_string(),
            entry.hunts_completed.to_string(),
            format!("{} cUSD", format_cusd(entry.total_rewards)),
            entry.total_clues_solved.to_string(),
            entry
                .best_completion_time
                .map(|timestamp| timestamp.to_string())
                .unwrap_or_else(|| "-".into()),
        ]);
    }
    builder.build().with(Style::modern()).to_string()
}

fn format_duration(seconds: u64) -> String {
    let (hours, minutes, seconds) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
