use std::io;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};

mod app;
mod config;
mod dashboard;
mod error;
mod gateway;
mod grant_detail;
mod models;
mod prompt;
mod render;
mod report;
mod resolver;
mod routes;
mod store;
#[cfg(test)]
mod testing;
mod wizard;

use app::App;
use config::Config;
use dashboard::{Dashboard, DashboardData, DashboardView};
use gateway::HttpGateway;
use prompt::Prompt;
use routes::Route;
use store::{IdentityStore, SqliteIdentityStore, PROFILE_ID_KEY};

#[derive(Parser)]
#[command(name = "grant-match")]
#[command(about = "Build a profile and browse ranked grant matches", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the local identity store
    InitStore,
    /// Check that the grant API is reachable
    Ping,
    /// Print the active profile id
    Whoami,
    /// Create a profile, then open its dashboard
    Onboard,
    /// Show ranked grant matches
    Dashboard {
        #[arg(long)]
        profile_id: Option<String>,
    },
    /// Show one grant's details
    Grant {
        grant_id: String,
        #[arg(long)]
        profile_id: Option<String>,
    },
    /// Open a page by route, e.g. /grants/g1?profileId=p1
    Open { route: Route },
    /// Write a markdown report of the ranked matches
    Report {
        #[arg(long)]
        profile_id: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write the ranked matches as CSV
    Export {
        #[arg(long)]
        profile_id: Option<String>,
        #[arg(long)]
        csv: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.config.init_tracing();

    let store = SqliteIdentityStore::connect(&cli.config.state_db)
        .await
        .with_context(|| format!("failed to open identity store {}", cli.config.state_db))?;
    store.init().await.context("failed to prepare identity store")?;

    let gateway = HttpGateway::new(&cli.config.api_url, cli.config.timeout())
        .context("failed to build HTTP client")?;

    let start = match cli.command {
        Commands::InitStore => {
            println!("Identity store ready.");
            return Ok(());
        }
        Commands::Ping => {
            gateway
                .ping()
                .await
                .with_context(|| format!("grant API at {} is not reachable", cli.config.api_url))?;
            println!("Grant API at {} is up.", cli.config.api_url);
            return Ok(());
        }
        Commands::Whoami => {
            match store.get(PROFILE_ID_KEY).await? {
                Some(id) => println!("{id}"),
                None => println!("No active profile."),
            }
            return Ok(());
        }
        Commands::Report { profile_id, out } => {
            let data = load_ready(&gateway, &store, profile_id.as_deref()).await?;
            let report = report::build_report(&data, Utc::now().date_naive());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
            return Ok(());
        }
        Commands::Export { profile_id, csv } => {
            let data = load_ready(&gateway, &store, profile_id.as_deref()).await?;
            let written = report::export_csv(&data, &csv)?;
            println!("Exported {written} matches to {}.", csv.display());
            return Ok(());
        }
        Commands::Onboard => Route::Onboarding,
        Commands::Dashboard { profile_id } => Route::dashboard(profile_id.as_deref()),
        Commands::Grant {
            grant_id,
            profile_id,
        } => Route::GrantDetail {
            grant_id,
            profile_id,
        },
        Commands::Open { route } => route,
    };

    let stdin = io::stdin();
    let prompt = Prompt::new(stdin.lock(), io::stdout());
    App::new(&gateway, &store, prompt).run(start).await
}

/// Runs the dashboard sequence without the interactive loop.
async fn load_ready(
    gateway: &HttpGateway,
    store: &SqliteIdentityStore,
    profile_id: Option<&str>,
) -> anyhow::Result<DashboardData> {
    let dashboard = Dashboard::new(gateway, store);
    dashboard.load(profile_id).await;

    match dashboard.view() {
        DashboardView::Ready(data) => Ok(data),
        DashboardView::RedirectToOnboarding => {
            anyhow::bail!("no active profile; run `grant-match onboard` first")
        }
        DashboardView::Failed { message } => anyhow::bail!(message),
        DashboardView::Loading => anyhow::bail!("dashboard did not finish loading"),
    }
}
