//! liftboard - Strength training progress dashboard
//!
//! Charts every tracked lift for every user on the server, one line per user.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use liftboard::client::ApiClient;
use liftboard::config::{DashboardConfig, DEFAULT_SERVER, DEFAULT_UPLOAD_TIMEOUT_SECS};
use liftboard::controller::DashboardController;
use liftboard::render::RetainedCharts;
use liftboard::tui::App;

#[derive(Parser)]
#[command(name = "liftboard")]
#[command(author, version, about = "Strength training dashboard")]
struct Cli {
    /// Dashboard server base URL
    #[arg(long, global = true, env = "LIFTBOARD_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Seconds to wait for the server before aborting an upload
    #[arg(
        long,
        global = true,
        env = "LIFTBOARD_UPLOAD_TIMEOUT_SECS",
        default_value_t = DEFAULT_UPLOAD_TIMEOUT_SECS
    )]
    upload_timeout_secs: u64,

    /// Exercise to chart, repeatable or comma separated
    #[arg(long = "exercise", global = true, env = "LIFTBOARD_EXERCISES", value_delimiter = ',')]
    exercises: Vec<String>,

    /// Treat the dataset as flat (no grouping controls)
    #[arg(long, global = true)]
    flat: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui,

    /// Fetch the dataset once and print every chart
    Show {
        /// Metric field (maxOneRepMax, maxWeight, totalVolume)
        #[arg(short, long)]
        metric: Option<String>,

        /// Grouping key (0 = sets, 1 = day, 2 = week, 3 = month)
        #[arg(short, long)]
        grouping: Option<String>,
    },

    /// Upload a workout export
    Upload {
        /// User the data belongs to
        #[arg(short, long)]
        user: String,

        /// CSV export (Strong or DailyStrength)
        #[arg(short, long)]
        file: PathBuf,
    },
}

impl Cli {
    fn dashboard_config(&self) -> DashboardConfig {
        let config = DashboardConfig::default()
            .with_server(&self.server)
            .with_exercises(&self.exercises)
            .with_upload_timeout(Duration::from_secs(self.upload_timeout_secs));

        if self.flat { config.without_groupings() } else { config }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Logs go to stderr so they stay out of the dashboard
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.dashboard_config();

    match cli.command {
        Some(Commands::Show { metric, grouping }) => {
            let client = ApiClient::new(&config);
            let mut dashboard = DashboardController::new(config, RetainedCharts::new());

            if let Some(metric) = metric {
                dashboard.select_metric(&metric)?;
            }
            if let Some(grouping) = grouping {
                dashboard.select_grouping(&grouping)?;
            }

            let dataset = client.fetch_dataset().await?;
            dashboard.finish_load(Ok(dataset));

            println!(
                "Metric: {} | Grouping: {}",
                dashboard.selection().metric(),
                dashboard.selection().grouping().unwrap_or("none")
            );
            println!("{:-<60}", "");
            for chart in dashboard.charts().live() {
                println!("{}\n", chart.describe());
            }
        }

        Some(Commands::Upload { user, file }) => {
            let client = ApiClient::new(&config);
            let outcome = client.upload(&user, &file).await?;
            println!("Upload: {} {}", outcome.status, outcome.verdict.describe());
            if !outcome.verdict.is_accepted() {
                bail!("server did not accept the upload");
            }
        }

        Some(Commands::Tui) | None => {
            let mut app = App::new(config);
            app.run()?;
        }
    }

    Ok(())
}
