mod commands;
mod logging;
mod mailchimp;
mod render;
mod spreadsheet;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use newsletter_core::config::NewsletterConfig;
use newsletter_core::pipeline::ContentMode;
use owo_colors::OwoColorize;
use simplelog::LevelFilter;

use commands::Status;

#[derive(Parser)]
#[command(name = "newsletter")]
#[command(about = "Build tomorrow's events newsletter from a spreadsheet and schedule it on Mailchimp")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Direct download link to the events spreadsheet (overrides config)
    #[arg(long, global = true)]
    sheet_url: Option<String>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone the latest campaign with upcoming events and schedule it for tomorrow
    Run {
        /// Build and save the proposed newsletter without changing anything on Mailchimp
        #[arg(long)]
        dry_run: bool,

        /// How the new content is pushed
        #[arg(long, value_enum, default_value_t = Mode::Html)]
        mode: Mode,
    },
    /// Splice upcoming events into a local HTML file
    Preview {
        /// Campaign HTML to splice into
        #[arg(long)]
        html: PathBuf,

        /// Read events from a local workbook instead of the spreadsheet link
        #[arg(long)]
        sheet_file: Option<PathBuf>,
    },
    /// Save the latest campaign's HTML into the artifacts directory
    DumpLatest {
        /// File name inside the artifacts directory
        #[arg(long)]
        out: Option<String>,
    },
    /// Show the most recently sent campaign
    Latest,
    /// Check the Mailchimp API key and server
    Ping,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Splice the full campaign HTML
    Html,
    /// Rewrite template sections, falling back to HTML
    Sections,
}

impl From<Mode> for ContentMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Html => ContentMode::Html,
            Mode::Sections => ContentMode::Sections,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(status) => status.into(),
        Err(e) => {
            log::debug!("{e:?}");
            eprintln!("{} {e:#}", "Error:".red());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<Status> {
    dotenvy::dotenv().ok();

    let mut config = NewsletterConfig::load()?;
    if let Some(url) = cli.sheet_url {
        config.spreadsheet.url = Some(url);
    }

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let artifacts_dir = config.artifacts_dir();
    let log_dir = matches!(cli.command, Commands::Run { .. }).then_some(artifacts_dir.as_path());
    if let Some(path) = logging::init(level, log_dir)? {
        log::debug!("Logging to {}", path.display());
    }

    match cli.command {
        Commands::Run { dry_run, mode } => commands::run::run(&config, dry_run, mode.into()).await,
        Commands::Preview { html, sheet_file } => {
            commands::preview::run(&config, &html, sheet_file.as_deref()).await
        }
        Commands::DumpLatest { out } => commands::dump::run(&config, out).await,
        Commands::Latest => commands::latest::run(&config).await,
        Commands::Ping => commands::ping::run(&config).await,
    }
}
