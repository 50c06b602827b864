use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{FixedOffset, Utc};
use clap::{Parser, Subcommand};
use log::{info, warn};

mod aggregate;
mod error;
mod identity;
mod models;
mod normalize;
mod pass;
mod present;
mod rank;
mod source;
mod window;

use aggregate::TodayTally;
use models::LeaderboardView;
use normalize::Normalizer;
use pass::{Pass, Settings};
use present::{JsonPresenter, MarkdownPresenter, Presenter, TerminalPresenter};
use rank::RankOptions;
use source::DataSource;
use window::{WindowKind, WindowPolicy};

const DEFAULT_SOURCE: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vTAhxSgkKqKMBBh--ANLq5BborX1XRoW1GVsLp2G6di80-ectAgXmcRJzn9K-rhJyR2TuIQuD-EDu_i/pub?output=csv";

#[derive(Parser)]
#[command(name = "pushup-leaderboard")]
#[command(about = "Leaderboard and running total for a pushup challenge sheet", long_about = None)]
struct Cli {
    /// Submissions CSV: an http(s) URL or a local file
    #[arg(long, default_value = DEFAULT_SOURCE, env = "PUSHUP_SOURCE", global = true)]
    source: String,

    /// How "today" is measured
    #[arg(long, value_enum, default_value_t = WindowKind::Rolling, env = "PUSHUP_WINDOW", global = true)]
    window: WindowKind,

    /// Reference offset for the calendar window, e.g. -05:00
    #[arg(
        long,
        default_value = "+00:00",
        value_parser = parse_offset,
        allow_hyphen_values = true,
        env = "PUSHUP_UTC_OFFSET",
        global = true
    )]
    utc_offset: FixedOffset,

    /// Offset of timestamps in the sheet that carry no zone
    #[arg(
        long,
        default_value = "+00:00",
        value_parser = parse_offset,
        allow_hyphen_values = true,
        env = "PUSHUP_SOURCE_OFFSET",
        global = true
    )]
    source_offset: FixedOffset,

    /// How several submissions on the same day combine
    #[arg(long, value_enum, default_value_t = TodayTally::Latest, env = "PUSHUP_TODAY_TALLY", global = true)]
    today_tally: TodayTally,

    /// Mark the last place of the full leaderboard
    #[arg(long, env = "PUSHUP_MARK_LAST", global = true)]
    mark_last: bool,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a leaderboard to the terminal
    Show {
        #[arg(long, value_enum, default_value_t = LeaderboardView::AllTime)]
        view: LeaderboardView,
        #[arg(long)]
        limit: Option<usize>,
        /// Refresh every SECS seconds until interrupted
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },
    /// Write a markdown report with every view
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Export a leaderboard as JSON
    Export {
        #[arg(long, value_enum, default_value_t = LeaderboardView::AllTime)]
        view: LeaderboardView,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            normalizer: Normalizer::new(self.source_offset),
            window: WindowPolicy::new(self.window, self.utc_offset),
            tally: self.today_tally,
            rank: RankOptions {
                mark_last: self.mark_last,
            },
        }
    }
}

fn parse_offset(value: &str) -> Result<FixedOffset, String> {
    value
        .parse::<FixedOffset>()
        .map_err(|err| format!("expected an offset like +05:30 or -05:00: {err}"))
}

/// Fetch the sheet and fold it. Nothing is rendered unless this succeeds.
async fn load_pass(source: &DataSource, settings: Settings) -> anyhow::Result<Pass> {
    let text = source
        .fetch()
        .await
        .with_context(|| format!("failed to load submissions from {source}"))?;
    let pass = Pass::run(&text, Utc::now(), settings).context("failed to parse submissions")?;
    Ok(pass)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let source = DataSource::parse(&cli.source);
    let settings = cli.settings();
    info!("reading submissions from {source}, today = {}", settings.window);

    match cli.command {
        Commands::Show { view, limit, watch } => {
            let mut presenter = TerminalPresenter::new(std::io::stdout(), limit);

            let Some(secs) = watch else {
                let pass = load_pass(&source, settings).await?;
                presenter.present(&[pass.leaderboard(view)])?;
                return Ok(());
            };

            let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
            loop {
                interval.tick().await;
                match load_pass(&source, settings).await {
                    Ok(pass) => presenter.present(&[pass.leaderboard(view)])?,
                    Err(err) => warn!("refresh failed, keeping the previous leaderboard: {err:#}"),
                }
            }
        }
        Commands::Report { out, limit } => {
            let pass = load_pass(&source, settings).await?;
            let boards = [
                pass.leaderboard(LeaderboardView::AllTime),
                pass.leaderboard(LeaderboardView::Today),
                pass.leaderboard(LeaderboardView::Submissions),
            ];
            MarkdownPresenter::new(out.clone(), Some(limit)).present(&boards)?;
            println!(
                "Report written to {} ({} pushups so far, today = {}).",
                out.display(),
                pass.grand_total(),
                pass.window()
            );
        }
        Commands::Export { view, out } => {
            let pass = load_pass(&source, settings).await?;
            let board = pass.leaderboard(view);
            let exported = board.entries.len();
            match out {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    JsonPresenter::new(std::io::BufWriter::new(file)).present(&[board])?;
                    info!("exported {exported} entries to {}", path.display());
                }
                None => JsonPresenter::new(std::io::stdout().lock()).present(&[board])?,
            }
        }
    }

    Ok(())
}
