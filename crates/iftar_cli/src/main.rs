//! Iftar Fund CLI
//!
//! Check campaign progress, record donations, and get UPI payment details.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iftar_animation::FrameScheduler;
use iftar_app::{
    copy_upi_id, plan_payment, share_campaign, CampaignView, MemoryClipboard, Notification,
    NotificationLevel, PaymentAction, ShareOutcome, StatsSynchronizer, ToastQueue, UserAgent,
    PRESET_AMOUNTS,
};
use iftar_core::{meals_for_amount, CampaignBackend, MemoryBackend};
use iftar_query::{QueryClient, QueryStatus};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod ledger;

use config::{CampaignConfig, CONFIG_FILE};

/// User agent reported by `pay --mobile`
const MOBILE_USER_AGENT: &str =
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Mobile Safari/537.36";

#[derive(Parser)]
#[command(name = "iftar")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ramadan Iftar Fund campaign client", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding iftar.toml and the donation ledger
    #[arg(short = 'C', long, global = true, default_value = ".")]
    dir: PathBuf,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show campaign progress
    Stats,

    /// List recorded donations
    History,

    /// Record a donation (in rupees)
    Donate {
        /// Amount in rupees, e.g. 500
        amount: String,
    },

    /// Show how to pay, as a UPI link on mobile or payee details otherwise
    Pay {
        /// Amount in rupees
        amount: Option<u64>,

        /// Browser user agent to plan the payment for
        #[arg(long)]
        user_agent: Option<String>,

        /// Plan the payment for a mobile browser
        #[arg(long, conflicts_with = "user_agent")]
        mobile: bool,
    },

    /// Copy the UPI ID
    CopyUpi,

    /// Share the campaign link
    Share,

    /// Live campaign counters, refreshed on the poll interval
    Watch {
        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },

    /// Create iftar.toml in the campaign directory
    Init {
        /// Overwrite an existing iftar.toml
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Stats => cmd_stats(&cli.dir, cli.json).await,
        Commands::History => cmd_history(&cli.dir, cli.json).await,
        Commands::Donate { amount } => cmd_donate(&cli.dir, &amount, cli.json).await,
        Commands::Pay {
            amount,
            user_agent,
            mobile,
        } => cmd_pay(&cli.dir, amount, user_agent, mobile, cli.json),
        Commands::CopyUpi => cmd_copy_upi(&cli.dir),
        Commands::Share => cmd_share(&cli.dir),
        Commands::Watch { seconds } => cmd_watch(&cli.dir, seconds, cli.json).await,
        Commands::Init { force } => cmd_init(&cli.dir, force),
    }
}

/// A mounted synchronizer over the replayed ledger
struct Session {
    dir: PathBuf,
    config: CampaignConfig,
    backend: Arc<MemoryBackend>,
    toasts: Arc<ToastQueue>,
    sync: StatsSynchronizer,
}

impl Session {
    fn open(dir: &Path) -> Result<Self> {
        let config = CampaignConfig::load_or_default(dir)?;
        let donations = ledger::load(dir)?;
        let backend = Arc::new(
            MemoryBackend::with_target(config.campaign.target_meals).with_donations(donations),
        );
        let toasts = Arc::new(ToastQueue::new());
        let sync = StatsSynchronizer::mount(
            QueryClient::new(),
            Arc::clone(&backend),
            toasts.clone(),
            config.sync_options(),
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            backend,
            toasts,
            sync,
        })
    }

    /// Wait until no stats fetch is in flight
    async fn settled(&self) -> Result<()> {
        let mut rx = self.sync.subscribe_stats();
        rx.wait_for(|s| is_settled(s.status()))
            .await
            .context("stats query dropped")?;
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        let donations = self
            .backend
            .get_all_donations()
            .await
            .context("Failed to read donations back")?;
        ledger::save(&self.dir, &donations)
    }

    fn print_toasts(&self) {
        print_toasts(&self.toasts);
    }
}

fn is_settled(status: QueryStatus) -> bool {
    matches!(status, QueryStatus::Resolved | QueryStatus::StaleError)
}

fn print_toasts(toasts: &ToastQueue) {
    for Notification {
        level,
        title,
        description,
        ..
    } in toasts.drain()
    {
        let mark = match level {
            NotificationLevel::Success => "✔",
            NotificationLevel::Error => "✘",
            NotificationLevel::Info => "•",
        };
        println!("{} {}", mark, title);
        if let Some(description) = description {
            println!("  {}", description);
        }
    }
}

async fn cmd_stats(dir: &Path, json: bool) -> Result<()> {
    let session = Session::open(dir)?;
    session.settled().await?;

    let state = session.sync.stats_state();
    let Some(stats) = state.data else {
        let reason = state.error.map(|e| e.to_string()).unwrap_or_default();
        anyhow::bail!("Campaign stats unavailable: {}", reason);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&*stats)?);
        return Ok(());
    }

    println!("{}", session.config.campaign.name);
    println!("{}", "=".repeat(session.config.campaign.name.chars().count()));
    println!(
        "Meals sponsored: {} / {}",
        stats.meals_sponsored, stats.target_meals
    );
    println!("Total raised:    ₹{}", stats.total_amount);
    println!("Progress:        {:.1}% complete", stats.percentage_complete);
    println!("Still needed:    {} meals", stats.meals_remaining());

    Ok(())
}

async fn cmd_history(dir: &Path, json: bool) -> Result<()> {
    let session = Session::open(dir)?;
    let state = session
        .sync
        .subscribe_donations()
        .wait_for(|s| is_settled(s.status()))
        .await
        .context("donation history query dropped")?
        .clone();

    let Some(history) = state.data else {
        let reason = state.error.map(|e| e.to_string()).unwrap_or_default();
        anyhow::bail!("Failed to load donation history: {}", reason);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&*history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No donations recorded yet.");
        return Ok(());
    }

    for donation in history.iter().rev() {
        println!(
            "{:>12}  ₹{:<8} {} meals",
            donation.timestamp / 1_000_000_000,
            donation.amount,
            meals_for_amount(donation.amount)
        );
    }

    Ok(())
}

async fn cmd_donate(dir: &Path, amount: &str, json: bool) -> Result<()> {
    let session = Session::open(dir)?;
    session.settled().await?;

    let result = session.sync.record_donation_input(amount).await;
    session.print_toasts();
    let meals = result.context("Donation not recorded")?;

    session.persist().await?;
    session.settled().await?;
    info!("ledger updated in {}", session.dir.display());

    let stats = session.sync.get_stats();
    if json {
        let body = serde_json::json!({
            "meals": meals,
            "stats": stats.stats.as_deref(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else if let Some(stats) = stats.stats {
        println!(
            "Campaign now at {} / {} meals ({:.1}% complete)",
            stats.meals_sponsored, stats.target_meals, stats.percentage_complete
        );
    }

    Ok(())
}

fn cmd_pay(
    dir: &Path,
    amount: Option<u64>,
    user_agent: Option<String>,
    mobile: bool,
    json: bool,
) -> Result<()> {
    let config = CampaignConfig::load_or_default(dir)?;
    let payee = config.payee();
    let agent = if mobile {
        UserAgent::new(MOBILE_USER_AGENT)
    } else {
        UserAgent::new(user_agent.unwrap_or_else(|| format!("iftar-cli/{}", env!("CARGO_PKG_VERSION"))))
    };

    let action = plan_payment(&payee, amount.unwrap_or(0), &agent);

    if json {
        let body = match &action {
            PaymentAction::OpenUpiApp { uri } => serde_json::json!({ "action": "upi", "uri": uri }),
            PaymentAction::PayManually { payee, amount } => serde_json::json!({
                "action": "manual",
                "upi_id": payee.address,
                "payee_name": payee.name,
                "amount": amount,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    match action {
        PaymentAction::OpenUpiApp { uri } => {
            println!("Open in your UPI app:");
            println!("  {}", uri);
        }
        PaymentAction::PayManually { payee, amount } => {
            println!("Pay with any UPI app:");
            println!("  UPI ID: {}", payee.address);
            println!("  Name:   {}", payee.name);
            match amount {
                Some(amount) => println!("  Amount: ₹{}", amount),
                None => println!(
                    "  Amount: any (suggested: {})",
                    PRESET_AMOUNTS
                        .iter()
                        .map(|a| format!("₹{}", a))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }
            println!();
            println!("Then record it with `iftar donate <amount>`.");
        }
    }

    Ok(())
}

fn cmd_copy_upi(dir: &Path) -> Result<()> {
    let config = CampaignConfig::load_or_default(dir)?;
    let clipboard = MemoryClipboard::new();
    let toasts = ToastQueue::new();

    let result = copy_upi_id(&clipboard, &toasts, &config.payment.upi_id);
    print_toasts(&toasts);
    result.context("Could not copy UPI ID")?;

    if let Some(contents) = clipboard.contents() {
        println!("{}", contents);
    }
    Ok(())
}

fn cmd_share(dir: &Path) -> Result<()> {
    let config = CampaignConfig::load_or_default(dir)?;
    let clipboard = MemoryClipboard::new();
    let toasts = ToastQueue::new();
    let data = config.share_data();

    // No share sheet in a terminal; the link is copied instead
    let result = share_campaign(None, &clipboard, &toasts, &data);
    print_toasts(&toasts);

    if result.context("Could not share campaign")? == ShareOutcome::LinkCopied {
        println!("{}", data.text);
        println!("{}", data.url);
    }
    Ok(())
}

async fn cmd_watch(dir: &Path, seconds: Option<u64>, json: bool) -> Result<()> {
    let session = Session::open(dir)?;
    let scheduler = FrameScheduler::new();
    let mut view = CampaignView::with_options(
        scheduler.handle(),
        session.config.campaign.target_meals,
        session.config.animation.counter_duration_ms,
    );

    let frame_period = Duration::from_millis((1000 / session.config.animation.fps as u64).max(1));
    let mut frames = tokio::time::interval(frame_period);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let started = tokio::time::Instant::now();
    let deadline = seconds.map(|s| started + Duration::from_secs(s));
    let mut last = None;
    let mut stdout = std::io::stdout();

    info!(
        "watching campaign, polling every {}s",
        session.config.sync.poll_interval_secs
    );

    loop {
        tokio::select! {
            _ = frames.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
            break;
        }

        view.apply(&session.sync.get_stats());
        scheduler.tick(started.elapsed().as_secs_f64() * 1000.0);

        let frame = view.frame();
        if last.as_ref() == Some(&frame) {
            continue;
        }

        if json {
            writeln!(stdout, "{}", serde_json::to_string(&frame)?)?;
        } else {
            write!(
                stdout,
                "\r{} meals sponsored | {} raised | {} of {} meals ({})   ",
                frame.meals, frame.total, frame.percentage, frame.target_meals, frame.progress_label
            )?;
        }
        stdout.flush()?;
        last = Some(frame);
    }

    if !json {
        writeln!(stdout)?;
    }
    Ok(())
}

fn cmd_init(dir: &Path, force: bool) -> Result<()> {
    if dir.join(CONFIG_FILE).exists() && !force {
        anyhow::bail!(
            "{} already contains a {}. Use --force to overwrite it.",
            dir.display(),
            CONFIG_FILE
        );
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    CampaignConfig::default().save_to_dir(dir)?;

    info!("Created {}", dir.join(CONFIG_FILE).display());
    println!("Created {}", dir.join(CONFIG_FILE).display());
    println!("Run `iftar stats` to see campaign progress");

    Ok(())
}
