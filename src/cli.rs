//! Command-line interface and workflow orchestration

use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::auth;
use crate::catalog::{self, SenderCatalog};
use crate::client::{GmailMailService, MailService};
use crate::config::Config;
use crate::criteria::FilterDisposition;
use crate::error::Result;
use crate::marking::{MarkingSession, StdinDecisions};
use crate::sweeper::{SweepReport, Sweeper};

#[derive(Parser, Debug)]
#[command(name = "gmail-sweep")]
#[command(version)]
#[command(about = "Interactive Gmail mailbox cleanup", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 credentials file
    #[arg(long, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Path to token cache file
    #[arg(long, default_value = ".gmail-sweep/token.json")]
    pub token_cache: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with the Gmail API
    Auth {
        /// Force re-authentication even if a cached token exists
        #[arg(long)]
        force: bool,
    },

    /// List the unique senders found in the mailbox
    Senders,

    /// Interactively mark senders and move their messages to trash
    /// (messages with the protected label are left alone)
    Sweep {
        /// Trash the whole mailbox instead of marked senders only
        #[arg(long)]
        all: bool,

        /// Discard the cached token after a successful run
        #[arg(long)]
        discard_token: bool,
    },

    /// Interactively mark senders and create a server-side filter for them
    CreateFilter,

    /// Generate an example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

/// Progress reporter using indicatif
pub struct ProgressReporter {
    multi: MultiProgress,
    spinner_style: ProgressStyle,
    bar_style: ProgressStyle,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed:>6}] {msg}")
            .unwrap()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        let bar_style = ProgressStyle::default_bar()
            .template("[{elapsed:>6}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .unwrap()
            .progress_chars("##-");

        Self {
            multi: MultiProgress::new(),
            spinner_style,
            bar_style,
        }
    }

    pub fn add_spinner(&self, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(self.spinner_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn add_progress_bar(&self, len: u64, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new(len));
        pb.set_style(self.bar_style.clone());
        pb.set_message(msg.to_string());
        pb
    }

    /// Finish a spinner and clear it from the multi-progress display
    pub fn finish_spinner(&self, pb: &ProgressBar, msg: &str) {
        pb.finish_and_clear();
        println!("  ✓ {}", msg);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Enumerate the whole mailbox, page by page, into a flat id list.
///
/// The continuation token is read from each page response; an absent token
/// ends the traversal.
pub async fn list_all_message_ids(service: &dyn MailService) -> Result<Vec<String>> {
    let mut all_ids = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = service.list_messages(cursor.as_deref()).await?;
        all_ids.extend(page.ids);

        match page.next_page_token {
            Some(token) => cursor = Some(token),
            None => break,
        }
    }

    Ok(all_ids)
}

/// Authenticate and build the production client from config
async fn connect(
    cli: &Cli,
    config: &Config,
    reporter: &ProgressReporter,
) -> Result<GmailMailService> {
    let auth_spinner = reporter.add_spinner("Authenticating with Gmail API...");
    let hub = auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache).await?;
    reporter.finish_spinner(&auth_spinner, "Gmail API authenticated");

    Ok(GmailMailService::new(
        hub,
        config.client.max_concurrent_requests,
        config.sweep.page_size,
    ))
}

/// Enumerate the mailbox and build the deduplicated sender catalog
async fn build_catalog(
    service: &dyn MailService,
    reporter: &ProgressReporter,
) -> Result<SenderCatalog> {
    let list_spinner = reporter.add_spinner("Enumerating mailbox...");
    let ids = list_all_message_ids(service).await?;
    reporter.finish_spinner(&list_spinner, &format!("Found {} messages", ids.len()));

    let pb = reporter.add_progress_bar(ids.len() as u64, "Fetching sender headers...");
    let catalog = catalog::collect_with_progress(service, &ids, |_| pb.inc(1)).await?;
    pb.finish_and_clear();
    println!("  ✓ {} unique senders", catalog.len());

    Ok(catalog)
}

/// `senders` command: print the deduplicated sender catalog
pub async fn run_senders(cli: &Cli, config: &Config) -> Result<()> {
    let reporter = ProgressReporter::new();
    let service = connect(cli, config, &reporter).await?;
    let catalog = build_catalog(&service, &reporter).await?;

    println!("\nUnique senders:");
    for identity in catalog.iter() {
        match &identity.email {
            Some(email) => {
                let name = identity.display_name.as_deref().unwrap_or("-");
                println!("  {} <{}>", name, email);
            }
            None => println!("  {}", identity.raw),
        }
    }

    Ok(())
}

/// `sweep` command: mark senders interactively, then trash their messages
/// (or the whole mailbox with `--all`), protecting labeled messages.
pub async fn run_sweep(
    cli: &Cli,
    config: &Config,
    all: bool,
    discard_token: bool,
) -> Result<SweepReport> {
    let reporter = ProgressReporter::new();
    let service = connect(cli, config, &reporter).await?;
    let sweeper = Sweeper::new(&service, config.sweep.protected_label.clone());

    let report = if all {
        info!("Sweeping the whole mailbox");
        sweeper.trash_all().await?
    } else {
        let catalog = build_catalog(&service, &reporter).await?;
        if catalog.is_empty() {
            println!("Mailbox has no senders to mark.");
            return sweeper.trash_marked(&[]).await;
        }

        // Prompting is foreground, blocking I/O; progress bars are done by
        // this point.
        let mut session = MarkingSession::new(StdinDecisions);
        let marked = session.mark(&catalog)?;
        println!("Marked {} of {} senders", marked.len(), catalog.len());

        sweeper.trash_marked(&marked).await?
    };

    if discard_token {
        auth::discard_cached_token(&cli.token_cache).await?;
    }

    Ok(report)
}

/// `create-filter` command: mark senders interactively, then create one
/// server-side filter matching them.
pub async fn run_create_filter(cli: &Cli, config: &Config) -> Result<String> {
    let reporter = ProgressReporter::new();
    let service = connect(cli, config, &reporter).await?;
    let catalog = build_catalog(&service, &reporter).await?;

    let mut session = MarkingSession::new(StdinDecisions);
    let marked = session.mark(&catalog)?;
    println!("Marked {} of {} senders", marked.len(), catalog.len());

    let disposition = FilterDisposition {
        add_label_ids: config.filter.add_label_ids.clone(),
        remove_label_ids: config.filter.remove_label_ids.clone(),
    };

    let sweeper = Sweeper::new(&service, config.sweep.protected_label.clone());
    sweeper.create_sender_filter(&marked, &disposition).await
}
