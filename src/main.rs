use anyhow::Result;
use clap::Parser;
use gmail_sweep::cli::{self, Cli, Commands};
use gmail_sweep::config::Config;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        eprintln!("\nFor help, run: gmail-sweep --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Install default crypto provider for rustls
    // On non-Windows platforms, use aws-lc-rs (better performance, FIPS support)
    // On Windows, use ring (better compatibility, no NASM/CMake required)
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_sweep=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_sweep=info,warn,error"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    match cli.command {
        Commands::Auth { force } => {
            tracing::info!("Authenticating with Gmail API...");

            if let Some(parent) = cli.token_cache.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            if force && cli.token_cache.exists() {
                tokio::fs::remove_file(&cli.token_cache).await?;
                tracing::info!("Removed existing token cache");
            }

            let hub = gmail_sweep::auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache)
                .await?;

            println!("Successfully authenticated with Gmail API");
            println!("Token cached at: {:?}", cli.token_cache);

            // Test the connection - must specify scope to avoid triggering
            // an additional OAuth flow
            let (_, profile) = hub
                .users()
                .get_profile("me")
                .add_scope("https://www.googleapis.com/auth/gmail.modify")
                .doit()
                .await?;
            println!(
                "Connected to account: {}",
                profile.email_address.unwrap_or_default()
            );

            Ok(())
        }

        Commands::Senders => {
            let config = Config::load(&cli.config).await?;
            cli::run_senders(&cli, &config).await?;
            Ok(())
        }

        Commands::Sweep { all, discard_token } => {
            let config = Config::load(&cli.config).await?;
            let report = cli::run_sweep(&cli, &config, all, discard_token).await?;

            println!("\nSweep complete:");
            println!("  Pages traversed:  {}", report.pages);
            println!("  Messages checked: {}", report.examined);
            println!("  Moved to trash:   {}", report.trashed);
            println!("  Left alone:       {}", report.skipped);

            Ok(())
        }

        Commands::CreateFilter => {
            let config = Config::load(&cli.config).await?;
            let filter_id = cli::run_create_filter(&cli, &config).await?;
            println!("Created filter: {}", filter_id);
            Ok(())
        }

        Commands::InitConfig { output, force } => {
            if output.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {:?}. Use --force to overwrite.",
                    output
                );
            }

            Config::create_example(&output).await?;
            println!("Created example config at: {:?}", output);
            Ok(())
        }
    }
}
