//! Gmail Mailbox Sweep
//!
//! An interactive cleanup tool that enumerates a mailbox, deduplicates its
//! senders, lets the user mark the ones they want gone, and then either moves
//! their messages to trash (protecting labeled messages) or creates a
//! server-side filter matching them.
//!
//! # Overview
//!
//! - **Authentication**: OAuth2 authentication with token caching
//! - **Enumeration**: Page-by-page mailbox traversal behind continuation tokens
//! - **Sender Catalog**: Deduplicated sender identities parsed from `From` headers
//! - **Marking**: One-pass interactive yes/no review of the catalog
//! - **Sweeping**: Selective or whole-mailbox trash with a protected label
//! - **Filters**: Single-filter synthesis from the marked senders
//!
//! # Example Usage
//!
//! ```no_run
//! use gmail_sweep::{auth, client::GmailMailService, config::Config, sweeper::Sweeper};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     let hub = auth::initialize_gmail_hub(
//!         "credentials.json".as_ref(),
//!         ".gmail-sweep/token.json".as_ref()
//!     ).await?;
//!
//!     let service = GmailMailService::new(
//!         hub,
//!         config.client.max_concurrent_requests,
//!         config.sweep.page_size,
//!     );
//!
//!     let sweeper = Sweeper::new(&service, config.sweep.protected_label.clone());
//!     let report = sweeper.trash_all().await?;
//!     println!("Trashed {} messages", report.trashed);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 authentication and Gmail API initialization
//! - [`catalog`] - Deduplicated sender catalog built from message headers
//! - [`cli`] - Command-line interface and workflow orchestration
//! - [`client`] - Rate-limited Gmail API service with retry logic
//! - [`config`] - Configuration management
//! - [`criteria`] - Filter criteria synthesis from marked senders
//! - [`error`] - Error types and result aliases
//! - [`identity`] - Sender identity parsing from raw `From` headers
//! - [`marking`] - Interactive marking session over the catalog
//! - [`sweeper`] - Paginated trash traversal and filter creation

pub mod auth;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod criteria;
pub mod error;
pub mod identity;
pub mod marking;
pub mod sweeper;

// Re-export commonly used types for convenience
pub use error::{Result, SweepError};

pub use catalog::SenderCatalog;
pub use client::{GmailMailService, MailService, MessagePage, MessageRecord};
pub use config::{ClientConfig, Config, FilterConfig, SweepConfig};
pub use criteria::{FilterCriteria, FilterDisposition};
pub use identity::SenderIdentity;
pub use marking::{DecisionSource, MarkingSession, ScriptedDecisions, StdinDecisions};
pub use sweeper::{SweepReport, Sweeper};

// CLI types (for binary usage)
pub use cli::{Cli, Commands, ProgressReporter};
