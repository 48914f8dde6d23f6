//! Bulk actions over paginated message listings
//!
//! Both bulk actions (selective trash and filter creation) run against the
//! same marked-sender set. Trashing walks the mailbox page by page,
//! re-reading each message's labels at the moment of mutation so that a
//! message starred between listing and acting is left alone. Nothing is
//! transactional: a failure aborts the remaining pages, and mutations
//! already applied stay applied.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::MailService;
use crate::criteria::{FilterCriteria, FilterDisposition};
use crate::error::{Result, SweepError};
use crate::identity::{extract_email, SenderIdentity};

/// Which messages the trash traversal acts on
enum TrashScope {
    /// Only messages whose sender email is in the marked set
    Marked(HashSet<String>),
    /// Every message in the mailbox
    All,
}

impl TrashScope {
    fn applies_to(&self, from_header: Option<&str>) -> bool {
        match self {
            TrashScope::All => true,
            TrashScope::Marked(emails) => from_header
                .and_then(extract_email)
                .map(|email| emails.contains(&email))
                .unwrap_or(false),
        }
    }
}

/// Outcome of one completed trash run
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// FETCH_PAGE/PROCESS_PAGE cycles completed
    pub pages: usize,
    /// Messages examined across all pages
    pub examined: usize,
    /// Messages moved to trash
    pub trashed: usize,
    /// Messages exempted by the protected label
    pub skipped: usize,
}

/// Executes bulk actions against the mail service
pub struct Sweeper<'a> {
    service: &'a dyn MailService,
    protected_label: String,
}

impl<'a> Sweeper<'a> {
    /// # Arguments
    /// * `service` - the remote mail service
    /// * `protected_label` - label that exempts a message from trashing
    ///   (checked at mutation time, not at enumeration time)
    pub fn new(service: &'a dyn MailService, protected_label: impl Into<String>) -> Self {
        Self {
            service,
            protected_label: protected_label.into(),
        }
    }

    /// Trash every message from the marked senders, except messages
    /// carrying the protected label.
    ///
    /// Marked identities without an extractable email cannot match any
    /// message and are dropped from the scope up front.
    pub async fn trash_marked(&self, marked: &[SenderIdentity]) -> Result<SweepReport> {
        let emails: HashSet<String> = marked
            .iter()
            .filter_map(|id| id.email.clone())
            .collect();

        if emails.is_empty() {
            warn!("No marked sender has an extractable email; nothing to trash");
            return Ok(self.empty_report());
        }

        self.run_trash(TrashScope::Marked(emails)).await
    }

    /// Trash the whole mailbox except messages carrying the protected
    /// label.
    pub async fn trash_all(&self) -> Result<SweepReport> {
        self.run_trash(TrashScope::All).await
    }

    /// Create one server-side filter matching the marked senders.
    ///
    /// Refuses to submit when no marked identity yields an email: an empty
    /// criteria would create a filter matching nothing meaningful, so it
    /// surfaces as [`SweepError::EmptyCriteria`] instead.
    pub async fn create_sender_filter(
        &self,
        marked: &[SenderIdentity],
        disposition: &FilterDisposition,
    ) -> Result<String> {
        let criteria = FilterCriteria::from_marked(marked);
        if criteria.is_empty() {
            return Err(SweepError::EmptyCriteria);
        }

        info!("Creating filter with criteria: {}", criteria);
        let filter_id = self.service.create_filter(&criteria, disposition).await?;
        info!("Created filter with id: {}", filter_id);
        Ok(filter_id)
    }

    fn empty_report(&self) -> SweepReport {
        let now = Utc::now();
        SweepReport {
            run_id: Uuid::new_v4(),
            started_at: now,
            completed_at: now,
            pages: 0,
            examined: 0,
            trashed: 0,
            skipped: 0,
        }
    }

    /// The traversal state machine: FETCH_PAGE -> PROCESS_PAGE, cycling on
    /// the page response's continuation token until a page comes back
    /// without one. Any service error aborts the remaining pages and is
    /// wrapped with the counts and the failure position.
    async fn run_trash(&self, scope: TrashScope) -> Result<SweepReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let mut cursor: Option<String> = None;
        let mut pages = 0usize;
        let mut examined = 0usize;
        let mut trashed = 0usize;
        let mut skipped = 0usize;

        info!("Starting trash run {}", run_id);

        loop {
            // FETCH_PAGE
            let page = self
                .service
                .list_messages(cursor.as_deref())
                .await
                .map_err(|e| SweepError::SweepAborted {
                    page: pages + 1,
                    message_id: "(page fetch)".to_string(),
                    trashed,
                    skipped,
                    unprocessed: 0,
                    source: Box::new(e),
                })?;
            pages += 1;

            debug!("Page {}: {} messages", pages, page.ids.len());

            // PROCESS_PAGE
            for (index, id) in page.ids.iter().enumerate() {
                examined += 1;

                match self.trash_one(&scope, id).await {
                    Ok(MessageOutcome::Trashed) => {
                        trashed += 1;
                        info!("Message {} trashed", id);
                    }
                    Ok(MessageOutcome::Protected) => {
                        skipped += 1;
                        info!("Message {} skipped, protected", id);
                    }
                    Ok(MessageOutcome::NotInScope) => {
                        debug!("Message {} not from a marked sender", id);
                    }
                    Err(e) => {
                        // FAILED: abort remaining pages, keep what was done
                        return Err(SweepError::SweepAborted {
                            page: pages,
                            message_id: id.clone(),
                            trashed,
                            skipped,
                            unprocessed: page.ids.len() - index - 1,
                            source: Box::new(e),
                        });
                    }
                }
            }

            // The continuation token belongs to the page response; no
            // token means DONE.
            match page.next_page_token {
                Some(token) => cursor = Some(token),
                None => break,
            }
        }

        let report = SweepReport {
            run_id,
            started_at,
            completed_at: Utc::now(),
            pages,
            examined,
            trashed,
            skipped,
        };

        info!(
            "Trash run {} done: {} pages, {} trashed, {} skipped of {} examined",
            report.run_id, report.pages, report.trashed, report.skipped, report.examined
        );

        Ok(report)
    }

    /// Terminal operation for one message: re-read its headers and labels,
    /// then trash unless out of scope or protected.
    async fn trash_one(&self, scope: &TrashScope, id: &str) -> Result<MessageOutcome> {
        let record = self.service.get_message(id).await?;

        if !scope.applies_to(record.header("From")) {
            return Ok(MessageOutcome::NotInScope);
        }

        // Label state read here, not at enumeration time
        if record.has_label(&self.protected_label) {
            return Ok(MessageOutcome::Protected);
        }

        self.service.trash_message(id).await?;
        Ok(MessageOutcome::Trashed)
    }
}

enum MessageOutcome {
    Trashed,
    Protected,
    NotInScope,
}
