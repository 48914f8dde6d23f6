//! Gmail API client with rate limiting and retry logic

use async_trait::async_trait;
use google_gmail1::{
    api::{Filter, FilterAction, FilterCriteria as ApiFilterCriteria, Message},
    hyper_rustls, hyper_util, Gmail,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::criteria::{FilterCriteria, FilterDisposition};
use crate::error::{Result, SweepError};

/// One page of a message listing. The continuation token is a field of the
/// page response envelope; individual message records never carry it.
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    pub ids: Vec<String>,
    pub next_page_token: Option<String>,
}

impl MessagePage {
    /// Absence of a token means there is no next page
    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }
}

/// Transient read-only projection of one remote message. Held only for the
/// duration of one page's processing, never cached.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    pub id: String,
    pub label_ids: Vec<String>,
    pub headers: Vec<(String, String)>,
}

impl MessageRecord {
    /// Look up a header value by name, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Check whether a label is currently on the message
    pub fn has_label(&self, label: &str) -> bool {
        self.label_ids.iter().any(|l| l == label)
    }
}

/// The remote mail service as the cleanup engine sees it.
///
/// Every call is synchronous from the engine's perspective: it either
/// succeeds or fails, and the engine issues one call at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailService: Send + Sync {
    /// List one page of message ids, starting from an optional
    /// continuation token
    async fn list_messages<'a>(&self, page_token: Option<&'a str>) -> Result<MessagePage>;

    /// Fetch one message's current labels and headers
    async fn get_message(&self, id: &str) -> Result<MessageRecord>;

    /// Move a message to trash
    async fn trash_message(&self, id: &str) -> Result<()>;

    /// Create a server-side filter; returns the new filter's id.
    /// Callers must validate the criteria first - this submits whatever it
    /// is given.
    async fn create_filter(
        &self,
        criteria: &FilterCriteria,
        disposition: &FilterDisposition,
    ) -> Result<String>;
}

/// Production Gmail client
///
/// Wraps the Gmail hub with:
/// - Semaphore-based rate limiting
/// - Exponential backoff retry for transient errors
/// - Page-size control for listings
pub struct GmailMailService {
    hub: Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>,
    rate_limiter: Arc<Semaphore>,
    page_size: u32,
}

impl GmailMailService {
    /// Create a new client
    ///
    /// # Arguments
    /// * `hub` - Gmail API hub instance
    /// * `max_concurrent` - Maximum concurrent requests the client will allow
    /// * `page_size` - Messages requested per listing page (Gmail caps at 500)
    pub fn new(
        hub: Gmail<
            hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
        >,
        max_concurrent: usize,
        page_size: u32,
    ) -> Self {
        Self {
            hub,
            rate_limiter: Arc::new(Semaphore::new(max_concurrent)),
            page_size: page_size.min(500),
        }
    }

    /// Check if an error is retryable
    fn should_retry(error: &SweepError) -> bool {
        matches!(
            error,
            SweepError::Server { .. }
                | SweepError::RateLimitExceeded { .. }
                | SweepError::Network(_)
        )
    }

    /// Execute an async operation with exponential backoff retry
    async fn with_retry<T, F, Fut>(
        operation_name: &str,
        max_retries: u32,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut delay = Duration::from_secs(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if Self::should_retry(&e) && attempts <= max_retries => {
                    // A rate-limited response tells us exactly how long to
                    // wait; everything else gets the doubling delay.
                    let wait = match &e {
                        SweepError::RateLimitExceeded { retry_after } => {
                            Duration::from_secs(*retry_after)
                        }
                        _ => delay,
                    };
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        operation_name,
                        attempts,
                        max_retries + 1,
                        e,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    delay = std::cmp::min(delay * 2, Duration::from_secs(30));
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn acquire_permit(&self) -> Result<tokio::sync::SemaphorePermit<'_>> {
        self.rate_limiter
            .acquire()
            .await
            .map_err(|e| SweepError::Unknown(format!("Failed to acquire rate limit permit: {}", e)))
    }
}

/// Parse a Gmail API Message into a MessageRecord
fn parse_message_record(msg: Message) -> Result<MessageRecord> {
    let id = msg
        .id
        .ok_or_else(|| SweepError::InvalidMessageFormat("Missing message ID".to_string()))?;

    let label_ids = msg.label_ids.unwrap_or_default();

    let headers = msg
        .payload
        .and_then(|p| p.headers)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|h| match (h.name, h.value) {
            (Some(name), Some(value)) => Some((name, value)),
            _ => None,
        })
        .collect();

    Ok(MessageRecord {
        id,
        label_ids,
        headers,
    })
}

#[async_trait]
impl MailService for GmailMailService {
    async fn list_messages<'a>(&self, page_token: Option<&'a str>) -> Result<MessagePage> {
        let _permit = self.acquire_permit().await?;

        Self::with_retry("list_messages", 3, || async {
            let mut call = self
                .hub
                .users()
                .messages_list("me")
                .max_results(self.page_size);

            if let Some(token) = page_token {
                call = call.page_token(token);
            }

            let (_, response) = call
                .add_scope("https://www.googleapis.com/auth/gmail.modify")
                .doit()
                .await?;

            let ids = response
                .messages
                .unwrap_or_default()
                .into_iter()
                .filter_map(|m| m.id)
                .collect::<Vec<_>>();

            debug!(
                "Listed page with {} messages, more: {}",
                ids.len(),
                response.next_page_token.is_some()
            );

            // The continuation token comes from the page envelope, not from
            // the last message record.
            Ok(MessagePage {
                ids,
                next_page_token: response.next_page_token,
            })
        })
        .await
    }

    async fn get_message(&self, id: &str) -> Result<MessageRecord> {
        let _permit = self.acquire_permit().await?;

        Self::with_retry("get_message", 3, || async {
            let (_, msg) = self
                .hub
                .users()
                .messages_get("me", id)
                .format("metadata")
                .add_metadata_headers("From")
                .add_metadata_headers("Subject")
                .add_scope("https://www.googleapis.com/auth/gmail.modify")
                .doit()
                .await?;

            parse_message_record(msg)
        })
        .await
    }

    async fn trash_message(&self, id: &str) -> Result<()> {
        let _permit = self.acquire_permit().await?;

        Self::with_retry("trash_message", 3, || async {
            self.hub
                .users()
                .messages_trash("me", id)
                .add_scope("https://www.googleapis.com/auth/gmail.modify")
                .doit()
                .await?;

            Ok(())
        })
        .await
    }

    async fn create_filter(
        &self,
        criteria: &FilterCriteria,
        disposition: &FilterDisposition,
    ) -> Result<String> {
        let _permit = self.acquire_permit().await?;

        Self::with_retry("create_filter", 3, || async {
            let api_criteria = ApiFilterCriteria {
                from: Some(criteria.expression().to_string()),
                ..Default::default()
            };

            let action = FilterAction {
                add_label_ids: if disposition.add_label_ids.is_empty() {
                    None
                } else {
                    Some(disposition.add_label_ids.clone())
                },
                remove_label_ids: if disposition.remove_label_ids.is_empty() {
                    None
                } else {
                    Some(disposition.remove_label_ids.clone())
                },
                ..Default::default()
            };

            let gmail_filter = Filter {
                criteria: Some(api_criteria),
                action: Some(action),
                ..Default::default()
            };

            let (_, created_filter) = self
                .hub
                .users()
                .settings_filters_create(gmail_filter, "me")
                .add_scope("https://www.googleapis.com/auth/gmail.settings.basic")
                .doit()
                .await?;

            created_filter
                .id
                .ok_or_else(|| SweepError::Filter("Created filter has no ID".to_string()))
        })
        .await
    }
}
