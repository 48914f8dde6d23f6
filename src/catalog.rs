//! Deduplicated catalog of sender identities across a message collection
//!
//! Building the catalog costs one header fetch per message. Header data is
//! not available from the listing call alone, so the O(n) round trips are
//! intentional.

use tracing::{debug, warn};

use crate::client::MailService;
use crate::error::Result;
use crate::identity::SenderIdentity;

/// Set of sender identities keyed by raw `From` header value.
///
/// Membership is O(1) amortized; insertion order is preserved so that the
/// marking session and test output are deterministic.
#[derive(Debug, Default)]
pub struct SenderCatalog {
    entries: Vec<SenderIdentity>,
    seen_raw: std::collections::HashSet<String>,
}

impl SenderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an identity unless one with the same raw header value is
    /// already present. Returns true when the identity was added.
    pub fn insert(&mut self, identity: SenderIdentity) -> bool {
        if self.seen_raw.contains(&identity.raw) {
            return false;
        }
        self.seen_raw.insert(identity.raw.clone());
        self.entries.push(identity);
        true
    }

    /// O(1) membership test by raw header value
    pub fn contains_raw(&self, raw: &str) -> bool {
        self.seen_raw.contains(raw)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SenderIdentity> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<SenderIdentity> {
        self.entries
    }
}

/// Build the catalog for a collection of message ids.
///
/// Fetches each message's headers in turn (one call at a time) and inserts
/// the `From` identity. If any fetch fails the whole collection fails and
/// no partial catalog is returned; callers wanting partial-failure
/// tolerance must wrap retries around this call.
pub async fn collect(service: &dyn MailService, message_ids: &[String]) -> Result<SenderCatalog> {
    collect_with_progress(service, message_ids, |_| {}).await
}

/// Same as [`collect`], invoking `on_message` after each header fetch so
/// callers can report progress.
pub async fn collect_with_progress(
    service: &dyn MailService,
    message_ids: &[String],
    on_message: impl Fn(&str),
) -> Result<SenderCatalog> {
    let mut catalog = SenderCatalog::new();

    for id in message_ids {
        let record = service.get_message(id).await?;

        match record.header("From") {
            Some(raw) => {
                let identity = SenderIdentity::parse(raw);
                if catalog.insert(identity) {
                    debug!("New sender from message {}: {}", id, raw);
                }
            }
            None => {
                warn!("Message {} has no From header, skipping", id);
            }
        }

        on_message(id);
    }

    debug!(
        "Catalog complete: {} unique senders across {} messages",
        catalog.len(),
        message_ids.len()
    );

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MessageRecord, MockMailService};
    use crate::error::SweepError;

    fn record(id: &str, from: &str) -> MessageRecord {
        MessageRecord {
            id: id.to_string(),
            label_ids: vec!["INBOX".to_string()],
            headers: vec![("From".to_string(), from.to_string())],
        }
    }

    #[test]
    fn test_insert_deduplicates_by_raw_value() {
        let mut catalog = SenderCatalog::new();
        assert!(catalog.insert(SenderIdentity::parse("A <a@x.com>")));
        assert!(catalog.insert(SenderIdentity::parse("B <b@x.com>")));
        assert!(!catalog.insert(SenderIdentity::parse("A <a@x.com>")));

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains_raw("A <a@x.com>"));
        assert!(!catalog.contains_raw("C <c@x.com>"));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut catalog = SenderCatalog::new();
        catalog.insert(SenderIdentity::parse("B <b@x.com>"));
        catalog.insert(SenderIdentity::parse("A <a@x.com>"));

        let raws: Vec<&str> = catalog.iter().map(|i| i.raw.as_str()).collect();
        assert_eq!(raws, vec!["B <b@x.com>", "A <a@x.com>"]);
    }

    #[tokio::test]
    async fn test_collect_builds_deduplicated_catalog() {
        let mut service = MockMailService::new();
        service.expect_get_message().returning(|id| {
            let from = match id {
                "m1" => "A <a@x.com>",
                "m2" => "B <b@x.com>",
                _ => "A <a@x.com>",
            };
            Ok(record(id, from))
        });

        let ids = vec!["m1".to_string(), "m2".to_string(), "m3".to_string()];
        let catalog = collect(&service, &ids).await.unwrap();

        // Two messages with identical raw From values contribute one entry
        assert_eq!(catalog.len(), 2);
        let raws: Vec<&str> = catalog.iter().map(|i| i.raw.as_str()).collect();
        assert_eq!(raws, vec!["A <a@x.com>", "B <b@x.com>"]);
    }

    #[tokio::test]
    async fn test_collect_fails_whole_operation_on_fetch_error() {
        let mut service = MockMailService::new();
        service.expect_get_message().returning(|id| {
            if id == "m2" {
                Err(SweepError::Network("connection reset".to_string()))
            } else {
                Ok(record(id, "A <a@x.com>"))
            }
        });

        let ids = vec!["m1".to_string(), "m2".to_string(), "m3".to_string()];
        let result = collect(&service, &ids).await;

        // No partial catalog comes back
        assert!(matches!(result, Err(SweepError::Network(_))));
    }

    #[tokio::test]
    async fn test_collect_skips_messages_without_from_header() {
        let mut service = MockMailService::new();
        service.expect_get_message().returning(|id| {
            if id == "m1" {
                Ok(MessageRecord {
                    id: id.to_string(),
                    label_ids: vec![],
                    headers: vec![("Subject".to_string(), "hi".to_string())],
                })
            } else {
                Ok(record(id, "A <a@x.com>"))
            }
        });

        let ids = vec!["m1".to_string(), "m2".to_string()];
        let catalog = collect(&service, &ids).await.unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_collect_reports_progress_per_message() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let mut service = MockMailService::new();
        service
            .expect_get_message()
            .returning(|id| Ok(record(id, "A <a@x.com>")));

        let counted = AtomicUsize::new(0);
        let ids = vec!["m1".to_string(), "m2".to_string(), "m3".to_string()];
        collect_with_progress(&service, &ids, |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

        assert_eq!(counted.load(Ordering::SeqCst), 3);
    }
}
