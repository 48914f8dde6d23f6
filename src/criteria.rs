//! Filter criteria synthesis from marked sender identities

use serde::{Deserialize, Serialize};

use crate::identity::SenderIdentity;

/// A service-level filter expression: the marked senders' extracted emails
/// joined with a logical OR.
///
/// An empty criteria means "nothing to submit". Callers must check
/// [`is_empty`](FilterCriteria::is_empty) before handing the criteria to
/// the service; the executor enforces this and returns
/// [`SweepError::EmptyCriteria`](crate::error::SweepError::EmptyCriteria)
/// instead of creating a vacuous filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria(String);

impl FilterCriteria {
    /// Build criteria from the marked identities. Identities without an
    /// extractable email are discarded; they cannot participate in
    /// filter expressions.
    pub fn from_marked(marked: &[SenderIdentity]) -> Self {
        let emails: Vec<&str> = marked
            .iter()
            .filter_map(|id| id.email.as_deref())
            .collect();

        FilterCriteria(emails.join(" OR "))
    }

    /// The expression string as submitted to the service
    pub fn expression(&self) -> &str {
        &self.0
    }

    /// True when no marked identity yielded an email
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FilterCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a created filter does to matching messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterDisposition {
    pub add_label_ids: Vec<String>,
    pub remove_label_ids: Vec<String>,
}

impl Default for FilterDisposition {
    /// Archive policy: matching messages leave the inbox, nothing is added
    fn default() -> Self {
        Self {
            add_label_ids: Vec::new(),
            remove_label_ids: vec!["INBOX".to_string()],
        }
    }
}
