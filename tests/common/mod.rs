//! Shared test infrastructure
//!
//! Provides an in-memory mail service with scripted pages and mutable
//! message state, so workflow tests can observe trashing and filter
//! creation without a network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use gmail_sweep::client::{MailService, MessagePage, MessageRecord};
use gmail_sweep::criteria::{FilterCriteria, FilterDisposition};
use gmail_sweep::error::{Result, SweepError};

/// In-memory mail service backed by scripted pages.
///
/// Pages are handed out in order: the first `list_messages(None)` call
/// returns page 0, and each page carries a token pointing at the next one
/// (the last page carries none). Tokens are validated, so a traversal
/// that passes a stale or invented token fails the test.
pub struct FakeMailService {
    state: Mutex<FakeState>,
}

struct FakeState {
    pages: Vec<Vec<String>>,
    messages: HashMap<String, MessageRecord>,
    trashed: Vec<String>,
    list_calls: Vec<Option<String>>,
    created_filters: Vec<(String, FilterDisposition)>,
    fail_on_get: Option<String>,
}

impl FakeMailService {
    pub fn new(pages: Vec<Vec<&str>>, messages: Vec<MessageRecord>) -> Self {
        let pages = pages
            .into_iter()
            .map(|ids| ids.into_iter().map(String::from).collect())
            .collect();
        let messages = messages.into_iter().map(|m| (m.id.clone(), m)).collect();

        Self {
            state: Mutex::new(FakeState {
                pages,
                messages,
                trashed: Vec::new(),
                list_calls: Vec::new(),
                created_filters: Vec::new(),
                fail_on_get: None,
            }),
        }
    }

    /// Make `get_message` fail for one specific id
    pub fn fail_on_get(&self, id: &str) {
        self.state.lock().unwrap().fail_on_get = Some(id.to_string());
    }

    pub fn trashed_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().trashed.clone()
    }

    /// Tokens passed to `list_messages`, in call order
    pub fn list_calls(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().list_calls.clone()
    }

    pub fn created_filters(&self) -> Vec<(String, FilterDisposition)> {
        self.state.lock().unwrap().created_filters.clone()
    }
}

fn page_token(index: usize) -> String {
    format!("page-{}", index)
}

#[async_trait]
impl MailService for FakeMailService {
    async fn list_messages<'a>(&self, page_token_arg: Option<&'a str>) -> Result<MessagePage> {
        let mut state = self.state.lock().unwrap();
        state.list_calls.push(page_token_arg.map(String::from));

        let index = match page_token_arg {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| SweepError::BadRequest(format!("bad token {}", token)))?,
        };

        let ids = state
            .pages
            .get(index)
            .ok_or_else(|| SweepError::BadRequest(format!("no page {}", index)))?
            .clone();

        let next_page_token = if index + 1 < state.pages.len() {
            Some(page_token(index + 1))
        } else {
            None
        };

        Ok(MessagePage {
            ids,
            next_page_token,
        })
    }

    async fn get_message(&self, id: &str) -> Result<MessageRecord> {
        let state = self.state.lock().unwrap();

        if state.fail_on_get.as_deref() == Some(id) {
            return Err(SweepError::Server {
                status: 503,
                message: "scripted failure".to_string(),
            });
        }

        state
            .messages
            .get(id)
            .cloned()
            .ok_or_else(|| SweepError::MessageNotFound(id.to_string()))
    }

    async fn trash_message(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        if !state.messages.contains_key(id) {
            return Err(SweepError::MessageNotFound(id.to_string()));
        }

        state.trashed.push(id.to_string());
        Ok(())
    }

    async fn create_filter(
        &self,
        criteria: &FilterCriteria,
        disposition: &FilterDisposition,
    ) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state
            .created_filters
            .push((criteria.expression().to_string(), disposition.clone()));
        Ok(format!("filter-{}", state.created_filters.len()))
    }
}

/// Build a message record with a `From` header and labels
pub fn message(id: &str, from: &str, labels: &[&str]) -> MessageRecord {
    MessageRecord {
        id: id.to_string(),
        label_ids: labels.iter().map(|l| l.to_string()).collect(),
        headers: vec![
            ("From".to_string(), from.to_string()),
            ("Subject".to_string(), format!("Subject of {}", id)),
        ],
    }
}
