//! Sender identity extraction from raw `From` header values
//!
//! Parsing is pure and total: a header that does not follow the
//! `Name <email>` convention still yields a valid identity, just one
//! without an extractable email. Such identities can be cataloged and
//! displayed but cannot participate in filter criteria or trash-by-email
//! matching.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Matches the first angle-bracket-delimited substring of a header
static ANGLE_ADDR: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(.*?)>").unwrap());

/// A sender as seen in a message's `From` header.
///
/// Two identities can be compared two different ways, and the notions are
/// deliberately NOT interchangeable:
/// - [`same_raw_header`](SenderIdentity::same_raw_header) - byte equality of
///   the raw header value; this is the catalog's dedup key.
/// - [`same_email`](SenderIdentity::same_email) - case-insensitive equality
///   of the extracted emails; this is what filter criteria and trash
///   matching use, so that `"Jane <JANE@x.com>"` and `"jane@x.com"` refer
///   to the same sender.
///
/// Neither is exposed as `PartialEq` - call the comparison you mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderIdentity {
    /// The raw header value, unmodified
    pub raw: String,
    /// Display name portion, if the header has one before the brackets
    pub display_name: Option<String>,
    /// Email extracted from the angle brackets, lowercased and trimmed
    pub email: Option<String>,
}

impl SenderIdentity {
    /// Parse a raw `From` header value. Never fails; a header with no
    /// angle-bracket address yields `email: None`.
    pub fn parse(raw: &str) -> Self {
        let email = extract_email(raw);

        let display_name = raw.find('<').and_then(|pos| {
            let name = raw[..pos].trim().trim_matches('"').trim();
            if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            }
        });

        Self {
            raw: raw.to_string(),
            display_name,
            email,
        }
    }

    /// Raw-header equality: the catalog's notion of "same sender".
    pub fn same_raw_header(&self, other: &SenderIdentity) -> bool {
        self.raw == other.raw
    }

    /// Extracted-email equality, case-insensitive. False when either side
    /// has no extractable email: an identity without an address can never
    /// match anything by email.
    pub fn same_email(&self, other: &SenderIdentity) -> bool {
        match (&self.email, &other.email) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Does this identity's email match the given (already normalized)
    /// address?
    pub fn has_email(&self, email: &str) -> bool {
        self.email.as_deref() == Some(email)
    }

    /// Human-readable form for prompts and logs
    pub fn label(&self) -> &str {
        &self.raw
    }
}

/// Extract the email address from a raw header value, normalized to
/// lowercase with surrounding whitespace removed. Returns `None` when no
/// angle-bracket-delimited substring is present.
///
/// Applied identically wherever emails are synthesized into criteria or
/// compared against marked identities.
pub fn extract_email(raw: &str) -> Option<String> {
    ANGLE_ADDR
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_lowercase())
        .filter(|email| !email.is_empty())
}
