//! Issue entity and the typed values that flow into the store.

use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of an identifier rendered as hex (12-byte ObjectId).
const ID_HEX_LEN: usize = 24;

/// Opaque issue identifier assigned by the store.
///
/// Always 24 lowercase hex characters, the rendering of a
/// MongoDB ObjectId. Construct via [`IssueId::parse`] for client input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(String);

/// Raised when a client-supplied identifier is not a well-formed ObjectId.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed issue id: {0:?}")]
pub struct InvalidIssueId(pub String);

impl IssueId {
    /// Validate and wrap a client-supplied identifier.
    pub fn parse(raw: &str) -> Result<Self, InvalidIssueId> {
        if raw.len() == ID_HEX_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(raw.to_ascii_lowercase()))
        } else {
            Err(InvalidIssueId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored issue, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: IssueId,
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub open: bool,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl Issue {
    /// Materialize a new issue under an identifier chosen by the store.
    pub fn from_new(id: IssueId, new: NewIssue) -> Self {
        Self {
            id,
            project: new.project,
            issue_title: new.issue_title,
            issue_text: new.issue_text,
            created_by: new.created_by,
            assigned_to: new.assigned_to,
            status_text: new.status_text,
            open: true,
            created_on: new.created_on,
            updated_on: new.created_on,
        }
    }

    /// Apply a sparse update in place.
    pub fn apply(&mut self, changes: &IssueChanges) {
        if let Some(title) = &changes.issue_title {
            self.issue_title = title.clone();
        }
        if let Some(text) = &changes.issue_text {
            self.issue_text = text.clone();
        }
        if let Some(created_by) = &changes.created_by {
            self.created_by = created_by.clone();
        }
        if let Some(assigned_to) = &changes.assigned_to {
            self.assigned_to = assigned_to.clone();
        }
        if let Some(status_text) = &changes.status_text {
            self.status_text = status_text.clone();
        }
        if let Some(open) = changes.open {
            self.open = open;
        }
        if let Some(updated_on) = changes.updated_on {
            self.updated_on = updated_on;
        }
    }
}

/// A validated issue that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub created_on: DateTime<Utc>,
}

/// Sparse set of field replacements for an update.
///
/// `None` means "leave as is". `updated_on` is stamped by the service, never
/// taken from the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueChanges {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl IssueChanges {
    /// True when no client-controlled field is set.
    pub fn is_empty(&self) -> bool {
        self.issue_title.is_none()
            && self.issue_text.is_none()
            && self.created_by.is_none()
            && self.assigned_to.is_none()
            && self.status_text.is_none()
            && self.open.is_none()
    }

    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.updated_on = Some(at);
        self
    }
}

/// Current time at the store's resolution (milliseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
