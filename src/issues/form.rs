//! Request body shape shared by create, update and delete.
//!
//! Only allow-listed keys are read; anything else in the body is ignored.
//! Form clients submit every input, so an empty text value means "not
//! supplied".
//!
//! Fields are decoded leniently: any JSON scalar is kept as its text, so a
//! numeric `_id` reaches identifier validation instead of failing the whole
//! body. Casting happens later, where each operation reports its own error.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::issues::model::{now, IssueChanges, NewIssue};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("required field(s) missing")]
    RequiredFieldsMissing,
}

/// A supplied field whose text cannot be cast to the field's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for `{field}`: {value:?}")]
pub struct InvalidValue {
    pub field: &'static str,
    pub value: String,
}

/// Issue fields as submitted by a client (JSON object or URL-encoded form).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IssueForm {
    #[serde(rename = "_id", deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub issue_title: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub issue_text: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub created_by: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub assigned_to: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub status_text: Option<String>,
    /// Raw `open` text; cast by [`IssueForm::changes`].
    #[serde(deserialize_with = "lenient_text")]
    pub open: Option<String>,
}

impl IssueForm {
    /// The submitted `_id`, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        supplied(&self.id)
    }

    /// Validate the create payload for `project`.
    pub fn into_new_issue(self, project: &str) -> Result<NewIssue, ValidationError> {
        let (Some(issue_title), Some(issue_text), Some(created_by)) = (
            non_empty(self.issue_title),
            non_empty(self.issue_text),
            non_empty(self.created_by),
        ) else {
            return Err(ValidationError::RequiredFieldsMissing);
        };

        Ok(NewIssue {
            project: project.to_string(),
            issue_title,
            issue_text,
            created_by,
            assigned_to: self.assigned_to.unwrap_or_default(),
            status_text: self.status_text.unwrap_or_default(),
            created_on: now(),
        })
    }

    /// Whether the client supplied any mutable field, castable or not.
    pub fn has_updates(&self) -> bool {
        [
            &self.issue_title,
            &self.issue_text,
            &self.created_by,
            &self.assigned_to,
            &self.status_text,
            &self.open,
        ]
        .into_iter()
        .any(|field| supplied(field).is_some())
    }

    /// Collect and cast the mutable fields the client actually supplied.
    pub fn changes(&self) -> Result<IssueChanges, InvalidValue> {
        let open = match supplied(&self.open) {
            Some(raw) => Some(parse_bool(raw).ok_or_else(|| InvalidValue {
                field: "open",
                value: raw.to_string(),
            })?),
            None => None,
        };

        Ok(IssueChanges {
            issue_title: supplied(&self.issue_title).map(str::to_string),
            issue_text: supplied(&self.issue_text).map(str::to_string),
            created_by: supplied(&self.created_by).map(str::to_string),
            assigned_to: supplied(&self.assigned_to).map(str::to_string),
            status_text: supplied(&self.status_text).map(str::to_string),
            open,
            updated_on: None,
        })
    }
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parse `"true"`/`"false"` the way both form and query values arrive.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Accept any JSON value as text. Strings pass through, `null` is absent and
/// everything else keeps its JSON rendering.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
