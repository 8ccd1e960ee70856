//! Listing filters parsed from the query string.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::issues::form::parse_bool;
use crate::issues::model::{Issue, IssueId};

/// A filter value that cannot be cast to its field's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for filter `{field}`: {value:?}")]
pub struct FilterError {
    pub field: &'static str,
    pub value: String,
}

/// Exact-match constraints for a listing. `project` always comes from the path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueFilter {
    pub project: String,
    pub id: Option<IssueId>,
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
    pub created_on: Option<DateTime<Utc>>,
    pub updated_on: Option<DateTime<Utc>>,
}

impl IssueFilter {
    pub fn for_project(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Default::default()
        }
    }

    /// Build a filter from raw query pairs. Unrecognized keys are skipped.
    pub fn from_query(
        project: &str,
        query: &HashMap<String, String>,
    ) -> Result<Self, FilterError> {
        let mut filter = Self::for_project(project);

        for (key, value) in query {
            match key.as_str() {
                "_id" => {
                    let id = IssueId::parse(value).map_err(|_| invalid("_id", value))?;
                    filter.id = Some(id);
                }
                "issue_title" => filter.issue_title = Some(value.clone()),
                "issue_text" => filter.issue_text = Some(value.clone()),
                "created_by" => filter.created_by = Some(value.clone()),
                "assigned_to" => filter.assigned_to = Some(value.clone()),
                "status_text" => filter.status_text = Some(value.clone()),
                "open" => {
                    filter.open = Some(parse_bool(value).ok_or_else(|| invalid("open", value))?);
                }
                "created_on" => filter.created_on = Some(parse_timestamp("created_on", value)?),
                "updated_on" => filter.updated_on = Some(parse_timestamp("updated_on", value)?),
                other => tracing::debug!(key = %other, "Ignoring unrecognized filter"),
            }
        }

        Ok(filter)
    }

    /// Whether `issue` satisfies every constraint.
    pub fn matches(&self, issue: &Issue) -> bool {
        fn eq<T: PartialEq>(want: &Option<T>, have: &T) -> bool {
            want.as_ref().map_or(true, |w| w == have)
        }

        issue.project == self.project
            && eq(&self.id, &issue.id)
            && eq(&self.issue_title, &issue.issue_title)
            && eq(&self.issue_text, &issue.issue_text)
            && eq(&self.created_by, &issue.created_by)
            && eq(&self.assigned_to, &issue.assigned_to)
            && eq(&self.status_text, &issue.status_text)
            && eq(&self.open, &issue.open)
            && eq(&self.created_on, &issue.created_on)
            && eq(&self.updated_on, &issue.updated_on)
    }
}

fn invalid(field: &'static str, value: &str) -> FilterError {
    FilterError {
        field,
        value: value.to_string(),
    }
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, FilterError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| invalid(field, value))
}
