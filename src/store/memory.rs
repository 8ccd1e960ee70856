//! In-memory issue store.
//!
//! Keeps issues in insertion order behind a `tokio::sync::RwLock`. Identifiers
//! are freshly generated ObjectIds so they look exactly like the MongoDB ones.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::issues::{Issue, IssueChanges, IssueFilter, IssueId, NewIssue};
use crate::store::{IssueStore, Result, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryIssueStore {
    issues: RwLock<Vec<Issue>>,
}

impl InMemoryIssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored issues across all projects.
    pub async fn len(&self) -> usize {
        self.issues.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.issues.read().await.is_empty()
    }
}

#[async_trait]
impl IssueStore for InMemoryIssueStore {
    async fn find(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let issues = self.issues.read().await;
        Ok(issues
            .iter()
            .filter(|issue| filter.matches(issue))
            .cloned()
            .collect())
    }

    async fn insert(&self, issue: NewIssue) -> Result<Issue> {
        let id = IssueId::parse(&ObjectId::new().to_hex())
            .map_err(|e| StoreError::InvalidId(e.0))?;
        let issue = Issue::from_new(id, issue);
        self.issues.write().await.push(issue.clone());
        Ok(issue)
    }

    async fn get(&self, id: &IssueId) -> Result<Option<Issue>> {
        let issues = self.issues.read().await;
        Ok(issues.iter().find(|issue| &issue.id == id).cloned())
    }

    async fn update(&self, id: &IssueId, changes: &IssueChanges) -> Result<Option<Issue>> {
        let mut issues = self.issues.write().await;
        Ok(issues.iter_mut().find(|issue| &issue.id == id).map(|issue| {
            issue.apply(changes);
            issue.clone()
        }))
    }

    async fn delete(&self, id: &IssueId) -> Result<Option<Issue>> {
        let mut issues = self.issues.write().await;
        let position = issues.iter().position(|issue| &issue.id == id);
        Ok(position.map(|index| issues.remove(index)))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
