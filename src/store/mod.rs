//! Issue persistence subsystem.
//!
//! # Data Flow
//! ```text
//! issues::handlers
//!     → IssueStore (object-safe async trait, shared as Arc<dyn IssueStore>)
//!         → mongo.rs  (MongoDB collection, production)
//!         → memory.rs (in-process Vec, tests and local runs)
//! ```
//!
//! # Design Decisions
//! - One collection, one entity; every call maps to a single store operation
//! - Identifiers are validated before they reach a backend
//! - Update and delete return `Ok(None)` for "no such record"; errors are
//!   reserved for the store itself failing

pub mod memory;
pub mod mongo;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{DatabaseConfig, StoreBackend};
use crate::issues::{Issue, IssueChanges, IssueFilter, IssueId, NewIssue};

pub use memory::InMemoryIssueStore;
pub use mongo::MongoIssueStore;

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store query failed: {0}")]
    Query(String),

    #[error("malformed identifier: {0}")]
    InvalidId(String),

    #[error("corrupt document: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence operations for issues.
#[async_trait]
pub trait IssueStore: Send + Sync {
    /// All issues matching `filter`, in insertion order.
    async fn find(&self, filter: &IssueFilter) -> Result<Vec<Issue>>;

    /// Persist a new issue and return it with its assigned identifier.
    async fn insert(&self, issue: NewIssue) -> Result<Issue>;

    async fn get(&self, id: &IssueId) -> Result<Option<Issue>>;

    /// Apply `changes` and return the updated record.
    async fn update(&self, id: &IssueId, changes: &IssueChanges) -> Result<Option<Issue>>;

    /// Remove the record and return what was removed.
    async fn delete(&self, id: &IssueId) -> Result<Option<Issue>>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<()>;
}

/// Open the store selected by configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn IssueStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory issue store; data is lost on restart");
            Ok(Arc::new(InMemoryIssueStore::new()))
        }
        StoreBackend::Mongodb => {
            let store = MongoIssueStore::connect(config).await?;
            Ok(Arc::new(store))
        }
    }
}
