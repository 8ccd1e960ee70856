//! MongoDB issue store.
//!
//! # Responsibilities
//! - Build a driver client from `DatabaseConfig` (pool size, timeouts)
//! - Translate filters and sparse updates into BSON documents
//! - Map stored documents (ObjectId, BSON datetime) to `Issue`
//!
//! # Design Decisions
//! - Update is a `$set` via `find_one_and_update` returning the new document
//! - Delete is `find_one_and_delete` so "not found" is observable
//! - Listing sorts by `_id`, which follows insertion order

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};

use crate::config::DatabaseConfig;
use crate::issues::{Issue, IssueChanges, IssueFilter, IssueId, NewIssue};
use crate::store::{IssueStore, Result, StoreError};

const APP_NAME: &str = "issue-tracker";

/// Issue as laid out in the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IssueDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    project: String,
    issue_title: String,
    issue_text: String,
    created_by: String,
    #[serde(default)]
    assigned_to: String,
    #[serde(default)]
    status_text: String,
    open: bool,
    created_on: BsonDateTime,
    updated_on: BsonDateTime,
}

impl IssueDocument {
    fn into_issue(self) -> Result<Issue> {
        let id = IssueId::parse(&self.id.to_hex()).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(Issue {
            id,
            project: self.project,
            issue_title: self.issue_title,
            issue_text: self.issue_text,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            status_text: self.status_text,
            open: self.open,
            created_on: from_bson_datetime(self.created_on)?,
            updated_on: from_bson_datetime(self.updated_on)?,
        })
    }
}

fn to_bson_datetime(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

fn from_bson_datetime(dt: BsonDateTime) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(dt.timestamp_millis())
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {dt}")))
}

fn object_id(id: &IssueId) -> Result<ObjectId> {
    ObjectId::parse_str(id.as_str()).map_err(|_| StoreError::InvalidId(id.to_string()))
}

fn map_driver_error(e: mongodb::error::Error) -> StoreError {
    match *e.kind {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } => {
            StoreError::Connection(e.to_string())
        }
        ErrorKind::BsonDeserialization(_) => StoreError::Corrupt(e.to_string()),
        _ => StoreError::Query(e.to_string()),
    }
}

/// Build the query document for a listing.
fn filter_document(filter: &IssueFilter) -> Result<Document> {
    let mut query = doc! { "project": filter.project.as_str() };

    if let Some(id) = &filter.id {
        query.insert("_id", object_id(id)?);
    }
    let text_fields = [
        ("issue_title", &filter.issue_title),
        ("issue_text", &filter.issue_text),
        ("created_by", &filter.created_by),
        ("assigned_to", &filter.assigned_to),
        ("status_text", &filter.status_text),
    ];
    for (key, value) in text_fields {
        if let Some(value) = value {
            query.insert(key, value.as_str());
        }
    }
    if let Some(open) = filter.open {
        query.insert("open", open);
    }
    if let Some(created_on) = filter.created_on {
        query.insert("created_on", to_bson_datetime(created_on));
    }
    if let Some(updated_on) = filter.updated_on {
        query.insert("updated_on", to_bson_datetime(updated_on));
    }

    Ok(query)
}

/// Build the `$set` document for an update.
fn set_document(changes: &IssueChanges) -> Document {
    let mut set = Document::new();

    let text_fields = [
        ("issue_title", &changes.issue_title),
        ("issue_text", &changes.issue_text),
        ("created_by", &changes.created_by),
        ("assigned_to", &changes.assigned_to),
        ("status_text", &changes.status_text),
    ];
    for (key, value) in text_fields {
        if let Some(value) = value {
            set.insert(key, value.as_str());
        }
    }
    if let Some(open) = changes.open {
        set.insert("open", open);
    }
    if let Some(updated_on) = changes.updated_on {
        set.insert("updated_on", to_bson_datetime(updated_on));
    }

    set
}

/// Issue store backed by a single MongoDB collection.
#[derive(Clone)]
pub struct MongoIssueStore {
    database: Database,
    collection: Collection<IssueDocument>,
}

impl MongoIssueStore {
    /// Build a client and bind to the configured database and collection.
    ///
    /// The driver connects lazily; an unreachable server is logged here and
    /// surfaces again as per-request errors.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(config.uri.as_str())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        options.app_name = Some(APP_NAME.to_string());
        options.max_pool_size = config.max_pool_size;
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
        options.server_selection_timeout = Some(Duration::from_secs(config.connect_timeout_secs));

        let client =
            Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;
        let database = client.database(&config.database);
        let collection = database.collection::<IssueDocument>(&config.collection);

        let store = Self {
            database,
            collection,
        };

        match store.ping().await {
            Ok(()) => tracing::info!(
                database = %config.database,
                collection = %config.collection,
                "Connected to MongoDB"
            ),
            Err(e) => tracing::error!(
                database = %config.database,
                error = %e,
                "MongoDB unreachable at startup; requests will fail until it recovers"
            ),
        }

        Ok(store)
    }
}

#[async_trait]
impl IssueStore for MongoIssueStore {
    async fn find(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let cursor = self
            .collection
            .find(filter_document(filter)?)
            .sort(doc! { "_id": 1 })
            .await
            .map_err(map_driver_error)?;

        let documents: Vec<IssueDocument> = cursor.try_collect().await.map_err(map_driver_error)?;
        documents.into_iter().map(IssueDocument::into_issue).collect()
    }

    async fn insert(&self, issue: NewIssue) -> Result<Issue> {
        let created_on = to_bson_datetime(issue.created_on);
        let document = IssueDocument {
            id: ObjectId::new(),
            project: issue.project,
            issue_title: issue.issue_title,
            issue_text: issue.issue_text,
            created_by: issue.created_by,
            assigned_to: issue.assigned_to,
            status_text: issue.status_text,
            open: true,
            created_on,
            updated_on: created_on,
        };

        self.collection
            .insert_one(&document)
            .await
            .map_err(map_driver_error)?;

        document.into_issue()
    }

    async fn get(&self, id: &IssueId) -> Result<Option<Issue>> {
        self.collection
            .find_one(doc! { "_id": object_id(id)? })
            .await
            .map_err(map_driver_error)?
            .map(IssueDocument::into_issue)
            .transpose()
    }

    async fn update(&self, id: &IssueId, changes: &IssueChanges) -> Result<Option<Issue>> {
        self.collection
            .find_one_and_update(
                doc! { "_id": object_id(id)? },
                doc! { "$set": set_document(changes) },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_driver_error)?
            .map(IssueDocument::into_issue)
            .transpose()
    }

    async fn delete(&self, id: &IssueId) -> Result<Option<Issue>> {
        self.collection
            .find_one_and_delete(doc! { "_id": object_id(id)? })
            .await
            .map_err(map_driver_error)?
            .map(IssueDocument::into_issue)
            .transpose()
    }

    async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(map_driver_error)
    }
}
