//! Handlers for `/api/issues/{project}`.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::http::request::IssueBody;
use crate::http::response::{ApiError, Outcome};
use crate::http::server::AppState;
use crate::issues::model::now;
use crate::issues::{Issue, IssueFilter, IssueForm, IssueId};
use crate::observability::metrics;

/// GET: list a project's issues, narrowed by exact-match query filters.
pub async fn list_issues(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    let filter = IssueFilter::from_query(&project, &query).map_err(|e| {
        tracing::warn!(project = %project, error = %e, "Rejected listing filter");
        ApiError::CouldNotRetrieve
    })?;

    let issues = state.store.find(&filter).await.map_err(|e| {
        tracing::error!(project = %project, error = %e, "Failed to retrieve issues");
        metrics::record_store_error("find");
        ApiError::CouldNotRetrieve
    })?;

    tracing::debug!(project = %project, count = issues.len(), "Listed issues");
    Ok(Json(issues))
}

/// POST: create an issue in `project`.
pub async fn create_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    IssueBody(form): IssueBody<IssueForm>,
) -> Result<Json<Issue>, ApiError> {
    let new_issue = form.into_new_issue(&project)?;

    let issue = state.store.insert(new_issue).await.map_err(|e| {
        tracing::error!(project = %project, error = %e, "Failed to create issue");
        metrics::record_store_error("insert");
        ApiError::CouldNotCreate
    })?;

    tracing::info!(project = %project, issue_id = %issue.id, "Issue created");
    Ok(Json(issue))
}

/// PUT: apply the supplied fields to the issue named by `_id`.
pub async fn update_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    IssueBody(form): IssueBody<IssueForm>,
) -> Result<Json<Outcome>, ApiError> {
    let raw_id = form.id().ok_or(ApiError::MissingId)?.to_string();

    if !form.has_updates() {
        return Err(ApiError::NoUpdateFields { id: raw_id });
    }

    let Ok(id) = IssueId::parse(&raw_id) else {
        tracing::warn!(project = %project, issue_id = %raw_id, "Update with malformed id");
        return Err(ApiError::CouldNotUpdate { id: raw_id });
    };

    let changes = match form.changes() {
        Ok(changes) => changes,
        Err(e) => {
            tracing::warn!(project = %project, issue_id = %raw_id, error = %e, "Update with uncastable field");
            return Err(ApiError::CouldNotUpdate { id: raw_id });
        }
    };

    match state.store.update(&id, &changes.stamped(now())).await {
        Ok(Some(issue)) => {
            tracing::info!(project = %project, issue_id = %issue.id, "Issue updated");
            Ok(Json(Outcome::updated(issue.id.to_string())))
        }
        Ok(None) => {
            tracing::warn!(project = %project, issue_id = %raw_id, "Update target not found");
            Err(ApiError::CouldNotUpdate { id: raw_id })
        }
        Err(e) => {
            tracing::error!(project = %project, issue_id = %raw_id, error = %e, "Failed to update issue");
            metrics::record_store_error("update");
            Err(ApiError::CouldNotUpdate { id: raw_id })
        }
    }
}

/// DELETE: remove the issue named by `_id`.
pub async fn delete_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    IssueBody(form): IssueBody<IssueForm>,
) -> Result<Json<Outcome>, ApiError> {
    let raw_id = form.id().ok_or(ApiError::MissingId)?.to_string();

    let Ok(id) = IssueId::parse(&raw_id) else {
        tracing::warn!(project = %project, issue_id = %raw_id, "Delete with malformed id");
        return Err(ApiError::CouldNotDelete { id: raw_id });
    };

    match state.store.delete(&id).await {
        Ok(Some(_)) => {
            tracing::info!(project = %project, issue_id = %raw_id, "Issue deleted");
            Ok(Json(Outcome::deleted(raw_id)))
        }
        Ok(None) => {
            tracing::warn!(project = %project, issue_id = %raw_id, "Delete target not found");
            Err(ApiError::CouldNotDelete { id: raw_id })
        }
        Err(e) => {
            tracing::error!(project = %project, issue_id = %raw_id, error = %e, "Failed to delete issue");
            metrics::record_store_error("delete");
            Err(ApiError::CouldNotDelete { id: raw_id })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{CONTENT_LENGTH, CONTENT_TYPE},
            Method, Request, StatusCode,
        },
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::TrackerConfig;
    use crate::http::server::build_router;
    use crate::issues::{IssueChanges, NewIssue};
    use crate::store::{InMemoryIssueStore, IssueStore, StoreError};

    use super::*;

    const MISSING_ID: &str = "5f8d0d55b54764421b7156c9";

    fn app(store: Arc<dyn IssueStore>) -> Router {
        build_router(&TrackerConfig::default(), AppState::new(store))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                request = request.header(CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn create(app: &Router, project: &str, body: Value) -> Value {
        let (status, created) = send(app, Method::POST, &format!("/api/issues/{project}"), Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        created
    }

    fn full_issue() -> Value {
        json!({
            "issue_title": "Test Title",
            "issue_text": "Test Text for the issue",
            "created_by": "Zaid",
            "assigned_to": "Raghad",
            "status_text": "In Progress",
        })
    }

    fn required_only() -> Value {
        json!({
            "issue_title": "Test Title",
            "issue_text": "Test Text for the issue",
            "created_by": "Zaid",
        })
    }

    #[tokio::test]
    async fn test_create_with_every_field() {
        let store = Arc::new(InMemoryIssueStore::new());
        let app = app(store.clone());

        let created = create(&app, "apitest", full_issue()).await;
        assert_eq!(created["issue_title"], "Test Title");
        assert_eq!(created["issue_text"], "Test Text for the issue");
        assert_eq!(created["created_by"], "Zaid");
        assert_eq!(created["assigned_to"], "Raghad");
        assert_eq!(created["status_text"], "In Progress");
        assert_eq!(created["project"], "apitest");
        assert_eq!(created["open"], true);
        assert!(IssueId::parse(created["_id"].as_str().unwrap()).is_ok());
        assert_eq!(created["created_on"], created["updated_on"]);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_with_required_fields_only() {
        let app = app(Arc::new(InMemoryIssueStore::new()));

        let created = create(&app, "apitest", required_only()).await;
        assert_eq!(created["assigned_to"], "");
        assert_eq!(created["status_text"], "");
        assert_eq!(created["open"], true);
    }

    #[tokio::test]
    async fn test_create_missing_required_field_persists_nothing() {
        let store = Arc::new(InMemoryIssueStore::new());
        let app = app(store.clone());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/issues/apitest",
            Some(json!({ "created_by": "Zaid", "assigned_to": "Raghad", "status_text": "In Progress" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "required field(s) missing" }));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_scopes_by_project_and_filters() {
        let app = app(Arc::new(InMemoryIssueStore::new()));
        create(&app, "apitest", full_issue()).await;
        create(&app, "apitest", required_only()).await;
        create(&app, "other", full_issue()).await;

        let (status, all) = send(&app, Method::GET, "/api/issues/apitest", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (_, assigned) = send(&app, Method::GET, "/api/issues/apitest?assigned_to=Raghad", None).await;
        let assigned = assigned.as_array().unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0]["assigned_to"], "Raghad");

        let (_, both) = send(
            &app,
            Method::GET,
            "/api/issues/apitest?assigned_to=Raghad&open=false",
            None,
        )
        .await;
        assert!(both.as_array().unwrap().is_empty());

        let (_, both) = send(
            &app,
            Method::GET,
            "/api/issues/apitest?assigned_to=Raghad&open=true",
            None,
        )
        .await;
        assert_eq!(both.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_ignores_unknown_filters() {
        let app = app(Arc::new(InMemoryIssueStore::new()));
        create(&app, "apitest", full_issue()).await;

        let (_, listed) = send(&app, Method::GET, "/api/issues/apitest?color=red&project=other", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_bad_filter_value_is_500() {
        let app = app(Arc::new(InMemoryIssueStore::new()));

        let (status, body) = send(&app, Method::GET, "/api/issues/apitest?open=maybe", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "could not retreive issues" }));
    }

    #[tokio::test]
    async fn test_update_one_field() {
        let store = Arc::new(InMemoryIssueStore::new());
        let app = app(store.clone());
        let created = create(&app, "apitest", full_issue()).await;
        let id = created["_id"].as_str().unwrap().to_string();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/issues/apitest",
            Some(json!({ "_id": id, "issue_text": "Updated text" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "result": "successfully updated", "_id": id }));

        let stored = store.get(&IssueId::parse(&id).unwrap()).await.unwrap().unwrap();
        let before: Issue = serde_json::from_value(created).unwrap();
        assert_eq!(stored.issue_text, "Updated text");
        assert_eq!(stored.issue_title, before.issue_title);
        assert_eq!(stored.assigned_to, before.assigned_to);
        assert_eq!(stored.open, before.open);
        assert_eq!(stored.created_on, before.created_on);
        assert!(stored.updated_on > before.updated_on);
    }

    #[tokio::test]
    async fn test_update_multiple_fields_and_close() {
        let store = Arc::new(InMemoryIssueStore::new());
        let app = app(store.clone());
        let created = create(&app, "apitest", full_issue()).await;
        let id = created["_id"].as_str().unwrap().to_string();

        let (_, body) = send(
            &app,
            Method::PUT,
            "/api/issues/apitest",
            Some(json!({ "_id": id, "issue_title": "New", "open": false })),
        )
        .await;
        assert_eq!(body["result"], "successfully updated");

        let stored = store.get(&IssueId::parse(&id).unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.issue_title, "New");
        assert!(!stored.open);
    }

    #[tokio::test]
    async fn test_update_validation_errors() {
        let app = app(Arc::new(InMemoryIssueStore::new()));

        let (_, body) = send(&app, Method::PUT, "/api/issues/apitest", Some(json!({ "issue_title": "x" }))).await;
        assert_eq!(body, json!({ "error": "missing _id" }));

        let (_, body) = send(&app, Method::PUT, "/api/issues/apitest", Some(json!({ "_id": MISSING_ID }))).await;
        assert_eq!(body, json!({ "error": "no update field(s) sent", "_id": MISSING_ID }));

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/issues/apitest",
            Some(json!({ "_id": "invalid-id", "issue_title": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "could not update", "_id": "invalid-id" }));

        let (_, body) = send(
            &app,
            Method::PUT,
            "/api/issues/apitest",
            Some(json!({ "_id": MISSING_ID, "issue_title": "x" })),
        )
        .await;
        assert_eq!(body, json!({ "error": "could not update", "_id": MISSING_ID }));
    }

    #[tokio::test]
    async fn test_update_empty_text_is_not_a_change() {
        let app = app(Arc::new(InMemoryIssueStore::new()));
        let created = create(&app, "apitest", full_issue()).await;
        let id = created["_id"].as_str().unwrap();

        let (_, body) = send(
            &app,
            Method::PUT,
            "/api/issues/apitest",
            Some(json!({ "_id": id, "assigned_to": "", "status_text": "" })),
        )
        .await;
        assert_eq!(body, json!({ "error": "no update field(s) sent", "_id": id }));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = Arc::new(InMemoryIssueStore::new());
        let app = app(store.clone());
        let created = create(&app, "apitest", full_issue()).await;
        let id = created["_id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, Method::DELETE, "/api/issues/apitest", Some(json!({ "_id": id }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "result": "successfully deleted", "_id": id }));
        assert!(store.get(&IssueId::parse(&id).unwrap()).await.unwrap().is_none());

        let (_, body) = send(&app, Method::DELETE, "/api/issues/apitest", Some(json!({ "_id": id }))).await;
        assert_eq!(body, json!({ "error": "could not delete", "_id": id }));
    }

    #[tokio::test]
    async fn test_delete_validation_errors() {
        let app = app(Arc::new(InMemoryIssueStore::new()));

        let (_, body) = send(&app, Method::DELETE, "/api/issues/apitest", None).await;
        assert_eq!(body, json!({ "error": "missing _id" }));

        let (_, body) = send(&app, Method::DELETE, "/api/issues/apitest", Some(json!({ "_id": "invalid-id" }))).await;
        assert_eq!(body, json!({ "error": "could not delete", "_id": "invalid-id" }));
    }

    #[tokio::test]
    async fn test_non_object_body_is_400() {
        let app = app(Arc::new(InMemoryIssueStore::new()));

        let (status, body) = send(&app, Method::POST, "/api/issues/apitest", Some(json!("just text"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "invalid request body" }));
    }

    #[tokio::test]
    async fn test_create_coerces_scalar_fields() {
        let app = app(Arc::new(InMemoryIssueStore::new()));

        let created = create(
            &app,
            "apitest",
            json!({ "issue_title": 42, "issue_text": "Text", "created_by": "Zaid" }),
        )
        .await;
        assert_eq!(created["issue_title"], "42");
    }

    #[tokio::test]
    async fn test_wrong_typed_id_gets_generic_error() {
        let app = app(Arc::new(InMemoryIssueStore::new()));

        let (status, body) = send(&app, Method::DELETE, "/api/issues/apitest", Some(json!({ "_id": 123 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "could not delete", "_id": "123" }));

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/issues/apitest",
            Some(json!({ "_id": 123, "issue_title": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "could not update", "_id": "123" }));
    }

    #[tokio::test]
    async fn test_uncastable_open_on_update() {
        let store = Arc::new(InMemoryIssueStore::new());
        let app = app(store.clone());
        let created = create(&app, "apitest", full_issue()).await;
        let id = created["_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/issues/apitest",
            Some(json!({ "_id": id, "open": "maybe" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "could not update", "_id": id }));

        let stored = store.get(&IssueId::parse(&id).unwrap()).await.unwrap().unwrap();
        assert!(stored.open);
    }

    #[tokio::test]
    async fn test_oversized_body_is_413() {
        let mut config = TrackerConfig::default();
        config.security.max_body_size = 16;
        let app = build_router(&config, AppState::new(Arc::new(InMemoryIssueStore::new())));
        let payload = full_issue().to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/issues/apitest")
                    .header(CONTENT_TYPE, "application/json")
                    .header(CONTENT_LENGTH, payload.len())
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    /// A store whose every call fails, standing in for an unreachable database.
    struct FailingStore;

    #[async_trait]
    impl IssueStore for FailingStore {
        async fn find(&self, _: &IssueFilter) -> crate::store::Result<Vec<Issue>> {
            Err(StoreError::Connection("connection refused".into()))
        }
        async fn insert(&self, _: NewIssue) -> crate::store::Result<Issue> {
            Err(StoreError::Connection("connection refused".into()))
        }
        async fn get(&self, _: &IssueId) -> crate::store::Result<Option<Issue>> {
            Err(StoreError::Connection("connection refused".into()))
        }
        async fn update(&self, _: &IssueId, _: &IssueChanges) -> crate::store::Result<Option<Issue>> {
            Err(StoreError::Query("write conflict".into()))
        }
        async fn delete(&self, _: &IssueId) -> crate::store::Result<Option<Issue>> {
            Err(StoreError::Query("write conflict".into()))
        }
        async fn ping(&self) -> crate::store::Result<()> {
            Err(StoreError::Connection("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_store_failures() {
        let app = app(Arc::new(FailingStore));

        let (status, body) = send(&app, Method::GET, "/api/issues/apitest", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "could not retreive issues" }));

        let (status, body) = send(&app, Method::POST, "/api/issues/apitest", Some(required_only())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "could not create issue" }));

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/issues/apitest",
            Some(json!({ "_id": MISSING_ID, "status_text": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "could not update", "_id": MISSING_ID }));

        let (status, body) = send(&app, Method::DELETE, "/api/issues/apitest", Some(json!({ "_id": MISSING_ID }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "could not delete", "_id": MISSING_ID }));

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["store"], "unreachable");
    }
}
