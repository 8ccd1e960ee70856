use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An issue as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: String,
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub open: bool,
    pub created_on: String,
    pub updated_on: String,
}

#[derive(Debug, Default, Serialize)]
pub struct CreateIssue {
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct UpdateIssue {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
}

/// `{result, _id}` envelope returned by update and delete.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Outcome {
    pub result: String,
    #[serde(rename = "_id")]
    pub id: String,
}

/// An `{error, _id?}` reply from the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiFailure {
    pub error: String,
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{} ({})", self.error, id),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for ApiFailure {}

pub type SdkResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub struct IssueClient {
    client: Client,
    base_url: String,
}

impl IssueClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/api/issues/{project}`, with `project` percent-encoded as a
    /// single path segment.
    pub fn endpoint(&self, project: &str) -> SdkResult<Url> {
        issues_url(&self.base_url, project)
    }

    /// List issues in `project`, narrowed by exact-match filters.
    pub async fn list(&self, project: &str, filters: &[(&str, &str)]) -> SdkResult<Vec<Issue>> {
        let resp = self
            .client
            .get(self.endpoint(project)?)
            .query(filters)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn create(&self, project: &str, issue: &CreateIssue) -> SdkResult<Issue> {
        let resp = self
            .client
            .post(self.endpoint(project)?)
            .json(issue)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn update(&self, project: &str, update: &UpdateIssue) -> SdkResult<Outcome> {
        let resp = self
            .client
            .put(self.endpoint(project)?)
            .json(update)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn delete(&self, project: &str, id: &str) -> SdkResult<Outcome> {
        let resp = self
            .client
            .delete(self.endpoint(project)?)
            .json(&serde_json::json!({ "_id": id }))
            .send()
            .await?;
        decode(resp).await
    }
}

/// Build the collection URL for `project` under `base_url`.
pub fn issues_url(base_url: &str, project: &str) -> SdkResult<Url> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|_| format!("base URL cannot carry a path: {base_url}"))?
        .pop_if_empty()
        .extend(["api", "issues", project]);
    Ok(url)
}

/// Turn a reply into `T`, or into an [`ApiFailure`] when it carries `error`.
async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> SdkResult<T> {
    let status = resp.status();
    let body: Value = resp.json().await?;

    if body.get("error").is_some() {
        let failure: ApiFailure = serde_json::from_value(body)?;
        return Err(failure.into());
    }
    if status != StatusCode::OK {
        return Err(format!("issue tracker returned status {}: {}", status, body).into());
    }

    Ok(serde_json::from_value(body)?)
}
