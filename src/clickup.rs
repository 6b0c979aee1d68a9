//! ClickUp task import. Tasks from a list can be turned into draft releases.

use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::models::{Category, ReleaseDraft};

/// ClickUp returns at most this many tasks per page.
pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum ClickUpError {
    #[error("ClickUp API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Invalid list ID: {0}")]
    InvalidListId(String),
    #[error("API key and list ID are required")]
    MissingCredentials,
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Task must have a title")]
    UntitledTask,
}

/// A task as presented to the admin for import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: String,
}

impl Task {
    /// Map the task 1:1 onto a new release: feature category, dated by its due
    /// date or `now`, no tags, labels or media.
    pub fn to_draft(&self, now: DateTime<Utc>) -> Result<ReleaseDraft, ClickUpError> {
        if self.name.trim().is_empty() {
            return Err(ClickUpError::UntitledTask);
        }

        Ok(ReleaseDraft {
            id: None,
            title: self.name.clone(),
            description: self.description.clone(),
            datetime: self.due_date.unwrap_or(now),
            category: Category::Feature,
            tags: Some(Vec::new()),
            labels: Some(Vec::new()),
            media: None,
        })
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TaskPage {
    #[serde(default)]
    tasks: Vec<RawTask>,
    #[serde(default)]
    last_page: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawTask {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    text_content: Option<String>,
    #[serde(default)]
    status: Option<RawStatus>,
    /// Milliseconds since the epoch, as a string
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    priority: Option<RawPriority>,
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    status: String,
}

#[derive(Debug, Deserialize)]
struct RawPriority {
    priority: String,
}

impl From<RawTask> for Task {
    fn from(raw: RawTask) -> Self {
        Task {
            id: raw.id,
            name: raw.name.unwrap_or_default(),
            description: raw
                .description
                .filter(|d| !d.is_empty())
                .or(raw.text_content)
                .unwrap_or_default(),
            status: raw.status.map(|s| s.status).unwrap_or_default(),
            due_date: raw
                .due_date
                .and_then(|ms| ms.parse::<i64>().ok())
                .and_then(DateTime::from_timestamp_millis),
            priority: raw
                .priority
                .map(|p| p.priority)
                .unwrap_or_else(|| "none".to_string()),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct ClickUpClient {
    base_url: String,
    client: Client,
    max_pages: u32,
}

impl ClickUpClient {
    pub fn new(base_url: &str, max_pages: u32) -> Result<Self, ClickUpError> {
        let client = Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            max_pages: max_pages.max(1),
        })
    }

    /// Fetch the tasks of a list, optionally only those created after
    /// `start_date`. Pages are followed until a short page, `last_page`, or
    /// the configured page bound.
    pub async fn fetch_tasks(
        &self,
        api_key: &str,
        list_id: &str,
        start_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<Task>, ClickUpError> {
        let api_key = api_key.trim();
        let list_id = list_id.trim();
        if api_key.is_empty() || list_id.is_empty() {
            return Err(ClickUpError::MissingCredentials);
        }
        if !list_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ClickUpError::InvalidListId(list_id.to_string()));
        }

        let url = format!("{}/list/{}/task", self.base_url, list_id);
        let mut tasks = Vec::new();

        for page in 0..self.max_pages {
            let mut params = vec![
                ("page", page.to_string()),
                ("include_closed", "true".to_string()),
            ];
            if let Some(start) = start_date {
                params.push(("date_created_gt", start.timestamp_millis().to_string()));
            }

            let resp = self
                .client
                .get(&url)
                .header(AUTHORIZATION, api_key)
                .query(&params)
                .send()
                .await?;

            if !resp.status().is_success() {
                let status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                return Err(ClickUpError::Api { status, body });
            }

            let body: TaskPage = resp.json().await?;
            let count = body.tasks.len();
            tasks.extend(body.tasks.into_iter().map(Task::from));

            tracing::debug!(list_id = %list_id, page, count, "Fetched ClickUp task page");

            if count < PAGE_SIZE || body.last_page.unwrap_or(false) {
                break;
            }
        }

        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn raw_task(id: usize) -> serde_json::Value {
        json!({
            "id": format!("task-{id}"),
            "name": format!("Task {id}"),
            "description": null,
            "text_content": "",
            "status": { "status": "open" },
            "due_date": null,
            "priority": null
        })
    }

    #[tokio::test]
    async fn test_fetch_tasks_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list/901/task"))
            .and(header("Authorization", "pk_test"))
            .and(query_param("page", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tasks": [{
                    "id": "abc",
                    "name": "Ship dark mode",
                    "description": "Adds a theme toggle",
                    "status": { "status": "complete" },
                    "due_date": "1710862200000",
                    "priority": { "priority": "high" }
                }],
                "last_page": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ClickUpClient::new(&server.uri(), 5).unwrap();
        let tasks = client.fetch_tasks("pk_test", "901", None).await.unwrap();

        assert_eq!(tasks.len(), 1);
        let task = &tasks[0];
        assert_eq!(task.id, "abc");
        assert_eq!(task.name, "Ship dark mode");
        assert_eq!(task.description, "Adds a theme toggle");
        assert_eq!(task.status, "complete");
        assert_eq!(task.priority, "high");
        assert_eq!(
            task.due_date,
            Some(DateTime::parse_from_rfc3339("2024-03-19T15:30:00Z").unwrap().with_timezone(&Utc))
        );
    }

    #[tokio::test]
    async fn test_fetch_tasks_follows_pages() {
        let server = MockServer::start().await;
        let full: Vec<_> = (0..PAGE_SIZE).map(raw_task).collect();
        Mock::given(method("GET"))
            .and(path("/list/901/task"))
            .and(query_param("page", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tasks": full })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/list/901/task"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "tasks": [raw_task(500), raw_task(501)] })),
            )
            .mount(&server)
            .await;

        let client = ClickUpClient::new(&server.uri(), 5).unwrap();
        let tasks = client.fetch_tasks("pk_test", "901", None).await.unwrap();

        assert_eq!(tasks.len(), PAGE_SIZE + 2);
        assert_eq!(tasks.last().unwrap().id, "task-501");
        assert_eq!(tasks[0].priority, "none");
    }

    #[tokio::test]
    async fn test_fetch_tasks_respects_page_bound() {
        let server = MockServer::start().await;
        let full: Vec<_> = (0..PAGE_SIZE).map(raw_task).collect();
        Mock::given(method("GET"))
            .and(path("/list/901/task"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tasks": full })))
            .expect(2)
            .mount(&server)
            .await;

        let client = ClickUpClient::new(&server.uri(), 2).unwrap();
        let tasks = client.fetch_tasks("pk_test", "901", None).await.unwrap();
        assert_eq!(tasks.len(), PAGE_SIZE * 2);
    }

    #[tokio::test]
    async fn test_start_date_filter_is_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/list/901/task"))
            .and(query_param("date_created_gt", "1710806400000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tasks": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ClickUpClient::new(&server.uri(), 5).unwrap();
        let start = DateTime::parse_from_rfc3339("2024-03-19T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let tasks = client
            .fetch_tasks("pk_test", "901", Some(start))
            .await
            .unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Token invalid"))
            .mount(&server)
            .await;

        let client = ClickUpClient::new(&server.uri(), 5).unwrap();
        let err = client.fetch_tasks("bad", "901", None).await.unwrap_err();
        match err {
            ClickUpError::Api { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Token invalid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let client = ClickUpClient::new("http://127.0.0.1:9", 1).unwrap();
        assert!(matches!(
            client.fetch_tasks("", "901", None).await,
            Err(ClickUpError::MissingCredentials)
        ));
        assert!(matches!(
            client.fetch_tasks("pk", "../admin", None).await,
            Err(ClickUpError::InvalidListId(_))
        ));
    }

    #[test]
    fn test_task_to_draft() {
        let now = Utc::now();
        let task = Task {
            id: "abc".to_string(),
            name: "Ship dark mode".to_string(),
            description: "Theme toggle".to_string(),
            status: "complete".to_string(),
            due_date: None,
            priority: "high".to_string(),
        };

        let draft = task.to_draft(now).unwrap();
        assert_eq!(draft.id, None);
        assert_eq!(draft.title, "Ship dark mode");
        assert_eq!(draft.description, "Theme toggle");
        assert_eq!(draft.datetime, now);
        assert_eq!(draft.category, Category::Feature);
        assert_eq!(draft.tags, Some(vec![]));

        let untitled = Task {
            name: "  ".to_string(),
            ..task
        };
        assert!(matches!(untitled.to_draft(now), Err(ClickUpError::UntitledTask)));
    }
}
