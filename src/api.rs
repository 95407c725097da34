//! Client for the remote task-records API.
//!
//! Every operation issues exactly one request and either decodes the body
//! or reports why it couldn't. Nothing is retried.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::task::{Task, TaskPayload};

/// Errors from talking to the task API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The API answered with a non-success status.
    #[error("task API returned {status}")]
    Remote {
        /// Upstream HTTP status code.
        status: u16,
        /// Response body, when there was one.
        body: Option<String>,
    },

    /// No response was received (connection refused, timeout, ...).
    #[error("task API unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    /// A success response whose body was not the expected JSON.
    #[error("unexpected task API response: {0}")]
    Decode(#[source] reqwest::Error),

    /// The base URL is not an absolute http or https URL.
    #[error("invalid task API URL {url:?}")]
    InvalidUrl { url: String },

    /// The HTTP client itself could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

#[derive(Clone)]
pub struct TaskApi {
    client: reqwest::Client,
    base_url: String,
}

impl TaskApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let is_http = reqwest::Url::parse(base_url)
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host());
        if !is_http {
            return Err(ApiError::InvalidUrl {
                url: base_url.to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("taskboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn task_url(&self, id: i64) -> String {
        format!("{}/{}", self.base_url, id)
    }

    pub async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let response = self.send(self.client.get(&self.base_url)).await?;
        decode(response).await
    }

    pub async fn get(&self, id: i64) -> Result<Task, ApiError> {
        let response = self.send(self.client.get(self.task_url(id))).await?;
        decode(response).await
    }

    pub async fn create(&self, payload: &TaskPayload) -> Result<Task, ApiError> {
        let response = self
            .send(self.client.post(&self.base_url).json(payload))
            .await?;
        decode(response).await
    }

    pub async fn update_status(&self, id: i64, status: &str) -> Result<Task, ApiError> {
        let url = format!("{}/status", self.task_url(id));
        let response = self
            .send(self.client.patch(url).json(&json!({ "status": status })))
            .await?;
        decode(response).await
    }

    pub async fn update(&self, id: i64, payload: &TaskPayload) -> Result<Task, ApiError> {
        let response = self
            .send(self.client.put(self.task_url(id)).json(payload))
            .await?;
        decode(response).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.send(self.client.delete(self.task_url(id))).await?;
        Ok(())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(ApiError::Transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.ok().filter(|b| !b.trim().is_empty());
        Err(ApiError::Remote {
            status: status.as_u16(),
            body,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response.json::<T>().await.map_err(|e| {
        if e.is_decode() {
            ApiError::Decode(e)
        } else {
            ApiError::Transport(e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn task_json(id: i64, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "description": "",
            "status": "In Progress",
            "dueDate": "2025-01-01T00:00:00"
        })
    }

    fn payload() -> TaskPayload {
        TaskPayload {
            title: "Write report".into(),
            description: "Quarterly".into(),
            status: "Not Started".into(),
            due_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    async fn api_for(server: &MockServer) -> TaskApi {
        TaskApi::new(&format!("{}/api/tasks", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn list_decodes_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([task_json(1, "a"), task_json(2, "b")])),
            )
            .mount(&server)
            .await;

        let tasks = api_for(&server).await.list().await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].title, "b");
    }

    #[tokio::test]
    async fn get_hits_task_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks/12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(task_json(12, "twelve")))
            .expect(1)
            .mount(&server)
            .await;

        let task = api_for(&server).await.get(12).await.unwrap();
        assert_eq!(task.id, 12);
    }

    #[tokio::test]
    async fn create_posts_camel_case_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tasks"))
            .and(body_json(json!({
                "title": "Write report",
                "description": "Quarterly",
                "status": "Not Started",
                "dueDate": "2025-01-01T00:00:00Z"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(task_json(3, "Write report")))
            .expect(1)
            .mount(&server)
            .await;

        let created = api_for(&server).await.create(&payload()).await.unwrap();
        assert_eq!(created.id, 3);
    }

    #[tokio::test]
    async fn create_server_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/tasks"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = api_for(&server).await.create(&payload()).await.unwrap_err();
        match err {
            ApiError::Remote { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.as_deref(), Some("boom"));
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        // Grab a free port and release it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let api = TaskApi::new(
            &format!("http://127.0.0.1:{port}/api/tasks"),
            Duration::from_secs(5),
        )
        .unwrap();
        let err = api.create(&payload()).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn base_url_must_be_absolute_http() {
        for url in ["localhost:4000/api/tasks", "not a url", "ftp://files/api/tasks"] {
            let err = TaskApi::new(url, Duration::from_secs(5)).err().unwrap();
            assert!(matches!(err, ApiError::InvalidUrl { .. }), "{url}: got {err:?}");
            assert_eq!(err.status(), None);
        }

        let api = TaskApi::new("https://tasks.internal/api/tasks/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.base_url(), "https://tasks.internal/api/tasks");
    }

    #[tokio::test]
    async fn update_status_patches_status_body() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/tasks/4/status"))
            .and(body_json(json!({ "status": "Completed" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(task_json(4, "four")))
            .expect(1)
            .mount(&server)
            .await;

        api_for(&server)
            .await
            .update_status(4, "Completed")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_puts_full_record() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/tasks/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(task_json(5, "Write report")))
            .expect(1)
            .mount(&server)
            .await;

        let updated = api_for(&server).await.update(5, &payload()).await.unwrap();
        assert_eq!(updated.id, 5);
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let err = api_for(&server).await.list().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn deleting_twice_reports_not_found_the_second_time() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/tasks/9"))
            .respond_with(ResponseTemplate::new(204))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/tasks/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json(1, "a")])))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        api.delete(9).await.unwrap();

        let err = api.delete(9).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "task API returned 404");

        let remaining = api.list().await.unwrap();
        assert!(remaining.iter().all(|t| t.id != 9));
    }
}
