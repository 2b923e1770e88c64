//! Entity API client
//!
//! One method per endpoint, one HTTP round trip per call. `create_entity`
//! fails on a non-success status; the other calls hand the status back so the
//! test can assert on it.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::report::{step, Attachment, SharedReporter};

/// Status and decoded body of a read call
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// JSON body, or the raw text as a JSON string when the body is not JSON
    pub body: Value,
}

/// Client for the entity CRUD endpoints
#[derive(Clone)]
pub struct EntityApi {
    base_url: String,
    http: reqwest::Client,
    reporter: SharedReporter,
}

impl EntityApi {
    pub fn new(base_url: impl Into<String>, reporter: SharedReporter) -> Self {
        Self::with_client(base_url, reqwest::Client::new(), reporter)
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client, reporter: SharedReporter) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http,
            reporter,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn reporter(&self) -> &SharedReporter {
        &self.reporter
    }

    /// Create an entity and return its id
    pub async fn create_entity<T: Serialize + ?Sized>(&self, data: &T) -> E2eResult<i64> {
        let url = format!("{}/api/create", self.base_url);
        let body = serde_json::to_value(data)?;
        step(&*self.reporter, "Create a new entity", async {
            let (status, body) = self
                .send(Method::POST, &url, json_headers(), Some(&body))
                .await?;
            if !status.is_success() {
                return Err(E2eError::Status {
                    method: "POST".to_string(),
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            Ok(serde_json::from_value(body)?)
        })
        .await
    }

    /// Fetch one entity
    pub async fn get_entity(&self, entity_id: i64) -> E2eResult<ApiResponse> {
        let url = format!("{}/api/get/{}", self.base_url, entity_id);
        step(&*self.reporter, format!("Get entity by ID {}", entity_id), async {
            let (status, body) = self.send(Method::GET, &url, accept("application/json"), None).await?;
            Ok(ApiResponse { status, body })
        })
        .await
    }

    /// Fetch the entity list
    pub async fn get_all_entities(&self) -> E2eResult<ApiResponse> {
        let url = format!("{}/api/getAll", self.base_url);
        step(&*self.reporter, "Get all entities", async {
            let (status, body) = self.send(Method::GET, &url, accept("application/json"), None).await?;
            Ok(ApiResponse { status, body })
        })
        .await
    }

    /// Replace an entity's fields; returns the status code
    pub async fn update_entity<T: Serialize + ?Sized>(&self, entity_id: i64, data: &T) -> E2eResult<StatusCode> {
        let url = format!("{}/api/patch/{}", self.base_url, entity_id);
        let body = serde_json::to_value(data)?;
        step(&*self.reporter, format!("Update entity with ID {}", entity_id), async {
            let (status, _) = self
                .send(Method::PATCH, &url, json_headers(), Some(&body))
                .await?;
            Ok(status)
        })
        .await
    }

    /// Delete an entity; returns the status code
    pub async fn delete_entity(&self, entity_id: i64) -> E2eResult<StatusCode> {
        let url = format!("{}/api/delete/{}", self.base_url, entity_id);
        step(&*self.reporter, format!("Delete entity with ID {}", entity_id), async {
            let (status, _) = self.send(Method::DELETE, &url, accept("text/plain"), None).await?;
            Ok(status)
        })
        .await
    }

    /// Service version string from `GET /api/version`
    pub async fn api_version(&self) -> E2eResult<String> {
        let url = format!("{}/api/version", self.base_url);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(E2eError::Status {
                method: "GET".to_string(),
                url,
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?.trim().to_string())
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<&Value>,
    ) -> E2eResult<(StatusCode, Value)> {
        self.log_request(&method, url, &headers, body);

        let mut request = self.http.request(method.clone(), url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let response_headers = response.headers().clone();
        let text = response.text().await?;
        debug!(%method, url, status = status.as_u16(), "entity API call");

        let body = match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(_) => Value::String(text),
        };
        self.log_response(status, &response_headers, &body);

        Ok((status, body))
    }

    fn log_request(&self, method: &Method, url: &str, headers: &HeaderMap, body: Option<&Value>) {
        let reporter = &self.reporter;
        reporter.start_step(&format!("Request: {} {}", method, url));
        if !headers.is_empty() {
            reporter.attach("Headers", Attachment::json(&headers_to_json(headers)));
        }
        if let Some(body) = body {
            reporter.attach("Request Body", Attachment::json(body));
        }
        reporter.finish_step(crate::report::Status::Passed);
    }

    fn log_response(&self, status: StatusCode, headers: &HeaderMap, body: &Value) {
        let reporter = &self.reporter;
        reporter.start_step(&format!("Response: Status Code {}", status.as_u16()));
        let attachment = match body {
            Value::String(text) => Attachment::text(text.clone()),
            other => Attachment::json(other),
        };
        reporter.attach("Response Body", attachment);
        reporter.attach("Response Headers", Attachment::json(&headers_to_json(headers)));
        reporter.finish_step(crate::report::Status::Passed);
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = accept("application/json");
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

fn accept(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(value));
    headers
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let map = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();
    Value::Object(map)
}
