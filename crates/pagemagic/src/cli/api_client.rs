//! Blocking HTTP client for the Page Magic backend.

use std::time::Duration;

use pagemagic_core::api::{ApiError, job_status_path};
use pagemagic_core::error::Result;
use pagemagic_core::poll::{JobSnapshot, JobSource};
use serde::de::DeserializeOwned;

/// Thin JSON client: bearer auth, JSON bodies, typed errors for non-2xx responses.
pub struct ApiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for `base_url`.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pagemagic/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Full URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and decode the JSON response.
    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        log::debug!("GET {}", url);

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &body).into());
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl JobSource for ApiClient {
    fn fetch(&mut self, job_id: &str) -> Result<JobSnapshot> {
        let path = job_status_path(&urlencoding::encode(job_id));
        self.get_json(&path)
    }
}
