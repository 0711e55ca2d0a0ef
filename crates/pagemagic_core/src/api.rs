//! Contracts shared with the REST backend.
//!
//! The backend answers non-2xx requests with a JSON envelope of the form
//! `{"message": "...", "code": "..."}`. [`ApiError::from_response`] turns such
//! a response into a typed error, singling out the plan/quota limit code that
//! callers must handle separately (usually by showing an upgrade prompt).
//!
//! The transport itself lives in the CLI crate; this module stays free of any
//! HTTP dependency so the job poller can be driven by any [`JobSource`](crate::poll::JobSource).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code the backend uses when an organization has hit its plan limit.
pub const PLAN_LIMIT_CODE: &str = "PLAN_LIMIT_REACHED";

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "PAGEMAGIC_API_URL";

/// Environment variable carrying the bearer token.
pub const API_TOKEN_ENV: &str = "PAGEMAGIC_API_TOKEN";

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable message
    pub message: String,
    /// Machine-readable code, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A failed backend call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The organization's plan does not allow this operation.
    #[error("Plan limit reached: {message}")]
    PlanLimit { status: u16, message: String },

    /// Any other non-2xx response.
    #[error("Request failed with status {status}: {message}")]
    Status {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Build an error from a non-2xx status and its raw body.
    ///
    /// Bodies that are not the JSON envelope are kept verbatim as the message.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();

        let (message, code) = match parsed {
            Some(envelope) => (envelope.message, envelope.code),
            None => {
                let trimmed = body.trim();
                let message = if trimmed.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    trimmed.to_string()
                };
                (message, None)
            }
        };

        if code.as_deref() == Some(PLAN_LIMIT_CODE) {
            return ApiError::PlanLimit { status, message };
        }

        ApiError::Status {
            status,
            message,
            code,
        }
    }

    /// The backend error code, if the response carried one.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::PlanLimit { .. } => Some(PLAN_LIMIT_CODE),
            ApiError::Status { code, .. } => code.as_deref(),
            ApiError::Transport(_) => None,
        }
    }

    /// HTTP status of the failed response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::PlanLimit { status, .. } | ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(_) => None,
        }
    }

    /// Whether callers should treat this as a plan/quota limit.
    pub fn is_plan_limit(&self) -> bool {
        matches!(self, ApiError::PlanLimit { .. })
    }
}

/// Path of the job status endpoint for a page-magic run.
pub fn job_status_path(job_id: &str) -> String {
    format!("/page-magic/jobs/{}", job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_limit_code_is_recognised() {
        let err = ApiError::from_response(
            403,
            r#"{"message":"You have used all page improvements","code":"PLAN_LIMIT_REACHED"}"#,
        );
        assert!(err.is_plan_limit());
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.code(), Some(PLAN_LIMIT_CODE));
    }

    #[test]
    fn test_other_codes_stay_generic() {
        let err = ApiError::from_response(404, r#"{"message":"Project not found","code":"NOT_FOUND"}"#);
        assert!(!err.is_plan_limit());
        assert_eq!(err.code(), Some("NOT_FOUND"));
        assert_eq!(
            err.to_string(),
            "Request failed with status 404: Project not found"
        );
    }

    #[test]
    fn test_non_json_body_kept_as_message() {
        let err = ApiError::from_response(502, "Bad Gateway\n");
        assert_eq!(
            err,
            ApiError::Status {
                status: 502,
                message: "Bad Gateway".to_string(),
                code: None,
            }
        );
    }

    #[test]
    fn test_empty_body_uses_status() {
        let err = ApiError::from_response(500, "");
        assert_eq!(err.to_string(), "Request failed with status 500: HTTP 500");
    }

    #[test]
    fn test_job_status_path() {
        assert_eq!(job_status_path("abc-123"), "/page-magic/jobs/abc-123");
    }
}
