pub mod middleware;

use serde::Deserialize;

/// Google API error envelope: `{"error": {"code": .., "message": .., "status": ..}}`.
#[derive(Debug, Deserialize)]
pub struct FirebaseErrorResponse {
    pub error: FirebaseErrorDetails,
}

#[derive(Debug, Deserialize)]
pub struct FirebaseErrorDetails {
    pub code: u16,
    pub message: String,
    pub status: Option<String>,
}

impl FirebaseErrorResponse {
    pub fn display_message(&self) -> String {
        match &self.error.status {
            Some(status) => format!("{} ({}, code: {})", self.error.message, status, self.error.code),
            None => format!("{} (code: {})", self.error.message, self.error.code),
        }
    }
}

/// Renders an unsuccessful response body, falling back to `default_msg` and the status.
pub fn describe_error_body(status: reqwest::StatusCode, body: &str, default_msg: &str) -> String {
    match serde_json::from_str::<FirebaseErrorResponse>(body) {
        Ok(error_resp) => error_resp.display_message(),
        Err(_) if body.trim().is_empty() => format!("{}: {}", default_msg, status),
        Err(_) => format!("{}: {}: {}", default_msg, status, body.trim()),
    }
}

pub async fn parse_error_response(response: reqwest::Response, default_msg: &str) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    describe_error_body(status, &body, default_msg)
}
