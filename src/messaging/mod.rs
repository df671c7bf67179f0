//! Firebase Cloud Messaging.
//!
//! Clients are handed out by an initialized [`FirebaseApp`](crate::FirebaseApp).
//! When the process never managed to initialize its default app,
//! [`default_messaging`] returns `None` and sending is simply unavailable.

use crate::app::{AppRegistry, DEFAULT_APP_NAME};
use crate::core::middleware::AuthMiddleware;
use crate::core::parse_error_response;
use crate::messaging::models::{
    BatchResponse, Message, MulticastMessage, SendResponse, SendResponseInternal,
    TopicManagementError, TopicManagementResponse,
};
use futures::future::join_all;
use reqwest::{header, Client};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod models;

const FCM_SEND_URL: &str = "https://fcm.googleapis.com/v1/projects/{project_id}/messages:send";
const IID_URL: &str = "https://iid.googleapis.com";

const MAX_BATCH_SIZE: usize = 500;
const MAX_TOPIC_TOKENS: usize = 1000;

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct FirebaseMessaging {
    client: ClientWithMiddleware,
    send_url: String,
    iid_url: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    validate_only: bool,
    message: &'a Message,
}

#[derive(Serialize)]
struct TopicManagementRequest<'a> {
    to: String,
    registration_tokens: &'a [&'a str],
}

#[derive(Deserialize)]
struct TopicManagementApiResponse {
    results: Option<Vec<TopicManagementApiResult>>,
}

#[derive(Deserialize)]
struct TopicManagementApiResult {
    error: Option<String>,
}

/// Messaging client of the default app in the process-wide registry.
///
/// An app registered under a custom `app_name` is reached through
/// [`messaging_for_app`] instead.
pub fn default_messaging() -> Option<FirebaseMessaging> {
    messaging_for_app(DEFAULT_APP_NAME)
}

/// Messaging client of the app registered as `name` in the process-wide registry.
pub fn messaging_for_app(name: &str) -> Option<FirebaseMessaging> {
    messaging_in(AppRegistry::global(), name)
}

pub(crate) fn messaging_in(registry: &AppRegistry, name: &str) -> Option<FirebaseMessaging> {
    let app = registry.try_get_app(name);
    if app.is_none() {
        warn!(
            app = name,
            "Firebase Admin SDK is not initialized, push notifications are disabled"
        );
    }
    app.map(|app| app.messaging())
}

impl FirebaseMessaging {
    pub fn new(middleware: AuthMiddleware) -> Self {
        let project_id = middleware.project_id().unwrap_or_default().to_string();
        let send_url = FCM_SEND_URL.replace("{project_id}", &project_id);
        Self::new_with_url(middleware, send_url, IID_URL.to_string())
    }

    /// Creates a client against custom endpoints. Used by tests.
    pub fn new_with_url(middleware: AuthMiddleware, send_url: String, iid_url: String) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = ClientBuilder::new(Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .with(middleware)
            .build();

        Self {
            client,
            send_url,
            iid_url,
        }
    }

    /// Sends a message and returns its name, `projects/{id}/messages/{message_id}`.
    ///
    /// With `dry_run` the message is validated by FCM but not delivered.
    pub async fn send(&self, message: &Message, dry_run: bool) -> Result<String, MessagingError> {
        validate_message(message)?;
        self.send_request(message, dry_run).await
    }

    /// Sends up to 500 messages concurrently.
    ///
    /// Every message is validated first and a single invalid message rejects the
    /// whole call with `InvalidArgument`. Once sending starts, a message FCM
    /// refuses is reported in its `SendResponse` and does not fail the others.
    pub async fn send_each(
        &self,
        messages: &[Message],
        dry_run: bool,
    ) -> Result<BatchResponse, MessagingError> {
        if messages.len() > MAX_BATCH_SIZE {
            return Err(MessagingError::InvalidArgument(format!(
                "Cannot send more than {} messages in a single batch.",
                MAX_BATCH_SIZE
            )));
        }
        for message in messages {
            validate_message(message)?;
        }

        let results = join_all(
            messages
                .iter()
                .map(|message| self.send_request(message, dry_run)),
        )
        .await;

        let responses: Vec<SendResponse> = results
            .into_iter()
            .map(|result| match result {
                Ok(name) => SendResponse {
                    success: true,
                    message_id: Some(name),
                    error: None,
                },
                Err(e) => SendResponse {
                    success: false,
                    message_id: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        let success_count = responses.iter().filter(|r| r.success).count();
        debug!(
            success_count,
            failure_count = responses.len() - success_count,
            "FCM batch sent"
        );

        Ok(BatchResponse {
            success_count,
            failure_count: responses.len() - success_count,
            responses,
        })
    }

    /// Sends the multicast payload to each of its tokens (at most 500).
    pub async fn send_each_for_multicast(
        &self,
        message: &MulticastMessage,
        dry_run: bool,
    ) -> Result<BatchResponse, MessagingError> {
        if message.tokens.is_empty() {
            return Err(MessagingError::InvalidArgument(
                "Multicast message must contain at least one token.".to_string(),
            ));
        }
        self.send_each(&message.to_messages(), dry_run).await
    }

    async fn send_request(&self, message: &Message, dry_run: bool) -> Result<String, MessagingError> {
        let request = SendRequest {
            validate_only: dry_run,
            message,
        };

        let response = self
            .client
            .post(&self.send_url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MessagingError::ApiError(
                parse_error_response(response, "FCM send failed").await,
            ));
        }

        let result: SendResponseInternal = response.json().await?;
        Ok(result.name)
    }

    pub async fn subscribe_to_topic(
        &self,
        tokens: &[&str],
        topic: &str,
    ) -> Result<TopicManagementResponse, MessagingError> {
        self.manage_topic(tokens, topic, "iid/v1:batchAdd").await
    }

    pub async fn unsubscribe_from_topic(
        &self,
        tokens: &[&str],
        topic: &str,
    ) -> Result<TopicManagementResponse, MessagingError> {
        self.manage_topic(tokens, topic, "iid/v1:batchRemove").await
    }

    async fn manage_topic(
        &self,
        tokens: &[&str],
        topic: &str,
        operation: &str,
    ) -> Result<TopicManagementResponse, MessagingError> {
        if tokens.is_empty() {
            return Err(MessagingError::InvalidArgument(
                "Registration tokens must not be empty.".to_string(),
            ));
        }
        let topic_path = normalize_topic(topic)?;
        let url = format!("{}/{}", self.iid_url, operation);

        let mut summary = TopicManagementResponse::default();

        for (batch_idx, chunk) in tokens.chunks(MAX_TOPIC_TOKENS).enumerate() {
            let request = TopicManagementRequest {
                to: topic_path.clone(),
                registration_tokens: chunk,
            };

            let response = self
                .client
                .post(&url)
                .header(header::CONTENT_TYPE, "application/json")
                // The IID API only accepts OAuth2 tokens with this header set.
                .header("access_token_auth", "true")
                .body(serde_json::to_vec(&request)?)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(MessagingError::ApiError(
                    parse_error_response(response, "Topic management failed").await,
                ));
            }

            let api_response: TopicManagementApiResponse = response.json().await?;

            for (i, result) in api_response.results.unwrap_or_default().iter().enumerate() {
                match &result.error {
                    Some(reason) => {
                        summary.failure_count += 1;
                        summary.errors.push(TopicManagementError {
                            index: batch_idx * MAX_TOPIC_TOKENS + i,
                            reason: reason.clone(),
                        });
                    }
                    None => summary.success_count += 1,
                }
            }
        }

        Ok(summary)
    }
}

fn validate_message(message: &Message) -> Result<(), MessagingError> {
    if message.target_count() != 1 {
        return Err(MessagingError::InvalidArgument(
            "Message must have exactly one of token, topic, or condition.".to_string(),
        ));
    }
    if let Some(topic) = &message.topic {
        if topic.starts_with("/topics/") {
            return Err(MessagingError::InvalidArgument(
                "Topic name must not start with \"/topics/\".".to_string(),
            ));
        }
    }
    Ok(())
}

fn normalize_topic(topic: &str) -> Result<String, MessagingError> {
    let name = topic.strip_prefix("/topics/").unwrap_or(topic);
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.~%".contains(c));
    if !valid {
        return Err(MessagingError::InvalidArgument(format!(
            "Invalid topic name: \"{}\"",
            topic
        )));
    }
    Ok(format!("/topics/{}", name))
}
