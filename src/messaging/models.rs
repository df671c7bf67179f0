use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A message sent through the FCM HTTP v1 API.
///
/// Exactly one of `token`, `topic` or `condition` must be set.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Arbitrary key/value payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,

    /// Notification shown on every platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub webpush: Option<WebpushConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub apns: Option<ApnsConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcm_options: Option<FcmOptions>,

    /// Registration token of a single device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Topic name without the "/topics/" prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    /// Topic condition, e.g. "'foo' in topics && 'bar' in topics".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Message {
    pub(crate) fn target_count(&self) -> usize {
        [
            self.token.is_some(),
            self.topic.is_some(),
            self.condition.is_some(),
        ]
        .iter()
        .filter(|&&t| t)
        .count()
    }
}

/// The same payload delivered to many registration tokens.
#[derive(Debug, Clone, Default)]
pub struct MulticastMessage {
    pub tokens: Vec<String>,
    pub data: Option<HashMap<String, String>>,
    pub notification: Option<Notification>,
    pub android: Option<AndroidConfig>,
    pub webpush: Option<WebpushConfig>,
    pub apns: Option<ApnsConfig>,
    pub fcm_options: Option<FcmOptions>,
}

impl MulticastMessage {
    pub(crate) fn to_messages(&self) -> Vec<Message> {
        self.tokens
            .iter()
            .map(|token| Message {
                data: self.data.clone(),
                notification: self.notification.clone(),
                android: self.android.clone(),
                webpush: self.webpush.clone(),
                apns: self.apns.clone(),
                fcm_options: self.fcm_options.clone(),
                token: Some(token.clone()),
                topic: None,
                condition: None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// URL of an image shown in the notification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AndroidConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<AndroidMessagePriority>,

    /// Duration string, e.g. "3600s".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub restricted_package_name: Option<String>,

    /// Overrides `Message::data` on Android.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<AndroidNotification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AndroidMessagePriority {
    Normal,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AndroidNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// `#rrggbb`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_action: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WebpushConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,

    /// Web Notification options, passed through as JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcm_options: Option<WebpushFcmOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WebpushFcmOptions {
    /// HTTPS link opened when the notification is clicked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApnsConfig {
    /// Raw APNs request headers, e.g. `apns-priority`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,

    /// Raw APNs payload including the `aps` dictionary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fcm_options: Option<ApnsFcmOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApnsFcmOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FcmOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics_label: Option<String>,
}

/// Outcome of a topic (un)subscription request.
#[derive(Debug, Clone, Default)]
pub struct TopicManagementResponse {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<TopicManagementError>,
}

#[derive(Debug, Clone)]
pub struct TopicManagementError {
    /// Index of the failing token in the request.
    pub index: usize,
    pub reason: String,
}

/// Per-message outcomes of `send_each` and `send_each_for_multicast`, in request order.
#[derive(Debug, Clone, Default)]
pub struct BatchResponse {
    pub success_count: usize,
    pub failure_count: usize,
    pub responses: Vec<SendResponse>,
}

#[derive(Debug, Clone)]
pub struct SendResponse {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendResponseInternal {
    pub name: String,
}
