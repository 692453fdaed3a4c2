//! Discord REST client. Every call funnels through [`DiscordHttp::request`]
//! so auth, 429 retries and error mapping live in one place.

use std::time::Duration;

use log::{debug, warn};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const BASE_URL: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/squirrel-catcher, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Discord API error {status} on {route}: {body}")]
    Api {
        status: u16,
        route: String,
        body: String,
    },
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The fields of a created message the bot needs for a later edit.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub id: String,
    pub channel_id: String,
}

#[derive(Clone)]
pub struct DiscordHttp {
    client: reqwest::Client,
    token: String,
}

impl DiscordHttp {
    pub fn new(token: impl Into<String>) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            token: token.into(),
        })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: &Value,
    ) -> Result<Option<Value>, HttpError> {
        let url = format!("{}/{}", BASE_URL, path.trim_start_matches('/'));
        let route = format!("{} /{}", method, path.trim_start_matches('/'));
        let mut attempt = 0;
        loop {
            let resp = self
                .client
                .request(method.clone(), &url)
                .header("Authorization", format!("Bot {}", self.token))
                .json(body)
                .send()
                .await?;
            let status = resp.status();

            if status == StatusCode::TOO_MANY_REQUESTS && attempt < MAX_RETRIES {
                attempt += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<f64>().ok())
                    .unwrap_or(1.0)
                    .min(30.0);
                warn!("Rate limited on {}, retrying in {:.1}s", route, wait);
                tokio::time::sleep(Duration::from_secs_f64(wait)).await;
                continue;
            }

            if status == StatusCode::NO_CONTENT {
                debug!("{} -> 204", route);
                return Ok(None);
            }
            if status.is_success() {
                debug!("{} -> {}", route, status.as_u16());
                return Ok(Some(resp.json::<Value>().await?));
            }
            let body = resp.text().await.unwrap_or_default();
            return Err(HttpError::Api {
                status: status.as_u16(),
                route,
                body,
            });
        }
    }

    fn message_ref(value: Option<Value>, route: &str) -> Result<MessageRef, HttpError> {
        value
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or_else(|| HttpError::Api {
                status: 200,
                route: route.to_string(),
                body: "response is missing message id".to_string(),
            })
    }

    pub async fn create_message(&self, channel_id: &str, body: &Value) -> Result<MessageRef, HttpError> {
        let path = format!("channels/{}/messages", channel_id);
        let value = self.request(Method::POST, &path, body).await?;
        Self::message_ref(value, &path)
    }

    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        body: &Value,
    ) -> Result<(), HttpError> {
        let path = format!("channels/{}/messages/{}", channel_id, message_id);
        self.request(Method::PATCH, &path, body).await.map(|_| ())
    }

    /// Initial response to an interaction.
    pub async fn interaction_callback(
        &self,
        interaction_id: &str,
        token: &str,
        body: &Value,
    ) -> Result<(), HttpError> {
        let path = format!("interactions/{}/{}/callback", interaction_id, token);
        self.request(Method::POST, &path, body).await.map(|_| ())
    }

    /// Edit the message sent by [`Self::interaction_callback`].
    pub async fn edit_original_response(
        &self,
        application_id: &str,
        token: &str,
        body: &Value,
    ) -> Result<(), HttpError> {
        let path = format!("webhooks/{}/{}/messages/@original", application_id, token);
        self.request(Method::PATCH, &path, body).await.map(|_| ())
    }
}
