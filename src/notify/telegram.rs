use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::notify::{NotifyError, Notifier};

/// Minimal Telegram Bot API client: outbound messages and update polling
pub struct TelegramClient {
    client: Client,
    base_url: String,
    send_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Long-poll window for getUpdates
const UPDATES_TIMEOUT_SECS: u64 = 25;

/// Outbound messages must not inherit the long-poll budget
const SEND_TIMEOUT_SECS: u64 = 10;

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(UPDATES_TIMEOUT_SECS + 10))
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
            send_timeout: Duration::from_secs(SEND_TIMEOUT_SECS),
        })
    }

    /// Fetch updates newer than `offset`
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let url = format!("{}/getUpdates", self.base_url);

        let response: UpdatesResponse = self.client
            .get(&url)
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", UPDATES_TIMEOUT_SECS.to_string()),
            ])
            .send()
            .await
            .context("Failed to fetch Telegram updates")?
            .json()
            .await
            .context("Failed to parse Telegram updates")?;

        if !response.ok {
            anyhow::bail!("Telegram getUpdates returned ok=false");
        }

        Ok(response.result)
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, destination: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/sendMessage", self.base_url);

        let response = self.client
            .post(&url)
            .timeout(self.send_timeout)
            .json(&SendMessageRequest { chat_id: destination, text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(status.as_u16(), body));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_deserialization() {
        let raw = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"chat": {"id": -100}, "text": "/status"}},
                {"update_id": 11, "edited_message": {"chat": {"id": 5}}}
            ]
        }"#;

        let response: UpdatesResponse = serde_json::from_str(raw).unwrap();
        assert!(response.ok);
        assert_eq!(response.result.len(), 2);

        let first = response.result[0].message.as_ref().unwrap();
        assert_eq!(first.chat.id, -100);
        assert_eq!(first.text.as_deref(), Some("/status"));
        assert!(response.result[1].message.is_none());
    }

    #[test]
    fn test_bot_url_layout() {
        let client = TelegramClient::new("https://api.telegram.org/", "123:abc").unwrap();
        assert_eq!(client.base_url, "https://api.telegram.org/bot123:abc");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_reported_not_raised() {
        let client = TelegramClient::new("http://127.0.0.1:9", "t").unwrap();
        let result = client.send("42", "hello").await;
        assert!(matches!(result, Err(NotifyError::Transport(_))));
    }

    #[tokio::test]
    async fn test_send_gives_up_on_silent_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            // Accept and hold connections without ever answering
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let mut client = TelegramClient::new(&format!("http://{}", addr), "t").unwrap();
        client.send_timeout = Duration::from_millis(100);

        let result = tokio::time::timeout(Duration::from_secs(5), client.send("42", "hello"))
            .await
            .unwrap();
        match result {
            Err(NotifyError::Transport(e)) => assert!(e.is_timeout()),
            other => panic!("expected a timeout, got {:?}", other),
        }

        server.abort();
    }
}
