// src/publish/telegram.rs
//! Telegram Bot API sender: `sendPhoto` with an HTML caption. Bounded
//! timeout and a small retry budget with exponential backoff; anything
//! still failing after that surfaces as `SendFailed` and the caller leaves
//! the item uncommitted.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::PostError;
use crate::publish::{Ack, Delivery};

pub struct TelegramSender {
    token: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    result: Option<ApiMessage>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message_id: i64,
}

impl TelegramSender {
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            token,
            chat_id,
            client: Client::new(),
            timeout: Duration::from_secs(20),
            max_retries: 3,
            base_url: "https://api.telegram.org".to_string(),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Point at a different API host (test servers).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn form(&self, image: &[u8], caption: &str) -> Result<Form, PostError> {
        let photo = Part::bytes(image.to_vec())
            .file_name("card.png")
            .mime_str("image/png")
            .map_err(|e| PostError::SendFailed(format!("building photo part: {e}")))?;
        Ok(Form::new()
            .part("photo", photo)
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .text("parse_mode", "HTML")
            .text("disable_web_page_preview", "true"))
    }
}

#[async_trait]
impl Delivery for TelegramSender {
    async fn send(&self, image: &[u8], caption: &str) -> Result<Ack, PostError> {
        let url = format!("{}/bot{}/sendPhoto", self.base_url, self.token);

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&url)
                .timeout(self.timeout)
                .multipart(self.form(image, caption)?)
                .send()
                .await;

            let retryable_err = match res {
                Ok(rsp) if rsp.status().is_success() => {
                    let api: ApiResponse = rsp
                        .json()
                        .await
                        .map_err(|e| PostError::SendFailed(format!("decoding response: {e}")))?;
                    if !api.ok {
                        return Err(PostError::SendFailed(
                            api.description.unwrap_or_else(|| "api returned ok=false".into()),
                        ));
                    }
                    let message_id = api.result.map(|m| m.message_id).unwrap_or_default();
                    return Ok(Ack { message_id });
                }
                Ok(rsp) => format!("http status {}", rsp.status()),
                Err(e) => format!("request failed: {e}"),
            };

            if attempt < self.max_retries {
                tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                continue;
            }
            return Err(PostError::SendFailed(retryable_err));
        }
    }
}
