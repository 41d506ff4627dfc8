//! Telegram push channel

use super::{Alert, Notifier};
use crate::config::TelegramConfig;
use crate::error::{Result, WatcherError};
use async_trait::async_trait;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use std::path::Path;

const API_BASE: &str = "https://api.telegram.org";

pub struct PushNotifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest {
    chat_id: String,
    text: String,
    parse_mode: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl PushNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{API_BASE}/bot{}/{method}", self.bot_token)
    }

    async fn send_message(&self, alert: &Alert) -> Result<()> {
        let request = SendMessageRequest {
            chat_id: self.chat_id.clone(),
            text: format_text(alert),
            parse_mode: "HTML".to_string(),
        };

        let response: ApiResponse = self
            .http
            .post(self.endpoint("sendMessage"))
            .json(&request)
            .send()
            .await?
            .json()
            .await?;
        check(response)
    }

    async fn send_photo(&self, alert: &Alert, photo: &Path) -> Result<()> {
        let bytes = tokio::fs::read(photo).await?;
        let file_name = photo
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.jpg".to_string());

        let form = multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", format_text(alert))
            .text("parse_mode", "HTML")
            .part("photo", multipart::Part::bytes(bytes).file_name(file_name));

        let response: ApiResponse = self
            .http
            .post(self.endpoint("sendPhoto"))
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;
        check(response)
    }
}

#[async_trait]
impl Notifier for PushNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn notify(&self, alert: &Alert) -> Result<()> {
        match &alert.photo {
            Some(photo) => self.send_photo(alert, photo).await,
            None => self.send_message(alert).await,
        }
    }
}

fn check(response: ApiResponse) -> Result<()> {
    if response.ok {
        Ok(())
    } else {
        Err(WatcherError::Notify(
            response
                .description
                .unwrap_or_else(|| "telegram rejected the message".to_string()),
        ))
    }
}

fn format_text(alert: &Alert) -> String {
    format!("<b>{}</b>\n{}", escape(&alert.subject), escape(&alert.body))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
