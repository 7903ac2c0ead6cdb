//! Telegram 通知
//!
//! 发送失败只记录日志，从不向上传播。

use crate::config::BotConfig;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Telegram Bot API 地址
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// 发送结果
#[derive(Debug, Clone, PartialEq)]
pub enum SendResult {
    /// 发送成功
    Sent,
    /// 发送失败（已记录日志）
    Failed(String),
}

/// 消息发送渠道
pub trait Messenger {
    /// 渠道名称（用于日志）
    fn name(&self) -> &str;

    /// 同步发送文本消息
    fn send(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// sendMessage 请求体
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Bot API 响应
#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram 机器人
pub struct TelegramBot {
    client: reqwest::blocking::Client,
    api_url: String,
    token: String,
}

impl TelegramBot {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Cannot create HTTP client: {}", e))?;

        Ok(Self {
            client,
            api_url: TELEGRAM_API_URL.to_string(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &BotConfig) -> Result<Self> {
        Self::new(&config.telegram_token, config.http_timeout)
    }

    /// 使用自定义 API 地址（本地 Bot API 服务器）
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }
}

impl Messenger for TelegramBot {
    fn name(&self) -> &str {
        "telegram"
    }

    fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessageRequest { chat_id, text })
            .send()
            // reqwest 的错误信息包含 URL，也就包含 token
            .map_err(|e| anyhow!("Telegram request failed: {}", e.without_url()))?;

        let status = response.status();
        let body: BotApiResponse = response
            .json()
            .map_err(|e| anyhow!("Failed to parse Telegram response ({}): {}", status, e.without_url()))?;

        if body.ok {
            Ok(())
        } else {
            Err(anyhow!(
                "Telegram API error ({}): {}",
                status,
                body.description.unwrap_or_else(|| "Unknown error".to_string())
            ))
        }
    }
}

/// 发送消息，失败时记录日志并返回 `SendResult::Failed`
pub fn notify(messenger: &dyn Messenger, chat_id: &str, text: &str) -> SendResult {
    match messenger.send(chat_id, text) {
        Ok(()) => {
            debug!(channel = messenger.name(), "Бот отправил сообщение \"{}\"", text);
            SendResult::Sent
        }
        Err(e) => {
            error!(channel = messenger.name(), error = %e, "Failed to send message");
            SendResult::Failed(e.to_string())
        }
    }
}
