//! Practicum API 客户端
//!
//! 阻塞式 HTTP GET，带 `Authorization: OAuth <token>` 头和 `from_date` 参数。

use crate::config::BotConfig;
use crate::error::{PollError, Unavailable};
use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// 作业状态来源
///
/// 轮询循环只依赖此 trait，便于测试时替换。
pub trait HomeworkSource {
    /// 请求 `from_date` 之后的作业状态，返回未校验的 JSON
    fn fetch(&self, from_date: i64) -> Result<Value, PollError>;
}

/// HTTP 400 响应体
#[derive(Deserialize)]
struct BadRequestBody {
    code: Value,
    error: BadRequestDetail,
}

#[derive(Deserialize)]
struct BadRequestDetail {
    error: Value,
}

/// HTTP 401 响应体
#[derive(Deserialize)]
struct UnauthorizedBody {
    code: Value,
    message: Value,
}

/// Practicum 作业状态接口客户端
pub struct PracticumClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: String,
}

impl PracticumClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("Cannot create HTTP client: {}", e))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    pub fn from_config(config: &BotConfig) -> Result<Self> {
        Self::new(&config.endpoint, &config.practicum_token, config.http_timeout)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl HomeworkSource for PracticumClient {
    fn fetch(&self, from_date: i64) -> Result<Value, PollError> {
        debug!(endpoint = %self.endpoint, from_date, "Requesting homework statuses");

        let unavailable = |detail: String| PollError::EndpointUnavailable {
            url: self.endpoint.clone(),
            reason: Unavailable::Transport(detail),
        };

        let response = self
            .client
            .get(&self.endpoint)
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| unavailable(e.to_string()))?;

        check_status(&self.endpoint, status, &body)
    }
}

/// 把 HTTP 响应映射为 JSON 或 `EndpointUnavailable`
///
/// 400 和 401 时从响应体中提取 API 的 `code` 及诊断字段；
/// 响应体无法解析时只记录警告。
pub fn check_status(url: &str, status: u16, body: &str) -> Result<Value, PollError> {
    if status == 200 {
        return serde_json::from_str(body).map_err(|e| {
            PollError::InvalidResponseShape(format!("ответ не является JSON: {}", e))
        });
    }

    let diagnostic = match status {
        400 => serde_json::from_str::<BadRequestBody>(body).map(|b| {
            format!("code: {} error: {}", plain(&b.code), plain(&b.error.error))
        }),
        401 => serde_json::from_str::<UnauthorizedBody>(body)
            .map(|b| format!("code: {} message: {}", plain(&b.code), plain(&b.message))),
        _ => return Err(status_error(url, status, None)),
    };

    match diagnostic {
        Ok(diagnostic) => Err(status_error(url, status, Some(diagnostic))),
        Err(e) => {
            warn!(status, error = %e, "Cannot parse API error body");
            Err(status_error(url, status, None))
        }
    }
}

fn status_error(url: &str, status: u16, diagnostic: Option<String>) -> PollError {
    PollError::EndpointUnavailable {
        url: url.to_string(),
        reason: Unavailable::Status { status, diagnostic },
    }
}

/// 字符串直接输出，不带 JSON 引号
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
