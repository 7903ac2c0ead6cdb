//! 启动配置
//!
//! 在进程启动时构建一次，之后以引用传入轮询循环。
//!
//! 必需的环境变量：
//! - `PRACTICUM_TOKEN`
//! - `TELEGRAM_TOKEN`
//! - `TELEGRAM_CHAT_ID`
//!
//! 可选：`PRACTICUM_ENDPOINT`、`RETRY_PERIOD`、`HTTP_TIMEOUT`

use crate::error::ConfigError;
use std::time::Duration;
use tracing::debug;

/// Practicum API 默认地址
pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// 轮询间隔（秒）
pub const DEFAULT_RETRY_PERIOD_SECS: u64 = 600;

/// 初始时间戳 = now - 此偏移（10.01.2023）
pub const EPOCH_OFFSET_SECS: i64 = 1_673_332_499;

/// HTTP 超时（秒）
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const REQUIRED: [&str; 3] = ["PRACTICUM_TOKEN", "TELEGRAM_TOKEN", "TELEGRAM_CHAT_ID"];

/// 时间戳推进策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TimestampPolicy {
    /// 始终使用启动时的时间戳
    #[default]
    Fixed,
    /// 每次成功响应后推进到 `current_date`
    Advance,
}

/// 机器人配置
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub practicum_token: String,
    pub telegram_token: String,
    pub chat_id: String,
    pub endpoint: String,
    pub retry_period: Duration,
    pub http_timeout: Duration,
    /// 首次请求的 from_date
    pub initial_timestamp: i64,
    pub timestamp_policy: TimestampPolicy,
}

impl BotConfig {
    /// 读取 `.env`（如果存在）后从进程环境加载
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => debug!(error = %e, "Failed to load .env file"),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 通过任意查找函数加载配置
    ///
    /// 任一必需值缺失或为空时返回 `ConfigError::MissingVariable`，
    /// 不会进行任何网络调用。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        for name in REQUIRED {
            if get(name).is_none() {
                return Err(ConfigError::MissingVariable(name));
            }
        }

        let retry_secs = parse_secs(&get, "RETRY_PERIOD", DEFAULT_RETRY_PERIOD_SECS)?;
        let timeout_secs = parse_secs(&get, "HTTP_TIMEOUT", DEFAULT_HTTP_TIMEOUT_SECS)?;

        Ok(Self {
            practicum_token: get("PRACTICUM_TOKEN").unwrap_or_default(),
            telegram_token: get("TELEGRAM_TOKEN").unwrap_or_default(),
            chat_id: get("TELEGRAM_CHAT_ID").unwrap_or_default(),
            endpoint: get("PRACTICUM_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            retry_period: Duration::from_secs(retry_secs),
            http_timeout: Duration::from_secs(timeout_secs),
            initial_timestamp: default_timestamp(),
            timestamp_policy: TimestampPolicy::default(),
        })
    }

    pub fn with_retry_period(mut self, period: Duration) -> Self {
        self.retry_period = period;
        self
    }

    pub fn with_initial_timestamp(mut self, timestamp: i64) -> Self {
        self.initial_timestamp = timestamp;
        self
    }

    pub fn with_timestamp_policy(mut self, policy: TimestampPolicy) -> Self {
        self.timestamp_policy = policy;
        self
    }
}

/// 启动时的默认 from_date
pub fn default_timestamp() -> i64 {
    chrono::Utc::now().timestamp() - EPOCH_OFFSET_SECS
}

fn parse_secs<G>(get: &G, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(default),
        // 0 会让循环或请求失去间隔
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::InvalidValue { name, value: raw }),
        },
    }
}
