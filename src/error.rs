//! 错误类型 - 轮询循环中的所有失败情形
//!
//! `PollError` 在循环边界统一捕获并转成聊天通知；
//! `ConfigError` 发生在循环开始之前，是致命错误。

use std::fmt;
use thiserror::Error;

/// 单次轮询可能产生的错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PollError {
    /// 接口不可用（网络错误或非 200 响应）
    #[error("Эндпоинт {url} недоступен. {reason}")]
    EndpointUnavailable {
        url: String,
        reason: Unavailable,
    },

    /// 响应结构不符合预期
    #[error("Неожиданный формат ответа API: {0}")]
    InvalidResponseShape(String),

    /// homeworks 列表为空
    #[error("Нет домашки. Может timestamp увеличить?")]
    NoSubmissionsFound,

    /// 未知的审核状态
    #[error("Домашку ещё не взяли в работу (статус: {0})")]
    UnrecognizedStatus(String),

    /// 缺少 homework_name
    #[error("Нет ключа homework_name. А должен...")]
    MissingSubmissionName,
}

impl PollError {
    /// 非 200 响应对应的 HTTP 状态码
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::EndpointUnavailable {
                reason: Unavailable::Status { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }
}

/// 接口不可用的具体原因
#[derive(Debug, Clone, PartialEq)]
pub enum Unavailable {
    /// 请求未得到响应
    Transport(String),
    /// 响应码不是 200；400/401 时附带 API 返回的诊断信息
    Status {
        status: u16,
        diagnostic: Option<String>,
    },
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(detail) => write!(f, "Нет ответа: {}", detail),
            Self::Status { status, diagnostic } => {
                write!(f, "Код ответа API: {}", status)?;
                if let Some(diagnostic) = diagnostic {
                    write!(f, " {}", diagnostic)?;
                }
                Ok(())
            }
        }
    }
}

/// 启动配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Отсутствует обязательная переменная окружения: {0}")]
    MissingVariable(&'static str),

    #[error("Некорректное значение {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}
