//! 作业数据模型 - 响应校验与状态消息格式化

use crate::error::PollError;
use serde_json::Value;
use std::str::FromStr;
use tracing::warn;

/// 审核状态（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    /// 状态对应的评语
    pub fn verdict(&self) -> &'static str {
        match self {
            Self::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Self::Reviewing => "Работа взята на проверку ревьюером.",
            Self::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

impl FromStr for HomeworkStatus {
    type Err = PollError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Self::Approved),
            "reviewing" => Ok(Self::Reviewing),
            "rejected" => Ok(Self::Rejected),
            other => Err(PollError::UnrecognizedStatus(other.to_string())),
        }
    }
}

/// 一次提交记录
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub status: HomeworkStatus,
    pub homework_name: String,
}

impl Submission {
    /// 从 JSON 解析；先校验 status，再校验 homework_name
    pub fn from_value(value: &Value) -> Result<Self, PollError> {
        let status = match value.get("status") {
            Some(Value::String(s)) => s.parse::<HomeworkStatus>()?,
            Some(other) => return Err(PollError::UnrecognizedStatus(other.to_string())),
            None => return Err(PollError::UnrecognizedStatus("null".to_string())),
        };

        let homework_name = value
            .get("homework_name")
            .and_then(|n| n.as_str())
            .filter(|n| !n.is_empty())
            .ok_or(PollError::MissingSubmissionName)?;

        Ok(Self {
            status,
            homework_name: homework_name.to_string(),
        })
    }

    /// 生成发给用户的消息
    pub fn message(&self) -> String {
        format!(
            "Изменился статус проверки работы \"{}\". {}",
            self.homework_name,
            self.status.verdict()
        )
    }
}

/// 已通过结构校验的 API 响应
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// 非空；元素尚未逐个校验
    homeworks: Vec<Value>,
    current_date: Option<i64>,
}

impl ApiResponse {
    /// 最近一次提交
    pub fn latest(&self) -> &Value {
        // 只能经由 check_response 构造，列表非空
        &self.homeworks[0]
    }

    pub fn current_date(&self) -> Option<i64> {
        self.current_date
    }
}

/// 校验响应结构
///
/// - 必须是 JSON 对象
/// - `homeworks` 必须是列表，且不能为空
/// - 缺少 `current_date` 只记录警告
pub fn check_response(response: &Value) -> Result<ApiResponse, PollError> {
    let object = response.as_object().ok_or_else(|| {
        PollError::InvalidResponseShape(format!("ожидался объект, получено: {}", kind_of(response)))
    })?;

    let homeworks = match object.get("homeworks") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(PollError::InvalidResponseShape(format!(
                "homeworks должен быть списком, получено: {}",
                kind_of(other)
            )))
        }
        None => {
            warn!("Response has no 'homeworks' key");
            return Err(PollError::InvalidResponseShape(
                "нет ключа homeworks".to_string(),
            ));
        }
    };

    let current_date = object.get("current_date").and_then(|d| d.as_i64());
    if current_date.is_none() {
        warn!("Response has no integer 'current_date' key");
    }

    if homeworks.is_empty() {
        return Err(PollError::NoSubmissionsFound);
    }

    Ok(ApiResponse {
        homeworks: homeworks.clone(),
        current_date,
    })
}

/// 解析单条提交并生成消息
pub fn parse_status(homework: &Value) -> Result<String, PollError> {
    Submission::from_value(homework).map(|s| s.message())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
