//! Homework Status Bot - 轮询 Practicum 作业审核状态并通过 Telegram 通知

pub mod api;
pub mod config;
pub mod error;
pub mod homework;
pub mod logging;
pub mod notifier;
pub mod poller;

#[cfg(test)]
mod test_support;

pub use api::{check_status, HomeworkSource, PracticumClient};
pub use config::{BotConfig, TimestampPolicy};
pub use error::{ConfigError, PollError, Unavailable};
pub use homework::{check_response, parse_status, ApiResponse, HomeworkStatus, Submission};
pub use notifier::{notify, Messenger, SendResult, TelegramBot};
pub use poller::{IterationOutcome, PollLoop};
