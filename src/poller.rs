//! 轮询循环
//!
//! 每轮依次执行：请求 → 校验 → 格式化 → 通知。
//! 任何错误都在本轮边界统一捕获，转成 `Сбой в работе программы: ...` 发送到聊天，
//! 与上一条相同的消息/错误不会重复发送。

use crate::api::HomeworkSource;
use crate::config::{BotConfig, TimestampPolicy};
use crate::error::PollError;
use crate::homework::{check_response, parse_status};
use crate::notifier::{notify, Messenger, SendResult};
use std::time::Duration;
use tracing::{debug, error, info};

/// 错误消息前缀
pub const ERROR_PREFIX: &str = "Сбой в работе программы: ";

/// 单轮结果
#[derive(Debug, Clone, PartialEq)]
pub enum IterationOutcome {
    /// 状态有变化，已发送
    Sent(String),
    /// 与上一条消息相同，未发送
    Unchanged,
    /// 出错并已上报
    ErrorReported(String),
    /// 出错，但与上一条错误相同，未上报
    ErrorSuppressed(String),
}

/// 轮询循环
pub struct PollLoop<'a> {
    chat_id: &'a str,
    retry_period: Duration,
    policy: TimestampPolicy,
    source: &'a dyn HomeworkSource,
    messenger: &'a dyn Messenger,
    timestamp: i64,
    last_message: String,
    last_error: String,
}

impl<'a> PollLoop<'a> {
    pub fn new(
        config: &'a BotConfig,
        source: &'a dyn HomeworkSource,
        messenger: &'a dyn Messenger,
    ) -> Self {
        Self {
            chat_id: &config.chat_id,
            retry_period: config.retry_period,
            policy: config.timestamp_policy,
            source,
            messenger,
            timestamp: config.initial_timestamp,
            last_message: String::new(),
            last_error: String::new(),
        }
    }

    /// 下一次请求使用的 from_date
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn last_message(&self) -> &str {
        &self.last_message
    }

    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    /// 执行一轮（不休眠）
    pub fn run_iteration(&mut self) -> IterationOutcome {
        match self.poll_once() {
            Ok(message) => {
                if message == self.last_message {
                    debug!("Status unchanged");
                    return IterationOutcome::Unchanged;
                }
                // 发送失败不影响状态更新
                self.deliver(&message);
                self.last_message = message.clone();
                IterationOutcome::Sent(message)
            }
            Err(e) => {
                let error_message = format!("{}{}", ERROR_PREFIX, e);
                error!("{}", error_message);
                if error_message == self.last_error {
                    return IterationOutcome::ErrorSuppressed(error_message);
                }
                self.deliver(&error_message);
                self.last_error = error_message.clone();
                IterationOutcome::ErrorReported(error_message)
            }
        }
    }

    /// 无限循环；每轮结束后固定休眠 retry_period
    pub fn run(&mut self) -> ! {
        info!(
            interval_secs = self.retry_period.as_secs(),
            from_date = self.timestamp,
            policy = ?self.policy,
            "Starting poll loop"
        );
        loop {
            let outcome = self.run_iteration();
            debug!(?outcome, "Iteration finished");
            std::thread::sleep(self.retry_period);
        }
    }

    fn deliver(&self, text: &str) {
        if let SendResult::Failed(reason) = notify(self.messenger, self.chat_id, text) {
            debug!(%reason, "Delivery failed; the text will not be resent until it changes");
        }
    }

    fn poll_once(&mut self) -> Result<String, PollError> {
        let raw = self.source.fetch(self.timestamp)?;
        let response = check_response(&raw)?;
        let message = parse_status(response.latest())?;

        if self.policy == TimestampPolicy::Advance {
            if let Some(current_date) = response.current_date() {
                self.timestamp = current_date;
            }
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Unavailable;
    use anyhow::anyhow;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct Scripted {
        responses: RefCell<VecDeque<Result<Value, PollError>>>,
        requested: RefCell<Vec<i64>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<Value, PollError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl HomeworkSource for Scripted {
        fn fetch(&self, from_date: i64) -> Result<Value, PollError> {
            self.requested.borrow_mut().push(from_date);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(PollError::NoSubmissionsFound))
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Messenger for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn send(&self, _chat_id: &str, text: &str) -> anyhow::Result<()> {
            self.sent.borrow_mut().push(text.to_string());
            if self.fail {
                Err(anyhow!("Forbidden: bot was blocked by the user"))
            } else {
                Ok(())
            }
        }
    }

    fn config(policy: TimestampPolicy) -> BotConfig {
        BotConfig {
            practicum_token: "p".to_string(),
            telegram_token: "t".to_string(),
            chat_id: "1".to_string(),
            endpoint: "http://localhost/".to_string(),
            retry_period: Duration::from_secs(0),
            http_timeout: Duration::from_secs(1),
            initial_timestamp: 100,
            timestamp_policy: policy,
        }
    }

    fn payload(status: &str, current_date: i64) -> Result<Value, PollError> {
        Ok(json!({
            "homeworks": [{"status": status, "homework_name": "hw01"}],
            "current_date": current_date
        }))
    }

    #[test]
    fn test_duplicate_message_sent_once() {
        let config = config(TimestampPolicy::Fixed);
        let source = Scripted::new(vec![payload("reviewing", 1), payload("reviewing", 2)]);
        let messenger = Recorder::default();
        let mut poll = PollLoop::new(&config, &source, &messenger);

        assert!(matches!(poll.run_iteration(), IterationOutcome::Sent(_)));
        assert_eq!(poll.run_iteration(), IterationOutcome::Unchanged);
        assert_eq!(messenger.sent.borrow().len(), 1);
    }

    #[test]
    fn test_status_change_is_sent() {
        let config = config(TimestampPolicy::Fixed);
        let source = Scripted::new(vec![payload("reviewing", 1), payload("approved", 2)]);
        let messenger = Recorder::default();
        let mut poll = PollLoop::new(&config, &source, &messenger);

        poll.run_iteration();
        poll.run_iteration();
        let sent = messenger.sent.borrow();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].ends_with("Ура!"));
    }

    #[test]
    fn test_duplicate_error_reported_once() {
        let config = config(TimestampPolicy::Fixed);
        let empty = || Ok(json!({"homeworks": [], "current_date": 1}));
        let source = Scripted::new(vec![empty(), empty()]);
        let messenger = Recorder::default();
        let mut poll = PollLoop::new(&config, &source, &messenger);

        let expected = "Сбой в работе программы: Нет домашки. Может timestamp увеличить?";
        assert_eq!(poll.run_iteration(), IterationOutcome::ErrorReported(expected.to_string()));
        assert_eq!(poll.run_iteration(), IterationOutcome::ErrorSuppressed(expected.to_string()));
        assert_eq!(*messenger.sent.borrow(), vec![expected.to_string()]);
        assert_eq!(poll.last_error(), expected);
    }

    #[test]
    fn test_different_errors_both_reported() {
        let config = config(TimestampPolicy::Fixed);
        let down = Err(PollError::EndpointUnavailable {
            url: "http://localhost/".to_string(),
            reason: Unavailable::Status { status: 500, diagnostic: None },
        });
        let source = Scripted::new(vec![down, Ok(json!({"homeworks": []}))]);
        let messenger = Recorder::default();
        let mut poll = PollLoop::new(&config, &source, &messenger);

        poll.run_iteration();
        poll.run_iteration();
        assert_eq!(messenger.sent.borrow().len(), 2);
    }

    #[test]
    fn test_unknown_status_reports_error_without_message() {
        let config = config(TimestampPolicy::Fixed);
        let source = Scripted::new(vec![payload("unknown_value", 1)]);
        let messenger = Recorder::default();
        let mut poll = PollLoop::new(&config, &source, &messenger);

        let outcome = poll.run_iteration();
        assert!(matches!(outcome, IterationOutcome::ErrorReported(ref e) if e.contains("unknown_value")));
        assert_eq!(poll.last_message(), "");
    }

    #[test]
    fn test_send_failure_does_not_stop_loop() {
        let config = config(TimestampPolicy::Fixed);
        let source = Scripted::new(vec![payload("approved", 1), payload("approved", 2)]);
        let messenger = Recorder { fail: true, ..Default::default() };
        let mut poll = PollLoop::new(&config, &source, &messenger);

        assert!(matches!(poll.run_iteration(), IterationOutcome::Sent(_)));
        assert_eq!(poll.run_iteration(), IterationOutcome::Unchanged);
        assert_eq!(poll.last_error(), "");
    }

    #[test]
    fn test_fixed_policy_keeps_timestamp() {
        let config = config(TimestampPolicy::Fixed);
        let source = Scripted::new(vec![payload("reviewing", 500), payload("reviewing", 900)]);
        let messenger = Recorder::default();
        let mut poll = PollLoop::new(&config, &source, &messenger);

        poll.run_iteration();
        poll.run_iteration();
        assert_eq!(*source.requested.borrow(), vec![100, 100]);
        assert_eq!(poll.timestamp(), 100);
    }

    #[test]
    fn test_advance_policy_moves_timestamp() {
        let config = config(TimestampPolicy::Advance);
        let source = Scripted::new(vec![payload("reviewing", 500), payload("approved", 900)]);
        let messenger = Recorder::default();
        let mut poll = PollLoop::new(&config, &source, &messenger);

        poll.run_iteration();
        poll.run_iteration();
        assert_eq!(*source.requested.borrow(), vec![100, 500]);
        assert_eq!(poll.timestamp(), 900);
    }
}
