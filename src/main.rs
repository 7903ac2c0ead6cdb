//! Homework Status Bot CLI
//!
//! 轮询 Practicum 作业状态并通过 Telegram 发送变更通知

use anyhow::Result;
use clap::Parser;
use homework_status_bot::{
    logging, BotConfig, IterationOutcome, PollLoop, PracticumClient, TelegramBot, TimestampPolicy,
};
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "hwbot")]
#[command(about = "Homework Status Bot - 轮询作业审核状态并发送 Telegram 通知")]
#[command(version)]
struct Cli {
    /// 轮询间隔（秒），覆盖 RETRY_PERIOD；必须大于 0
    #[arg(long, short, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// 时间戳策略: fixed 保持启动时的值，advance 推进到 current_date
    #[arg(long, value_enum, default_value = "fixed")]
    timestamp_policy: TimestampPolicy,

    /// 初始 from_date（unix 秒），默认 now - 1673332499
    #[arg(long)]
    from_date: Option<i64>,

    /// 只执行一轮后退出
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let mut config = config.with_timestamp_policy(cli.timestamp_policy);
    if let Some(secs) = cli.interval {
        config = config.with_retry_period(Duration::from_secs(secs));
    }
    if let Some(from_date) = cli.from_date {
        config = config.with_initial_timestamp(from_date);
    }

    let source = PracticumClient::from_config(&config)?;
    let bot = TelegramBot::from_config(&config)?;
    let mut poll = PollLoop::new(&config, &source, &bot);

    if cli.once {
        let outcome = poll.run_iteration();
        match &outcome {
            IterationOutcome::Sent(message) => info!(message = %message, "Status sent"),
            other => info!(outcome = ?other, "Iteration finished"),
        }
        return Ok(());
    }

    poll.run()
}
