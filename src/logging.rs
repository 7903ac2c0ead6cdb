//! 日志初始化

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的默认过滤规则
pub const DEFAULT_FILTER: &str = "homework_status_bot=debug,hwbot=debug";

/// 初始化 tracing，输出到 stdout
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_writer(std::io::stdout)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();
}
