// src/logging/mod.rs
//
// 运行日志 (tracing) 与审计记录 (EventSink)。核心库不记日志，只有流水线与命令行使用。

pub mod audit;
pub mod sink;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::error::{OpenRtbError, Result};

pub use audit::{AuditOutcome, AuditRecord};
pub use sink::EventSink;

/// 初始化全局 tracing：JSON 格式写入按小时滚动的 runtime.json，级别由 RUST_LOG 控制，缺省 info。
/// 返回的 guard 需要保留到进程退出，否则尾部日志会丢失。
pub fn init_tracing(log_dir: &str) -> Result<WorkerGuard> {
    let log_file = rolling::hourly(log_dir, "runtime.json");
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().json().with_writer(non_blocking));
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| OpenRtbError::Config(format!("unable to set global tracing subscriber: {e}")))?;
    Ok(guard)
}
