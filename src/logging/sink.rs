// src/logging/sink.rs

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Duration};
use tracing::warn;
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::fmt::MakeWriter;

use super::audit::AuditRecord;
use crate::config::SinkSettings;
use crate::error::Result;

/// 审计文件名前缀，按小时滚动
pub const AUDIT_FILE: &str = "audit.json";

/// **审计记录的后台批量写入器**
///
/// `log` 只把记录送进通道；后台任务攒批或定时写盘。`shutdown` 关闭通道并等待剩余记录落盘。
pub struct EventSink {
    sender: Sender<String>,
    writer: JoinHandle<()>,
}

impl EventSink {
    /// 需要在 tokio 运行时内调用
    pub fn new(log_dir: impl AsRef<Path>, settings: &SinkSettings) -> Result<Self> {
        std::fs::create_dir_all(log_dir.as_ref())?;
        let (sender, receiver) = mpsc::channel(settings.buffer_size.max(1));
        let log_file = Arc::new(rolling::hourly(log_dir.as_ref(), AUDIT_FILE));
        let writer = tokio::spawn(Self::background_writer(
            log_file,
            receiver,
            settings.batch_size.max(1),
            settings.flush_interval_ms.max(1),
        ));
        Ok(Self { sender, writer })
    }

    pub async fn log(&self, record: &AuditRecord) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                warn!(record_id = %record.record_id, error = %e, "failed to serialize audit record");
                return;
            }
        };
        if let Err(e) = self.sender.send(line).await {
            warn!(error = %e, "audit sink is closed");
        }
    }

    /// 关闭通道，等待后台任务把缓冲区写完
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.writer.await {
            warn!(error = %e, "audit writer task failed");
        }
    }

    async fn background_writer(
        log_file: Arc<RollingFileAppender>,
        mut receiver: Receiver<String>,
        batch_size: usize,
        flush_interval: u64,
    ) {
        let mut buffer = Vec::with_capacity(batch_size);
        let mut interval = time::interval(Duration::from_millis(flush_interval));

        loop {
            tokio::select! {
                message = receiver.recv() => match message {
                    Some(line) => {
                        buffer.push(line);
                        if buffer.len() >= batch_size {
                            Self::write_to_disk(log_file.clone(), &mut buffer).await;
                        }
                    }
                    None => break,
                },
                _ = interval.tick() => {
                    if !buffer.is_empty() {
                        Self::write_to_disk(log_file.clone(), &mut buffer).await;
                    }
                }
            }
        }
        if !buffer.is_empty() {
            Self::write_to_disk(log_file, &mut buffer).await;
        }
    }

    async fn write_to_disk(file: Arc<RollingFileAppender>, buffer: &mut Vec<String>) {
        let content = buffer.join("\n") + "\n";
        buffer.clear();

        let written = task::spawn_blocking(move || {
            let mut writer = file.make_writer();
            writer.write_all(content.as_bytes())?;
            writer.flush()
        })
        .await;
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "failed to write audit records"),
            Err(e) => warn!(error = %e, "audit write task panicked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;
    use uuid::Uuid;

    fn read_records(dir: &Path) -> Vec<Value> {
        let mut records = Vec::new();
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            if !name.starts_with(AUDIT_FILE) {
                continue;
            }
            for line in fs::read_to_string(&path).unwrap().lines().filter(|l| !l.is_empty()) {
                records.push(serde_json::from_str(line).unwrap());
            }
        }
        records
    }

    #[tokio::test]
    async fn shutdown_flushes_partial_batches() {
        let dir = std::env::temp_dir().join(format!("rust-openrtb-sink-{}", Uuid::new_v4()));
        let settings = SinkSettings { buffer_size: 8, batch_size: 2, flush_interval_ms: 60_000 };
        let sink = EventSink::new(&dir, &settings).unwrap();

        let records: Vec<AuditRecord> = (0..3).map(|i| AuditRecord::new(&format!("payload-{i}.json"))).collect();
        for record in &records {
            sink.log(record).await;
        }
        sink.shutdown().await;

        let written = read_records(&dir);
        assert_eq!(written.len(), 3);
        let mut sources: Vec<&str> = written.iter().filter_map(|r| r["source"].as_str()).collect();
        sources.sort_unstable();
        assert_eq!(sources, vec!["payload-0.json", "payload-1.json", "payload-2.json"]);
        assert!(written.iter().all(|r| r["log_type"] == "openrtb_audit"));

        fs::remove_dir_all(&dir).ok();
    }
}
