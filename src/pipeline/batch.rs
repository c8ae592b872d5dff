// src/pipeline/batch.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;

use super::engine::{Engine, Outcome};
use crate::logging::AuditRecord;

/// 一个文件的处理结果
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: PathBuf,
    pub outcome: Outcome,
    /// 读取 + 处理耗时
    pub elapsed_ms: u128,
}

/// **并发处理多个负载文件**
///
/// 每个文件一个任务，结果按输入顺序返回。读文件失败记为致命错误。
pub async fn process_files(paths: Vec<PathBuf>, engine: Arc<Engine>) -> Vec<FileResult> {
    let tasks: Vec<_> = paths
        .iter()
        .cloned()
        .map(|path| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                let start = Instant::now();
                let source = path.display().to_string();
                let outcome = match tokio::fs::read(&path).await {
                    Ok(bytes) => {
                        let engine = Arc::clone(&engine);
                        let task_source = source.clone();
                        match tokio::task::spawn_blocking(move || engine.process(&task_source, &bytes)).await {
                            Ok(outcome) => outcome,
                            Err(e) => failed(&source, format!("processing task failed: {e}")),
                        }
                    }
                    Err(e) => failed(&source, format!("io error: {e}")),
                };
                FileResult { path, outcome, elapsed_ms: start.elapsed().as_millis() }
            })
        })
        .collect();

    join_all(tasks)
        .await
        .into_iter()
        .zip(paths)
        .map(|(joined, path)| match joined {
            Ok(result) => result,
            Err(e) => {
                let source = path.display().to_string();
                FileResult { outcome: failed(&source, format!("task failed: {e}")), path, elapsed_ms: 0 }
            }
        })
        .collect()
}

fn failed(source: &str, error: String) -> Outcome {
    let mut record = AuditRecord::new(source);
    record.fail(error);
    Outcome { record, transaction: None, report: None }
}
