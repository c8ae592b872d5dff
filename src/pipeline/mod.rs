// src/pipeline/mod.rs
//
// 面向文件与命令行的处理流程；核心库之上唯一记录日志的一层

pub mod batch;
pub mod engine;

pub use batch::{process_files, FileResult};
pub use engine::{process_payload, Engine, Outcome};
