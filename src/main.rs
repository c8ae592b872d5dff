// src/main.rs

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use rust_openrtb::config::{FileSettingsSource, Settings, SettingsSource};
use rust_openrtb::logging::{self, AuditOutcome, EventSink};
use rust_openrtb::pipeline::{process_files, Engine, Outcome};
use rust_openrtb::{check_references, OpenRtbError, SchemaRegistry, Transaction, TransactionKind, Version};

#[derive(Parser, Debug)]
#[command(author = "whiteCcinn", version, about = "Validate and normalize OpenRTB 2.5 / 2.6 / 3.0 payloads")]
struct CliArgs {
    /// 运行日志与审计日志目录
    #[arg(long, global = true)]
    log_dir: Option<String>,
    /// JSON 配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// 警告也视为失败
    #[arg(long, global = true)]
    strict: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 校验一个或多个负载文件
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// 没有 openrtb 信封的负载按此版本解析
        #[arg(long)]
        version: Option<Version>,
        #[arg(long)]
        kind: Option<TransactionKind>,
    },
    /// 校验并转换到目标版本，结果输出到 stdout
    Normalize {
        file: PathBuf,
        #[arg(long)]
        target: Version,
        #[arg(long)]
        version: Option<Version>,
        #[arg(long)]
        kind: Option<TransactionKind>,
        /// 先补齐默认值
        #[arg(long)]
        canonicalize: bool,
        #[arg(long)]
        pretty: bool,
    },
    /// 检查响应对请求的引用
    Check {
        #[arg(long)]
        request: PathBuf,
        #[arg(long)]
        response: PathBuf,
    },
    /// 查看某版本下实体的字段定义
    Lookup { version: String, entity: String },
}

fn load_settings(args: &CliArgs) -> Result<Settings, OpenRtbError> {
    let mut settings = Settings::default();
    if let Some(path) = &args.config {
        settings = settings.apply(FileSettingsSource::new(path).load()?);
    }
    if let Some(log_dir) = &args.log_dir {
        settings.log_dir = log_dir.clone();
    }
    if args.strict {
        settings.strict = true;
    }
    Ok(settings)
}

fn print_outcome(source: &str, outcome: &Outcome, elapsed_ms: Option<u128>) {
    let record = &outcome.record;
    let took = elapsed_ms.map(|ms| format!(" [{ms} ms]")).unwrap_or_default();
    match record.outcome {
        AuditOutcome::Failed => {
            println!("{source}: failed: {}{took}", record.error.as_deref().unwrap_or("unknown error"));
        }
        AuditOutcome::Invalid => println!("{source}: invalid, {} error(s){took}", record.error_count()),
        _ => println!("{source}: ok, {} warning(s){took}", record.warning_count()),
    }
    for violation in record.violations.iter().chain(&record.drift) {
        println!("  {violation}");
    }
}

async fn read_transaction(path: &Path, default_version: Version, kind: TransactionKind) -> Result<Transaction, OpenRtbError> {
    let bytes = tokio::fs::read(path).await?;
    Transaction::parse(&bytes, default_version, Some(kind))
}

async fn run(command: Command, mut settings: Settings, sink: &EventSink) -> Result<u8, OpenRtbError> {
    let strict = settings.strict;
    match command {
        Command::Validate { files, version, kind } => {
            if let Some(version) = version {
                settings.default_version = version;
            }
            if kind.is_some() {
                settings.kind = kind;
            }
            settings.target = None;
            let engine = Arc::new(Engine::new(settings));
            let results = process_files(files, engine).await;

            let mut code = 0;
            for result in &results {
                print_outcome(&result.path.display().to_string(), &result.outcome, Some(result.elapsed_ms));
                sink.log(&result.outcome.record).await;
                code = code.max(result.outcome.exit_code(strict));
            }
            info!(files = results.len(), exit_code = code, "validate finished");
            Ok(code)
        }
        Command::Normalize { file, target, version, kind, canonicalize, pretty } => {
            if let Some(version) = version {
                settings.default_version = version;
            }
            if kind.is_some() {
                settings.kind = kind;
            }
            settings.target = Some(target);
            settings.canonicalize |= canonicalize;

            let bytes = tokio::fs::read(&file).await?;
            let source = file.display().to_string();
            let outcome = Engine::new(settings).process(&source, &bytes);
            for violation in outcome.record.violations.iter().chain(&outcome.record.drift) {
                eprintln!("{violation}");
            }
            sink.log(&outcome.record).await;

            match (&outcome.record.outcome, &outcome.transaction) {
                (AuditOutcome::Normalized, Some(tx)) => {
                    let json = if pretty { tx.to_json_pretty()? } else { tx.to_json()? };
                    println!("{json}");
                }
                _ => print_outcome(&source, &outcome, None),
            }
            Ok(outcome.exit_code(strict))
        }
        Command::Check { request, response } => {
            let request = read_transaction(&request, settings.default_version, TransactionKind::Request).await?;
            let response = read_transaction(&response, settings.default_version, TransactionKind::Response).await?;
            let report = check_references(&request, &response)?;
            for violation in &report.violations {
                println!("{violation}");
            }
            if !report.is_valid() || (strict && report.warnings().next().is_some()) {
                return Ok(1);
            }
            println!("all references resolve");
            Ok(0)
        }
        Command::Lookup { version, entity } => {
            let set = SchemaRegistry::global().lookup(&version, &entity)?;
            println!("{} (OpenRTB {version})", set.entity);
            for spec in set.fields() {
                let default = spec.default.map(|d| format!(" default {}", d.to_value())).unwrap_or_default();
                let required = if spec.required { "required" } else { "optional" };
                println!("  {:<22} {:<18} {required}{default}", spec.name, spec.kind.describe());
            }
            for rule in set.rules() {
                println!("  rule {rule:?}");
            }
            Ok(0)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    // 全局 tracing，guard 必须活到进程结束
    let _guard = match logging::init_tracing(&settings.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    info!(command = ?args.command, "rust-openrtb starting");

    let sink = match EventSink::new(&settings.log_dir, &settings.sink) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let code = match run(args.command, settings, &sink).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            2
        }
    };
    sink.shutdown().await;
    ExitCode::from(code)
}
