// src/config/settings.rs

use serde::{Deserialize, Serialize};

use crate::normalize::NormalizeOptions;
use crate::openrtb::transaction::TransactionKind;
use crate::openrtb::version::Version;

/// 审计日志后台写入参数
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SinkSettings {
    /// mpsc 通道缓冲区大小
    pub buffer_size: usize,
    /// 攒够多少条写一次盘
    pub batch_size: usize,
    /// 定时刷盘间隔（毫秒）
    pub flush_interval_ms: u64,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self { buffer_size: 1000, batch_size: 100, flush_interval_ms: 1000 }
    }
}

/// **运行配置**
///
/// 先取默认值，再叠加配置文件，最后由命令行参数覆盖。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// 没有 `openrtb` 信封的负载按此版本解析
    pub default_version: Version,
    /// 为空时按内容判断
    pub kind: Option<TransactionKind>,
    /// 归一化目标版本，为空时只校验
    pub target: Option<Version>,
    pub canonicalize: bool,
    /// 警告也视为失败
    pub strict: bool,
    pub log_dir: String,
    pub normalize: NormalizeOptions,
    pub sink: SinkSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_version: Version::V26,
            kind: None,
            target: None,
            canonicalize: false,
            strict: false,
            log_dir: "logs".to_string(),
            normalize: NormalizeOptions::default(),
            sink: SinkSettings::default(),
        }
    }
}

/// 配置文件中的可选项，出现的才覆盖
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsOverlay {
    pub default_version: Option<Version>,
    pub kind: Option<TransactionKind>,
    pub target: Option<Version>,
    pub canonicalize: Option<bool>,
    pub strict: Option<bool>,
    pub log_dir: Option<String>,
    pub normalize: Option<NormalizeOptions>,
    pub sink: Option<SinkSettings>,
}

impl Settings {
    pub fn apply(mut self, overlay: SettingsOverlay) -> Self {
        if let Some(version) = overlay.default_version {
            self.default_version = version;
        }
        if overlay.kind.is_some() {
            self.kind = overlay.kind;
        }
        if overlay.target.is_some() {
            self.target = overlay.target;
        }
        if let Some(canonicalize) = overlay.canonicalize {
            self.canonicalize = canonicalize;
        }
        if let Some(strict) = overlay.strict {
            self.strict = strict;
        }
        if let Some(log_dir) = overlay.log_dir {
            self.log_dir = log_dir;
        }
        if let Some(normalize) = overlay.normalize {
            self.normalize = normalize;
        }
        if let Some(sink) = overlay.sink {
            self.sink = sink;
        }
        self
    }
}
