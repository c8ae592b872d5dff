// src/config/adapters.rs

use std::fs;
use std::path::PathBuf;

use super::settings::SettingsOverlay;
use crate::error::{OpenRtbError, Result};

/// 配置来源
pub trait SettingsSource: Send + Sync {
    fn load(&self) -> Result<SettingsOverlay>;
}

/// 从 JSON 文件读取
pub struct FileSettingsSource {
    pub path: PathBuf,
}

impl FileSettingsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsSource for FileSettingsSource {
    fn load(&self) -> Result<SettingsOverlay> {
        let content = fs::read_to_string(&self.path)?;
        parse_overlay(&content).map_err(|e| OpenRtbError::Config(format!("{}: {e}", self.path.display())))
    }
}

/// 直接给出 JSON 文本，主要用于测试与嵌入
pub struct InlineSettingsSource {
    pub json: String,
}

impl SettingsSource for InlineSettingsSource {
    fn load(&self) -> Result<SettingsOverlay> {
        parse_overlay(&self.json).map_err(OpenRtbError::Config)
    }
}

fn parse_overlay(content: &str) -> std::result::Result<SettingsOverlay, String> {
    if content.trim().is_empty() {
        return Ok(SettingsOverlay::default());
    }
    serde_json::from_str(content).map_err(|e| e.to_string())
}
