// src/openrtb/regs.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::version::Version;

/// **隐私法规信号**
///
/// 从请求中构造一次，之后只读。2.5 的 gdpr / us_privacy 按惯例放在 regs.ext 中，
/// 3.0 的 regs 位于 Layer-4 的 context 中。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Regs {
    coppa: Option<i64>,
    gdpr: Option<i64>,
    us_privacy: Option<String>,
    gpp: Option<String>,
    gpp_sid: Option<Vec<i64>>,
    ext: Option<Map<String, Value>>,
}

impl Regs {
    /// 从 regs 对象构造；`version` 决定是否回退读取 ext 中的旧字段
    pub fn from_object(regs: &Map<String, Value>, version: Version) -> Self {
        let ext = regs.get("ext").and_then(Value::as_object);
        let int = |key: &str| -> Option<i64> {
            regs.get(key)
                .and_then(Value::as_i64)
                .or_else(|| fallback(version, key).then(|| ext?.get(key)?.as_i64()).flatten())
        };
        let text = |key: &str| -> Option<String> {
            regs.get(key)
                .and_then(Value::as_str)
                .or_else(|| fallback(version, key).then(|| ext?.get(key)?.as_str()).flatten())
                .map(str::to_string)
        };

        Self {
            coppa: int("coppa"),
            gdpr: int("gdpr"),
            us_privacy: text("us_privacy"),
            gpp: text("gpp"),
            gpp_sid: regs
                .get("gpp_sid")
                .and_then(Value::as_array)
                .map(|ids| ids.iter().filter_map(Value::as_i64).collect()),
            ext: ext.cloned(),
        }
    }

    pub fn coppa(&self) -> bool {
        self.coppa == Some(1)
    }

    /// None 表示请求未声明
    pub fn gdpr(&self) -> Option<bool> {
        self.gdpr.map(|v| v == 1)
    }

    pub fn us_privacy(&self) -> Option<&str> {
        self.us_privacy.as_deref()
    }

    pub fn gpp(&self) -> Option<&str> {
        self.gpp.as_deref()
    }

    pub fn gpp_sid(&self) -> &[i64] {
        self.gpp_sid.as_deref().unwrap_or(&[])
    }

    pub fn ext(&self) -> Option<&Map<String, Value>> {
        self.ext.as_ref()
    }
}

/// 2.5 把 gdpr / us_privacy 放在 ext 里；3.0 (AdCOM) 的 us_privacy 也在 ext 里
fn fallback(version: Version, key: &str) -> bool {
    match version {
        Version::V25 => matches!(key, "gdpr" | "us_privacy"),
        Version::V26 => false,
        Version::V30 => key == "us_privacy",
    }
}
