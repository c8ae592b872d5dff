// src/openrtb/version.rs

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use crate::error::OpenRtbError;

/// OpenRTB 协议版本，序列化为 "2.5" / "2.6" / "3.0"
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub enum Version {
    V25,
    V26,
    V30,
}

/// 协议代际：2.x 与 3.0 结构差异很大，归一化按代际分流
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    Two,
    Three,
}

impl Version {
    pub const ALL: [Version; 3] = [Version::V25, Version::V26, Version::V30];

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V25 => "2.5",
            Version::V26 => "2.6",
            Version::V30 => "3.0",
        }
    }

    pub fn generation(&self) -> Generation {
        match self {
            Version::V25 | Version::V26 => Generation::Two,
            Version::V30 => Generation::Three,
        }
    }
}

impl Generation {
    /// ext.__openrtb_carry 下的桶名
    pub fn bucket(&self) -> &'static str {
        match self {
            Generation::Two => "v2",
            Generation::Three => "v3",
        }
    }

    pub fn other(&self) -> Generation {
        match self {
            Generation::Two => Generation::Three,
            Generation::Three => Generation::Two,
        }
    }
}

impl FromStr for Version {
    type Err = OpenRtbError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "2.5" | "2.5.0" => Ok(Version::V25),
            "2.6" | "2.6.0" => Ok(Version::V26),
            "3" | "3.0" => Ok(Version::V30),
            other if other.starts_with("3.0.") => Ok(Version::V30),
            other => Err(OpenRtbError::UnknownVersion(other.to_string())),
        }
    }
}

impl TryFrom<String> for Version {
    type Error = OpenRtbError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.as_str().to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
