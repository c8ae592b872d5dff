// src/registry/mod.rs

pub mod domains;
pub mod field;
mod v25;
mod v26;
mod v30;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{OpenRtbError, Result};
use crate::openrtb::transaction::TransactionKind;
use crate::openrtb::version::Version;

pub use field::{DefaultValue, Domain, EnumDomain, FieldKind, FieldSet, FieldSpec, Rule};

/// 进程级只读注册表，首次使用时构建，之后不再修改
static REGISTRY: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::build);

/// **Schema 注册表**
///
/// 每个版本下每个实体的字段集合。
#[derive(Debug)]
pub struct SchemaRegistry {
    versions: HashMap<Version, HashMap<&'static str, FieldSet>>,
}

impl SchemaRegistry {
    pub fn global() -> &'static SchemaRegistry {
        &REGISTRY
    }

    fn build() -> Self {
        let mut versions = HashMap::new();
        for version in Version::ALL {
            let sets = match version {
                Version::V25 => v25::entities(),
                Version::V26 => v26::entities(),
                Version::V30 => v30::entities(),
            };
            versions.insert(version, sets.into_iter().map(|set| (set.entity, set)).collect());
        }
        Self { versions }
    }

    /// 按版本字符串查找实体字段集
    pub fn lookup(&self, version: &str, entity: &str) -> Result<&FieldSet> {
        let version: Version = version.parse()?;
        self.fields(version, entity).ok_or_else(|| OpenRtbError::UnknownEntity {
            version: version.to_string(),
            entity: entity.to_string(),
        })
    }

    pub fn fields(&self, version: Version, entity: &str) -> Option<&FieldSet> {
        self.versions.get(&version).and_then(|sets| sets.get(entity))
    }

    /// 文档根对应的实体
    pub fn root_entity(version: Version, kind: TransactionKind) -> &'static str {
        match (version, kind) {
            (Version::V30, _) => "Root",
            (_, TransactionKind::Request) => "BidRequest",
            (_, TransactionKind::Response) => "BidResponse",
        }
    }

    /// 某版本下的所有实体名（已排序）
    pub fn entities(&self, version: Version) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .versions
            .get(&version)
            .map(|sets| sets.keys().copied().collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }
}
