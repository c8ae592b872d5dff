// src/codec/mod.rs
//
// Layer-4 编解码器：2.x 的创意/上下文对象 <-> 3.0 的 spec / context / media

pub mod adcom;

use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::extension::ShapeError;
use crate::openrtb::media::AdUnit;

pub use adcom::AdcomCodec;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("malformed layer-4 object: {0}")]
    Malformed(String),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// 一个 Layer-4 对象在 2.x 上的投影
///
/// `fields` 是能落到 2.x 字段上的部分，`residual` 是没有对应位置、需要随事务携带的部分。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub fields: Map<String, Value>,
    pub residual: Map<String, Value>,
}

impl Projection {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields, residual: Map::new() }
    }
}

pub trait Layer4Codec: Send + Sync {
    fn domainspec(&self) -> &str;
    fn domainver(&self) -> &str;

    fn supports(&self, domainspec: &str, domainver: &str) -> bool {
        self.domainspec() == domainspec && self.domainver() == domainver
    }

    /// Imp 的创意对象与展示字段 -> Item.spec
    fn encode_placement(&self, unit: &AdUnit) -> Result<Value, CodecError>;
    fn decode_placement(&self, spec: &Value) -> Result<AdUnit, CodecError>;

    /// site / app / device / user / regs / 屏蔽列表 -> Request.context
    fn encode_context(&self, context: &Projection) -> Result<Value, CodecError>;
    fn decode_context(&self, context: &Value) -> Result<Projection, CodecError>;

    /// Bid 的创意字段 -> Bid.media
    fn encode_media(&self, media: &Projection) -> Result<Value, CodecError>;
    fn decode_media(&self, media: &Value) -> Result<Projection, CodecError>;
}

/// 已注册的编解码器，按注册顺序匹配
#[derive(Clone, Default)]
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn Layer4Codec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置 AdCOM 1.x
    pub fn with_adcom() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(AdcomCodec::default()));
        registry
    }

    pub fn register(&mut self, codec: Arc<dyn Layer4Codec>) {
        self.codecs.push(codec);
    }

    pub fn find(&self, domainspec: &str, domainver: &str) -> Option<&dyn Layer4Codec> {
        self.codecs
            .iter()
            .find(|codec| codec.supports(domainspec, domainver))
            .map(|codec| codec.as_ref())
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.codecs.iter().map(|c| format!("{}/{}", c.domainspec(), c.domainver())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adcom_is_found_for_any_1x_version() {
        let registry = CodecRegistry::with_adcom();
        assert!(registry.find("adcom", "1.0").is_some());
        assert!(registry.find("adcom", "1.1").is_some());
        assert!(registry.find("adcom", "2.0").is_none());
        assert!(registry.find("vast", "1.0").is_none());
        assert!(CodecRegistry::new().find("adcom", "1.0").is_none());
    }
}
