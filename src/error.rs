// src/error.rs

use thiserror::Error;

use crate::codec::CodecError;
use crate::extension::ShapeError;

/// **致命错误**
///
/// 单个事务处理失败时返回；校验违规不走这里，见 [`crate::validate::ValidationFailure`]。
#[derive(Debug, Error)]
pub enum OpenRtbError {
    /// 不是 2.5 / 2.6 / 3.0 之一
    #[error("unknown OpenRTB version: {0}")]
    UnknownVersion(String),

    #[error("entity `{entity}` is not defined for OpenRTB {version}")]
    UnknownEntity { version: String, entity: String },

    #[error("failed to parse payload: {0}")]
    Parse(String),

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    /// 没有为 domainspec/domainver 注册 Layer-4 编解码器
    #[error("no layer-4 codec registered for domainspec `{domainspec}` version `{domainver}`")]
    UnsupportedLayer4Spec { domainspec: String, domainver: String },

    #[error("invalid settings: {0}")]
    Config(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize transaction: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OpenRtbError>;

impl From<ShapeError> for OpenRtbError {
    fn from(err: ShapeError) -> Self {
        OpenRtbError::MalformedTransaction(err.to_string())
    }
}
