// src/lib.rs
//
// OpenRTB 2.5 / 2.6 / 3.0：注册表、校验、归一化、Layer-4 编解码

pub mod codec;
pub mod config;
pub mod error;
pub mod extension;
pub mod logging;
pub mod normalize;
pub mod openrtb;
pub mod pipeline;
pub mod registry;
pub mod validate;

pub use codec::{AdcomCodec, CodecError, CodecRegistry, Layer4Codec, Projection};
pub use error::{OpenRtbError, Result};
pub use normalize::{canonicalize, normalize, NormalizeOptions, Normalized};
pub use openrtb::{FieldPath, Generation, Transaction, TransactionKind, Version};
pub use registry::SchemaRegistry;
pub use validate::{check_references, validate, Reason, Severity, ValidationFailure, ValidationReport, Validator, Violation};
