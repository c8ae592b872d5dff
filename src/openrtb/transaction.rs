// src/openrtb/transaction.rs

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::path::FieldPath;
use super::regs::Regs;
use super::version::{Generation, Version};
use crate::error::{OpenRtbError, Result};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Request,
    Response,
}

impl TransactionKind {
    /// 3.0 信封中的键名
    pub fn envelope_key(&self) -> &'static str {
        match self {
            TransactionKind::Request => "request",
            TransactionKind::Response => "response",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "request" => Ok(TransactionKind::Request),
            "response" => Ok(TransactionKind::Response),
            other => Err(format!("unknown transaction kind `{other}`, expected request or response")),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.envelope_key())
    }
}

/// 请求中的一个广告位（2.x 的 Imp / 3.0 的 Item）
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: String,
    pub deal_ids: Vec<String>,
}

/// 响应中的一个出价及其引用
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BidRef {
    /// 出价对象自身的路径
    pub path: FieldPath,
    /// impid (2.x) / item (3.0)
    pub line_item: Option<String>,
    /// dealid (2.x) / deal (3.0)
    pub deal: Option<String>,
}

/// **一次竞价事务**
///
/// `document` 保存完整的线上 JSON 根对象；3.0 的根为 `{"openrtb": {...}}`。
/// 对大字段的类型化视图延迟构造并缓存。
#[derive(Debug, Clone)]
pub struct Transaction {
    version: Version,
    kind: TransactionKind,
    document: Value,
    regs_view: OnceCell<Option<Regs>>,
    line_items_view: OnceCell<Vec<LineItem>>,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.kind == other.kind && self.document == other.document
    }
}

impl Transaction {
    /// 从已解析的 JSON 构造，根必须是对象
    pub fn from_value(document: Value, version: Version, kind: TransactionKind) -> Result<Self> {
        if !document.is_object() {
            return Err(OpenRtbError::MalformedTransaction("document root must be a JSON object".into()));
        }
        if version == Version::V30 && !document.get("openrtb").is_some_and(Value::is_object) {
            return Err(OpenRtbError::MalformedTransaction(
                "OpenRTB 3.0 payloads must be wrapped in an `openrtb` object".into(),
            ));
        }
        Ok(Self {
            version,
            kind,
            document,
            regs_view: OnceCell::new(),
            line_items_view: OnceCell::new(),
        })
    }

    /// 同版本、同类型，替换文档；`document` 的根形状由调用方保证
    pub(crate) fn with_document(&self, document: Value) -> Self {
        Self {
            version: self.version,
            kind: self.kind,
            document,
            regs_view: OnceCell::new(),
            line_items_view: OnceCell::new(),
        }
    }

    /// 解析原始字节。带 `openrtb` 信封的按 3.0 处理，否则使用 `default_version`。
    pub fn parse(bytes: &[u8], default_version: Version, kind: Option<TransactionKind>) -> Result<Self> {
        let mut buffer = bytes.to_vec();
        let document: Value = simd_json::serde::from_slice(&mut buffer)
            .map_err(|e| OpenRtbError::Parse(e.to_string()))?;
        let root = document
            .as_object()
            .ok_or_else(|| OpenRtbError::MalformedTransaction("document root must be a JSON object".into()))?;

        if let Some(envelope) = root.get("openrtb").and_then(Value::as_object) {
            let version = match envelope.get("ver").and_then(Value::as_str) {
                Some(ver) => ver.parse::<Version>()?,
                None => Version::V30,
            };
            if version != Version::V30 {
                return Err(OpenRtbError::MalformedTransaction(format!(
                    "`openrtb` envelope declares version {version}"
                )));
            }
            let kind = kind.unwrap_or(if envelope.contains_key("response") && !envelope.contains_key("request") {
                TransactionKind::Response
            } else {
                TransactionKind::Request
            });
            return Self::from_value(document, Version::V30, kind);
        }

        let kind = kind.unwrap_or(if root.contains_key("imp") {
            TransactionKind::Request
        } else {
            TransactionKind::Response
        });
        Self::from_value(document, default_version, kind)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn into_document(self) -> Value {
        self.document
    }

    /// request / response 对象所在路径
    pub fn body_path(&self) -> FieldPath {
        match self.version.generation() {
            Generation::Two => FieldPath::root(),
            Generation::Three => FieldPath::root().field("openrtb").field(self.kind.envelope_key()),
        }
    }

    /// request / response 对象本身
    pub fn body(&self) -> Option<&Map<String, Value>> {
        match self.version.generation() {
            Generation::Two => self.document.as_object(),
            Generation::Three => self
                .document
                .get("openrtb")?
                .get(self.kind.envelope_key())?
                .as_object(),
        }
    }

    /// 3.0 信封（`openrtb` 对象）
    pub fn envelope(&self) -> Option<&Map<String, Value>> {
        match self.version.generation() {
            Generation::Two => None,
            Generation::Three => self.document.get("openrtb")?.as_object(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.body()?.get("id")?.as_str()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.document)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.document)?)
    }

    /// 广告位数组的字段名
    pub fn line_item_key(&self) -> &'static str {
        match self.version.generation() {
            Generation::Two => "imp",
            Generation::Three => "item",
        }
    }

    pub fn line_items(&self) -> &[LineItem] {
        self.line_items_view.get_or_init(|| {
            let deals_of = |item: &Map<String, Value>| -> Vec<String> {
                let deals = match self.version.generation() {
                    Generation::Two => item.get("pmp").and_then(|pmp| pmp.get("deals")),
                    Generation::Three => item.get("deal"),
                };
                deals
                    .and_then(Value::as_array)
                    .map(|deals| {
                        deals
                            .iter()
                            .filter_map(|d| d.get("id").and_then(Value::as_str).map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default()
            };
            if self.kind != TransactionKind::Request {
                return Vec::new();
            }
            self.body()
                .and_then(|body| body.get(self.line_item_key()))
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_object)
                        .filter_map(|item| {
                            let id = item.get("id")?.as_str()?.to_string();
                            Some(LineItem { id, deal_ids: deals_of(item) })
                        })
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    /// 响应中的所有出价
    pub fn bids(&self) -> Vec<BidRef> {
        let (item_key, deal_key) = match self.version.generation() {
            Generation::Two => ("impid", "dealid"),
            Generation::Three => ("item", "deal"),
        };
        let mut refs = Vec::new();
        if self.kind != TransactionKind::Response {
            return refs;
        }
        let base = self.body_path();
        let seatbids = self.body().and_then(|b| b.get("seatbid")).and_then(Value::as_array);
        for (i, seatbid) in seatbids.into_iter().flatten().enumerate() {
            let bids = seatbid.get("bid").and_then(Value::as_array);
            for (j, bid) in bids.into_iter().flatten().enumerate() {
                let text = |key: &str| bid.get(key).and_then(Value::as_str).map(str::to_string);
                refs.push(BidRef {
                    path: base.field("seatbid").index(i).field("bid").index(j),
                    line_item: text(item_key),
                    deal: text(deal_key),
                });
            }
        }
        refs
    }

    /// 请求接受的币种，缺省为 USD
    pub fn accepted_currencies(&self) -> Vec<String> {
        self.body()
            .and_then(|b| b.get("cur"))
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).map(str::to_string).collect::<Vec<_>>())
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| vec!["USD".to_string()])
    }

    /// 隐私法规信号，仅请求有
    pub fn regs(&self) -> Option<&Regs> {
        self.regs_view
            .get_or_init(|| {
                if self.kind != TransactionKind::Request {
                    return None;
                }
                let body = self.body()?;
                let regs = match self.version.generation() {
                    Generation::Two => body.get("regs"),
                    Generation::Three => body.get("context").and_then(|c| c.get("regs")),
                };
                regs.and_then(Value::as_object)
                    .map(|regs| Regs::from_object(regs, self.version))
            })
            .as_ref()
    }
}
