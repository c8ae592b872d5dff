// src/normalize/mod.rs
//
// 版本归一化：2.5 <-> 2.6 <-> 3.0。不修改输入，返回新事务与语义漂移警告。

pub mod defaults;
mod promote;
mod tables;
mod to_three;
mod to_two;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::codec::CodecRegistry;
use crate::error::Result;
use crate::extension::{conform, ShapeError};
use crate::openrtb::path::FieldPath;
use crate::openrtb::transaction::Transaction;
use crate::openrtb::version::{Generation, Version};
use crate::registry::SchemaRegistry;
use crate::validate::Violation;

pub use defaults::canonicalize;

/// 生成 3.0 信封时使用的 Layer-4 规范
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NormalizeOptions {
    pub domainspec: String,
    pub domainver: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self { domainspec: "adcom".to_string(), domainver: "1.0".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub transaction: Transaction,
    /// SemanticDrift 等警告
    pub warnings: Vec<Violation>,
}

/// **把事务归一化到 `target` 版本**
///
/// 2.x 之间只搬动少数字段；跨代际时广告位、上下文与创意经由 Layer-4 编解码器转换。
/// 最后按目标版本的对象模型做一次 conform：未知字段进携带桶，可恢复的字段恢复。
pub fn normalize(
    tx: &Transaction,
    target: Version,
    codecs: &CodecRegistry,
    options: &NormalizeOptions,
) -> Result<Normalized> {
    let kind = tx.kind();
    let source = tx.version();
    let mut warnings = Vec::new();
    let mut document = tx.document().clone();

    let mut document = match (source.generation(), target.generation()) {
        (Generation::Two, Generation::Two) => {
            promote::shift(&mut document, kind, source, target)?;
            document
        }
        (Generation::Two, Generation::Three) => {
            promote::shift(&mut document, kind, source, Version::V26)?;
            to_three::convert(document, kind, codecs, options, &mut warnings)?
        }
        (Generation::Three, Generation::Two) => {
            let mut converted = to_two::convert(document, kind, codecs, options, &mut warnings)?;
            promote::shift(&mut converted, kind, Version::V26, target)?;
            converted
        }
        (Generation::Three, Generation::Three) => document,
    };

    let root = SchemaRegistry::root_entity(target, kind);
    conform(&mut document, target, root, &FieldPath::root())?;
    Ok(Normalized { transaction: Transaction::from_value(document, target, kind)?, warnings })
}

/// 携带桶中取回的对象；缺省为空
pub(super) fn carried_object(value: Option<Value>, path: FieldPath) -> Result<Map<String, Value>> {
    match value {
        None => Ok(Map::new()),
        Some(Value::Object(object)) => Ok(object),
        Some(_) => Err(ShapeError { path, expected: "an object" }.into()),
    }
}

pub(super) fn expect_array(value: Value, path: FieldPath) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(ShapeError { path, expected: "an array" }.into()),
    }
}

pub(super) fn expect_object(value: Value, path: &FieldPath) -> Result<Map<String, Value>> {
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(ShapeError { path: path.clone(), expected: "an object" }.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OpenRtbError;
    use crate::openrtb::transaction::TransactionKind;
    use crate::validate::{Reason, Validator};
    use serde_json::json;

    fn tx(document: Value, version: Version, kind: TransactionKind) -> Transaction {
        Transaction::from_value(document, version, kind).unwrap()
    }

    fn run(tx: &Transaction, target: Version) -> Normalized {
        normalize(tx, target, &CodecRegistry::with_adcom(), &NormalizeOptions::default()).unwrap()
    }

    #[test]
    fn banner_imp_becomes_item_spec() {
        let request = tx(
            json!({"id": "r1", "imp": [{"id": "1", "banner": {"w": 300, "h": 250}}]}),
            Version::V26,
            TransactionKind::Request,
        );
        let normalized = run(&request, Version::V30);
        assert_eq!(
            normalized.transaction.document(),
            &json!({"openrtb": {
                "ver": "3.0",
                "domainspec": "adcom",
                "domainver": "1.0",
                "request": {
                    "id": "r1",
                    "item": [{"id": "1", "spec": {"placement": {"display": {"w": 300, "h": 250}}}}]
                }
            }})
        );
        assert!(normalized.warnings.is_empty());
        assert!(Validator::new().validate(&normalized.transaction).is_valid());

        let back = run(&normalized.transaction, Version::V26);
        assert_eq!(back.transaction, request);
    }

    #[test]
    fn full_request_round_trips_through_v30() {
        let request = tx(
            json!({
                "id": "r2",
                "at": 1,
                "tmax": 120,
                "cur": ["USD"],
                "allimps": 0,
                "wseat": ["s1"],
                "bseat": ["s2"],
                "bcat": ["IAB25"],
                "cattax": 2,
                "source": {"tid": "t", "fd": 1, "schain": {"complete": 1, "ver": "1.0", "nodes": [{"asi": "x.com", "sid": "1"}]}},
                "imp": [{
                    "id": "1",
                    "video": {"mimes": ["video/mp4"], "protocols": [2], "w": 640, "h": 360, "plcmt": 1},
                    "bidfloor": 1.25,
                    "bidfloorcur": "EUR",
                    "pmp": {"private_auction": 1, "deals": [{"id": "d1", "bidfloor": 2.0, "guar": 1}], "ext": {"p": 1}},
                    "qty": {"multiplier": 1.5, "sourcetype": 1},
                    "refresh": {"count": 3},
                    "ext": {"gpid": "/home"}
                }],
                "app": {"id": "a", "bundle": "com.example"},
                "device": {"ua": "x", "geo": {"lat": 1.0, "lon": 2.0}},
                "user": {"id": "u", "consent": "CO"},
                "regs": {"gdpr": 1},
                "ext": {"exchange": {"k": "v"}}
            }),
            Version::V26,
            TransactionKind::Request,
        );
        let three = run(&request, Version::V30);
        let body = &three.transaction.document()["openrtb"]["request"];
        assert_eq!(body["seat"], json!(["s1"]));
        assert_eq!(body["wseat"], json!(1));
        assert_eq!(body["item"][0]["flr"], json!(1.25));
        assert_eq!(body["item"][0]["flrcur"], json!("EUR"));
        assert_eq!(body["item"][0]["private"], json!(1));
        assert_eq!(body["item"][0]["deal"][0]["flr"], json!(2.0));
        assert_eq!(body["item"][0]["qtyflt"], json!(1.5));
        assert_eq!(body["context"]["restrictions"]["bcat"], json!(["IAB25"]));
        assert_eq!(body["context"]["app"]["bundle"], json!("com.example"));
        assert_eq!(body["source"]["schain"]["nodes"][0]["asi"], json!("x.com"));
        assert_eq!(body["ext"]["__openrtb_carry"]["v2"]["bseat"], json!(["s2"]));

        let back = run(&three.transaction, Version::V26);
        assert_eq!(back.transaction.document(), request.document());
    }

    #[test]
    fn v25_to_v26_and_back() {
        let request = tx(
            json!({
                "id": "r",
                "imp": [{"id": "1", "banner": {"w": 1, "h": 1}}],
                "user": {"yob": 1990, "ext": {"consent": "CO"}},
                "device": {"didsha1": "abc"},
                "regs": {"ext": {"gdpr": 1}}
            }),
            Version::V25,
            TransactionKind::Request,
        );
        let v26 = run(&request, Version::V26);
        assert_eq!(
            v26.transaction.document(),
            &json!({
                "id": "r",
                "imp": [{"id": "1", "banner": {"w": 1, "h": 1}}],
                "user": {"consent": "CO", "ext": {"__openrtb_carry": {"v2": {"yob": 1990}}}},
                "device": {"ext": {"__openrtb_carry": {"v2": {"didsha1": "abc"}}}},
                "regs": {"gdpr": 1}
            })
        );
        let back = run(&v26.transaction, Version::V25);
        assert_eq!(back.transaction, request);
    }

    #[test]
    fn response_maps_bids_and_flags_drift() {
        let response = tx(
            json!({
                "id": "r1",
                "bidid": "b",
                "cur": "USD",
                "customdata": "cd",
                "seatbid": [{
                    "seat": "s",
                    "group": 0,
                    "bid": [{
                        "id": "b1", "impid": "1", "price": 1.5, "nurl": "https://win", "burl": "https://bill",
                        "adid": "ad1", "dealid": "d1", "adm": "<div/>", "crid": "c1", "w": 300, "h": 250, "mtype": 1
                    }]
                }]
            }),
            Version::V26,
            TransactionKind::Response,
        );
        let three = run(&response, Version::V30);
        let body = &three.transaction.document()["openrtb"]["response"];
        let bid = &body["seatbid"][0]["bid"][0];
        assert_eq!(body["cdata"], json!("cd"));
        assert_eq!(body["seatbid"][0]["package"], json!(0));
        assert_eq!(bid["item"], json!("1"));
        assert_eq!(bid["deal"], json!("d1"));
        assert_eq!(bid["mid"], json!("ad1"));
        assert_eq!(bid["purl"], json!("https://win"));
        assert_eq!(bid["burl"], json!("https://bill"));
        assert_eq!(bid["media"]["ad"]["id"], json!("c1"));
        assert_eq!(bid["media"]["ad"]["display"]["adm"], json!("<div/>"));

        assert_eq!(three.warnings.len(), 1);
        assert_eq!(three.warnings[0].reason, Reason::SemanticDrift);
        assert_eq!(three.warnings[0].path.to_string(), "openrtb.response.seatbid[0].bid[0].purl");

        let back = run(&three.transaction, Version::V26);
        assert_eq!(back.transaction, response);
        assert_eq!(back.warnings.len(), 1);
        assert_eq!(back.warnings[0].path.to_string(), "seatbid[0].bid[0].nurl");
    }

    #[test]
    fn v30_only_fields_are_carried_and_restored() {
        let request = tx(
            json!({"openrtb": {"ver": "3.0", "domainspec": "adcom", "domainver": "1.0", "request": {
                "id": "r",
                "cdata": "opaque",
                "package": 1,
                "item": [{"id": "1", "qty": 2, "seq": 1, "dlvy": 1, "spec": {"placement": {"display": {"w": 1, "h": 1}}}}],
                "context": {"site": {"id": "s"}, "restrictions": {"battr": [1]}}
            }}}),
            Version::V30,
            TransactionKind::Request,
        );
        let two = run(&request, Version::V26);
        let doc = two.transaction.document();
        assert_eq!(doc["site"], json!({"id": "s"}));
        assert_eq!(doc["ext"]["__openrtb_carry"]["v3"]["cdata"], json!("opaque"));
        assert_eq!(doc["ext"]["__openrtb_carry"]["v3"]["context"], json!({"restrictions": {"battr": [1]}}));
        assert_eq!(doc["imp"][0]["ext"]["__openrtb_carry"]["v3"], json!({"qty": 2, "seq": 1, "dlvy": 1}));

        let back = run(&two.transaction, Version::V30);
        assert_eq!(back.transaction, request);
    }

    #[test]
    fn normalize_is_idempotent_for_a_fixed_target() {
        let request = tx(
            json!({"id": "r", "imp": [{"id": "1", "audio": {"mimes": ["audio/mp4"]}, "unknown": 1}], "wlang": ["en"]}),
            Version::V25,
            TransactionKind::Request,
        );
        for target in Version::ALL {
            let once = run(&request, target);
            let twice = run(&once.transaction, target);
            assert_eq!(twice.transaction, once.transaction, "target {target}");
        }
    }

    #[test]
    fn unknown_layer4_spec_is_fatal() {
        let request = tx(
            json!({"openrtb": {"domainspec": "vast", "domainver": "4.0", "request": {"id": "r", "item": []}}}),
            Version::V30,
            TransactionKind::Request,
        );
        let err = normalize(&request, Version::V26, &CodecRegistry::with_adcom(), &NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, OpenRtbError::UnsupportedLayer4Spec { domainspec, .. } if domainspec == "vast"));

        let v26 = tx(json!({"id": "r", "imp": []}), Version::V26, TransactionKind::Request);
        let err = normalize(&v26, Version::V30, &CodecRegistry::new(), &NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, OpenRtbError::UnsupportedLayer4Spec { .. }));
    }

    #[test]
    fn malformed_ext_is_fatal() {
        let request = tx(json!({"id": "r", "imp": [{"id": "1", "banner": {}, "ext": 5}]}), Version::V26, TransactionKind::Request);
        let err = normalize(&request, Version::V30, &CodecRegistry::with_adcom(), &NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, OpenRtbError::MalformedTransaction(msg) if msg.contains("imp[0].ext")));
    }

    #[test]
    fn vendor_carry_in_ext_stays_vendor_data() {
        for ext in [json!({"carry": "vendor-string"}), json!({"carry": {"v2": {"bidfloor": 9}}})] {
            let request = tx(
                json!({"id": "r", "imp": [{"id": "1", "banner": {"w": 1, "h": 1}, "ext": ext}]}),
                Version::V26,
                TransactionKind::Request,
            );
            let same = run(&request, Version::V26);
            assert_eq!(same.transaction, request);
            assert!(same.transaction.document()["imp"][0].get("bidfloor").is_none());

            let three = run(&request, Version::V30);
            assert_eq!(three.transaction.document()["openrtb"]["request"]["item"][0]["ext"], ext);
            let back = run(&three.transaction, Version::V26);
            assert_eq!(back.transaction, request);
        }
    }

    #[test]
    fn input_is_not_mutated() {
        let request = tx(json!({"id": "r", "imp": [{"id": "1", "banner": {}}], "vendor": 1}), Version::V26, TransactionKind::Request);
        let before = request.clone();
        let _ = run(&request, Version::V30);
        let _ = run(&request, Version::V26);
        assert_eq!(request, before);
    }
}
