// src/normalize/defaults.rs

use serde_json::{Map, Value};

use crate::openrtb::transaction::Transaction;
use crate::openrtb::version::Version;
use crate::registry::{FieldKind, SchemaRegistry};

/// **显式补默认值**
///
/// 对已存在的实体，把注册表中带默认值、但文档中缺失的字段补上，递归进行。
/// 不透明的 Layer-4 对象不处理。校验与归一化从不隐式调用它。
pub fn canonicalize(tx: &Transaction) -> Transaction {
    let mut document = tx.document().clone();
    let root = SchemaRegistry::root_entity(tx.version(), tx.kind());
    if let Some(map) = document.as_object_mut() {
        fill(map, tx.version(), root);
    }
    tx.with_document(document)
}

fn fill(map: &mut Map<String, Value>, version: Version, entity: &str) {
    let Some(set) = SchemaRegistry::global().fields(version, entity) else {
        return;
    };
    for spec in set.fields() {
        if let Some(default) = &spec.default {
            map.entry(spec.name.to_string()).or_insert_with(|| default.to_value());
        }
        match (spec.kind, map.get_mut(spec.name)) {
            (FieldKind::Object(child), Some(Value::Object(object))) => fill(object, version, child),
            (FieldKind::ObjectArray(child), Some(Value::Array(items))) => {
                for object in items.iter_mut().filter_map(Value::as_object_mut) {
                    fill(object, version, child);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openrtb::transaction::TransactionKind;
    use crate::validate::Validator;
    use serde_json::json;

    #[test]
    fn v26_request_defaults() {
        let tx = Transaction::from_value(
            json!({"id": "r", "at": 1, "imp": [{"id": "1", "banner": {}}]}),
            Version::V26,
            TransactionKind::Request,
        )
        .unwrap();
        let canonical = canonicalize(&tx);
        assert_eq!(
            canonical.document(),
            &json!({
                "id": "r",
                "at": 1,
                "test": 0,
                "allimps": 0,
                "cur": ["USD"],
                "cattax": 1,
                "imp": [{
                    "id": "1",
                    "banner": {},
                    "instl": 0,
                    "bidfloor": 0,
                    "bidfloorcur": "USD",
                    "rwdd": 0,
                    "ssai": 0
                }]
            })
        );
        assert_eq!(canonical.version(), Version::V26);
        assert!(Validator::new().validate(&canonical).is_valid());
        assert_eq!(canonicalize(&canonical), canonical);
    }

    #[test]
    fn nested_entities_and_absent_entities() {
        let tx = Transaction::from_value(
            json!({"id": "r", "imp": [{"id": "1", "video": {"mimes": []}, "pmp": {"deals": [{"id": "d"}]}}]}),
            Version::V25,
            TransactionKind::Request,
        )
        .unwrap();
        let doc = canonicalize(&tx).into_document();
        let imp = &doc["imp"][0];
        assert_eq!(imp["video"]["boxingallowed"], json!(1));
        assert_eq!(imp["video"]["skipmin"], json!(0));
        assert_eq!(imp["pmp"]["private_auction"], json!(0));
        assert_eq!(imp["pmp"]["deals"][0]["bidfloorcur"], json!("USD"));
        assert!(imp.get("rwdd").is_none());
        assert!(doc.get("site").is_none());
        assert!(doc.get("cattax").is_none());
    }

    #[test]
    fn v30_defaults_stop_at_layer4_objects() {
        let tx = Transaction::from_value(
            json!({"openrtb": {"domainver": "1.0", "request": {"id": "r", "item": [{"id": "1", "spec": {}}], "context": {}}}}),
            Version::V30,
            TransactionKind::Request,
        )
        .unwrap();
        let doc = canonicalize(&tx).into_document();
        let envelope = &doc["openrtb"];
        assert_eq!(envelope["ver"], json!("3.0"));
        assert_eq!(envelope["domainspec"], json!("adcom"));
        let request = &envelope["request"];
        assert_eq!(request["wseat"], json!(1));
        assert_eq!(request["package"], json!(0));
        assert_eq!(request["cur"], json!(["USD"]));
        assert_eq!(
            request["item"][0],
            json!({"id": "1", "spec": {}, "qty": 1, "flrcur": "USD", "dlvy": 0, "private": 0})
        );
        assert_eq!(request["context"], json!({}));
        assert!(envelope.get("response").is_none());
    }

    #[test]
    fn response_defaults() {
        let tx = Transaction::from_value(
            json!({"id": "r", "seatbid": [{"bid": [{"id": "b", "impid": "1", "price": 1.0}]}]}),
            Version::V25,
            TransactionKind::Response,
        )
        .unwrap();
        let doc = canonicalize(&tx).into_document();
        assert_eq!(doc["cur"], json!("USD"));
        assert_eq!(doc["seatbid"][0]["group"], json!(0));
    }
}
