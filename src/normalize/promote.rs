// src/normalize/promote.rs
//
// 2.5 <-> 2.6：2.5 惯例放在 ext 中的字段在 2.6 成为正式字段

use serde_json::{Map, Value};

use crate::error::Result;
use crate::extension::{check_ext, EXT};
use crate::openrtb::path::FieldPath;
use crate::openrtb::transaction::TransactionKind;
use crate::openrtb::version::Version;

/// (所在对象, 字段)
const PROMOTIONS: &[(&str, &str)] = &[
    ("regs", "gdpr"),
    ("regs", "us_privacy"),
    ("user", "consent"),
    ("user", "eids"),
    ("source", "schain"),
];

/// 在两个 2.x 版本之间移动上述字段；其余差异交给 conform
pub(super) fn shift(document: &mut Value, kind: TransactionKind, from: Version, to: Version) -> Result<()> {
    if kind != TransactionKind::Request || from == to {
        return Ok(());
    }
    let Some(root) = document.as_object_mut() else {
        return Ok(());
    };
    for (parent, field) in PROMOTIONS {
        let Some(Value::Object(object)) = root.get_mut(*parent) else {
            continue;
        };
        check_ext(object).map_err(|e| e.within(&FieldPath::root().field(parent)))?;
        match (from, to) {
            (Version::V25, Version::V26) => promote(object, field),
            (Version::V26, Version::V25) => demote(object, field),
            _ => {}
        }
    }
    Ok(())
}

/// ext.field -> field
fn promote(object: &mut Map<String, Value>, field: &str) {
    if object.contains_key(field) {
        return;
    }
    let Some(Value::Object(ext)) = object.get_mut(EXT) else {
        return;
    };
    let Some(value) = ext.remove(field) else {
        return;
    };
    if ext.is_empty() {
        object.remove(EXT);
    }
    object.insert(field.to_string(), value);
}

/// field -> ext.field
fn demote(object: &mut Map<String, Value>, field: &str) {
    let occupied = matches!(object.get(EXT), Some(Value::Object(ext)) if ext.contains_key(field));
    if occupied {
        return;
    }
    let Some(value) = object.remove(field) else {
        return;
    };
    if let Value::Object(ext) = object.entry(EXT).or_insert_with(|| Value::Object(Map::new())) {
        ext.insert(field.to_string(), value);
    }
}
