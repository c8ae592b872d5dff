// src/extension.rs
//
// ext 透传与携带桶 (ext.__openrtb_carry.v2 / ext.__openrtb_carry.v3)
//
// 携带桶使用保留键 __openrtb_carry；ext 下的其他键（包括厂商自己的 carry）一律不解释。

use serde_json::{Map, Value};
use thiserror::Error;

use crate::openrtb::path::FieldPath;
use crate::openrtb::version::{Generation, Version};
use crate::registry::{FieldKind, SchemaRegistry};

pub const EXT: &str = "ext";
pub const CARRY: &str = "__openrtb_carry";

/// 结构错误：本应是对象/数组的位置出现了别的值
#[derive(Debug, Clone, PartialEq, Error)]
#[error("`{path}` must be {expected}")]
pub struct ShapeError {
    pub path: FieldPath,
    pub expected: &'static str,
}

impl ShapeError {
    fn object(path: FieldPath) -> Self {
        Self { path, expected: "an object" }
    }

    /// 把相对路径挂到 `base` 之下
    pub fn within(self, base: &FieldPath) -> Self {
        Self { path: base.join(&self.path), expected: self.expected }
    }
}

fn ext_path() -> FieldPath {
    FieldPath::root().field(EXT)
}

fn carry_path() -> FieldPath {
    ext_path().field(CARRY)
}

fn child_object<'a>(parent: &'a mut Map<String, Value>, key: &str, path: FieldPath) -> Result<&'a mut Map<String, Value>, ShapeError> {
    parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| ShapeError::object(path))
}

fn bucket_mut(map: &mut Map<String, Value>, generation: Generation) -> Result<&mut Map<String, Value>, ShapeError> {
    let ext = child_object(map, EXT, ext_path())?;
    let carry = child_object(ext, CARRY, carry_path())?;
    child_object(carry, generation.bucket(), carry_path().field(generation.bucket()))
}

fn carry_mut(map: &mut Map<String, Value>) -> Result<Option<&mut Map<String, Value>>, ShapeError> {
    let Some(ext) = map.get_mut(EXT) else {
        return Ok(None);
    };
    let ext = ext.as_object_mut().ok_or_else(|| ShapeError::object(ext_path()))?;
    match ext.get_mut(CARRY) {
        None => Ok(None),
        Some(Value::Object(carry)) => Ok(Some(carry)),
        Some(_) => Err(ShapeError::object(carry_path())),
    }
}

/// ext 存在时必须是对象
pub fn check_ext(map: &Map<String, Value>) -> Result<(), ShapeError> {
    match map.get(EXT) {
        None | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(ShapeError::object(ext_path())),
    }
}

/// 把一个字段放进 `generation` 的携带桶
pub fn carry(map: &mut Map<String, Value>, generation: Generation, key: &str, value: Value) -> Result<(), ShapeError> {
    bucket_mut(map, generation)?.insert(key.to_string(), value);
    Ok(())
}

pub fn carry_all(map: &mut Map<String, Value>, generation: Generation, fields: Map<String, Value>) -> Result<(), ShapeError> {
    if fields.is_empty() {
        return check_ext(map);
    }
    bucket_mut(map, generation)?.extend(fields);
    Ok(())
}

/// 取出桶中的单个字段，并清理空桶
pub fn take_carried(map: &mut Map<String, Value>, generation: Generation, key: &str) -> Result<Option<Value>, ShapeError> {
    let Some(carry) = carry_mut(map)? else {
        return Ok(None);
    };
    let value = match carry.get_mut(generation.bucket()) {
        None => None,
        Some(Value::Object(bucket)) => bucket.remove(key),
        Some(_) => return Err(ShapeError::object(carry_path().field(generation.bucket()))),
    };
    prune(map);
    Ok(value)
}

/// 取出整个桶
pub fn take_bucket(map: &mut Map<String, Value>, generation: Generation) -> Result<Map<String, Value>, ShapeError> {
    let Some(carry) = carry_mut(map)? else {
        return Ok(Map::new());
    };
    let bucket = match carry.remove(generation.bucket()) {
        None => Map::new(),
        Some(Value::Object(bucket)) => bucket,
        Some(_) => return Err(ShapeError::object(carry_path().field(generation.bucket()))),
    };
    prune(map);
    Ok(bucket)
}

/// 删除空桶；保留键为空时删除它，ext 因此变空时删除 ext。
/// 不含保留键的 ext 不动。
pub fn prune(map: &mut Map<String, Value>) {
    let Some(Value::Object(ext)) = map.get_mut(EXT) else {
        return;
    };
    let Some(Value::Object(carry)) = ext.get_mut(CARRY) else {
        return;
    };
    carry.retain(|_, bucket| !matches!(bucket, Value::Object(b) if b.is_empty()));
    if !carry.is_empty() {
        return;
    }
    ext.remove(CARRY);
    if ext.is_empty() {
        map.remove(EXT);
    }
}

/// 取出一个对象字段；不存在返回 None
pub fn take_object(map: &mut Map<String, Value>, key: &str) -> Result<Option<Map<String, Value>>, ShapeError> {
    match map.remove(key) {
        None => Ok(None),
        Some(Value::Object(object)) => Ok(Some(object)),
        Some(_) => Err(ShapeError::object(FieldPath::root().field(key))),
    }
}

/// 按改名表把字段从 `src` 挪到 `dst`
pub fn move_fields(src: &mut Map<String, Value>, table: &[(&str, &str)], dst: &mut Map<String, Value>) {
    for (from, to) in table {
        if let Some(value) = src.remove(*from) {
            dst.insert(to.to_string(), value);
        }
    }
}

pub fn invert(table: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
    table.iter().map(|(from, to)| (*to, *from)).collect()
}

/// **按改名表转换一个对象**
///
/// 表中的字段改名复制；其余字段进入 `from` 代际的携带桶；源对象的 ext 原样并入；
/// 之前从 `to` 代际携带过来的字段无条件恢复。
pub fn remap(
    src: &Map<String, Value>,
    table: &[(&str, &str)],
    from: Generation,
    to: Generation,
) -> Result<Map<String, Value>, ShapeError> {
    check_ext(src)?;
    let mut out = Map::new();
    let mut carried = Map::new();
    for (key, value) in src {
        if key == EXT {
            continue;
        }
        match table.iter().find(|(name, _)| name == key) {
            Some((_, renamed)) => {
                out.insert(renamed.to_string(), value.clone());
            }
            None => {
                carried.insert(key.clone(), value.clone());
            }
        }
    }
    if let Some(ext) = src.get(EXT) {
        out.insert(EXT.to_string(), ext.clone());
    }
    carry_all(&mut out, from, carried)?;
    for (key, value) in take_bucket(&mut out, to)? {
        out.insert(key, value);
    }
    Ok(out)
}

/// **对齐到目标版本的对象模型**
///
/// 自 `entity` 起沿注册表向下：
/// - 携带桶中目标实体认识、且当前缺失的字段被恢复；
/// - 目标实体不认识的字段被收进携带桶（实体没有 ext 时保持原样）；
/// - 不透明字段 (Layer-4) 不下探。
///
/// 重复执行结果不变。
pub fn conform(value: &mut Value, version: Version, entity: &str, path: &FieldPath) -> Result<(), ShapeError> {
    let Some(fields) = SchemaRegistry::global().fields(version, entity) else {
        return Ok(());
    };
    let map = value.as_object_mut().ok_or_else(|| ShapeError::object(path.clone()))?;

    if fields.contains(EXT) {
        let generation = version.generation();
        let mut bucket = take_bucket(map, generation).map_err(|e| e.within(path))?;
        let restorable: Vec<String> = bucket
            .keys()
            .filter(|key| fields.contains(key) && !map.contains_key(*key))
            .cloned()
            .collect();
        for key in restorable {
            if let Some(value) = bucket.remove(&key) {
                map.insert(key, value);
            }
        }

        let unknown: Vec<String> = map.keys().filter(|key| !fields.contains(key)).cloned().collect();
        for key in unknown {
            if let Some(value) = map.remove(&key) {
                bucket.insert(key, value);
            }
        }
        carry_all(map, generation, bucket).map_err(|e| e.within(path))?;
    }

    for spec in fields.fields() {
        match spec.kind {
            FieldKind::Object(child) => {
                if let Some(value) = map.get_mut(spec.name) {
                    conform(value, version, child, &path.field(spec.name))?;
                }
            }
            FieldKind::ObjectArray(child) => match map.get_mut(spec.name) {
                None => {}
                Some(Value::Array(items)) => {
                    for (i, item) in items.iter_mut().enumerate() {
                        conform(item, version, child, &path.field(spec.name).index(i))?;
                    }
                }
                Some(_) => {
                    return Err(ShapeError { path: path.field(spec.name), expected: "an array" });
                }
            },
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn carry_then_take_leaves_no_trace() {
        let mut map = object(json!({"id": "1"}));
        carry(&mut map, Generation::Two, "fd", json!(1)).unwrap();
        assert_eq!(Value::Object(map.clone()), json!({"id": "1", "ext": {"__openrtb_carry": {"v2": {"fd": 1}}}}));

        assert_eq!(take_carried(&mut map, Generation::Two, "fd").unwrap(), Some(json!(1)));
        assert_eq!(Value::Object(map), json!({"id": "1"}));
    }

    #[test]
    fn prune_keeps_vendor_ext() {
        let mut map = object(json!({"ext": {"vendor": true, "__openrtb_carry": {"v3": {"seq": 2}}}}));
        let bucket = take_bucket(&mut map, Generation::Three).unwrap();
        assert_eq!(bucket.get("seq"), Some(&json!(2)));
        assert_eq!(Value::Object(map), json!({"ext": {"vendor": true}}));

        let mut untouched = object(json!({"ext": {}}));
        prune(&mut untouched);
        assert_eq!(Value::Object(untouched), json!({"ext": {}}));
    }

    #[test]
    fn vendor_carry_key_is_opaque() {
        let mut imp = json!({"id": "1", "banner": {}, "ext": {"carry": "vendor-string"}});
        conform(&mut imp, Version::V26, "Imp", &FieldPath::parse("imp[0]")).unwrap();
        assert_eq!(imp, json!({"id": "1", "banner": {}, "ext": {"carry": "vendor-string"}}));

        let mut imp = json!({"id": "1", "banner": {}, "ext": {"carry": {"v2": {"bidfloor": 9}}}});
        let before = imp.clone();
        conform(&mut imp, Version::V26, "Imp", &FieldPath::parse("imp[0]")).unwrap();
        assert_eq!(imp, before);
        assert!(imp.get("bidfloor").is_none());

        let mut map = object(json!({"ext": {"carry": 7}}));
        carry(&mut map, Generation::Three, "seq", json!(1)).unwrap();
        assert_eq!(Value::Object(map), json!({"ext": {"carry": 7, "__openrtb_carry": {"v3": {"seq": 1}}}}));
    }

    #[test]
    fn non_object_ext_is_a_shape_error() {
        let mut map = object(json!({"ext": "oops"}));
        let err = carry(&mut map, Generation::Two, "x", json!(1)).unwrap_err();
        assert_eq!(err.path.to_string(), "ext");
        assert!(remap(&map, &[], Generation::Two, Generation::Three).is_err());
        assert_eq!(
            err.within(&FieldPath::parse("imp[0]")).to_string(),
            "`imp[0].ext` must be an object"
        );
    }

    #[test]
    fn remap_renames_carries_and_restores() {
        const TABLE: &[(&str, &str)] = &[("mimes", "mime"), ("w", "w")];
        let banner = object(json!({"mimes": ["image/png"], "w": 300, "btype": [1], "ext": {"k": 1}}));
        let display = remap(&banner, TABLE, Generation::Two, Generation::Three).unwrap();
        assert_eq!(
            Value::Object(display.clone()),
            json!({"mime": ["image/png"], "w": 300, "ext": {"k": 1, "__openrtb_carry": {"v2": {"btype": [1]}}}})
        );

        let back = remap(&display, &invert(TABLE), Generation::Three, Generation::Two).unwrap();
        assert_eq!(back, banner);
    }

    #[test]
    fn conform_absorbs_and_restores_across_minor_versions() {
        let mut user = json!({"id": "u", "yob": 1980, "gender": "F", "ext": {"seg": 1}});
        conform(&mut user, Version::V26, "User", &FieldPath::root().field("user")).unwrap();
        assert_eq!(user, json!({"id": "u", "ext": {"seg": 1, "__openrtb_carry": {"v2": {"yob": 1980, "gender": "F"}}}}));

        let once = user.clone();
        conform(&mut user, Version::V26, "User", &FieldPath::root().field("user")).unwrap();
        assert_eq!(user, once);

        conform(&mut user, Version::V25, "User", &FieldPath::root().field("user")).unwrap();
        assert_eq!(user, json!({"id": "u", "yob": 1980, "gender": "F", "ext": {"seg": 1}}));
    }

    #[test]
    fn conform_descends_into_children_but_not_opaque_fields() {
        let mut request = json!({
            "id": "r",
            "item": [{"id": "1", "spec": {"placement": {"anything": 1}}, "vendorflag": true}],
            "context": {"free": "form"}
        });
        conform(&mut request, Version::V30, "Request", &FieldPath::root()).unwrap();
        assert_eq!(request["item"][0]["ext"], json!({"__openrtb_carry": {"v3": {"vendorflag": true}}}));
        assert_eq!(request["item"][0]["spec"], json!({"placement": {"anything": 1}}));
        assert_eq!(request["context"], json!({"free": "form"}));
    }

    #[test]
    fn conform_rejects_non_object_entities() {
        let mut request = json!({"id": "r", "imp": [{"id": "1", "banner": 5}]});
        let err = conform(&mut request, Version::V26, "BidRequest", &FieldPath::root()).unwrap_err();
        assert_eq!(err.path.to_string(), "imp[0].banner");
    }
}
