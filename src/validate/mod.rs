// src/validate/mod.rs
//
// 按注册表校验一个事务。纯函数，不修改输入，不写默认值。

pub mod references;
pub mod report;

use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::openrtb::path::FieldPath;
use crate::openrtb::transaction::{Transaction, TransactionKind};
use crate::openrtb::version::{Generation, Version};
use crate::registry::{Domain, FieldKind, FieldSet, FieldSpec, Rule, SchemaRegistry};

pub use references::check_references;
pub use report::{Reason, Severity, ValidationFailure, ValidationReport, Violation};

/// 校验阶段，报告按阶段排序
#[derive(Debug, Clone, Copy)]
enum Phase {
    /// 必填字段与基础类型
    Structure = 0,
    Enumeration = 1,
    CrossField = 2,
    Range = 3,
}

#[derive(Default)]
struct Collector {
    phases: [Vec<Violation>; 4],
}

impl Collector {
    fn push(&mut self, phase: Phase, violation: Violation) {
        self.phases[phase as usize].push(violation);
    }

    fn finish(self) -> ValidationReport {
        ValidationReport::new(self.phases.into_iter().flatten().collect())
    }
}

/// 整数判定：必须能放进 i64，300.0 这样的浮点写法不算整数
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub struct Validator {
    registry: &'static SchemaRegistry,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self { registry: SchemaRegistry::global() }
    }

    pub fn validate(&self, tx: &Transaction) -> ValidationReport {
        self.validate_document(tx.document(), tx.kind(), tx.version())
    }

    /// 以 `version` 的对象模型校验任意 JSON 根对象
    pub fn validate_document(&self, document: &Value, kind: TransactionKind, version: Version) -> ValidationReport {
        let mut out = Collector::default();
        let root = SchemaRegistry::root_entity(version, kind);
        let Some(set) = self.registry.fields(version, root) else {
            return out.finish();
        };
        let Some(map) = document.as_object() else {
            out.push(
                Phase::Structure,
                Violation::error(FieldPath::root(), Reason::TypeMismatch, format!("expected object, found {}", kind_of(document))),
            );
            return out.finish();
        };

        self.walk(map, set, version, &FieldPath::root(), &mut out);
        self.transaction_checks(map, kind, version, &mut out);
        out.finish()
    }

    fn walk(&self, map: &Map<String, Value>, set: &FieldSet, version: Version, path: &FieldPath, out: &mut Collector) {
        for spec in set.fields() {
            let field_path = path.field(spec.name);
            match map.get(spec.name) {
                None => {
                    if spec.required {
                        out.push(
                            Phase::Structure,
                            Violation::error(field_path, Reason::MissingRequired, "required field is missing"),
                        );
                    }
                }
                Some(value) => self.check_field(value, spec, version, &field_path, out),
            }
        }

        for rule in set.rules() {
            let (fields, error) = match rule {
                Rule::AtMostOne(fields) | Rule::ExactlyOne(fields) => (*fields, true),
                Rule::Advisory(fields) => (*fields, false),
            };
            let present: Vec<&str> = fields
                .iter()
                .copied()
                .filter(|name| map.get(*name).is_some_and(|v| !v.is_null()))
                .collect();
            if present.len() >= 2 {
                let detail = format!("at most one of {} may be present, found {}", fields.join(", "), present.join(", "));
                let violation = if error {
                    Violation::error(path.clone(), Reason::MutuallyExclusiveViolation, detail)
                } else {
                    Violation::warning(path.clone(), Reason::MutuallyExclusiveViolation, detail)
                };
                out.push(Phase::CrossField, violation);
            } else if present.is_empty() && matches!(rule, Rule::ExactlyOne(_)) {
                out.push(
                    Phase::CrossField,
                    Violation::error(
                        path.field(&fields.join("|")),
                        Reason::MissingRequired,
                        format!("exactly one of {} is required", fields.join(", ")),
                    ),
                );
            }
        }
    }

    fn check_field(&self, value: &Value, spec: &FieldSpec, version: Version, path: &FieldPath, out: &mut Collector) {
        let mismatch = |out: &mut Collector, path: FieldPath, value: &Value, expected: &str| {
            out.push(
                Phase::Structure,
                Violation::error(path, Reason::TypeMismatch, format!("expected {expected}, found {}", kind_of(value))),
            );
        };

        match spec.kind {
            FieldKind::String => {
                if !value.is_string() {
                    mismatch(out, path.clone(), value, spec.kind.describe());
                }
            }
            FieldKind::Integer | FieldKind::Number => {
                let number = match spec.kind {
                    FieldKind::Integer => as_integer(value).map(|i| i as f64),
                    _ => value.as_f64(),
                };
                match number {
                    Some(number) => self.check_domain(number, spec, path, out),
                    None => mismatch(out, path.clone(), value, spec.kind.describe()),
                }
            }
            FieldKind::Flag => match as_integer(value) {
                Some(0) | Some(1) => {}
                Some(other) => out.push(
                    Phase::Range,
                    Violation::error(path.clone(), Reason::OutOfRange, format!("flag must be 0 or 1, found {other}")),
                ),
                None => mismatch(out, path.clone(), value, spec.kind.describe()),
            },
            FieldKind::StringArray | FieldKind::IntegerArray | FieldKind::NumberArray => {
                let Some(items) = value.as_array() else {
                    mismatch(out, path.clone(), value, spec.kind.describe());
                    return;
                };
                self.check_length(items.len(), spec, path, out);
                for (i, item) in items.iter().enumerate() {
                    let item_path = path.index(i);
                    match spec.kind {
                        FieldKind::StringArray if !item.is_string() => mismatch(out, item_path, item, "string"),
                        FieldKind::StringArray => {}
                        FieldKind::IntegerArray => match as_integer(item) {
                            Some(number) => self.check_domain(number as f64, spec, &item_path, out),
                            None => mismatch(out, item_path, item, "integer"),
                        },
                        _ => match item.as_f64() {
                            Some(number) => self.check_domain(number, spec, &item_path, out),
                            None => mismatch(out, item_path, item, "number"),
                        },
                    }
                }
            }
            FieldKind::Object(child) => match value.as_object() {
                Some(map) => self.descend(map, child, version, path, out),
                None => mismatch(out, path.clone(), value, spec.kind.describe()),
            },
            FieldKind::ObjectArray(child) => {
                let Some(items) = value.as_array() else {
                    mismatch(out, path.clone(), value, spec.kind.describe());
                    return;
                };
                self.check_length(items.len(), spec, path, out);
                for (i, item) in items.iter().enumerate() {
                    match item.as_object() {
                        Some(map) => self.descend(map, child, version, &path.index(i), out),
                        None => mismatch(out, path.index(i), item, "object"),
                    }
                }
            }
            FieldKind::Ext | FieldKind::Opaque => {
                if !value.is_object() {
                    mismatch(out, path.clone(), value, spec.kind.describe());
                }
            }
        }
    }

    fn descend(&self, map: &Map<String, Value>, entity: &str, version: Version, path: &FieldPath, out: &mut Collector) {
        if let Some(set) = self.registry.fields(version, entity) {
            self.walk(map, set, version, path, out);
        }
    }

    fn check_length(&self, len: usize, spec: &FieldSpec, path: &FieldPath, out: &mut Collector) {
        if len < spec.min_items {
            out.push(
                Phase::Range,
                Violation::error(
                    path.clone(),
                    Reason::OutOfRange,
                    format!("expected at least {} element(s), found {len}", spec.min_items),
                ),
            );
        }
    }

    fn check_domain(&self, number: f64, spec: &FieldSpec, path: &FieldPath, out: &mut Collector) {
        match spec.domain {
            Some(Domain::Enum(domain)) => {
                if !domain.contains(number as i64) {
                    out.push(
                        Phase::Enumeration,
                        Violation::warning(
                            path.clone(),
                            Reason::UnknownEnumValue,
                            format!("{number} is not a known {} value", domain.name),
                        ),
                    );
                }
            }
            Some(Domain::Range { min, max }) => {
                let below = min.is_some_and(|min| number < min);
                let above = max.is_some_and(|max| number > max);
                if below || above {
                    let bounds = match (min, max) {
                        (Some(min), Some(max)) => format!("[{min}, {max}]"),
                        (Some(min), None) => format!(">= {min}"),
                        (None, Some(max)) => format!("<= {max}"),
                        (None, None) => String::new(),
                    };
                    out.push(
                        Phase::Range,
                        Violation::error(path.clone(), Reason::OutOfRange, format!("{number} is outside {bounds}")),
                    );
                }
            }
            None => {}
        }
    }

    /// 注册表之外、作用于整个事务的检查
    fn transaction_checks(&self, root: &Map<String, Value>, kind: TransactionKind, version: Version, out: &mut Collector) {
        let (body, body_path) = match version.generation() {
            Generation::Two => (Some(root), FieldPath::root()),
            Generation::Three => {
                let Some(envelope) = root.get("openrtb").and_then(Value::as_object) else {
                    return;
                };
                let envelope_path = FieldPath::root().field("openrtb");
                let has_request = envelope.contains_key("request");
                let has_response = envelope.contains_key("response");
                if has_request && has_response {
                    out.push(
                        Phase::CrossField,
                        Violation::error(
                            envelope_path.clone(),
                            Reason::MutuallyExclusiveViolation,
                            "an envelope carries either a request or a response, not both",
                        ),
                    );
                }
                let key = kind.envelope_key();
                if !envelope.contains_key(key) {
                    out.push(
                        Phase::Structure,
                        Violation::error(envelope_path.field(key), Reason::MissingRequired, "required field is missing"),
                    );
                }
                (envelope.get(key).and_then(Value::as_object), envelope_path.field(key))
            }
        };
        let Some(body) = body else {
            return;
        };

        match kind {
            TransactionKind::Request => {
                let key = match version.generation() {
                    Generation::Two => "imp",
                    Generation::Three => "item",
                };
                let mut seen = HashSet::new();
                let items = body.get(key).and_then(Value::as_array);
                for (i, item) in items.into_iter().flatten().enumerate() {
                    let Some(id) = item.get("id").and_then(Value::as_str) else {
                        continue;
                    };
                    if !seen.insert(id) {
                        out.push(
                            Phase::CrossField,
                            Violation::error(
                                body_path.field(key).index(i).field("id"),
                                Reason::DuplicateId,
                                format!("line item id `{id}` is not unique within the request"),
                            ),
                        );
                    }
                }
            }
            TransactionKind::Response => {
                let seatbid = body.get("seatbid").and_then(Value::as_array);
                if seatbid.is_some_and(|s| s.is_empty()) {
                    out.push(
                        Phase::CrossField,
                        Violation::warning(
                            body_path.field("seatbid"),
                            Reason::OutOfRange,
                            "empty seatbid; omit it or supply nbr when there are no bids",
                        ),
                    );
                }
                if body.contains_key("nbr") && seatbid.is_some_and(|s| !s.is_empty()) {
                    out.push(
                        Phase::CrossField,
                        Violation::warning(
                            body_path.field("nbr"),
                            Reason::MutuallyExclusiveViolation,
                            "nbr is only meaningful when there are no bids",
                        ),
                    );
                }
            }
        }
    }
}

/// 以 `version` 校验事务
pub fn validate(tx: &Transaction, version: Version) -> ValidationReport {
    Validator::new().validate_document(tx.document(), tx.kind(), version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(document: Value, version: Version, kind: TransactionKind) -> ValidationReport {
        Validator::new().validate_document(&document, kind, version)
    }

    fn request(document: Value) -> ValidationReport {
        check(document, Version::V26, TransactionKind::Request)
    }

    fn summary(report: &ValidationReport) -> Vec<(String, Reason, Severity)> {
        report.violations.iter().map(|v| (v.path.to_string(), v.reason, v.severity)).collect()
    }

    #[test]
    fn valid_request_passes() {
        let report = request(json!({
            "id": "r1",
            "imp": [{"id": "1", "banner": {"w": 300, "h": 250, "format": [{"w": 300, "h": 250}]}, "bidfloor": 0.5}],
            "site": {"id": "s", "page": "https://example.com", "publisher": {"id": "p"}},
            "device": {"ua": "Mozilla", "geo": {"lat": 51.5, "lon": -0.12}, "devicetype": 2},
            "regs": {"coppa": 0, "gdpr": 1},
            "ext": {"anything": ["goes", 1, null]}
        }));
        assert!(report.violations.is_empty(), "{:?}", report.violations);
    }

    #[test]
    fn missing_id_is_reported_once() {
        let report = request(json!({"imp": [{"id": "1", "banner": {}}]}));
        assert_eq!(summary(&report), vec![("id".to_string(), Reason::MissingRequired, Severity::Error)]);
    }

    #[test]
    fn site_and_app_are_mutually_exclusive() {
        let report = request(json!({"id": "r", "imp": [{"id": "1", "banner": {}}], "site": {}, "app": {}}));
        assert_eq!(summary(&report), vec![("$".to_string(), Reason::MutuallyExclusiveViolation, Severity::Error)]);

        let report = request(json!({"id": "r", "imp": [{"id": "1", "banner": {}}], "app": {}, "dooh": {}}));
        assert!(!report.is_valid());
    }

    #[test]
    fn line_item_needs_exactly_one_creative_type() {
        let report = request(json!({"id": "r", "imp": [{"id": "1"}, {"id": "2", "banner": {}, "video": {"mimes": ["video/mp4"]}}]}));
        assert_eq!(
            summary(&report),
            vec![
                ("imp[0].banner|video|audio|native".to_string(), Reason::MissingRequired, Severity::Error),
                ("imp[1]".to_string(), Reason::MutuallyExclusiveViolation, Severity::Error),
            ]
        );
    }

    #[test]
    fn types_ranges_and_enums() {
        let report = request(json!({
            "id": 7,
            "imp": [{"id": "1", "banner": {"w": 300.5, "pos": 42}, "instl": 2}],
            "device": {"geo": {"lat": 91.0, "lon": -180.0}},
            "bcat": ["IAB1", 3],
            "user": null
        }));
        assert_eq!(
            summary(&report),
            vec![
                ("id".to_string(), Reason::TypeMismatch, Severity::Error),
                ("imp[0].banner.w".to_string(), Reason::TypeMismatch, Severity::Error),
                ("user".to_string(), Reason::TypeMismatch, Severity::Error),
                ("bcat[1]".to_string(), Reason::TypeMismatch, Severity::Error),
                ("imp[0].banner.pos".to_string(), Reason::UnknownEnumValue, Severity::Warning),
                ("imp[0].instl".to_string(), Reason::OutOfRange, Severity::Error),
                ("device.geo.lat".to_string(), Reason::OutOfRange, Severity::Error),
            ]
        );
    }

    #[test]
    fn integers_must_be_written_as_i64() {
        let report = request(json!({
            "id": "r",
            "imp": [{"id": "1", "instl": 1.0, "banner": {"h": 18446744073709551615u64, "w": 300.0}}]
        }));
        assert_eq!(
            summary(&report),
            vec![
                ("imp[0].banner.w".to_string(), Reason::TypeMismatch, Severity::Error),
                ("imp[0].banner.h".to_string(), Reason::TypeMismatch, Severity::Error),
                ("imp[0].instl".to_string(), Reason::TypeMismatch, Severity::Error),
            ]
        );
    }

    #[test]
    fn user_agent_brand_versions_are_strings() {
        let ok = request(json!({
            "id": "r",
            "imp": [{"id": "1", "banner": {}}],
            "device": {"sua": {"browsers": [{"brand": "Chromium", "version": "120.0"}], "platform": {"brand": "macOS", "version": "14"}}}
        }));
        assert!(ok.violations.is_empty(), "{:?}", ok.violations);

        let missing = request(json!({
            "id": "r",
            "imp": [{"id": "1", "banner": {}}],
            "device": {"sua": {"browsers": [{"brand": "Chromium"}]}}
        }));
        assert_eq!(
            summary(&missing),
            vec![("device.sua.browsers[0].version".to_string(), Reason::MissingRequired, Severity::Error)]
        );
    }

    #[test]
    fn exchange_specific_enum_values_are_accepted() {
        let report = request(json!({"id": "r", "at": 501, "imp": [{"id": "1", "banner": {"api": [500]}}]}));
        assert!(report.violations.is_empty());
    }

    #[test]
    fn empty_line_item_list_is_out_of_range() {
        let report = request(json!({"id": "r", "imp": []}));
        assert_eq!(summary(&report), vec![("imp".to_string(), Reason::OutOfRange, Severity::Error)]);
    }

    #[test]
    fn seat_lists_are_advisory() {
        let report = request(json!({"id": "r", "imp": [{"id": "1", "banner": {}}], "wseat": ["a"], "bseat": ["b"]}));
        assert!(report.is_valid());
        assert_eq!(summary(&report), vec![("$".to_string(), Reason::MutuallyExclusiveViolation, Severity::Warning)]);
    }

    #[test]
    fn duplicate_line_item_ids() {
        let report = request(json!({"id": "r", "imp": [{"id": "1", "banner": {}}, {"id": "1", "banner": {}}]}));
        assert_eq!(summary(&report), vec![("imp[1].id".to_string(), Reason::DuplicateId, Severity::Error)]);
    }

    #[test]
    fn version_specific_fields() {
        let doc = json!({"id": "r", "imp": [{"id": "1", "banner": {}}], "user": {"yob": "1980"}});
        let v25 = check(doc.clone(), Version::V25, TransactionKind::Request);
        assert_eq!(summary(&v25), vec![("user.yob".to_string(), Reason::TypeMismatch, Severity::Error)]);
        // 2.6 不再定义 yob，未知字段不校验
        assert!(request(doc).violations.is_empty());
    }

    #[test]
    fn v30_paths_run_through_the_envelope() {
        let report = check(
            json!({"openrtb": {"ver": "3.0", "domainver": "1.0", "request": {"id": "r", "item": [{"id": "1"}, {"spec": {}}]}}}),
            Version::V30,
            TransactionKind::Request,
        );
        assert_eq!(
            summary(&report),
            vec![
                ("openrtb.request.item[0].spec".to_string(), Reason::MissingRequired, Severity::Error),
                ("openrtb.request.item[1].id".to_string(), Reason::MissingRequired, Severity::Error),
            ]
        );
    }

    #[test]
    fn v30_envelope_must_match_kind() {
        let report = check(
            json!({"openrtb": {"domainver": "1.0", "request": {"id": "r", "item": [{"id": "1", "spec": {}}]}}}),
            Version::V30,
            TransactionKind::Response,
        );
        assert_eq!(
            summary(&report),
            vec![("openrtb.response".to_string(), Reason::MissingRequired, Severity::Error)]
        );
    }

    #[test]
    fn response_checks() {
        let response = |doc| check(doc, Version::V26, TransactionKind::Response);
        let ok = response(json!({"id": "r", "seatbid": [{"bid": [{"id": "b", "impid": "1", "price": 1.5}]}]}));
        assert!(ok.violations.is_empty());

        let empty = response(json!({"id": "r", "seatbid": []}));
        assert_eq!(summary(&empty), vec![("seatbid".to_string(), Reason::OutOfRange, Severity::Warning)]);

        let both = response(json!({"id": "r", "nbr": 2, "seatbid": [{"bid": [{"id": "b", "impid": "1", "price": 1}]}]}));
        assert_eq!(summary(&both), vec![("nbr".to_string(), Reason::MutuallyExclusiveViolation, Severity::Warning)]);

        let negative = response(json!({"id": "r", "seatbid": [{"bid": [{"id": "b", "impid": "1", "price": -1}]}]}));
        assert_eq!(
            summary(&negative),
            vec![("seatbid[0].bid[0].price".to_string(), Reason::OutOfRange, Severity::Error)]
        );
    }

    #[test]
    fn non_object_root() {
        let report = request(json!([1]));
        assert_eq!(summary(&report), vec![("$".to_string(), Reason::TypeMismatch, Severity::Error)]);
    }
}
