// src/logging/audit.rs

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::openrtb::transaction::TransactionKind;
use crate::openrtb::version::Version;
use crate::validate::Violation;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// 校验通过（可能带警告）
    Valid,
    /// 存在错误级违规
    Invalid,
    /// 校验通过并完成归一化
    Normalized,
    /// 解析或归一化失败
    Failed,
}

/// **单个事务的审计记录**
#[derive(Serialize, Debug, Clone)]
pub struct AuditRecord {
    pub timestamp: String,      // 记录时间，RFC 3339
    pub record_id: String,      // uuid v4
    pub log_type: String,       // 固定为 "openrtb_audit"
    pub source: String,         // 文件路径或其他来源标识
    pub transaction_id: Option<String>,
    pub version: Option<Version>,
    pub kind: Option<TransactionKind>,
    pub target: Option<Version>,
    pub outcome: AuditOutcome,
    pub error: Option<String>,
    pub violations: Vec<Violation>,
    pub drift: Vec<Violation>,  // 归一化产生的 SemanticDrift 警告
}

impl AuditRecord {
    pub fn new(source: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            record_id: Uuid::new_v4().to_string(),
            log_type: "openrtb_audit".to_string(),
            source: source.to_string(),
            transaction_id: None,
            version: None,
            kind: None,
            target: None,
            outcome: AuditOutcome::Failed, // 默认失败，后续更新
            error: None,
            violations: Vec::new(),
            drift: Vec::new(),
        }
    }

    pub fn set_transaction(&mut self, id: Option<&str>, version: Version, kind: TransactionKind) {
        self.transaction_id = id.map(str::to_string);
        self.version = Some(version);
        self.kind = Some(kind);
    }

    pub fn add_violations(&mut self, violations: &[Violation]) {
        self.violations.extend_from_slice(violations);
    }

    pub fn set_normalized(&mut self, target: Version, drift: Vec<Violation>) {
        self.target = Some(target);
        self.drift = drift;
        self.outcome = AuditOutcome::Normalized;
    }

    pub fn fail(&mut self, error: impl ToString) {
        self.outcome = AuditOutcome::Failed;
        self.error = Some(error.to_string());
    }

    pub fn error_count(&self) -> usize {
        self.violations.iter().filter(|v| v.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.violations.iter().chain(&self.drift).filter(|v| !v.is_error()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openrtb::path::FieldPath;
    use crate::validate::Reason;

    #[test]
    fn record_serializes_as_one_json_object() {
        let mut record = AuditRecord::new("payloads/a.json");
        record.set_transaction(Some("r1"), Version::V26, TransactionKind::Request);
        record.add_violations(&[Violation::warning(FieldPath::parse("imp[0].banner.pos"), Reason::UnknownEnumValue, "9")]);
        record.set_normalized(
            Version::V30,
            vec![Violation::warning(FieldPath::parse("seatbid[0].bid[0].nurl"), Reason::SemanticDrift, "nurl")],
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["log_type"], "openrtb_audit");
        assert_eq!(json["version"], "2.6");
        assert_eq!(json["target"], "3.0");
        assert_eq!(json["kind"], "request");
        assert_eq!(json["outcome"], "normalized");
        assert_eq!(json["violations"][0]["path"], "imp[0].banner.pos");
        assert_eq!(json["drift"][0]["reason"], "SemanticDrift");
        assert_eq!(record.warning_count(), 2);
        assert_eq!(record.error_count(), 0);
        assert!(Uuid::parse_str(&record.record_id).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }

    #[test]
    fn failure_keeps_the_error_text() {
        let mut record = AuditRecord::new("stdin");
        record.fail("unknown OpenRTB version: 2.4");
        assert_eq!(record.outcome, AuditOutcome::Failed);
        assert_eq!(record.error.as_deref(), Some("unknown OpenRTB version: 2.4"));
    }
}
