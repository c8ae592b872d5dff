// src/pipeline/engine.rs

use tracing::{debug, info, warn};

use crate::codec::CodecRegistry;
use crate::config::Settings;
use crate::logging::{AuditOutcome, AuditRecord};
use crate::normalize::{canonicalize, normalize};
use crate::openrtb::transaction::Transaction;
use crate::validate::{ValidationReport, Validator};

/// 单个负载的处理结果
#[derive(Debug, Clone)]
pub struct Outcome {
    pub record: AuditRecord,
    /// 最终事务：归一化 / 补默认值之后的结果，否则是原样解析的事务
    pub transaction: Option<Transaction>,
    pub report: Option<ValidationReport>,
}

impl Outcome {
    /// 0 成功，1 校验失败，2 致命错误
    pub fn exit_code(&self, strict: bool) -> u8 {
        match self.record.outcome {
            AuditOutcome::Failed => 2,
            AuditOutcome::Invalid => 1,
            _ if strict && self.record.warning_count() > 0 => 1,
            _ => 0,
        }
    }
}

/// **处理引擎**：解析 -> 校验 -> 可选补默认值 -> 可选归一化
pub struct Engine {
    settings: Settings,
    codecs: CodecRegistry,
    validator: Validator,
}

impl Engine {
    pub fn new(settings: Settings) -> Self {
        Self::with_codecs(settings, CodecRegistry::with_adcom())
    }

    pub fn with_codecs(settings: Settings, codecs: CodecRegistry) -> Self {
        Self { settings, codecs, validator: Validator::new() }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn process(&self, source: &str, bytes: &[u8]) -> Outcome {
        let mut record = AuditRecord::new(source);
        let tx = match Transaction::parse(bytes, self.settings.default_version, self.settings.kind) {
            Ok(tx) => tx,
            Err(e) => {
                warn!(source, error = %e, "payload rejected");
                record.fail(&e);
                return Outcome { record, transaction: None, report: None };
            }
        };
        record.set_transaction(tx.id(), tx.version(), tx.kind());

        let report = self.validator.validate(&tx);
        record.add_violations(&report.violations);
        if !report.is_valid() {
            record.outcome = AuditOutcome::Invalid;
            info!(source, errors = record.error_count(), "validation failed");
            return Outcome { record, transaction: Some(tx), report: Some(report) };
        }
        record.outcome = AuditOutcome::Valid;

        let tx = if self.settings.canonicalize { canonicalize(&tx) } else { tx };
        let Some(target) = self.settings.target else {
            debug!(source, version = %tx.version(), "validated");
            return Outcome { record, transaction: Some(tx), report: Some(report) };
        };

        match normalize(&tx, target, &self.codecs, &self.settings.normalize) {
            Ok(normalized) => {
                info!(
                    source,
                    from = %tx.version(),
                    to = %target,
                    drift = normalized.warnings.len(),
                    "normalized"
                );
                record.set_normalized(target, normalized.warnings);
                Outcome { record, transaction: Some(normalized.transaction), report: Some(report) }
            }
            Err(e) => {
                warn!(source, error = %e, "normalization failed");
                record.fail(&e);
                Outcome { record, transaction: Some(tx), report: Some(report) }
            }
        }
    }
}

/// 以给定配置处理一段原始负载
pub fn process_payload(bytes: &[u8], settings: &Settings) -> Outcome {
    Engine::new(settings.clone()).process("<memory>", bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openrtb::version::Version;
    use crate::validate::Reason;

    const REQUEST: &[u8] = br#"{"id":"r1","imp":[{"id":"1","banner":{"w":300,"h":250}}],"site":{"id":"s"}}"#;

    #[test]
    fn valid_payload_without_target_is_returned_as_is() {
        let outcome = process_payload(REQUEST, &Settings::default());
        assert_eq!(outcome.record.outcome, AuditOutcome::Valid);
        assert_eq!(outcome.record.transaction_id.as_deref(), Some("r1"));
        assert_eq!(outcome.transaction.as_ref().unwrap().version(), Version::V26);
        assert_eq!(outcome.exit_code(false), 0);
    }

    #[test]
    fn normalizes_to_target() {
        let settings = Settings { target: Some(Version::V30), canonicalize: true, ..Settings::default() };
        let outcome = process_payload(REQUEST, &settings);
        assert_eq!(outcome.record.outcome, AuditOutcome::Normalized);
        assert_eq!(outcome.record.target, Some(Version::V30));
        let tx = outcome.transaction.unwrap();
        assert_eq!(tx.version(), Version::V30);
        assert_eq!(tx.document()["openrtb"]["request"]["context"]["site"]["id"], "s");
        assert!(Validator::new().validate(&tx).is_valid());
    }

    #[test]
    fn invalid_payload_is_not_normalized() {
        let settings = Settings { target: Some(Version::V30), ..Settings::default() };
        let outcome = process_payload(br#"{"imp":[{"id":"1","banner":{}}]}"#, &settings);
        assert_eq!(outcome.record.outcome, AuditOutcome::Invalid);
        assert_eq!(outcome.record.violations[0].reason, Reason::MissingRequired);
        assert_eq!(outcome.transaction.as_ref().unwrap().version(), Version::V26);
        assert_eq!(outcome.exit_code(false), 1);
    }

    #[test]
    fn float_dimensions_stop_at_validation() {
        let settings = Settings { target: Some(Version::V30), ..Settings::default() };
        let outcome = process_payload(br#"{"id":"r1","imp":[{"id":"1","banner":{"w":300.0,"h":250}}]}"#, &settings);
        assert_eq!(outcome.record.outcome, AuditOutcome::Invalid);
        assert_eq!(outcome.record.violations.len(), 1);
        assert_eq!(outcome.record.violations[0].reason, Reason::TypeMismatch);
        assert_eq!(outcome.record.violations[0].path.to_string(), "imp[0].banner.w");
        assert_eq!(outcome.exit_code(false), 1);
    }

    #[test]
    fn unparsable_payload_is_fatal() {
        let outcome = process_payload(b"not json", &Settings::default());
        assert_eq!(outcome.record.outcome, AuditOutcome::Failed);
        assert!(outcome.record.error.is_some());
        assert!(outcome.transaction.is_none());
        assert_eq!(outcome.exit_code(false), 2);
    }

    #[test]
    fn strict_mode_fails_on_warnings() {
        let payload = br#"{"id":"r1","imp":[{"id":"1","banner":{"pos":42}}]}"#;
        let outcome = process_payload(payload, &Settings::default());
        assert_eq!(outcome.record.outcome, AuditOutcome::Valid);
        assert_eq!(outcome.record.warning_count(), 1);
        assert_eq!(outcome.exit_code(false), 0);
        assert_eq!(outcome.exit_code(true), 1);
    }

    #[test]
    fn drift_is_recorded() {
        let settings = Settings { target: Some(Version::V30), ..Settings::default() };
        let payload = br#"{"id":"r1","seatbid":[{"bid":[{"id":"b","impid":"1","price":1.0,"nurl":"https://win"}]}]}"#;
        let outcome = process_payload(payload, &settings);
        assert_eq!(outcome.record.outcome, AuditOutcome::Normalized);
        assert_eq!(outcome.record.drift.len(), 1);
        assert_eq!(outcome.record.drift[0].reason, Reason::SemanticDrift);
        assert_eq!(outcome.exit_code(true), 1);
    }
}
