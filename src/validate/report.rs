// src/validate/report.rs

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::openrtb::path::FieldPath;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    MissingRequired,
    TypeMismatch,
    OutOfRange,
    MutuallyExclusiveViolation,
    UnknownEnumValue,
    DuplicateId,
    UnresolvedReference,
    SemanticDrift,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// 一条违规：字段路径 + 原因
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Violation {
    pub path: FieldPath,
    pub reason: Reason,
    pub severity: Severity,
    pub detail: String,
}

impl Violation {
    pub fn error(path: FieldPath, reason: Reason, detail: impl Into<String>) -> Self {
        Self { path, reason, severity: Severity::Error, detail: detail.into() }
    }

    pub fn warning(path: FieldPath, reason: Reason, detail: impl Into<String>) -> Self {
        Self { path, reason, severity: Severity::Warning, detail: detail.into() }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level} {} at `{}`: {}", self.reason, self.path, self.detail)
    }
}

/// 一次校验的全部结果
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// 没有错误级违规即为通过（警告不影响）
    pub fn is_valid(&self) -> bool {
        !self.violations.iter().any(Violation::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.is_error())
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }

    /// 通过时返回警告，否则返回 [`ValidationFailure`]
    pub fn into_result(self) -> Result<Vec<Violation>, ValidationFailure> {
        if self.is_valid() {
            return Ok(self.violations);
        }
        Err(ValidationFailure { error_count: self.errors().count(), violations: self.violations })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation failed with {error_count} error(s)")]
pub struct ValidationFailure {
    pub error_count: usize,
    pub violations: Vec<Violation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warnings_do_not_fail_the_report() {
        let report = ValidationReport::new(vec![Violation::warning(
            FieldPath::parse("imp[0].banner.pos"),
            Reason::UnknownEnumValue,
            "9 is not a placement position",
        )]);
        assert!(report.is_valid());
        assert_eq!(report.into_result().unwrap().len(), 1);
    }

    #[test]
    fn errors_become_a_failure() {
        let report = ValidationReport::new(vec![
            Violation::error(FieldPath::parse("id"), Reason::MissingRequired, "required field is missing"),
            Violation::warning(FieldPath::root(), Reason::MutuallyExclusiveViolation, "wseat and bseat"),
        ]);
        let failure = report.into_result().unwrap_err();
        assert_eq!(failure.error_count, 1);
        assert_eq!(failure.violations.len(), 2);
        assert_eq!(failure.to_string(), "validation failed with 1 error(s)");
    }

    #[test]
    fn violation_serializes_path_as_string() {
        let violation = Violation::error(FieldPath::parse("imp[0].id"), Reason::DuplicateId, "duplicate");
        let json = serde_json::to_value(&violation).unwrap();
        assert_eq!(json["path"], "imp[0].id");
        assert_eq!(json["reason"], "DuplicateId");
        assert_eq!(json["severity"], "error");
        assert_eq!(violation.to_string(), "error DuplicateId at `imp[0].id`: duplicate");
    }
}
