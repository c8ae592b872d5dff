// src/validate/references.rs

use serde_json::Value;

use super::report::{Reason, ValidationReport, Violation};
use crate::error::{OpenRtbError, Result};
use crate::openrtb::transaction::{Transaction, TransactionKind};
use crate::openrtb::version::Generation;

/// **引用完整性检查**
///
/// 响应 id 与请求一致；每个出价引用存在的广告位；deal 引用属于该广告位；
/// 响应币种在请求接受的币种之内。请求与响应可以是不同代际。
pub fn check_references(request: &Transaction, response: &Transaction) -> Result<ValidationReport> {
    if request.kind() != TransactionKind::Request || response.kind() != TransactionKind::Response {
        return Err(OpenRtbError::MalformedTransaction(format!(
            "reference check needs a request and a response, got {} and {}",
            request.kind(),
            response.kind()
        )));
    }

    let mut violations = Vec::new();
    let body_path = response.body_path();

    if response.id() != request.id() {
        violations.push(Violation::error(
            body_path.field("id"),
            Reason::UnresolvedReference,
            format!(
                "response id {:?} does not answer request {:?}",
                response.id().unwrap_or_default(),
                request.id().unwrap_or_default()
            ),
        ));
    }

    let (item_key, deal_key) = match response.version().generation() {
        Generation::Two => ("impid", "dealid"),
        Generation::Three => ("item", "deal"),
    };
    let line_items = request.line_items();
    for bid in response.bids() {
        let Some(target) = bid.line_item.as_deref() else {
            continue;
        };
        let Some(line_item) = line_items.iter().find(|item| item.id == target) else {
            violations.push(Violation::error(
                bid.path.field(item_key),
                Reason::UnresolvedReference,
                format!("no line item with id `{target}` in the request"),
            ));
            continue;
        };
        if let Some(deal) = bid.deal.as_deref() {
            if !line_item.deal_ids.iter().any(|id| id == deal) {
                violations.push(Violation::error(
                    bid.path.field(deal_key),
                    Reason::UnresolvedReference,
                    format!("line item `{target}` offers no deal `{deal}`"),
                ));
            }
        }
    }

    let currency = response
        .body()
        .and_then(|body| body.get("cur"))
        .and_then(Value::as_str)
        .unwrap_or("USD");
    let accepted = request.accepted_currencies();
    if !accepted.iter().any(|cur| cur == currency) {
        violations.push(Violation::error(
            body_path.field("cur"),
            Reason::OutOfRange,
            format!("currency {currency} is not among the accepted {}", accepted.join(", ")),
        ));
    }

    Ok(ValidationReport::new(violations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openrtb::version::Version;
    use serde_json::json;

    fn request() -> Transaction {
        Transaction::from_value(
            json!({"id": "r1", "cur": ["USD", "EUR"], "imp": [{"id": "1", "banner": {}, "pmp": {"deals": [{"id": "d1"}]}}]}),
            Version::V26,
            TransactionKind::Request,
        )
        .unwrap()
    }

    fn response(document: Value, version: Version) -> Transaction {
        Transaction::from_value(document, version, TransactionKind::Response).unwrap()
    }

    #[test]
    fn unknown_impid_is_unresolved() {
        let bad = response(
            json!({"id": "r1", "seatbid": [{"bid": [{"id": "b", "impid": "99", "price": 1.0}]}]}),
            Version::V26,
        );
        let report = check_references(&request(), &bad).unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].reason, Reason::UnresolvedReference);
        assert_eq!(report.violations[0].path.to_string(), "seatbid[0].bid[0].impid");
        assert!(!report.is_valid());
    }

    #[test]
    fn matching_response_passes() {
        let good = response(
            json!({"id": "r1", "cur": "EUR", "seatbid": [{"bid": [{"id": "b", "impid": "1", "dealid": "d1", "price": 1.0}]}]}),
            Version::V26,
        );
        assert!(check_references(&request(), &good).unwrap().violations.is_empty());
    }

    #[test]
    fn id_deal_and_currency_mismatches() {
        let bad = response(
            json!({"id": "other", "cur": "JPY", "seatbid": [{"bid": [{"id": "b", "impid": "1", "dealid": "d9", "price": 1.0}]}]}),
            Version::V26,
        );
        let report = check_references(&request(), &bad).unwrap();
        let paths: Vec<String> = report.violations.iter().map(|v| v.path.to_string()).collect();
        assert_eq!(paths, vec!["id", "seatbid[0].bid[0].dealid", "cur"]);
    }

    #[test]
    fn works_across_generations() {
        let v30 = response(
            json!({"openrtb": {"ver": "3.0", "domainver": "1.0", "response": {
                "id": "r1", "seatbid": [{"bid": [{"item": "2", "price": 1.0}]}]
            }}}),
            Version::V30,
        );
        let report = check_references(&request(), &v30).unwrap();
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].path.to_string(), "openrtb.response.seatbid[0].bid[0].item");
    }

    #[test]
    fn arguments_must_be_request_then_response() {
        let req = request();
        assert!(check_references(&req, &req).is_err());
    }
}
