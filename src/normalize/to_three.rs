// src/normalize/to_three.rs
//
// 2.6 形状 -> 3.0 信封 + Layer-3 对象

use serde_json::{json, Map, Value};

use super::{carried_object, expect_array, expect_object, tables, NormalizeOptions};
use crate::codec::{CodecRegistry, Layer4Codec, Projection};
use crate::error::{OpenRtbError, Result};
use crate::extension::{carry_all, move_fields, remap, take_carried, take_object, EXT};
use crate::openrtb::media::{AdUnit, PRESENTATION_FIELDS};
use crate::openrtb::path::FieldPath;
use crate::openrtb::transaction::TransactionKind;
use crate::openrtb::version::Generation::{Three, Two};
use crate::validate::{Reason, Violation};

pub(super) fn convert(
    document: Value,
    kind: TransactionKind,
    codecs: &CodecRegistry,
    options: &NormalizeOptions,
    warnings: &mut Vec<Violation>,
) -> Result<Value> {
    let Value::Object(mut body) = document else {
        return Err(OpenRtbError::MalformedTransaction("document root must be a JSON object".into()));
    };
    let root = FieldPath::root();
    let mut envelope = carried_object(take_carried(&mut body, Three, "openrtb")?, root.field("ext"))?;
    let mut document = carried_object(take_carried(&mut body, Three, "root")?, root.field("ext"))?;

    let domainspec = envelope
        .get("domainspec")
        .and_then(Value::as_str)
        .unwrap_or(options.domainspec.as_str())
        .to_string();
    let domainver = envelope
        .get("domainver")
        .and_then(Value::as_str)
        .unwrap_or(options.domainver.as_str())
        .to_string();
    let codec = codecs
        .find(&domainspec, &domainver)
        .ok_or_else(|| OpenRtbError::UnsupportedLayer4Spec { domainspec: domainspec.clone(), domainver: domainver.clone() })?;

    let converted = match kind {
        TransactionKind::Request => request(body, codec)?,
        TransactionKind::Response => response(body, codec, warnings)?,
    };

    envelope.entry("ver").or_insert_with(|| json!(tables::ENVELOPE_VERSION));
    envelope.insert("domainspec".into(), json!(domainspec));
    envelope.insert("domainver".into(), json!(domainver));
    envelope.insert(kind.envelope_key().into(), Value::Object(converted));
    document.insert("openrtb".into(), Value::Object(envelope));
    Ok(Value::Object(document))
}

fn request(mut req: Map<String, Value>, codec: &dyn Layer4Codec) -> Result<Map<String, Value>> {
    let path = FieldPath::root();
    let mut out = Map::new();
    let mut leftovers = Map::new();
    move_fields(&mut req, tables::REQUEST, &mut out);

    match (req.remove("wseat"), req.remove("bseat")) {
        (Some(allowed), blocked) => {
            out.insert("seat".into(), allowed);
            out.insert("wseat".into(), json!(1));
            if let Some(blocked) = blocked {
                leftovers.insert("bseat".into(), blocked);
            }
        }
        (None, Some(blocked)) => {
            out.insert("seat".into(), blocked);
            out.insert("wseat".into(), json!(0));
        }
        (None, None) => {}
    }

    if let Some(source) = take_object(&mut req, "source")? {
        let source = remap(&source, tables::SOURCE, Two, Three).map_err(|e| e.within(&path.field("source")))?;
        out.insert("source".into(), Value::Object(source));
    }

    if let Some(imps) = req.remove("imp") {
        let items = expect_array(imps, path.field("imp"))?
            .into_iter()
            .enumerate()
            .map(|(i, imp)| item(imp, codec, &path.field("imp").index(i)).map(Value::Object))
            .collect::<Result<Vec<_>>>()?;
        out.insert("item".into(), Value::Array(items));
    }

    let mut context = Projection::default();
    for key in tables::CONTEXT {
        if let Some(value) = req.remove(*key) {
            context.fields.insert(key.to_string(), value);
        }
    }
    context.residual = carried_object(take_carried(&mut req, Three, "context")?, path.field("ext"))?;
    if !context.fields.is_empty() || !context.residual.is_empty() {
        out.insert("context".into(), codec.encode_context(&context)?);
    }

    if let Some(ext) = req.remove(EXT) {
        out.insert(EXT.into(), ext);
    }
    // allimps / wlang / wlangb / acat 以及未知字段
    leftovers.extend(req);
    carry_all(&mut out, Two, leftovers)?;
    Ok(out)
}

fn item(imp: Value, codec: &dyn Layer4Codec, path: &FieldPath) -> Result<Map<String, Value>> {
    let mut imp = expect_object(imp, path)?;
    let mut unit = AdUnit::from_imp(&imp)?;
    for key in tables::MEDIA.iter().chain(PRESENTATION_FIELDS) {
        imp.remove(*key);
    }
    unit.residual = carried_object(
        take_carried(&mut imp, Three, "spec").map_err(|e| e.within(path))?,
        path.field("ext"),
    )?;

    let mut item = Map::new();
    let mut leftovers = Map::new();
    move_fields(&mut imp, tables::ITEM, &mut item);

    if let Some(mut pmp) = take_object(&mut imp, "pmp").map_err(|e| e.within(path))? {
        let private = pmp.remove("private_auction");
        let deals = pmp.remove("deals");
        let mapped = private.is_some() || deals.is_some();
        if let Some(private) = private {
            item.insert("private".into(), private);
        }
        if let Some(deals) = deals {
            let deals_path = path.field("pmp").field("deals");
            let deals = expect_array(deals, deals_path.clone())?
                .into_iter()
                .enumerate()
                .map(|(i, deal)| -> Result<Value> {
                    let deal = expect_object(deal, &deals_path.index(i))?;
                    let deal = remap(&deal, tables::DEAL, Two, Three).map_err(|e| e.within(&deals_path.index(i)))?;
                    Ok(Value::Object(deal))
                })
                .collect::<Result<Vec<_>>>()?;
            item.insert("deal".into(), Value::Array(deals));
        }
        // pmp 中其余内容（如 ext）
        if !pmp.is_empty() || !mapped {
            leftovers.insert("pmp".into(), Value::Object(pmp));
        }
    }

    if let Some(qty) = imp.remove("qty") {
        let multiplier = qty.get("multiplier").cloned();
        let only_multiplier = multiplier.is_some() && qty.as_object().is_some_and(|q| q.len() == 1);
        if let Some(multiplier) = multiplier {
            item.insert("qtyflt".into(), multiplier);
        }
        if !only_multiplier {
            leftovers.insert("qty".into(), qty);
        }
    }

    item.insert("spec".into(), codec.encode_placement(&unit)?);
    if let Some(ext) = imp.remove(EXT) {
        item.insert(EXT.into(), ext);
    }
    leftovers.extend(imp);
    carry_all(&mut item, Two, leftovers).map_err(|e| e.within(path))?;
    Ok(item)
}

fn response(mut resp: Map<String, Value>, codec: &dyn Layer4Codec, warnings: &mut Vec<Violation>) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    move_fields(&mut resp, tables::RESPONSE, &mut out);

    if let Some(seatbids) = resp.remove("seatbid") {
        let seatbids = expect_array(seatbids, FieldPath::root().field("seatbid"))?
            .into_iter()
            .enumerate()
            .map(|(i, seatbid)| seatbid_to_three(seatbid, i, codec, warnings).map(Value::Object))
            .collect::<Result<Vec<_>>>()?;
        out.insert("seatbid".into(), Value::Array(seatbids));
    }

    if let Some(ext) = resp.remove(EXT) {
        out.insert(EXT.into(), ext);
    }
    carry_all(&mut out, Two, resp)?;
    Ok(out)
}

fn seatbid_to_three(
    seatbid: Value,
    index: usize,
    codec: &dyn Layer4Codec,
    warnings: &mut Vec<Violation>,
) -> Result<Map<String, Value>> {
    let path = FieldPath::root().field("seatbid").index(index);
    let mut seatbid = expect_object(seatbid, &path)?;
    let mut out = Map::new();
    move_fields(&mut seatbid, tables::SEATBID, &mut out);

    if let Some(bids) = seatbid.remove("bid") {
        let bids = expect_array(bids, path.field("bid"))?
            .into_iter()
            .enumerate()
            .map(|(j, bid)| bid_to_three(bid, index, j, codec, warnings).map(Value::Object))
            .collect::<Result<Vec<_>>>()?;
        out.insert("bid".into(), Value::Array(bids));
    }

    if let Some(ext) = seatbid.remove(EXT) {
        out.insert(EXT.into(), ext);
    }
    carry_all(&mut out, Two, seatbid).map_err(|e| e.within(&path))?;
    Ok(out)
}

fn bid_to_three(
    bid: Value,
    seat: usize,
    index: usize,
    codec: &dyn Layer4Codec,
    warnings: &mut Vec<Violation>,
) -> Result<Map<String, Value>> {
    let path = FieldPath::root().field("seatbid").index(seat).field("bid").index(index);
    let mut bid = expect_object(bid, &path)?;
    let mut out = Map::new();
    move_fields(&mut bid, tables::BID, &mut out);

    if let Some(nurl) = bid.remove("nurl") {
        out.insert("purl".into(), nurl);
        warnings.push(Violation::warning(
            FieldPath::root()
                .field("openrtb")
                .field("response")
                .field("seatbid")
                .index(seat)
                .field("bid")
                .index(index)
                .field("purl"),
            Reason::SemanticDrift,
            "win notice URL (nurl) carried as purl; 3.0 fires purl on billing rather than on win",
        ));
    }

    let mut media = Projection::default();
    for key in tables::CREATIVE {
        if let Some(value) = bid.remove(*key) {
            media.fields.insert(key.to_string(), value);
        }
    }
    media.residual = carried_object(
        take_carried(&mut bid, Three, "media").map_err(|e| e.within(&path))?,
        path.field("ext"),
    )?;
    if !media.fields.is_empty() || !media.residual.is_empty() {
        out.insert("media".into(), codec.encode_media(&media)?);
    }

    if let Some(ext) = bid.remove(EXT) {
        out.insert(EXT.into(), ext);
    }
    carry_all(&mut out, Two, bid).map_err(|e| e.within(&path))?;
    Ok(out)
}
