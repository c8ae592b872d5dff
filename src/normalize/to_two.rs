// src/normalize/to_two.rs
//
// 3.0 信封 + Layer-3 对象 -> 2.6 形状

use serde_json::{json, Map, Value};

use super::{carried_object, expect_array, expect_object, tables, NormalizeOptions};
use crate::codec::{CodecRegistry, Layer4Codec};
use crate::error::{OpenRtbError, Result};
use crate::extension::{carry, carry_all, invert, move_fields, remap, take_carried, take_object, EXT};
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
    let Value::Object(mut root) = document else {
        return Err(OpenRtbError::MalformedTransaction("document root must be a JSON object".into()));
    };
    let mut envelope = take_object(&mut root, "openrtb")?
        .ok_or_else(|| OpenRtbError::MalformedTransaction("missing `openrtb` envelope".into()))?;
    let body_path = FieldPath::root().field("openrtb").field(kind.envelope_key());
    let body = envelope
        .remove(kind.envelope_key())
        .ok_or_else(|| OpenRtbError::MalformedTransaction(format!("`openrtb` envelope carries no {kind}")))?;
    let body = expect_object(body, &body_path)?;

    let domainspec = envelope
        .get("domainspec")
        .and_then(Value::as_str)
        .unwrap_or("adcom")
        .to_string();
    let domainver = envelope
        .get("domainver")
        .and_then(Value::as_str)
        .unwrap_or(options.domainver.as_str())
        .to_string();
    let codec = codecs
        .find(&domainspec, &domainver)
        .ok_or_else(|| OpenRtbError::UnsupportedLayer4Spec { domainspec: domainspec.clone(), domainver: domainver.clone() })?;

    let mut converted = match kind {
        TransactionKind::Request => request(body, codec, &body_path)?,
        TransactionKind::Response => response(body, codec, &body_path, warnings)?,
    };

    // 与回转时生成的值相同的信封字段不必携带
    for (key, generated) in [
        ("ver", tables::ENVELOPE_VERSION),
        ("domainspec", options.domainspec.as_str()),
        ("domainver", options.domainver.as_str()),
    ] {
        if envelope.get(key).and_then(Value::as_str) == Some(generated) {
            envelope.remove(key);
        }
    }
    if !envelope.is_empty() {
        carry(&mut converted, Three, "openrtb", Value::Object(envelope))?;
    }
    if !root.is_empty() {
        carry(&mut converted, Three, "root", Value::Object(root))?;
    }
    Ok(Value::Object(converted))
}

fn request(mut req: Map<String, Value>, codec: &dyn Layer4Codec, path: &FieldPath) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    let mut leftovers = Map::new();
    move_fields(&mut req, &invert(tables::REQUEST), &mut out);

    match (req.remove("seat"), req.remove("wseat")) {
        (Some(seats), flag) => {
            let key = match flag.as_ref().and_then(Value::as_i64) {
                Some(0) => "bseat",
                _ => "wseat",
            };
            out.insert(key.into(), seats);
        }
        (None, Some(flag)) => {
            leftovers.insert("wseat".into(), flag);
        }
        (None, None) => {}
    }

    if let Some(source) = take_object(&mut req, "source").map_err(|e| e.within(path))? {
        let source = remap(&source, &invert(tables::SOURCE), Three, Two).map_err(|e| e.within(&path.field("source")))?;
        out.insert("source".into(), Value::Object(source));
    }

    if let Some(items) = req.remove("item") {
        let imps = expect_array(items, path.field("item"))?
            .into_iter()
            .enumerate()
            .map(|(i, item)| imp(item, codec, &path.field("item").index(i)).map(Value::Object))
            .collect::<Result<Vec<_>>>()?;
        out.insert("imp".into(), Value::Array(imps));
    }

    if let Some(context) = req.remove("context") {
        let context = codec.decode_context(&context)?;
        out.extend(context.fields);
        if !context.residual.is_empty() {
            leftovers.insert("context".into(), Value::Object(context.residual));
        }
    }

    if let Some(ext) = req.remove(EXT) {
        out.insert(EXT.into(), ext);
    }
    // cdata / package 以及未知字段
    leftovers.extend(req);
    carry_all(&mut out, Three, leftovers).map_err(|e| e.within(path))?;
    Ok(out)
}

fn imp(item: Value, codec: &dyn Layer4Codec, path: &FieldPath) -> Result<Map<String, Value>> {
    let mut item = expect_object(item, path)?;
    let carried_pmp = take_carried(&mut item, Two, "pmp").map_err(|e| e.within(path))?;
    let carried_qty = take_carried(&mut item, Two, "qty").map_err(|e| e.within(path))?;

    let mut imp = Map::new();
    let mut leftovers = Map::new();
    move_fields(&mut item, &invert(tables::ITEM), &mut imp);

    let had_pmp = carried_pmp.is_some();
    let mut pmp = carried_object(carried_pmp, path.field("ext"))?;
    if let Some(private) = item.remove("private") {
        pmp.insert("private_auction".into(), private);
    }
    if let Some(deals) = item.remove("deal") {
        let deals_path = path.field("deal");
        let deals = expect_array(deals, deals_path.clone())?
            .into_iter()
            .enumerate()
            .map(|(i, deal)| -> Result<Value> {
                let deal = expect_object(deal, &deals_path.index(i))?;
                let deal = remap(&deal, &invert(tables::DEAL), Three, Two).map_err(|e| e.within(&deals_path.index(i)))?;
                Ok(Value::Object(deal))
            })
            .collect::<Result<Vec<_>>>()?;
        pmp.insert("deals".into(), Value::Array(deals));
    }
    if had_pmp || !pmp.is_empty() {
        imp.insert("pmp".into(), Value::Object(pmp));
    }

    let qty = match (carried_qty, item.remove("qtyflt")) {
        (Some(Value::Object(mut qty)), Some(multiplier)) => {
            qty.insert("multiplier".into(), multiplier);
            Some(Value::Object(qty))
        }
        (Some(qty), _) => Some(qty),
        (None, Some(multiplier)) => Some(json!({ "multiplier": multiplier })),
        (None, None) => None,
    };
    if let Some(qty) = qty {
        imp.insert("qty".into(), qty);
    }

    if let Some(spec) = item.remove("spec") {
        let mut unit = codec.decode_placement(&spec)?;
        let residual = std::mem::take(&mut unit.residual);
        if !residual.is_empty() {
            leftovers.insert("spec".into(), Value::Object(residual));
        }
        unit.apply_to(&mut imp)?;
    }

    if let Some(ext) = item.remove(EXT) {
        imp.insert(EXT.into(), ext);
    }
    // 整数 qty / seq / dlvy 以及未知字段
    leftovers.extend(item);
    carry_all(&mut imp, Three, leftovers).map_err(|e| e.within(path))?;
    Ok(imp)
}

fn response(
    mut resp: Map<String, Value>,
    codec: &dyn Layer4Codec,
    path: &FieldPath,
    warnings: &mut Vec<Violation>,
) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    move_fields(&mut resp, &invert(tables::RESPONSE), &mut out);

    if let Some(seatbids) = resp.remove("seatbid") {
        let seatbids = expect_array(seatbids, path.field("seatbid"))?
            .into_iter()
            .enumerate()
            .map(|(i, seatbid)| seatbid_to_two(seatbid, i, codec, path, warnings).map(Value::Object))
            .collect::<Result<Vec<_>>>()?;
        out.insert("seatbid".into(), Value::Array(seatbids));
    }

    if let Some(ext) = resp.remove(EXT) {
        out.insert(EXT.into(), ext);
    }
    carry_all(&mut out, Three, resp).map_err(|e| e.within(path))?;
    Ok(out)
}

fn seatbid_to_two(
    seatbid: Value,
    index: usize,
    codec: &dyn Layer4Codec,
    body: &FieldPath,
    warnings: &mut Vec<Violation>,
) -> Result<Map<String, Value>> {
    let path = body.field("seatbid").index(index);
    let mut seatbid = expect_object(seatbid, &path)?;
    let mut out = Map::new();
    move_fields(&mut seatbid, &invert(tables::SEATBID), &mut out);

    if let Some(bids) = seatbid.remove("bid") {
        let bids = expect_array(bids, path.field("bid"))?
            .into_iter()
            .enumerate()
            .map(|(j, bid)| bid_to_two(bid, index, j, codec, body, warnings).map(Value::Object))
            .collect::<Result<Vec<_>>>()?;
        out.insert("bid".into(), Value::Array(bids));
    }

    if let Some(ext) = seatbid.remove(EXT) {
        out.insert(EXT.into(), ext);
    }
    carry_all(&mut out, Three, seatbid).map_err(|e| e.within(&path))?;
    Ok(out)
}

fn bid_to_two(
    bid: Value,
    seat: usize,
    index: usize,
    codec: &dyn Layer4Codec,
    body: &FieldPath,
    warnings: &mut Vec<Violation>,
) -> Result<Map<String, Value>> {
    let path = body.field("seatbid").index(seat).field("bid").index(index);
    let mut bid = expect_object(bid, &path)?;
    let mut out = Map::new();
    let mut leftovers = Map::new();
    move_fields(&mut bid, &invert(tables::BID), &mut out);

    if let Some(purl) = bid.remove("purl") {
        out.insert("nurl".into(), purl);
        warnings.push(Violation::warning(
            FieldPath::root().field("seatbid").index(seat).field("bid").index(index).field("nurl"),
            Reason::SemanticDrift,
            "billing notice URL (purl) carried as nurl; 2.x fires nurl on win rather than on billing",
        ));
    }

    if let Some(media) = bid.remove("media") {
        let media = codec.decode_media(&media)?;
        out.extend(media.fields);
        if !media.residual.is_empty() {
            leftovers.insert("media".into(), Value::Object(media.residual));
        }
    }

    if let Some(ext) = bid.remove(EXT) {
        out.insert(EXT.into(), ext);
    }
    // macro 以及未知字段
    leftovers.extend(bid);
    carry_all(&mut out, Three, leftovers).map_err(|e| e.within(&path))?;
    Ok(out)
}
