// src/registry/v26.rs
//
// OpenRTB 2.6：以 2.5 为基础，新增字段与对象，移除 2.5 已废弃的字段

use std::collections::HashMap;

use super::domains::*;
use super::field::{DefaultValue, Domain, FieldKind as K, FieldSet, FieldSpec, Rule};
use super::v25::{dimension, ext, f, flag, int, string, strings};

fn durfloors() -> FieldSpec {
    f("durfloors", K::ObjectArray("DurFloors"))
}

fn cattax() -> FieldSpec {
    int("cattax").enumerated(&CATEGORY_TAXONOMY).default_to(DefaultValue::Int(1))
}

/// 每个实体上要新增/替换的字段
fn additions() -> Vec<(&'static str, Vec<FieldSpec>)> {
    vec![
        ("BidRequest", vec![
            f("dooh", K::Object("Dooh")),
            strings("wlangb"),
            strings("acat"),
            cattax(),
        ]),
        ("Source", vec![f("schain", K::Object("SupplyChain"))]),
        ("Regs", vec![
            flag("gdpr"),
            string("us_privacy"),
            string("gpp"),
            f("gpp_sid", K::IntegerArray),
        ]),
        ("Imp", vec![
            flag("rwdd").default_to(DefaultValue::Int(0)),
            int("ssai").domain(Domain::range(0.0, 3.0)).default_to(DefaultValue::Int(0)),
            f("qty", K::Object("Qty")),
            f("dt", K::Number),
            f("refresh", K::Object("Refresh")),
        ]),
        ("Banner", vec![f("api", K::IntegerArray).enumerated(&API_FRAMEWORK_26)]),
        ("Video", vec![
            dimension("maxseq"),
            dimension("poddur"),
            string("podid"),
            int("podseq").enumerated(&POD_SEQUENCE),
            f("rqddurs", K::IntegerArray),
            int("plcmt").enumerated(&PLCMT),
            int("slotinpod").enumerated(&SLOT_POSITION),
            f("mincpmpersec", K::Number).domain(Domain::at_least(0.0)),
            f("poddedupe", K::IntegerArray).enumerated(&POD_DEDUPLICATION),
            f("playbackmethod", K::IntegerArray).enumerated(&PLAYBACK_METHOD_26),
            f("api", K::IntegerArray).enumerated(&API_FRAMEWORK_26),
            durfloors(),
        ]),
        ("Audio", vec![
            dimension("poddur"),
            f("rqddurs", K::IntegerArray),
            string("podid"),
            int("podseq").enumerated(&POD_SEQUENCE),
            int("slotinpod").enumerated(&SLOT_POSITION),
            f("mincpmpersec", K::Number).domain(Domain::at_least(0.0)),
            f("api", K::IntegerArray).enumerated(&API_FRAMEWORK_26),
            durfloors(),
        ]),
        ("Native", vec![f("api", K::IntegerArray).enumerated(&API_FRAMEWORK_26)]),
        ("Deal", vec![
            flag("guar").default_to(DefaultValue::Int(0)),
            f("mincpmpersec", K::Number).domain(Domain::at_least(0.0)),
            durfloors(),
        ]),
        ("Site", vec![cattax(), strings("kwarray"), string("inventorypartnerdomain")]),
        ("App", vec![cattax(), strings("kwarray"), string("inventorypartnerdomain")]),
        ("Publisher", vec![cattax()]),
        ("Producer", vec![cattax()]),
        ("Content", vec![
            cattax(),
            strings("kwarray"),
            string("langb"),
            f("network", K::Object("Network")),
            f("channel", K::Object("Channel")),
        ]),
        ("Device", vec![
            f("sua", K::Object("UserAgent")),
            string("langb"),
            int("devicetype").enumerated(&DEVICE_TYPE_26),
        ]),
        ("User", vec![
            strings("kwarray"),
            string("consent"),
            f("eids", K::ObjectArray("EID")),
        ]),
        ("Bid", vec![
            f("apis", K::IntegerArray).enumerated(&API_FRAMEWORK_26),
            cattax(),
            string("langb"),
            dimension("dur"),
            int("mtype").enumerated(&CREATIVE_MARKUP_TYPE),
            int("slotinpod").enumerated(&SLOT_POSITION),
        ]),
    ]
}

/// 2.6 中不再出现的 2.5 字段
const REMOVALS: &[(&str, &[&str])] = &[
    ("User", &["yob", "gender"]),
    ("Device", &["didsha1", "didmd5", "dpidsha1", "dpidmd5", "macsha1", "macmd5"]),
    ("Video", &["protocol", "sequence"]),
    ("Audio", &["sequence"]),
    ("Content", &["videoquality"]),
    ("Bid", &["api"]),
];

fn new_entities() -> Vec<FieldSet> {
    vec![
        FieldSet::new("Dooh", vec![
            string("id"),
            string("name"),
            strings("venuetype"),
            int("venuetypetax").enumerated(&DOOH_VENUE_TAXONOMY).default_to(DefaultValue::Int(1)),
            f("publisher", K::Object("Publisher")),
            string("domain"),
            string("keywords"),
            f("content", K::Object("Content")),
            ext(),
        ]),
        FieldSet::new("SupplyChain", vec![
            flag("complete").required(),
            f("nodes", K::ObjectArray("SupplyChainNode")).required(),
            string("ver").required(),
            ext(),
        ]),
        FieldSet::new("SupplyChainNode", vec![
            string("asi").required(),
            string("sid").required(),
            string("rid"),
            string("name"),
            string("domain"),
            flag("hp"),
            ext(),
        ]),
        FieldSet::new("EID", vec![
            string("inserter"),
            string("source").required(),
            string("matcher"),
            int("mm").enumerated(&ID_MATCH_METHOD),
            f("uids", K::ObjectArray("UID")).required().non_empty(),
            ext(),
        ]),
        FieldSet::new("UID", vec![
            string("id").required(),
            int("atype").enumerated(&AGENT_TYPE),
            ext(),
        ]),
        FieldSet::new("UserAgent", vec![
            f("browsers", K::ObjectArray("BrandVersion")),
            f("platform", K::Object("BrandVersion")),
            flag("mobile"),
            string("architecture"),
            string("bitness"),
            string("model"),
            int("source").enumerated(&USER_AGENT_SOURCE).default_to(DefaultValue::Int(0)),
            ext(),
        ]),
        FieldSet::new("BrandVersion", vec![string("brand").required(), string("version").required(), ext()]),
        FieldSet::new("Qty", vec![
            f("multiplier", K::Number).required().domain(Domain::at_least(0.0)),
            int("sourcetype").enumerated(&DOOH_MULTIPLIER_SOURCE),
            string("vendor"),
            ext(),
        ]),
        FieldSet::new("Refresh", vec![
            f("refsettings", K::ObjectArray("RefSettings")),
            dimension("count"),
            ext(),
        ]),
        FieldSet::new("RefSettings", vec![
            int("reftype").enumerated(&AUTO_REFRESH_TRIGGER).default_to(DefaultValue::Int(0)),
            dimension("minint"),
            ext(),
        ]),
        FieldSet::new("DurFloors", vec![
            dimension("mindur"),
            dimension("maxdur"),
            f("bidfloor", K::Number).domain(Domain::at_least(0.0)),
            ext(),
        ]),
        FieldSet::new("Network", vec![string("id"), string("name"), string("domain"), ext()]),
        FieldSet::new("Channel", vec![string("id"), string("name"), string("domain"), ext()]),
    ]
}

pub(super) fn entities() -> Vec<FieldSet> {
    let mut by_name: HashMap<&'static str, FieldSet> =
        super::v25::entities().into_iter().map(|set| (set.entity, set)).collect();

    for (entity, fields) in additions() {
        if let Some(set) = by_name.get_mut(entity) {
            for spec in fields {
                set.upsert(spec);
            }
        }
    }
    for (entity, names) in REMOVALS {
        if let Some(set) = by_name.get_mut(entity) {
            for name in names.iter() {
                set.remove(name);
            }
        }
    }
    if let Some(request) = by_name.get_mut("BidRequest") {
        request.replace_rules(vec![
            Rule::AtMostOne(&["site", "app", "dooh"]),
            Rule::Advisory(&["wseat", "bseat"]),
        ]);
    }

    by_name.into_values().chain(new_entities()).collect()
}
