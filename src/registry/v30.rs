// src/registry/v30.rs
//
// OpenRTB 3.0 (Layer-3)。spec / context / media 属于 Layer-4，由编解码器处理，这里只当作不透明对象。

use super::domains::*;
use super::field::{DefaultValue, Domain, FieldKind as K, FieldSet};
use super::v25::{dimension, ext, f, flag, int, string, strings};

pub(super) fn entities() -> Vec<FieldSet> {
    vec![
        FieldSet::new("Root", vec![f("openrtb", K::Object("Openrtb")).required()]),
        FieldSet::new("Openrtb", vec![
            string("ver").default_to(DefaultValue::Str("3.0")),
            string("domainspec").default_to(DefaultValue::Str("adcom")),
            string("domainver").required(),
            f("request", K::Object("Request")),
            f("response", K::Object("Response")),
        ]),
        FieldSet::new("Request", vec![
            string("id").required(),
            flag("test").default_to(DefaultValue::Int(0)),
            int("tmax").domain(Domain::at_least(0.0)),
            int("at").enumerated(&AUCTION_TYPE).default_to(DefaultValue::Int(2)),
            strings("cur").default_to(DefaultValue::StrList(&["USD"])),
            strings("seat"),
            flag("wseat").default_to(DefaultValue::Int(1)),
            string("cdata"),
            f("source", K::Object("Source")),
            f("item", K::ObjectArray("Item")).required().non_empty(),
            flag("package").default_to(DefaultValue::Int(0)),
            f("context", K::Opaque),
            ext(),
        ]),
        FieldSet::new("Source", vec![
            string("tid"),
            int("ts"),
            string("ds"),
            string("dsmap"),
            string("cert"),
            string("digest"),
            f("schain", K::Object("SupplyChain")),
            string("pchain"),
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
        FieldSet::new("Item", vec![
            string("id").required(),
            dimension("qty").default_to(DefaultValue::Int(1)),
            f("qtyflt", K::Number).domain(Domain::at_least(0.0)),
            int("seq"),
            f("flr", K::Number).domain(Domain::at_least(0.0)),
            string("flrcur").default_to(DefaultValue::Str("USD")),
            int("exp"),
            f("dt", K::Number),
            int("dlvy").domain(Domain::range(0.0, 2.0)).default_to(DefaultValue::Int(0)),
            f("metric", K::ObjectArray("Metric")),
            f("deal", K::ObjectArray("Deal")),
            flag("private").default_to(DefaultValue::Int(0)),
            f("spec", K::Opaque).required(),
            ext(),
        ]),
        FieldSet::new("Metric", vec![
            string("type").required(),
            f("value", K::Number).required(),
            string("vendor"),
            ext(),
        ]),
        FieldSet::new("Deal", vec![
            string("id").required(),
            f("flr", K::Number).domain(Domain::at_least(0.0)),
            string("flrcur").default_to(DefaultValue::Str("USD")),
            int("at").enumerated(&AUCTION_TYPE),
            strings("wseat"),
            strings("wadomain"),
            ext(),
        ]),
        FieldSet::new("Response", vec![
            string("id").required(),
            string("bidid"),
            int("nbr").enumerated(&NO_BID_REASON),
            string("cur").default_to(DefaultValue::Str("USD")),
            string("cdata"),
            f("seatbid", K::ObjectArray("Seatbid")),
            ext(),
        ]),
        FieldSet::new("Seatbid", vec![
            string("seat"),
            flag("package").default_to(DefaultValue::Int(0)),
            f("bid", K::ObjectArray("Bid")).required().non_empty(),
            ext(),
        ]),
        FieldSet::new("Bid", vec![
            string("id"),
            string("item").required(),
            f("price", K::Number).required().domain(Domain::at_least(0.0)),
            string("deal"),
            string("cid"),
            string("tactic"),
            string("purl"),
            string("burl"),
            string("lurl"),
            int("exp"),
            string("mid"),
            f("macro", K::ObjectArray("Macro")),
            f("media", K::Opaque),
            ext(),
        ]),
        FieldSet::new("Macro", vec![string("key").required(), string("value"), ext()]),
    ]
}
