// src/registry/v25.rs
//
// OpenRTB 2.5 对象定义；2.6 在此基础上增删

use super::domains::*;
use super::field::{DefaultValue, Domain, FieldKind as K, FieldSet, FieldSpec, Rule};

pub(super) fn f(name: &'static str, kind: K) -> FieldSpec {
    FieldSpec::new(name, kind)
}

pub(super) fn ext() -> FieldSpec {
    f("ext", K::Ext)
}

pub(super) fn flag(name: &'static str) -> FieldSpec {
    f(name, K::Flag)
}

pub(super) fn int(name: &'static str) -> FieldSpec {
    f(name, K::Integer)
}

pub(super) fn string(name: &'static str) -> FieldSpec {
    f(name, K::String)
}

pub(super) fn strings(name: &'static str) -> FieldSpec {
    f(name, K::StringArray)
}

pub(super) fn dimension(name: &'static str) -> FieldSpec {
    int(name).domain(Domain::at_least(0.0))
}

pub(super) fn entities() -> Vec<FieldSet> {
    vec![
        FieldSet::new("BidRequest", vec![
            string("id").required(),
            f("imp", K::ObjectArray("Imp")).required().non_empty(),
            f("site", K::Object("Site")),
            f("app", K::Object("App")),
            f("device", K::Object("Device")),
            f("user", K::Object("User")),
            flag("test").default_to(DefaultValue::Int(0)),
            int("at").enumerated(&AUCTION_TYPE).default_to(DefaultValue::Int(2)),
            int("tmax").domain(Domain::at_least(0.0)),
            strings("wseat"),
            strings("bseat"),
            flag("allimps").default_to(DefaultValue::Int(0)),
            strings("cur").default_to(DefaultValue::StrList(&["USD"])),
            strings("wlang"),
            strings("bcat"),
            strings("badv"),
            strings("bapp"),
            f("source", K::Object("Source")),
            f("regs", K::Object("Regs")),
            ext(),
        ])
        .with_rule(Rule::AtMostOne(&["site", "app"]))
        .with_rule(Rule::Advisory(&["wseat", "bseat"])),
        FieldSet::new("Source", vec![flag("fd"), string("tid"), string("pchain"), ext()]),
        FieldSet::new("Regs", vec![flag("coppa"), ext()]),
        FieldSet::new("Imp", vec![
            string("id").required(),
            f("metric", K::ObjectArray("Metric")),
            f("banner", K::Object("Banner")),
            f("video", K::Object("Video")),
            f("audio", K::Object("Audio")),
            f("native", K::Object("Native")),
            f("pmp", K::Object("Pmp")),
            string("displaymanager"),
            string("displaymanagerver"),
            flag("instl").default_to(DefaultValue::Int(0)),
            string("tagid"),
            f("bidfloor", K::Number).domain(Domain::at_least(0.0)).default_to(DefaultValue::Int(0)),
            string("bidfloorcur").default_to(DefaultValue::Str("USD")),
            flag("clickbrowser"),
            flag("secure"),
            strings("iframebuster"),
            int("exp"),
            ext(),
        ])
        .with_rule(Rule::ExactlyOne(&["banner", "video", "audio", "native"])),
        FieldSet::new("Metric", vec![
            string("type").required(),
            f("value", K::Number).required(),
            string("vendor"),
            ext(),
        ]),
        FieldSet::new("Banner", vec![
            f("format", K::ObjectArray("Format")),
            dimension("w"),
            dimension("h"),
            f("btype", K::IntegerArray).enumerated(&BANNER_TYPE),
            f("battr", K::IntegerArray).enumerated(&CREATIVE_ATTRIBUTE),
            int("pos").enumerated(&PLACEMENT_POSITION),
            strings("mimes"),
            flag("topframe"),
            f("expdir", K::IntegerArray).enumerated(&EXPANDABLE_DIRECTION),
            f("api", K::IntegerArray).enumerated(&API_FRAMEWORK_25),
            string("id"),
            flag("vcm"),
            ext(),
        ]),
        FieldSet::new("Format", vec![
            dimension("w"),
            dimension("h"),
            dimension("wratio"),
            dimension("hratio"),
            dimension("wmin"),
            ext(),
        ]),
        FieldSet::new("Video", vec![
            strings("mimes").required(),
            dimension("minduration"),
            dimension("maxduration"),
            f("protocols", K::IntegerArray).enumerated(&PROTOCOLS),
            int("protocol").enumerated(&PROTOCOLS),
            dimension("w"),
            dimension("h"),
            int("startdelay").domain(Domain::at_least(-2.0)),
            int("placement").enumerated(&VIDEO_PLACEMENT),
            int("linearity").enumerated(&LINEARITY),
            flag("skip"),
            dimension("skipmin").default_to(DefaultValue::Int(0)),
            dimension("skipafter").default_to(DefaultValue::Int(0)),
            int("sequence"),
            f("battr", K::IntegerArray).enumerated(&CREATIVE_ATTRIBUTE),
            int("maxextended"),
            dimension("minbitrate"),
            dimension("maxbitrate"),
            flag("boxingallowed").default_to(DefaultValue::Int(1)),
            f("playbackmethod", K::IntegerArray).enumerated(&PLAYBACK_METHOD_25),
            int("playbackend").enumerated(&PLAYBACK_END),
            f("delivery", K::IntegerArray).enumerated(&DELIVERY_METHOD),
            int("pos").enumerated(&PLACEMENT_POSITION),
            f("companionad", K::ObjectArray("Banner")),
            f("api", K::IntegerArray).enumerated(&API_FRAMEWORK_25),
            f("companiontype", K::IntegerArray).enumerated(&COMPANION_TYPE),
            ext(),
        ]),
        FieldSet::new("Audio", vec![
            strings("mimes").required(),
            dimension("minduration"),
            dimension("maxduration"),
            f("protocols", K::IntegerArray).enumerated(&PROTOCOLS),
            int("startdelay").domain(Domain::at_least(-2.0)),
            int("sequence"),
            f("battr", K::IntegerArray).enumerated(&CREATIVE_ATTRIBUTE),
            int("maxextended"),
            dimension("minbitrate"),
            dimension("maxbitrate"),
            f("delivery", K::IntegerArray).enumerated(&DELIVERY_METHOD),
            f("companionad", K::ObjectArray("Banner")),
            f("api", K::IntegerArray).enumerated(&API_FRAMEWORK_25),
            f("companiontype", K::IntegerArray).enumerated(&COMPANION_TYPE),
            dimension("maxseq"),
            int("feed").enumerated(&FEED_TYPE),
            flag("stitched"),
            int("nvol").enumerated(&VOLUME_NORMALIZATION),
            ext(),
        ]),
        FieldSet::new("Native", vec![
            string("request").required(),
            string("ver"),
            f("api", K::IntegerArray).enumerated(&API_FRAMEWORK_25),
            f("battr", K::IntegerArray).enumerated(&CREATIVE_ATTRIBUTE),
            ext(),
        ]),
        FieldSet::new("Pmp", vec![
            flag("private_auction").default_to(DefaultValue::Int(0)),
            f("deals", K::ObjectArray("Deal")),
            ext(),
        ]),
        FieldSet::new("Deal", vec![
            string("id").required(),
            f("bidfloor", K::Number).domain(Domain::at_least(0.0)).default_to(DefaultValue::Int(0)),
            string("bidfloorcur").default_to(DefaultValue::Str("USD")),
            int("at").enumerated(&AUCTION_TYPE),
            strings("wseat"),
            strings("wadomain"),
            ext(),
        ]),
        FieldSet::new("Site", vec![
            string("id"),
            string("name"),
            string("domain"),
            strings("cat"),
            strings("sectioncat"),
            strings("pagecat"),
            string("page"),
            string("ref"),
            string("search"),
            flag("mobile"),
            flag("privacypolicy"),
            f("publisher", K::Object("Publisher")),
            f("content", K::Object("Content")),
            string("keywords"),
            ext(),
        ]),
        FieldSet::new("App", vec![
            string("id"),
            string("name"),
            string("bundle"),
            string("domain"),
            string("storeurl"),
            strings("cat"),
            strings("sectioncat"),
            strings("pagecat"),
            string("ver"),
            flag("privacypolicy"),
            flag("paid"),
            f("publisher", K::Object("Publisher")),
            f("content", K::Object("Content")),
            string("keywords"),
            ext(),
        ]),
        FieldSet::new("Publisher", vec![string("id"), string("name"), strings("cat"), string("domain"), ext()]),
        FieldSet::new("Content", vec![
            string("id"),
            int("episode"),
            string("title"),
            string("series"),
            string("season"),
            string("artist"),
            string("genre"),
            string("album"),
            string("isrc"),
            f("producer", K::Object("Producer")),
            string("url"),
            strings("cat"),
            int("prodq").enumerated(&PRODUCTION_QUALITY),
            int("videoquality").enumerated(&PRODUCTION_QUALITY),
            int("context").enumerated(&CONTENT_CONTEXT),
            string("contentrating"),
            string("userrating"),
            int("qagmediarating").enumerated(&MEDIA_RATING),
            string("keywords"),
            flag("livestream"),
            flag("sourcerelationship"),
            dimension("len"),
            string("language"),
            flag("embeddable"),
            f("data", K::ObjectArray("Data")),
            ext(),
        ]),
        FieldSet::new("Producer", vec![string("id"), string("name"), strings("cat"), string("domain"), ext()]),
        FieldSet::new("Device", vec![
            string("ua"),
            f("geo", K::Object("Geo")),
            flag("dnt"),
            flag("lmt"),
            string("ip"),
            string("ipv6"),
            int("devicetype").enumerated(&DEVICE_TYPE_25),
            string("make"),
            string("model"),
            string("os"),
            string("osv"),
            string("hwv"),
            dimension("h"),
            dimension("w"),
            dimension("ppi"),
            f("pxratio", K::Number).domain(Domain::at_least(0.0)),
            flag("js"),
            flag("geofetch"),
            string("flashver"),
            string("language"),
            string("carrier"),
            string("mccmnc"),
            int("connectiontype").enumerated(&CONNECTION_TYPE),
            string("ifa"),
            string("didsha1"),
            string("didmd5"),
            string("dpidsha1"),
            string("dpidmd5"),
            string("macsha1"),
            string("macmd5"),
            ext(),
        ]),
        FieldSet::new("Geo", vec![
            f("lat", K::Number).domain(Domain::range(-90.0, 90.0)),
            f("lon", K::Number).domain(Domain::range(-180.0, 180.0)),
            int("type").enumerated(&LOCATION_TYPE),
            dimension("accuracy"),
            dimension("lastfix"),
            int("ipservice").enumerated(&IP_SERVICE),
            string("country"),
            string("region"),
            string("regionfips104"),
            string("metro"),
            string("city"),
            string("zip"),
            int("utcoffset"),
            ext(),
        ]),
        FieldSet::new("User", vec![
            string("id"),
            string("buyeruid"),
            int("yob"),
            string("gender"),
            string("keywords"),
            string("customdata"),
            f("geo", K::Object("Geo")),
            f("data", K::ObjectArray("Data")),
            ext(),
        ]),
        FieldSet::new("Data", vec![
            string("id"),
            string("name"),
            f("segment", K::ObjectArray("Segment")),
            ext(),
        ]),
        FieldSet::new("Segment", vec![string("id"), string("name"), string("value"), ext()]),
        FieldSet::new("BidResponse", vec![
            string("id").required(),
            f("seatbid", K::ObjectArray("SeatBid")),
            string("bidid"),
            string("cur").default_to(DefaultValue::Str("USD")),
            string("customdata"),
            int("nbr").enumerated(&NO_BID_REASON),
            ext(),
        ]),
        FieldSet::new("SeatBid", vec![
            f("bid", K::ObjectArray("Bid")).required().non_empty(),
            string("seat"),
            flag("group").default_to(DefaultValue::Int(0)),
            ext(),
        ]),
        FieldSet::new("Bid", vec![
            string("id").required(),
            string("impid").required(),
            f("price", K::Number).required().domain(Domain::at_least(0.0)),
            string("nurl"),
            string("burl"),
            string("lurl"),
            string("adm"),
            string("adid"),
            strings("adomain"),
            string("bundle"),
            string("iurl"),
            string("cid"),
            string("crid"),
            string("tactic"),
            strings("cat"),
            f("attr", K::IntegerArray).enumerated(&CREATIVE_ATTRIBUTE),
            int("api").enumerated(&API_FRAMEWORK_25),
            int("protocol").enumerated(&PROTOCOLS),
            int("qagmediarating").enumerated(&MEDIA_RATING),
            string("language"),
            string("dealid"),
            dimension("w"),
            dimension("h"),
            dimension("wratio"),
            dimension("hratio"),
            int("exp"),
            ext(),
        ]),
    ]
}
