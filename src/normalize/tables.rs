// src/normalize/tables.rs
//
// 2.x -> 3.0 的字段对应表，反方向用 `invert`

/// BidRequest -> Request
pub(super) const REQUEST: &[(&str, &str)] = &[
    ("id", "id"),
    ("test", "test"),
    ("tmax", "tmax"),
    ("at", "at"),
    ("cur", "cur"),
];

/// BidRequest 上交给 Layer-4 context 的字段
pub(super) const CONTEXT: &[&str] = &["site", "app", "dooh", "device", "user", "regs", "bcat", "badv", "bapp", "cattax"];

pub(super) const SOURCE: &[(&str, &str)] = &[("tid", "tid"), ("pchain", "pchain"), ("schain", "schain")];

/// Imp -> Item
pub(super) const ITEM: &[(&str, &str)] = &[
    ("id", "id"),
    ("exp", "exp"),
    ("dt", "dt"),
    ("metric", "metric"),
    ("bidfloor", "flr"),
    ("bidfloorcur", "flrcur"),
];

pub(super) const DEAL: &[(&str, &str)] = &[
    ("id", "id"),
    ("bidfloor", "flr"),
    ("bidfloorcur", "flrcur"),
    ("at", "at"),
    ("wseat", "wseat"),
    ("wadomain", "wadomain"),
];

/// Imp 上由 Layer-4 placement 承载的字段
pub(super) const MEDIA: &[&str] = &["banner", "video", "audio", "native"];

/// BidResponse -> Response
pub(super) const RESPONSE: &[(&str, &str)] = &[
    ("id", "id"),
    ("bidid", "bidid"),
    ("nbr", "nbr"),
    ("cur", "cur"),
    ("customdata", "cdata"),
];

pub(super) const SEATBID: &[(&str, &str)] = &[("seat", "seat"), ("group", "package")];

/// Bid -> Bid；nurl/purl 单独处理
pub(super) const BID: &[(&str, &str)] = &[
    ("id", "id"),
    ("impid", "item"),
    ("price", "price"),
    ("dealid", "deal"),
    ("cid", "cid"),
    ("tactic", "tactic"),
    ("burl", "burl"),
    ("lurl", "lurl"),
    ("exp", "exp"),
    ("adid", "mid"),
];

/// Bid 上交给 Layer-4 media 的创意字段
pub(super) const CREATIVE: &[&str] = &[
    "adm",
    "adomain",
    "bundle",
    "iurl",
    "crid",
    "cattax",
    "cat",
    "attr",
    "api",
    "apis",
    "protocol",
    "qagmediarating",
    "language",
    "langb",
    "w",
    "h",
    "wratio",
    "hratio",
    "dur",
    "mtype",
    "slotinpod",
];

/// 3.0 信封中由转换生成的默认值；与之相同时不必携带
pub(super) const ENVELOPE_VERSION: &str = "3.0";
