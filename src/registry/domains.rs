// src/registry/domains.rs
//
// 各版本引用的 AdCOM / OpenRTB 枚举取值表

use super::field::EnumDomain;

macro_rules! domain {
    ($ident:ident, $name:literal, [$($v:expr),* $(,)?]) => {
        pub static $ident: EnumDomain = EnumDomain { name: $name, values: &[$($v),*], exchange_from: None };
    };
    ($ident:ident, $name:literal, [$($v:expr),* $(,)?], $from:expr) => {
        pub static $ident: EnumDomain = EnumDomain { name: $name, values: &[$($v),*], exchange_from: Some($from) };
    };
}

domain!(AUCTION_TYPE, "auction type", [1, 2], 500);
domain!(NO_BID_REASON, "no-bid reason", [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10], 500);
domain!(DEVICE_TYPE_25, "device type", [1, 2, 3, 4, 5, 6, 7]);
domain!(DEVICE_TYPE_26, "device type", [1, 2, 3, 4, 5, 6, 7, 8]);
domain!(CONNECTION_TYPE, "connection type", [0, 1, 2, 3, 4, 5, 6, 7]);
domain!(LOCATION_TYPE, "location type", [1, 2, 3]);
domain!(IP_SERVICE, "ip location service", [1, 2, 3, 4]);
domain!(PLACEMENT_POSITION, "placement position", [0, 1, 2, 3, 4, 5, 6, 7]);
domain!(PROTOCOLS, "audio/video creative subtype", [1, 2, 3, 4, 5, 6, 7, 8, 9, 10], 500);
domain!(API_FRAMEWORK_25, "api framework", [1, 2, 3, 4, 5, 6], 500);
domain!(API_FRAMEWORK_26, "api framework", [1, 2, 3, 4, 5, 6, 7, 8, 9], 500);
domain!(CREATIVE_ATTRIBUTE, "creative attribute", [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17], 500);
domain!(BANNER_TYPE, "banner ad type", [1, 2, 3, 4]);
domain!(EXPANDABLE_DIRECTION, "expandable direction", [1, 2, 3, 4, 5, 6]);
domain!(LINEARITY, "linearity mode", [1, 2]);
domain!(VIDEO_PLACEMENT, "video placement type", [1, 2, 3, 4, 5], 500);
domain!(PLCMT, "video placement subtype", [1, 2, 3, 4], 500);
domain!(PLAYBACK_METHOD_25, "playback method", [1, 2, 3, 4, 5, 6], 500);
domain!(PLAYBACK_METHOD_26, "playback method", [1, 2, 3, 4, 5, 6, 7], 500);
domain!(PLAYBACK_END, "playback cessation mode", [1, 2, 3], 500);
domain!(DELIVERY_METHOD, "delivery method", [1, 2, 3]);
domain!(COMPANION_TYPE, "companion type", [1, 2, 3]);
domain!(FEED_TYPE, "feed type", [1, 2, 3], 500);
domain!(VOLUME_NORMALIZATION, "volume normalization mode", [0, 1, 2, 3, 4], 500);
domain!(PRODUCTION_QUALITY, "production quality", [0, 1, 2, 3]);
domain!(CONTENT_CONTEXT, "content context", [1, 2, 3, 4, 5, 6, 7], 500);
domain!(MEDIA_RATING, "media rating", [1, 2, 3]);
domain!(CATEGORY_TAXONOMY, "category taxonomy", [1, 2, 3, 4, 5, 6, 7], 500);
domain!(SLOT_POSITION, "slot position in pod", [-1, 0, 1, 2]);
domain!(POD_SEQUENCE, "pod sequence", [-1, 0, 1]);
domain!(POD_DEDUPLICATION, "pod deduplication", [1, 2, 3, 4], 500);
domain!(AGENT_TYPE, "agent type", [1, 2, 3], 500);
domain!(ID_MATCH_METHOD, "id match method", [0, 1, 2, 3, 4, 5], 500);
domain!(USER_AGENT_SOURCE, "user agent source", [0, 1, 2, 3]);
domain!(AUTO_REFRESH_TRIGGER, "auto refresh trigger", [0, 1, 2, 3], 500);
domain!(DOOH_VENUE_TAXONOMY, "dooh venue taxonomy", [1, 2, 3, 4], 500);
domain!(DOOH_MULTIPLIER_SOURCE, "dooh multiplier measurement source", [0, 1, 2, 3], 500);
domain!(CREATIVE_MARKUP_TYPE, "creative markup type", [1, 2, 3, 4], 500);
