// src/codec/adcom.rs
//
// AdCOM 1.x：spec.placement / context / media.ad

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Value};

use super::{CodecError, Layer4Codec, Projection};
use crate::extension::{carry_all, invert, move_fields, remap, take_bucket, take_object, ShapeError};
use crate::openrtb::media::{AdUnit, CreativeMarkupType};
use crate::openrtb::path::FieldPath;
use crate::openrtb::version::Generation::{Three, Two};

const BANNER: &[(&str, &str)] = &[
    ("mimes", "mime"),
    ("w", "w"),
    ("h", "h"),
    ("pos", "pos"),
    ("api", "api"),
    ("topframe", "topframe"),
    ("format", "displayfmt"),
];

const NATIVE: &[(&str, &str)] = &[("api", "api")];

/// video 与 audio 共用的改名
const AV_COMMON: &[(&str, &str)] = &[
    ("mimes", "mime"),
    ("minduration", "mindur"),
    ("maxduration", "maxdur"),
    ("startdelay", "delay"),
    ("protocols", "ctype"),
    ("maxextended", "maxext"),
    ("minbitrate", "minbitr"),
    ("maxbitrate", "maxbitr"),
    ("mincpmpersec", "mincpms"),
    ("companionad", "comp"),
    ("companiontype", "comptype"),
    ("delivery", "delivery"),
    ("maxseq", "maxseq"),
    ("poddur", "poddur"),
    ("podid", "podid"),
    ("podseq", "podseq"),
    ("rqddurs", "rqddurs"),
    ("slotinpod", "slotinpod"),
    ("api", "api"),
];

const VIDEO_ONLY: &[(&str, &str)] = &[
    ("placement", "ptype"),
    ("plcmt", "plcmt"),
    ("linearity", "linear"),
    ("boxingallowed", "boxing"),
    ("playbackmethod", "playmethod"),
    ("playbackend", "playend"),
    ("w", "w"),
    ("h", "h"),
    ("skip", "skip"),
    ("skipmin", "skipmin"),
    ("skipafter", "skipafter"),
    ("pos", "pos"),
];

const AUDIO_ONLY: &[(&str, &str)] = &[("feed", "feed"), ("stitched", "stitched"), ("nvol", "nvol")];

/// Imp 展示字段 -> placement
const PRESENTATION: &[(&str, &str)] = &[
    ("tagid", "tagid"),
    ("secure", "secure"),
    ("rwdd", "reward"),
    ("ssai", "ssai"),
    ("displaymanager", "sdk"),
    ("displaymanagerver", "sdkver"),
];

/// Imp 展示字段 -> placement.display（仅当存在 display 时）
const DISPLAY_PRESENTATION: &[(&str, &str)] = &[
    ("instl", "instl"),
    ("clickbrowser", "clktype"),
    ("iframebuster", "ifrbust"),
];

const CONTEXT_OBJECTS: &[&str] = &["site", "app", "dooh", "device", "user", "regs"];
const RESTRICTIONS: &[&str] = &["bcat", "badv", "bapp", "cattax"];

/// Bid -> media.ad
const AD: &[(&str, &str)] = &[
    ("crid", "id"),
    ("adomain", "adomain"),
    ("bundle", "bundle"),
    ("iurl", "iurl"),
    ("cat", "cat"),
    ("cattax", "cattax"),
    ("attr", "attr"),
    ("language", "lang"),
    ("qagmediarating", "mrating"),
];

const DISPLAY_MARKUP: &[(&str, &str)] = &[
    ("adm", "adm"),
    ("w", "w"),
    ("h", "h"),
    ("wratio", "wratio"),
    ("hratio", "hratio"),
    ("apis", "api"),
];

const AV_MARKUP: &[(&str, &str)] = &[("adm", "adm"), ("dur", "dur"), ("protocol", "ctype"), ("apis", "api")];

fn joined(a: &[(&'static str, &'static str)], b: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
    a.iter().chain(b).copied().collect()
}

fn to_map<T: Serialize>(value: &T, what: &str) -> Result<Map<String, Value>, CodecError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CodecError::Malformed(format!("{what} did not serialize to an object"))),
        Err(e) => Err(CodecError::Malformed(format!("{what}: {e}"))),
    }
}

fn from_map<T: DeserializeOwned>(map: Map<String, Value>, what: &str) -> Result<T, CodecError> {
    serde_json::from_value(Value::Object(map)).map_err(|e| CodecError::Malformed(format!("{what}: {e}")))
}

fn as_object(value: &Value, what: &'static str) -> Result<Map<String, Value>, CodecError> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| ShapeError { path: FieldPath::root().field(what), expected: "an object" }.into())
}

/// **AdCOM 1.x 编解码器**
///
/// 所有在 AdCOM 中没有位置的 2.x 字段都放进 ext.__openrtb_carry.v2，解码时原样取回。
#[derive(Debug, Clone)]
pub struct AdcomCodec {
    domainver: String,
}

impl Default for AdcomCodec {
    fn default() -> Self {
        Self { domainver: "1.0".to_string() }
    }
}

impl Layer4Codec for AdcomCodec {
    fn domainspec(&self) -> &str {
        "adcom"
    }

    fn domainver(&self) -> &str {
        &self.domainver
    }

    fn supports(&self, domainspec: &str, domainver: &str) -> bool {
        domainspec == "adcom" && (domainver == "1" || domainver.starts_with("1."))
    }

    fn encode_placement(&self, unit: &AdUnit) -> Result<Value, CodecError> {
        let mut spec = unit.residual.clone();
        let mut placement = take_object(&mut spec, "placement")?.unwrap_or_default();
        let mut presentation = unit.presentation.clone();
        let mut carried = Map::new();
        move_fields(&mut presentation, PRESENTATION, &mut placement);

        let display = match (&unit.banner, &unit.native) {
            (Some(banner), native) => {
                if let Some(native) = native {
                    carried.insert("native".into(), Value::Object(to_map(native, "native")?));
                }
                Some(remap(&to_map(banner, "banner")?, BANNER, Two, Three)?)
            }
            (None, Some(native)) => {
                let mut display = remap(&to_map(native, "native")?, NATIVE, Two, Three)?;
                display.entry("nativefmt").or_insert_with(|| json!({}));
                Some(display)
            }
            (None, None) => None,
        };
        if let Some(mut display) = display {
            move_fields(&mut presentation, DISPLAY_PRESENTATION, &mut display);
            placement.insert("display".into(), Value::Object(display));
        }
        if let Some(video) = &unit.video {
            let table = joined(AV_COMMON, VIDEO_ONLY);
            placement.insert("video".into(), Value::Object(remap(&to_map(video, "video")?, &table, Two, Three)?));
        }
        if let Some(audio) = &unit.audio {
            let table = joined(AV_COMMON, AUDIO_ONLY);
            placement.insert("audio".into(), Value::Object(remap(&to_map(audio, "audio")?, &table, Two, Three)?));
        }

        // instl 等无 display 可挂时，以及 refresh
        carried.extend(presentation);
        carry_all(&mut placement, Two, carried)?;
        spec.insert("placement".into(), Value::Object(placement));
        Ok(Value::Object(spec))
    }

    fn decode_placement(&self, spec: &Value) -> Result<AdUnit, CodecError> {
        let mut spec = as_object(spec, "spec")?;
        let mut placement = take_object(&mut spec, "placement")?.unwrap_or_default();
        let mut carried = take_bucket(&mut placement, Two)?;
        let mut unit = AdUnit::default();
        let mut presentation = Map::new();
        move_fields(&mut placement, &invert(PRESENTATION), &mut presentation);

        if let Some(mut display) = take_object(&mut placement, "display")? {
            move_fields(&mut display, &invert(DISPLAY_PRESENTATION), &mut presentation);
            let is_native = display.contains_key("nativefmt");
            if display.get("nativefmt") == Some(&json!({})) {
                display.remove("nativefmt");
            }
            if is_native {
                let native = remap(&display, &invert(NATIVE), Three, Two)?;
                unit.native = Some(from_map(native, "native")?);
            } else {
                let banner = remap(&display, &invert(BANNER), Three, Two)?;
                unit.banner = Some(from_map(banner, "banner")?);
            }
        }
        if let Some(video) = take_object(&mut placement, "video")? {
            let table = invert(&joined(AV_COMMON, VIDEO_ONLY));
            unit.video = Some(from_map(remap(&video, &table, Three, Two)?, "video")?);
        }
        if let Some(audio) = take_object(&mut placement, "audio")? {
            let table = invert(&joined(AV_COMMON, AUDIO_ONLY));
            unit.audio = Some(from_map(remap(&audio, &table, Three, Two)?, "audio")?);
        }
        if let Some(native) = carried.remove("native") {
            unit.native = Some(serde_json::from_value(native).map_err(|e| CodecError::Malformed(format!("native: {e}")))?);
        }

        presentation.extend(carried);
        unit.presentation = presentation;
        if !placement.is_empty() {
            spec.insert("placement".into(), Value::Object(placement));
        }
        unit.residual = spec;
        Ok(unit)
    }

    fn encode_context(&self, context: &Projection) -> Result<Value, CodecError> {
        let mut encoded = context.residual.clone();
        let mut restrictions = take_object(&mut encoded, "restrictions")?.unwrap_or_default();
        let mut carried = Map::new();
        for (key, value) in &context.fields {
            if CONTEXT_OBJECTS.contains(&key.as_str()) {
                encoded.insert(key.clone(), value.clone());
            } else if RESTRICTIONS.contains(&key.as_str()) {
                restrictions.insert(key.clone(), value.clone());
            } else {
                carried.insert(key.clone(), value.clone());
            }
        }
        if !restrictions.is_empty() {
            encoded.insert("restrictions".into(), Value::Object(restrictions));
        }
        carry_all(&mut encoded, Two, carried)?;
        Ok(Value::Object(encoded))
    }

    fn decode_context(&self, context: &Value) -> Result<Projection, CodecError> {
        let mut context = as_object(context, "context")?;
        let mut fields = take_bucket(&mut context, Two)?;
        for key in CONTEXT_OBJECTS {
            if let Some(value) = context.remove(*key) {
                fields.insert(key.to_string(), value);
            }
        }
        if let Some(mut restrictions) = take_object(&mut context, "restrictions")? {
            for key in RESTRICTIONS {
                if let Some(value) = restrictions.remove(*key) {
                    fields.insert(key.to_string(), value);
                }
            }
            if !restrictions.is_empty() {
                context.insert("restrictions".into(), Value::Object(restrictions));
            }
        }
        Ok(Projection { fields, residual: context })
    }

    fn encode_media(&self, media: &Projection) -> Result<Value, CodecError> {
        let mut fields = media.fields.clone();
        let mut encoded = media.residual.clone();
        let mut ad = take_object(&mut encoded, "ad")?.unwrap_or_default();
        move_fields(&mut fields, AD, &mut ad);

        let (slot, table) = markup_slot(CreativeMarkupType::from_value(fields.get("mtype")));
        let mut markup = take_object(&mut ad, slot)?.unwrap_or_default();
        move_fields(&mut fields, table, &mut markup);
        if !markup.is_empty() {
            ad.insert(slot.into(), Value::Object(markup));
        }

        // mtype、2.5 的单值 api、langb、dur 等
        carry_all(&mut ad, Two, fields)?;
        if !ad.is_empty() {
            encoded.insert("ad".into(), Value::Object(ad));
        }
        Ok(Value::Object(encoded))
    }

    fn decode_media(&self, media: &Value) -> Result<Projection, CodecError> {
        let mut media = as_object(media, "media")?;
        let mut ad = take_object(&mut media, "ad")?.unwrap_or_default();
        let restored = take_bucket(&mut ad, Two)?;
        let mut fields = Map::new();
        move_fields(&mut ad, &invert(AD), &mut fields);

        let mtype = CreativeMarkupType::from_value(restored.get("mtype"));
        let (slot, table) = match mtype {
            Some(_) => markup_slot(mtype),
            None => ["display", "video", "audio"]
                .into_iter()
                .find(|slot| ad.contains_key(*slot))
                .map(|slot| match slot {
                    "video" => ("video", AV_MARKUP),
                    "audio" => ("audio", AV_MARKUP),
                    _ => ("display", DISPLAY_MARKUP),
                })
                .unwrap_or(("display", DISPLAY_MARKUP)),
        };
        if let Some(mut markup) = take_object(&mut ad, slot)? {
            move_fields(&mut markup, &invert(table), &mut fields);
            if !markup.is_empty() {
                ad.insert(slot.into(), Value::Object(markup));
            }
        }

        fields.extend(restored);
        if !ad.is_empty() {
            media.insert("ad".into(), Value::Object(ad));
        }
        Ok(Projection { fields, residual: media })
    }
}

fn markup_slot(mtype: Option<CreativeMarkupType>) -> (&'static str, &'static [(&'static str, &'static str)]) {
    match mtype {
        Some(CreativeMarkupType::Video) => ("video", AV_MARKUP),
        Some(CreativeMarkupType::Audio) => ("audio", AV_MARKUP),
        Some(CreativeMarkupType::Banner) | Some(CreativeMarkupType::Native) | None => ("display", DISPLAY_MARKUP),
    }
}
