// src/openrtb/media.rs
//
// 2.x 广告位的类型化创意对象，Layer-4 编解码器以此为输入/输出

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::TryFrom;

use crate::codec::CodecError;

/// Bid.mtype：创意标记类型
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum CreativeMarkupType {
    Banner = 1,
    Video = 2,
    Audio = 3,
    Native = 4,
}

impl TryFrom<u8> for CreativeMarkupType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CreativeMarkupType::Banner),
            2 => Ok(CreativeMarkupType::Video),
            3 => Ok(CreativeMarkupType::Audio),
            4 => Ok(CreativeMarkupType::Native),
            _ => Err(format!("Invalid value for CreativeMarkupType: {}", value)),
        }
    }
}

impl From<CreativeMarkupType> for u8 {
    fn from(mtype: CreativeMarkupType) -> Self {
        mtype as u8
    }
}

impl CreativeMarkupType {
    pub fn from_value(value: Option<&Value>) -> Option<Self> {
        let raw = u8::try_from(value?.as_u64()?).ok()?;
        Self::try_from(raw).ok()
    }
}

/// Banner 允许的尺寸
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Format {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Banner {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Vec<Format>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<Vec<i64>>,
    /// 其余字段（含 ext）原样保留
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Video {
    pub mimes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minduration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxduration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startdelay: Option<i64>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Audio {
    pub mimes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minduration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxduration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocols: Option<Vec<i64>>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Native {
    /// 符合 Native Ad 规范的请求串
    pub request: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Imp 上与广告位展示相关、交给 Layer-4 的字段
pub const PRESENTATION_FIELDS: &[&str] = &[
    "tagid",
    "secure",
    "rwdd",
    "ssai",
    "displaymanager",
    "displaymanagerver",
    "instl",
    "clickbrowser",
    "iframebuster",
    "refresh",
];

/// **类型化的 2.x 广告位**
///
/// 四种创意对象加上展示字段，是 Layer-4 编解码器 encode/decode 的单位。
/// `residual` 是 Layer-4 对象中在 2.x 里没有对应位置的部分，编码时作为骨架写回。
///
/// 类型化字段上显式的 `null`（如 `"w": null`）反序列化为 `None`，不会往返保留；
/// 这类输入本身校验不通过 (TypeMismatch)。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdUnit {
    pub banner: Option<Banner>,
    pub video: Option<Video>,
    pub audio: Option<Audio>,
    pub native: Option<Native>,
    pub presentation: Map<String, Value>,
    pub residual: Map<String, Value>,
}

impl AdUnit {
    /// 从 Imp 中取出创意对象与展示字段
    pub fn from_imp(imp: &Map<String, Value>) -> Result<Self, CodecError> {
        Ok(Self {
            banner: typed(imp, "banner")?,
            video: typed(imp, "video")?,
            audio: typed(imp, "audio")?,
            native: typed(imp, "native")?,
            presentation: PRESENTATION_FIELDS
                .iter()
                .filter_map(|key| imp.get(*key).map(|v| (key.to_string(), v.clone())))
                .collect(),
            residual: Map::new(),
        })
    }

    /// 写回 Imp
    pub fn apply_to(self, imp: &mut Map<String, Value>) -> Result<(), CodecError> {
        put(imp, "banner", self.banner)?;
        put(imp, "video", self.video)?;
        put(imp, "audio", self.audio)?;
        put(imp, "native", self.native)?;
        for (key, value) in self.presentation {
            imp.insert(key, value);
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.banner.is_none()
            && self.video.is_none()
            && self.audio.is_none()
            && self.native.is_none()
            && self.presentation.is_empty()
            && self.residual.is_empty()
    }
}

fn typed<T: for<'de> Deserialize<'de>>(imp: &Map<String, Value>, key: &str) -> Result<Option<T>, CodecError> {
    imp.get(key)
        .map(|raw| serde_json::from_value(raw.clone()))
        .transpose()
        .map_err(|e| CodecError::Malformed(format!("{key}: {e}")))
}

fn put<T: Serialize>(imp: &mut Map<String, Value>, key: &str, value: Option<T>) -> Result<(), CodecError> {
    if let Some(value) = value {
        let value = serde_json::to_value(value).map_err(|e| CodecError::Malformed(format!("{key}: {e}")))?;
        imp.insert(key.to_string(), value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn markup_type_from_u8() {
        assert_eq!(CreativeMarkupType::try_from(2), Ok(CreativeMarkupType::Video));
        assert!(CreativeMarkupType::try_from(9).is_err());
        assert_eq!(CreativeMarkupType::from_value(Some(&json!(4))), Some(CreativeMarkupType::Native));
        assert_eq!(CreativeMarkupType::from_value(Some(&json!("4"))), None);
    }

    #[test]
    fn ad_unit_round_trips_imp_fields() {
        let imp = json!({
            "id": "1",
            "banner": {"w": 300, "h": 250, "btype": [1], "format": [{"w": 300, "h": 250, "wmin": 10}], "ext": {"x": 1}},
            "tagid": "slot-1",
            "instl": 1,
            "bidfloor": 0.5
        });
        let imp = imp.as_object().unwrap();
        let unit = AdUnit::from_imp(imp).unwrap();
        let banner = unit.banner.as_ref().unwrap();
        assert_eq!((banner.w, banner.h), (Some(300), Some(250)));
        assert_eq!(banner.rest.get("btype"), Some(&json!([1])));
        assert_eq!(unit.presentation.len(), 2);

        let mut rebuilt = Map::new();
        rebuilt.insert("id".into(), json!("1"));
        rebuilt.insert("bidfloor".into(), json!(0.5));
        unit.apply_to(&mut rebuilt).unwrap();
        assert_eq!(&rebuilt, imp);
    }

    #[test]
    fn explicit_null_on_typed_fields_is_dropped() {
        let imp = json!({"id": "1", "banner": {"w": null, "h": 50, "vendor": null}});
        let unit = AdUnit::from_imp(imp.as_object().unwrap()).unwrap();
        let mut rebuilt = Map::new();
        unit.apply_to(&mut rebuilt).unwrap();
        assert_eq!(rebuilt["banner"], json!({"h": 50, "vendor": null}));
    }

    #[test]
    fn malformed_media_is_a_codec_error() {
        let imp = json!({"id": "1", "video": {"mimes": "video/mp4"}});
        let err = AdUnit::from_imp(imp.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(msg) if msg.starts_with("video")));
    }
}
