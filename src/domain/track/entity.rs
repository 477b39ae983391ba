use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Metadata payload the embedded page sends with `track:info-req`.
///
/// Only the fields the main process reads are typed; everything else is kept
/// in `extra` so the payload is forwarded to consumers unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<TrackContext>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<TrackMeta>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub author: String,

    /// The page reports this as a string ("213"); numbers are accepted too.
    #[serde(
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub length_seconds: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ThumbnailList>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ThumbnailList {
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackContext {
    /// "Music", "Video" or "Image"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_details: Option<ContextVideoDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_owner_details: Option<PageOwnerDetails>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContextVideoDetails {
    #[serde(
        default,
        deserialize_with = "lenient_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_seconds: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PageOwnerDetails {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrackMeta {
    /// Album art URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrackData {
    /// Track identifier, if the payload carries video details.
    pub fn id(&self) -> Option<&str> {
        self.video.as_ref().map(|v| v.video_id.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.video.as_ref().map(|v| v.title.as_str())
    }

    pub fn author(&self) -> Option<&str> {
        self.video.as_ref().map(|v| v.author.as_str())
    }

    pub fn category(&self) -> Option<&str> {
        self.context.as_ref()?.category.as_deref()
    }

    pub fn album(&self) -> Option<&str> {
        self.context
            .as_ref()?
            .page_owner_details
            .as_ref()
            .map(|p| p.name.as_str())
    }

    /// Duration in seconds: context details first, video details second.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.context
            .as_ref()
            .and_then(|c| c.video_details.as_ref())
            .and_then(|d| d.duration_seconds)
            .or_else(|| self.video.as_ref().and_then(|v| v.length_seconds))
    }

    pub fn first_thumbnail_url(&self) -> Option<&str> {
        self.video
            .as_ref()?
            .thumbnail
            .as_ref()?
            .thumbnails
            .first()
            .map(|t| t.url.as_str())
    }

    pub fn album_thumbnail(&self) -> Option<&str> {
        self.meta.as_ref()?.thumbnail.as_deref()
    }
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
