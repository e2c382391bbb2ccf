use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Last-known attributes of an external image record.
///
/// The record is owned by another system; only `imagePath` matters here, every
/// other attribute is kept opaque.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(rename = "imagePath", default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ImageRecord {
    /// Referenced object path exactly as stored; only an empty value counts
    /// as absent.
    pub fn object_path(&self) -> Option<&str> {
        self.image_path.as_deref().filter(|path| !path.is_empty())
    }
}

/// Notification that an image record was removed from the metadata store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDeletedEvent {
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default)]
    pub data: ImageRecord,
}
