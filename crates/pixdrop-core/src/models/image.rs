use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where an uploaded image lives and how it can be fetched.
///
/// Written once per upload request. `retrieval_token` is stored as object
/// metadata and gates the public download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageObjectDescriptor {
    pub object_path: String,
    pub content_type: String,
    pub retrieval_token: String,
}

/// Body of a successful `POST /storeImage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreImageResponse {
    /// Token-gated public download URL
    pub image_url: String,
    /// Object path inside the bucket; send it back as `oldImagePath` to replace the image
    pub image_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_uses_camel_case_keys() {
        let response = StoreImageResponse {
            image_url: "https://host/bucket/o/cat.png?alt=media&token=t".to_string(),
            image_path: "cat.png".to_string(),
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["imagePath"], "cat.png");
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("image_path").is_none());
    }
}
