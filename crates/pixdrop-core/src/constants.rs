//! Wire-level names shared by the API and storage crates.

/// Route of the upload endpoint.
pub const STORE_IMAGE_PATH: &str = "/storeImage";

/// Route receiving record-deleted notifications.
pub const RECORD_DELETED_PATH: &str = "/events/recordDeleted";

/// Multipart field that switches the upload to replace semantics.
pub const OLD_IMAGE_PATH_FIELD: &str = "oldImagePath";

/// Object metadata key holding the retrieval token.
pub const DOWNLOAD_TOKEN_METADATA_KEY: &str = "firebaseStorageDownloadTokens";

/// Content type recorded when the file part declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Default `<storage-host>` segment of download URLs.
pub const DEFAULT_DOWNLOAD_URL_HOST: &str = "firebasestorage.googleapis.com/v0/b";

/// Google key set used to sign Firebase ID tokens.
pub const DEFAULT_FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Issuer prefix of Firebase ID tokens; the project id is appended.
pub const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";
