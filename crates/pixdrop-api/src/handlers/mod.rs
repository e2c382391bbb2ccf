pub mod download;
pub mod health;
pub mod record_deleted;
pub mod store_image;
