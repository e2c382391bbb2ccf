//! Domain models shared between the HTTP layer and storage.

pub mod identity;
pub mod image;
pub mod record;

pub use identity::VerifiedIdentity;
pub use image::{StorageObjectDescriptor, StoreImageResponse};
pub use record::{ImageRecord, RecordDeletedEvent};
