pub mod cleanup;
pub mod upload;

pub use cleanup::{CleanupListener, CleanupOutcome};
pub use upload::UploadOrchestrator;
