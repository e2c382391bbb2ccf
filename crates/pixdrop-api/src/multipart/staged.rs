use std::io;
use std::path::Path;
use tempfile::TempPath;

/// Scratch copy of an uploaded file part.
///
/// The backing file is deleted when the value is dropped, so every exit path
/// (rejection, storage failure, client disconnect) releases it. `release` does
/// the same but reports the outcome.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    content_type: String,
    original_filename: String,
    size: u64,
}

impl StagedFile {
    pub(crate) fn new(
        path: TempPath,
        content_type: String,
        original_filename: String,
        size: u64,
    ) -> Self {
        Self {
            path,
            content_type,
            original_filename,
            size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Delete the scratch file now.
    pub fn release(self) -> io::Result<()> {
        self.path.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn staged() -> StagedFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"bytes").unwrap();
        StagedFile::new(
            file.into_temp_path(),
            "image/png".to_string(),
            "cat.png".to_string(),
            5,
        )
    }

    #[test]
    fn release_deletes_scratch_file() {
        let file = staged();
        let path = file.path().to_path_buf();
        assert!(path.exists());

        file.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn drop_deletes_scratch_file() {
        let file = staged();
        let path = file.path().to_path_buf();
        drop(file);
        assert!(!path.exists());
    }
}
