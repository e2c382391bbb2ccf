//! Streaming multipart ingestion.
//!
//! [`MultipartStreamParser`] turns a `multipart/form-data` body into a sequence
//! of [`Part`]s. File parts are piped chunk by chunk into a scratch file as the
//! bytes arrive; nothing downstream runs until [`Part::Done`] has been returned,
//! at which point every staged file is fully flushed.

mod staged;

pub use staged::StagedFile;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use pixdrop_core::constants::{DEFAULT_CONTENT_TYPE, OLD_IMAGE_PATH_FIELD};
use pixdrop_core::AppError;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Largest accepted non-file field value.
const MAX_FIELD_BYTES: usize = 8 * 1024;
const SCRATCH_PREFIX: &str = "pixdrop-upload-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    AwaitingPart,
    InFilePart,
    InFieldPart,
    Finished,
}

#[derive(Debug)]
pub enum Part {
    File(StagedFile),
    Field { name: String, value: String },
    Done,
}

/// Where file parts are staged and how large they may grow.
#[derive(Debug, Clone)]
pub struct ScratchConfig {
    pub dir: PathBuf,
    pub max_file_size_bytes: u64,
}

pub struct MultipartStreamParser {
    multipart: Option<Multipart>,
    scratch: ScratchConfig,
    state: ParserState,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body too large".to_string())
    } else {
        AppError::BadRequest(format!("Failed to read multipart: {}", err.body_text()))
    }
}

impl MultipartStreamParser {
    pub fn new(multipart: Multipart, scratch: ScratchConfig) -> Self {
        Self {
            multipart: Some(multipart),
            scratch,
            state: ParserState::AwaitingPart,
        }
    }

    /// A parser over a body that carried no multipart content; it finishes
    /// immediately.
    pub fn empty(scratch: ScratchConfig) -> Self {
        Self {
            multipart: None,
            scratch,
            state: ParserState::AwaitingPart,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Consume the next part. After `Part::Done` every further call returns `Done`.
    pub async fn next_part(&mut self) -> Result<Part, AppError> {
        if self.state == ParserState::Finished {
            return Ok(Part::Done);
        }

        let Some(multipart) = self.multipart.as_mut() else {
            self.state = ParserState::Finished;
            return Ok(Part::Done);
        };

        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                self.state = ParserState::Finished;
                return Ok(Part::Done);
            }
            Err(e) => {
                self.state = ParserState::Finished;
                return Err(multipart_error(e));
            }
        };

        let name = field.name().unwrap_or_default().to_string();

        let result = if field.file_name().is_some() {
            self.state = ParserState::InFilePart;
            stage_file(field, &self.scratch).await.map(Part::File)
        } else {
            self.state = ParserState::InFieldPart;
            read_field(field, &name).await.map(|value| Part::Field { name, value })
        };

        self.state = match result {
            Ok(_) => ParserState::AwaitingPart,
            Err(_) => ParserState::Finished,
        };
        result
    }
}

/// Pipe a file part into a new scratch file.
async fn stage_file(mut field: Field<'_>, scratch: &ScratchConfig) -> Result<StagedFile, AppError> {
    let original_filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    let named = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempfile_in(&scratch.dir)
        .map_err(|e| {
            AppError::Internal(format!(
                "Failed to create scratch file in {}: {}",
                scratch.dir.display(),
                e
            ))
        })?;
    // `temp_path` deletes the file on drop, including on the early returns below.
    let (file, temp_path) = named.into_parts();
    let mut sink = tokio::fs::File::from_std(file);

    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len() as u64;
        if size > scratch.max_file_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File size exceeds maximum allowed size of {} MB",
                scratch.max_file_size_bytes / 1024 / 1024
            )));
        }
        sink.write_all(&chunk).await?;
    }
    sink.flush().await?;
    drop(sink);

    tracing::debug!(
        filename = %original_filename,
        content_type = %content_type,
        size_bytes = size,
        "File part staged"
    );

    Ok(StagedFile::new(temp_path, content_type, original_filename, size))
}

async fn read_field(mut field: Field<'_>, name: &str) -> Result<String, AppError> {
    let mut raw = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if raw.len() + chunk.len() > MAX_FIELD_BYTES {
            return Err(AppError::BadRequest(format!("Field '{}' is too large", name)));
        }
        raw.extend_from_slice(&chunk);
    }

    let value = String::from_utf8(raw)
        .map_err(|_| AppError::BadRequest(format!("Field '{}' is not valid UTF-8", name)))?;

    if name != OLD_IMAGE_PATH_FIELD {
        return Ok(value);
    }

    urlencoding::decode(&value)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| AppError::BadRequest(format!("Field '{}' is not valid URI encoding", name)))
}

/// Fields of an upload request collected from the part sequence.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<StagedFile>,
    pub old_image_path: Option<String>,
}

/// Drain the parser into an [`UploadForm`].
///
/// When several file parts arrive the last one wins; earlier ones are released
/// as soon as they are replaced. An empty `oldImagePath` counts as absent.
pub async fn collect_upload(parser: &mut MultipartStreamParser) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    loop {
        match parser.next_part().await? {
            Part::File(staged) => {
                if let Some(previous) = form.file.replace(staged) {
                    tracing::debug!(
                        filename = %previous.original_filename(),
                        "Discarding earlier file part"
                    );
                }
            }
            Part::Field { name, value } if name == OLD_IMAGE_PATH_FIELD => {
                form.old_image_path = Some(value).filter(|v| !v.is_empty());
            }
            Part::Field { name, .. } => {
                tracing::debug!(field = %name, "Ignoring unknown form field");
            }
            Part::Done => break,
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::{FromRequest, Request};

    const BOUNDARY: &str = "pixdrop-test-boundary";

    enum TestPart<'a> {
        File {
            name: &'a str,
            filename: &'a str,
            content_type: Option<&'a str>,
            data: &'a [u8],
        },
        Field {
            name: &'a str,
            value: &'a str,
        },
    }

    fn body(parts: &[TestPart<'_>]) -> Vec<u8> {
        let mut out = Vec::new();
        for part in parts {
            out.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                TestPart::File {
                    name,
                    filename,
                    content_type,
                    data,
                } => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                            name, filename
                        )
                        .as_bytes(),
                    );
                    if let Some(ct) = content_type {
                        out.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
                    }
                    out.extend_from_slice(b"\r\n");
                    out.extend_from_slice(data);
                    out.extend_from_slice(b"\r\n");
                }
                TestPart::Field { name, value } => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                            name, value
                        )
                        .as_bytes(),
                    );
                }
            }
        }
        out.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        out
    }

    async fn parser(parts: &[TestPart<'_>], max: u64) -> (tempfile::TempDir, MultipartStreamParser) {
        let dir = tempfile::TempDir::new().unwrap();
        let request = Request::builder()
            .method("POST")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body(parts)))
            .unwrap();
        let multipart = Multipart::from_request(request, &()).await.unwrap();
        let scratch = ScratchConfig {
            dir: dir.path().to_path_buf(),
            max_file_size_bytes: max,
        };
        (dir, MultipartStreamParser::new(multipart, scratch))
    }

    fn scratch_entries(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn walks_parts_in_order_and_finishes() {
        let (_dir, mut parser) = parser(
            &[
                TestPart::Field {
                    name: "oldImagePath",
                    value: "images%2Fold%20one.png",
                },
                TestPart::File {
                    name: "image",
                    filename: "cat.png",
                    content_type: Some("image/png"),
                    data: b"png-bytes",
                },
            ],
            1024,
        )
        .await;

        assert_eq!(parser.state(), ParserState::AwaitingPart);

        match parser.next_part().await.unwrap() {
            Part::Field { name, value } => {
                assert_eq!(name, "oldImagePath");
                assert_eq!(value, "images/old one.png");
            }
            other => panic!("expected field, got {:?}", other),
        }
        assert_eq!(parser.state(), ParserState::AwaitingPart);

        match parser.next_part().await.unwrap() {
            Part::File(staged) => {
                assert_eq!(staged.original_filename(), "cat.png");
                assert_eq!(staged.content_type(), "image/png");
                assert_eq!(staged.size(), 9);
                assert_eq!(std::fs::read(staged.path()).unwrap(), b"png-bytes");
            }
            other => panic!("expected file, got {:?}", other),
        }

        assert!(matches!(parser.next_part().await.unwrap(), Part::Done));
        assert_eq!(parser.state(), ParserState::Finished);
        assert!(matches!(parser.next_part().await.unwrap(), Part::Done));
    }

    #[tokio::test]
    async fn missing_content_type_defaults_to_octet_stream() {
        let (_dir, mut parser) = parser(
            &[TestPart::File {
                name: "image",
                filename: "blob",
                content_type: None,
                data: b"x",
            }],
            1024,
        )
        .await;

        let form = collect_upload(&mut parser).await.unwrap();
        let file = form.file.unwrap();
        assert_eq!(file.content_type(), "application/octet-stream");
    }

    #[tokio::test]
    async fn last_file_part_wins_and_earlier_one_is_released() {
        let (dir, mut parser) = parser(
            &[
                TestPart::File {
                    name: "image",
                    filename: "first.png",
                    content_type: Some("image/png"),
                    data: b"first",
                },
                TestPart::File {
                    name: "image",
                    filename: "second.png",
                    content_type: Some("image/png"),
                    data: b"second",
                },
            ],
            1024,
        )
        .await;

        let form = collect_upload(&mut parser).await.unwrap();
        let file = form.file.unwrap();
        assert_eq!(file.original_filename(), "second.png");
        assert_eq!(scratch_entries(&dir), 1);

        drop(file);
        assert_eq!(scratch_entries(&dir), 0);
    }

    #[tokio::test]
    async fn stream_without_file_part_still_finishes() {
        let (_dir, mut parser) = parser(
            &[TestPart::Field {
                name: "oldImagePath",
                value: "",
            }],
            1024,
        )
        .await;

        let form = collect_upload(&mut parser).await.unwrap();
        assert!(form.file.is_none());
        assert!(form.old_image_path.is_none());
        assert_eq!(parser.state(), ParserState::Finished);
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_and_scratch_removed() {
        let (dir, mut parser) = parser(
            &[TestPart::File {
                name: "image",
                filename: "big.bin",
                content_type: None,
                data: &[0u8; 64],
            }],
            16,
        )
        .await;

        let result = collect_upload(&mut parser).await;
        assert!(matches!(result, Err(AppError::PayloadTooLarge(_))));
        assert_eq!(parser.state(), ParserState::Finished);
        assert_eq!(scratch_entries(&dir), 0);
    }

    #[tokio::test]
    async fn empty_parser_finishes_immediately() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut parser = MultipartStreamParser::empty(ScratchConfig {
            dir: dir.path().to_path_buf(),
            max_file_size_bytes: 1,
        });

        assert!(matches!(parser.next_part().await.unwrap(), Part::Done));
        assert_eq!(parser.state(), ParserState::Finished);
    }
}
