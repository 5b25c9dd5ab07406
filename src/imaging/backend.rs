//! Codec adapter trait and shared types.
//!
//! The [`Codec`] trait is the narrow boundary between the resize pipeline and
//! whatever actually touches pixels. The pipeline only ever asks six things of
//! it: read, decode, convert, size, resize and write. Every operation is
//! fallible and reports through [`CodecError`].
//!
//! The production implementation is
//! [`ImageCodec`](super::rust_backend::ImageCodec), built on the `image` crate.
//! Tests use the recording [`tests::MockCodec`] so scheduling and cascade logic
//! can be exercised without encoding a single pixel.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("failed to encode {format}: {reason}")]
    Convert { format: OutputFormat, reason: String },
    #[error("failed to read image size: {0}")]
    Size(String),
    #[error("failed to resize to {width}x{height}: {reason}")]
    Resize {
        width: u32,
        height: u32,
        reason: String,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Intrinsic pixel size of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Target encoding for every derivative.
///
/// There is a single canonical working format; the enum exists so names,
/// extensions and encoder selection all come from one place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    WebP,
}

impl OutputFormat {
    /// File extension (without the dot) for files written in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::WebP => f.write_str("WebP"),
        }
    }
}

/// Opaque, fallible image capability consumed by the resizer.
///
/// `Handle` is the decoded in-memory image. It is shared read-only between
/// the derivative tasks of one source image, hence `Send + Sync`.
pub trait Codec: Send + Sync + 'static {
    type Handle: Send + Sync + 'static;

    /// Load the raw bytes of a source file.
    fn read(&self, path: &Path) -> Result<Vec<u8>, CodecError>;

    /// Parse source bytes into a handle in the canonical working layout.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Handle, CodecError>;

    /// Encode the full, un-resized image in `format`.
    fn convert(&self, image: &Self::Handle, format: OutputFormat) -> Result<Vec<u8>, CodecError>;

    /// Intrinsic size of the decoded image.
    fn size(&self, image: &Self::Handle) -> Result<Dimensions, CodecError>;

    /// Resize to exactly `width` x `height` and encode in `format`.
    fn resize(
        &self,
        image: &Self::Handle,
        width: u32,
        height: u32,
        format: OutputFormat,
    ) -> Result<Vec<u8>, CodecError>;

    /// Persist encoded bytes.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), CodecError> {
        std::fs::write(path, bytes).map_err(|source| CodecError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Codec that records operations instead of touching pixels.
    /// Uses Mutex (not RefCell) so it is Sync and can be shared by pool workers.
    ///
    /// Decoding always yields `dimensions`; a handle is just those dimensions.
    #[derive(Debug)]
    pub struct MockCodec {
        pub dimensions: Dimensions,
        /// Writes to any path whose file name contains this fragment fail.
        pub fail_writes_containing: Option<String>,
        pub fail_decode: bool,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Read(String),
        Decode,
        Convert,
        Resize { width: u32, height: u32 },
        Write(String),
    }

    impl MockCodec {
        pub fn with_dimensions(width: u32, height: u32) -> Self {
            Self {
                dimensions: Dimensions { width, height },
                fail_writes_containing: None,
                fail_decode: false,
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_writes(mut self, fragment: &str) -> Self {
            self.fail_writes_containing = Some(fragment.to_string());
            self
        }

        pub fn failing_decode(mut self) -> Self {
            self.fail_decode = true;
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// File names of every write attempt, sorted for stable assertions.
        pub fn written_names(&self) -> Vec<String> {
            let mut names: Vec<String> = self
                .get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Write(path) => Path::new(&path)
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string()),
                    _ => None,
                })
                .collect();
            names.sort();
            names
        }

        /// Widths passed to `resize`, sorted descending.
        pub fn resized_widths(&self) -> Vec<u32> {
            let mut widths: Vec<u32> = self
                .get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Resize { width, .. } => Some(width),
                    _ => None,
                })
                .collect();
            widths.sort_unstable_by(|a, b| b.cmp(a));
            widths
        }

        fn record(&self, op: RecordedOp) {
            self.operations.lock().unwrap().push(op);
        }
    }

    impl Codec for MockCodec {
        type Handle = Dimensions;

        fn read(&self, path: &Path) -> Result<Vec<u8>, CodecError> {
            self.record(RecordedOp::Read(path.to_string_lossy().to_string()));
            Ok(b"mock".to_vec())
        }

        fn decode(&self, _bytes: &[u8]) -> Result<Dimensions, CodecError> {
            self.record(RecordedOp::Decode);
            if self.fail_decode {
                return Err(CodecError::Decode("mock decode failure".to_string()));
            }
            Ok(self.dimensions)
        }

        fn convert(&self, _image: &Dimensions, _format: OutputFormat) -> Result<Vec<u8>, CodecError> {
            self.record(RecordedOp::Convert);
            Ok(b"converted".to_vec())
        }

        fn size(&self, image: &Dimensions) -> Result<Dimensions, CodecError> {
            Ok(*image)
        }

        fn resize(
            &self,
            _image: &Dimensions,
            width: u32,
            height: u32,
            _format: OutputFormat,
        ) -> Result<Vec<u8>, CodecError> {
            self.record(RecordedOp::Resize { width, height });
            Ok(b"resized".to_vec())
        }

        fn write(&self, path: &Path, _bytes: &[u8]) -> Result<(), CodecError> {
            let display = path.to_string_lossy().to_string();
            self.record(RecordedOp::Write(display.clone()));
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            match &self.fail_writes_containing {
                Some(fragment) if file_name.contains(fragment.as_str()) => {
                    Err(CodecError::Write {
                        path: path.to_path_buf(),
                        source: std::io::Error::other("mock write failure"),
                    })
                }
                _ => Ok(()),
            }
        }
    }

    #[test]
    fn mock_records_resize() {
        let codec = MockCodec::with_dimensions(800, 600);
        let handle = codec.decode(b"").unwrap();
        codec.resize(&handle, 400, 300, OutputFormat::WebP).unwrap();

        let ops = codec.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[1],
            RecordedOp::Resize {
                width: 400,
                height: 300
            }
        ));
    }

    #[test]
    fn mock_write_failure_matches_file_name_only() {
        let codec = MockCodec::with_dimensions(10, 10).failing_writes("400w");
        assert!(codec.write(Path::new("/400w/ok.webp"), b"").is_ok());
        assert!(matches!(
            codec.write(Path::new("/out/400w:cat.webp"), b""),
            Err(CodecError::Write { .. })
        ));
    }

    /// Minimal codec that keeps the provided `write` method.
    struct Plain;

    impl Codec for Plain {
        type Handle = ();
        fn read(&self, _: &Path) -> Result<Vec<u8>, CodecError> {
            Ok(Vec::new())
        }
        fn decode(&self, _: &[u8]) -> Result<(), CodecError> {
            Ok(())
        }
        fn convert(&self, _: &(), _: OutputFormat) -> Result<Vec<u8>, CodecError> {
            Ok(Vec::new())
        }
        fn size(&self, _: &()) -> Result<Dimensions, CodecError> {
            Ok(Dimensions {
                width: 1,
                height: 1,
            })
        }
        fn resize(&self, _: &(), _: u32, _: u32, _: OutputFormat) -> Result<Vec<u8>, CodecError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn default_write_persists_bytes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out.webp");
        Plain.write(&path, b"bytes").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
    }

    #[test]
    fn default_write_reports_missing_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("missing").join("out.webp");
        let err = Plain.write(&path, b"x").unwrap_err();
        assert!(matches!(err, CodecError::Write { path: p, .. } if p == path));
    }

    #[test]
    fn output_format_extension() {
        assert_eq!(OutputFormat::default().extension(), "webp");
        assert_eq!(OutputFormat::WebP.to_string(), "WebP");
    }
}
