//! Pure Rust codec built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Read | `std::fs::read` |
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory` |
//! | Canonical layout | 8-bit RGB, or RGBA when the source has alpha |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |

use super::backend::{Codec, CodecError, Dimensions, OutputFormat};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Codec backed by the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl ImageCodec {
    pub fn new() -> Self {
        Self
    }
}

/// Bring any decoded layout into one the WebP encoder accepts.
fn to_working_layout(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.into_rgba8()),
        other => DynamicImage::ImageRgb8(other.into_rgb8()),
    }
}

fn encode(img: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    match format {
        OutputFormat::WebP => {
            let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut buf);
            img.write_with_encoder(encoder)
                .map_err(|e| CodecError::Convert {
                    format,
                    reason: e.to_string(),
                })?;
        }
    }
    Ok(buf)
}

impl Codec for ImageCodec {
    type Handle = DynamicImage;

    fn read(&self, path: &Path) -> Result<Vec<u8>, CodecError> {
        std::fs::read(path).map_err(|source| CodecError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        image::load_from_memory(bytes)
            .map(to_working_layout)
            .map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn convert(&self, image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, CodecError> {
        encode(image, format)
    }

    fn size(&self, image: &DynamicImage) -> Result<Dimensions, CodecError> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(CodecError::Size(format!("empty image ({width}x{height})")));
        }
        Ok(Dimensions { width, height })
    }

    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
        format: OutputFormat,
    ) -> Result<Vec<u8>, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::Resize {
                width,
                height,
                reason: "target dimensions must be non-zero".to_string(),
            });
        }
        let resized = image.resize_exact(width, height, FilterType::Lanczos3);
        encode(&resized, format)
    }
}
