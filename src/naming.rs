//! Output file naming.
//!
//! Derivative names come from a user template with two placeholders:
//!
//! - `{f}` → base file name (source name without extension)
//! - `{s}` → target width in pixels
//!
//! The canonical format's extension is always appended. The default template
//! is `{s}w:{f}`, so `cat.jpg` at 300px becomes `300w:cat.webp`.
//!
//! Substitution is a single pass: text produced by one placeholder is never
//! rescanned, so a base name that itself contains `{s}` stays intact. A
//! template without placeholders is allowed and yields the same name for
//! every width; the resulting collisions are the caller's business.

use crate::imaging::OutputFormat;
use std::path::Path;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "{s}w:{f}";

const NAME_PLACEHOLDER: &str = "{f}";
const WIDTH_PLACEHOLDER: &str = "{s}";

/// Base name and extension of a source file, e.g. `photo.jpg` → (`photo`, `jpg`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceName {
    pub base: String,
    pub extension: String,
}

/// Split a path's file name at its last dot.
///
/// Returns `None` when the name has no extension (including dot-files such
/// as `.hidden`) or is not valid UTF-8.
pub fn split_file_name(path: &Path) -> Option<SourceName> {
    let base = path.file_stem()?.to_str()?;
    let extension = path.extension()?.to_str()?;
    Some(SourceName {
        base: base.to_string(),
        extension: extension.to_string(),
    })
}

/// Render the file name for one width-variant derivative.
///
/// # Examples
/// ```
/// # use img_resize::naming::format_name;
/// # use img_resize::imaging::OutputFormat;
/// assert_eq!(format_name("{s}w:{f}", "cat", 300, OutputFormat::WebP), "300w:cat.webp");
/// assert_eq!(format_name("{f}-{s}", "cat", 300, OutputFormat::WebP), "cat-300.webp");
/// ```
pub fn format_name(template: &str, base_name: &str, width: u32, format: OutputFormat) -> String {
    let width = width.to_string();
    let mut out = String::with_capacity(template.len() + base_name.len() + 8);
    let mut rest = template;

    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix(NAME_PLACEHOLDER) {
            out.push_str(base_name);
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix(WIDTH_PLACEHOLDER) {
            out.push_str(&width);
            rest = tail;
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }

    out.push('.');
    out.push_str(format.extension());
    out
}

/// File name of the full-size converted copy, e.g. `photo.webp`.
pub fn full_size_name(base_name: &str, format: OutputFormat) -> String {
    format!("{}.{}", base_name, format.extension())
}
