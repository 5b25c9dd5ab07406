//! # img-resize
//!
//! Batch image resizer. Point it at a directory (or a single file) and every
//! JPEG, PNG and WebP image is written out as a cascade of smaller WebP
//! derivatives, one per configured width:
//!
//! ```text
//! photo.jpg (1000 px)  →  photo.webp          full size, canonical format
//!                         800w:photo.webp
//!                         400w:photo.webp
//! ```
//!
//! Widths at or above the source width are skipped; an image narrower than
//! every configured width still gets the smallest one.
//!
//! # Execution Model
//!
//! All work runs on one fixed-size [`pool::TaskPool`]. Discovery submits a
//! top-level task per image while it is still walking the tree; each of those
//! decodes the image once and submits one job per derivative. Nothing waits
//! for a free worker, and the run ends when the pool has no outstanding work.
//! Errors never abort the run: each becomes a [`report::TaskError`] logged by
//! a dedicated sink thread.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `img-resize.toml` loading, defaults, validation, command-line overrides |
//! | [`walk`] | Source discovery with optional recursion and directory mirroring |
//! | [`pool`] | Worker pool for self-spawning tasks with a completion barrier |
//! | [`resizer`] | Per-image cascade: decode once, fan out derivative jobs |
//! | [`naming`] | Output file name templates |
//! | [`imaging`] | Cascade math and the [`imaging::Codec`] boundary over the `image` crate |
//! | [`report`] | Error channel and sink thread |
//! | [`process`] | Wires one run together and returns a [`process::RunSummary`] |
//! | [`output`] | CLI output formatting |

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pool;
pub mod process;
pub mod report;
pub mod resizer;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_helpers;
