//! Image handling behind a narrow codec boundary.
//!
//! | Operation | Where |
//! |---|---|
//! | **Cascade planning** | [`plan_cascade`], [`scaled_height`] (pure) |
//! | **Decode / resize / encode** | [`Codec`] trait, [`ImageCodec`] implementation |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for cascade and dimension math (unit testable)
//! - **Backend**: [`Codec`] trait, [`CodecError`], [`Dimensions`], [`OutputFormat`]
//! - **Rust backend**: [`ImageCodec`] on top of the `image` crate

pub mod backend;
mod calculations;
pub mod rust_backend;

pub use backend::{Codec, CodecError, Dimensions, OutputFormat};
pub use calculations::{plan_cascade, scaled_height};
pub use rust_backend::{ImageCodec, supported_input_extensions};
