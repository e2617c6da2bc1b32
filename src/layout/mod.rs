//! Layout primitives shared by every document renderer.
//!
//! - `fonts` - the immutable [`FontSet`] and text measurement
//! - `text` - ellipsis truncation and lazy line wrapping
//! - `badge` - single-row rounded labels with drop-tail overflow
//! - `canvas` - millimetre drawing surface and PDF assembly

pub mod badge;
pub mod canvas;
pub mod encoding;
pub mod fonts;
pub mod metrics;
pub mod text;

pub use badge::{draw_badges, layout_badges, BadgeStyle, PlacedBadge};
pub use canvas::{Align, Canvas, Color, PageSize, Rect};
pub use fonts::{FontSet, FontSource, Measure, Weight};
pub use text::{truncate, wrap, ELLIPSIS};

use thiserror::Error;

/// Errors raised while assembling the PDF file.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to encode page content: {0}")]
    Content(#[from] lopdf::Error),
    #[error("failed to write PDF: {0}")]
    Write(#[source] std::io::Error),
}
