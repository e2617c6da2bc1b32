//! Traits shared by every document kind.

use super::{GeneratedDocument, RenderError};
use crate::layout::FontSet;

/// Trait for validating request objects.
pub trait Validator {
    fn validate(&self) -> Result<(), String>;
}

/// A document record that can draw itself.
pub trait Render {
    /// Title used for the PDF metadata and the report-history snapshot.
    fn title(&self) -> String;

    /// Render to one or more PDF files. Kinds that expand per participant yield several.
    fn render(&self, fonts: &FontSet) -> Result<Vec<GeneratedDocument>, RenderError>;
}
