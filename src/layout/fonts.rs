//! Font family used for measuring and drawing every document.
//!
//! A [`FontSet`] is fetched once at startup and handed to each render call by reference.
//! When the embedded family cannot be fetched or parsed the set silently degrades to the
//! built-in Helvetica faces; a render never fails because of fonts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusttype::{Font, Scale};
use thiserror::Error;

use super::encoding::printable;
use super::metrics::helvetica_width;

/// Millimetres per PDF point.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

pub const REGULAR_FILE: &str = "Roboto-Regular.ttf";
pub const BOLD_FILE: &str = "Roboto-Bold.ttf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// Where the embedded family comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FontSource {
    Directory(PathBuf),
    Url(String),
    Builtin,
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font file {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to fetch font: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("font {0} is not a valid TrueType font")]
    Parse(String),
}

/// A TrueType face whose bytes are embedded in the generated PDF.
#[derive(Clone)]
pub struct EmbeddedFace {
    name: String,
    data: Arc<Vec<u8>>,
    font: Font<'static>,
    units_per_em: f32,
    ascent: f32,
    descent: f32,
}

impl EmbeddedFace {
    pub fn parse(name: &str, data: Vec<u8>) -> Result<Self, FontError> {
        let shared = Arc::new(data);
        let font = Font::try_from_vec(shared.as_ref().clone())
            .ok_or_else(|| FontError::Parse(name.to_string()))?;
        let metrics = font.v_metrics_unscaled();
        let units_per_em = f32::from(font.units_per_em().max(1));
        Ok(Self {
            name: name.to_string(),
            data: shared,
            font,
            units_per_em,
            ascent: metrics.ascent,
            descent: metrics.descent,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Ascent and descent in 1/1000 em.
    pub fn vertical_metrics(&self) -> (f32, f32) {
        (
            self.ascent * 1000.0 / self.units_per_em,
            self.descent * 1000.0 / self.units_per_em,
        )
    }

    fn advance(&self, ch: char) -> f32 {
        // rusttype scales by ascent-descent height; at that scale one pixel is one font unit
        let scale = Scale::uniform((self.ascent - self.descent).max(1.0));
        let units = self.font.glyph(ch).scaled(scale).h_metrics().advance_width;
        units * 1000.0 / self.units_per_em
    }
}

impl std::fmt::Debug for EmbeddedFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedFace")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum FontFace {
    Embedded(EmbeddedFace),
    Builtin { bold: bool },
}

impl FontFace {
    /// Advance width in 1/1000 em of a character as it will be drawn.
    pub fn advance(&self, ch: char) -> f32 {
        let ch = printable(ch);
        match self {
            FontFace::Embedded(face) => face.advance(ch),
            FontFace::Builtin { bold } => f32::from(helvetica_width(ch, *bold)),
        }
    }

    pub fn base_font(&self) -> &str {
        match self {
            FontFace::Embedded(face) => face.name(),
            FontFace::Builtin { bold: false } => "Helvetica",
            FontFace::Builtin { bold: true } => "Helvetica-Bold",
        }
    }
}

/// Immutable regular + bold pair shared by all renders.
#[derive(Debug, Clone)]
pub struct FontSet {
    regular: FontFace,
    bold: FontFace,
}

impl FontSet {
    pub fn builtin() -> Self {
        Self {
            regular: FontFace::Builtin { bold: false },
            bold: FontFace::Builtin { bold: true },
        }
    }

    pub fn from_bytes(regular: Vec<u8>, bold: Vec<u8>) -> Result<Self, FontError> {
        Ok(Self {
            regular: FontFace::Embedded(EmbeddedFace::parse("Roboto-Regular", regular)?),
            bold: FontFace::Embedded(EmbeddedFace::parse("Roboto-Bold", bold)?),
        })
    }

    /// Fetch the embedded family, falling back to the built-in faces on any failure.
    pub async fn load(source: &FontSource, client: &reqwest::Client) -> Self {
        let fetched = match source {
            FontSource::Builtin => return Self::builtin(),
            FontSource::Directory(dir) => read_directory(dir).await,
            FontSource::Url(base) => fetch_url(client, base).await,
        };

        match fetched {
            Ok(fonts) => {
                log::info!("Embedded font family loaded from {:?}", source);
                fonts
            }
            Err(e) => {
                log::warn!("Font family unavailable ({}), using built-in Helvetica", e);
                Self::builtin()
            }
        }
    }

    pub fn face(&self, weight: Weight) -> &FontFace {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.regular, FontFace::Embedded(_))
    }

    pub fn measure(&self, size: f32, weight: Weight) -> Measure<'_> {
        Measure {
            face: self.face(weight),
            size,
        }
    }

    /// Width of `text` in millimetres at `size` points.
    pub fn text_width(&self, text: &str, size: f32, weight: Weight) -> f32 {
        self.measure(size, weight).width(text)
    }
}

/// A face at a fixed point size.
#[derive(Debug, Clone, Copy)]
pub struct Measure<'a> {
    face: &'a FontFace,
    size: f32,
}

impl<'a> Measure<'a> {
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Width in millimetres.
    pub fn width(&self, text: &str) -> f32 {
        let units: f32 = text.chars().map(|ch| self.face.advance(ch)).sum();
        units / 1000.0 * self.size * PT_TO_MM
    }
}

async fn read_directory(dir: &Path) -> Result<FontSet, FontError> {
    let regular_path = dir.join(REGULAR_FILE);
    let bold_path = dir.join(BOLD_FILE);
    let regular = tokio::fs::read(&regular_path)
        .await
        .map_err(|e| FontError::Read(regular_path.clone(), e))?;
    let bold = tokio::fs::read(&bold_path)
        .await
        .map_err(|e| FontError::Read(bold_path.clone(), e))?;
    FontSet::from_bytes(regular, bold)
}

async fn fetch_url(client: &reqwest::Client, base: &str) -> Result<FontSet, FontError> {
    let base = base.trim_end_matches('/');
    let regular = fetch_file(client, &format!("{}/{}", base, REGULAR_FILE)).await?;
    let bold = fetch_file(client, &format!("{}/{}", base, BOLD_FILE)).await?;
    FontSet::from_bytes(regular, bold)
}

async fn fetch_file(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FontError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_width_in_millimetres() {
        let fonts = FontSet::builtin();
        // "W" is 944/1000 em; at 10pt that is 9.44pt
        let width = fonts.text_width("W", 10.0, Weight::Regular);
        assert!((width - 9.44 * PT_TO_MM).abs() < 1e-4);
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let fonts = FontSet::builtin();
        let text = "İş Sağlığı ve Güvenliği";
        assert!(
            fonts.text_width(text, 10.0, Weight::Bold) > fonts.text_width(text, 10.0, Weight::Regular)
        );
    }

    #[test]
    fn test_invalid_font_bytes_are_rejected() {
        let result = FontSet::from_bytes(vec![0, 1, 2], vec![3, 4, 5]);
        assert!(matches!(result, Err(FontError::Parse(_))));
    }

    #[tokio::test]
    async fn test_missing_directory_falls_back_to_builtin() {
        let client = reqwest::Client::new();
        let source = FontSource::Directory(PathBuf::from("/nonexistent/fonts"));
        let fonts = FontSet::load(&source, &client).await;
        assert!(!fonts.is_embedded());
        assert_eq!(fonts.face(Weight::Bold).base_font(), "Helvetica-Bold");
    }

    #[tokio::test]
    async fn test_corrupt_font_files_fall_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(REGULAR_FILE), b"not a font").unwrap();
        std::fs::write(dir.path().join(BOLD_FILE), b"not a font either").unwrap();

        let source = FontSource::Directory(dir.path().to_path_buf());
        let fonts = FontSet::load(&source, &reqwest::Client::new()).await;
        assert!(!fonts.is_embedded());
    }
}
