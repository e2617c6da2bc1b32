//! Page drawing surface in millimetres with a top-left origin, assembled into a PDF.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::encoding::{decode_byte, encode, TURKISH_DIFFERENCES};
use super::fonts::{FontFace, FontSet, Measure, Weight};
use super::LayoutError;

const MM_TO_PT: f32 = 72.0 / 25.4;
// cubic Bezier control distance for a quarter circle
const KAPPA: f32 = 0.552_284_8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const BLACK: Color = Color(0, 0, 0);
    pub const WHITE: Color = Color(255, 255, 255);
    pub const HEADER: Color = Color(31, 58, 96);
    pub const ACCENT: Color = Color(192, 57, 43);
    pub const BADGE: Color = Color(211, 84, 0);
    pub const BORDER: Color = Color(150, 160, 170);
    pub const SHADE: Color = Color(236, 240, 245);
    pub const MUTED: Color = Color(90, 90, 90);

    fn components(self) -> Vec<Object> {
        [self.0, self.1, self.2]
            .iter()
            .map(|c| Object::Real(f32::from(*c) / 255.0))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    A4Portrait,
    A4Landscape,
}

impl PageSize {
    /// Width and height in millimetres.
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4Portrait => (210.0, 297.0),
            PageSize::A4Landscape => (297.0, 210.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Axis-aligned box in page millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn inset(&self, by: f32) -> Rect {
        Rect::new(self.x + by, self.y + by, (self.w - 2.0 * by).max(0.0), (self.h - 2.0 * by).max(0.0))
    }
}

pub struct Canvas<'f> {
    fonts: &'f FontSet,
    size: PageSize,
    pages: Vec<Vec<Operation>>,
}

impl<'f> Canvas<'f> {
    pub fn new(fonts: &'f FontSet, size: PageSize) -> Self {
        Self {
            fonts,
            size,
            pages: vec![Vec::new()],
        }
    }

    pub fn fonts(&self) -> &'f FontSet {
        self.fonts
    }

    pub fn measure(&self, size: f32, weight: Weight) -> Measure<'f> {
        self.fonts.measure(size, weight)
    }

    pub fn width(&self) -> f32 {
        self.size.dimensions().0
    }

    pub fn height(&self) -> f32 {
        self.size.dimensions().1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn add_page(&mut self) {
        self.pages.push(Vec::new());
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // the constructor always creates the first page
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn x(&self, mm: f32) -> Object {
        Object::Real(mm * MM_TO_PT)
    }

    fn y(&self, mm: f32) -> Object {
        Object::Real((self.height() - mm) * MM_TO_PT)
    }

    fn point(&self, px: f32, py: f32) -> Vec<Object> {
        vec![self.x(px), self.y(py)]
    }

    fn curve(&self, points: [(f32, f32); 3]) -> Vec<Object> {
        points.iter().flat_map(|(px, py)| [self.x(*px), self.y(*py)]).collect()
    }

    fn push_rect(&mut self, rect: Rect) {
        let operands = vec![
            self.x(rect.x),
            self.y(rect.bottom()),
            Object::Real(rect.w * MM_TO_PT),
            Object::Real(rect.h * MM_TO_PT),
        ];
        self.ops().push(Operation::new("re", operands));
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops().push(Operation::new("rg", color.components()));
        self.push_rect(rect);
        self.ops().push(Operation::new("f", vec![]));
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        self.ops().push(Operation::new("RG", color.components()));
        self.ops()
            .push(Operation::new("w", vec![Object::Real(line_width * MM_TO_PT)]));
        self.push_rect(rect);
        self.ops().push(Operation::new("S", vec![]));
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color, line_width: f32) {
        let (mx, my, lx, ly) = (self.x(x1), self.y(y1), self.x(x2), self.y(y2));
        let ops = self.ops();
        ops.push(Operation::new("RG", color.components()));
        ops.push(Operation::new("w", vec![Object::Real(line_width * MM_TO_PT)]));
        ops.push(Operation::new("m", vec![mx, my]));
        ops.push(Operation::new("l", vec![lx, ly]));
        ops.push(Operation::new("S", vec![]));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rounded_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        fill: Option<Color>,
        stroke: Option<Color>,
    ) {
        let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
        let k = r * KAPPA;
        let (right, bottom) = (x + w, y + h);

        let path = vec![
            Operation::new("m", self.point(x + r, y)),
            Operation::new("l", self.point(right - r, y)),
            Operation::new("c", self.curve([(right - r + k, y), (right, y + r - k), (right, y + r)])),
            Operation::new("l", self.point(right, bottom - r)),
            Operation::new(
                "c",
                self.curve([(right, bottom - r + k), (right - r + k, bottom), (right - r, bottom)]),
            ),
            Operation::new("l", self.point(x + r, bottom)),
            Operation::new("c", self.curve([(x + r - k, bottom), (x, bottom - r + k), (x, bottom - r)])),
            Operation::new("l", self.point(x, y + r)),
            Operation::new("c", self.curve([(x, y + r - k), (x + r - k, y), (x + r, y)])),
            Operation::new("h", vec![]),
        ];

        let paint = match (fill, stroke) {
            (Some(_), Some(_)) => "B",
            (Some(_), None) => "f",
            (None, Some(_)) => "S",
            (None, None) => return,
        };
        let ops = self.ops();
        if let Some(color) = fill {
            ops.push(Operation::new("rg", color.components()));
        }
        if let Some(color) = stroke {
            ops.push(Operation::new("RG", color.components()));
        }
        ops.extend(path);
        ops.push(Operation::new(paint, vec![]));
    }

    /// Draw `text` left-aligned with its baseline at `baseline_y`.
    pub fn text(&mut self, x: f32, baseline_y: f32, text: &str, size: f32, weight: Weight, color: Color) {
        if text.is_empty() {
            return;
        }
        let font = match weight {
            Weight::Regular => "F1",
            Weight::Bold => "F2",
        };
        let (tx, ty) = (self.x(x), self.y(baseline_y));
        let ops = self.ops();
        ops.push(Operation::new("rg", color.components()));
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Real(size)]));
        ops.push(Operation::new("Td", vec![tx, ty]));
        ops.push(Operation::new("Tj", vec![Object::String(encode(text), StringFormat::Literal)]));
        ops.push(Operation::new("ET", vec![]));
    }

    /// Draw `text` aligned inside the horizontal span `[x, x + width]`.
    #[allow(clippy::too_many_arguments)]
    pub fn text_aligned(
        &mut self,
        x: f32,
        width: f32,
        baseline_y: f32,
        text: &str,
        size: f32,
        weight: Weight,
        color: Color,
        align: Align,
    ) {
        let text_width = self.fonts.text_width(text, size, weight);
        let start = match align {
            Align::Left => x,
            Align::Center => x + (width - text_width) / 2.0,
            Align::Right => x + width - text_width,
        };
        self.text(start, baseline_y, text, size, weight, color);
    }

    /// Assemble every page into a PDF file.
    pub fn finish(self, title: &str) -> Result<Vec<u8>, LayoutError> {
        let (width, height) = self.size.dimensions();
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = add_font(&mut doc, self.fonts.face(Weight::Regular));
        let bold_id = add_font(&mut doc, self.fonts.face(Weight::Bold));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let encoded = Content { operations }.encode()?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(width * MM_TO_PT),
                    Object::Real(height * MM_TO_PT),
                ],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => utf16_string(title),
            "Producer" => Object::string_literal(concat!("isg-docs-server ", env!("CARGO_PKG_VERSION"))),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut out = Vec::new();
        doc.save_to(&mut out).map_err(LayoutError::Write)?;
        Ok(out)
    }
}

fn utf16_string(text: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn encoding_dictionary() -> Dictionary {
    let differences: Vec<Object> = TURKISH_DIFFERENCES
        .iter()
        .flat_map(|(code, name)| [Object::Integer(i64::from(*code)), Object::Name(name.as_bytes().to_vec())])
        .collect();
    dictionary! {
        "Type" => "Encoding",
        "BaseEncoding" => "WinAnsiEncoding",
        "Differences" => differences,
    }
}

fn add_font(doc: &mut Document, face: &FontFace) -> ObjectId {
    let embedded = match face {
        FontFace::Builtin { .. } => {
            return doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => face.base_font(),
                "Encoding" => encoding_dictionary(),
            });
        }
        FontFace::Embedded(embedded) => embedded,
    };

    let data = embedded.data().to_vec();
    let file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => data.len() as i64 },
        data,
    ));
    let (ascent, descent) = embedded.vertical_metrics();
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => embedded.name(),
        "Flags" => 32_i64,
        "FontBBox" => vec![
            Object::Real(-200.0),
            Object::Real(descent),
            Object::Real(1200.0),
            Object::Real(ascent),
        ],
        "ItalicAngle" => 0_i64,
        "Ascent" => Object::Real(ascent),
        "Descent" => Object::Real(descent),
        "CapHeight" => Object::Real(ascent * 0.9),
        "StemV" => 80_i64,
        "FontFile2" => file_id,
    });
    let widths: Vec<Object> = (32u8..=255)
        .map(|code| {
            let width = decode_byte(code).map(|ch| face.advance(ch)).unwrap_or(0.0);
            Object::Integer(width.round() as i64)
        })
        .collect();

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "TrueType",
        "BaseFont" => embedded.name(),
        "FirstChar" => 32_i64,
        "LastChar" => 255_i64,
        "Widths" => widths,
        "FontDescriptor" => descriptor_id,
        "Encoding" => encoding_dictionary(),
    })
}
