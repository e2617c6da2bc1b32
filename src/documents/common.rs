//! Shared helpers for document renderers: Turkish dates, placeholders and the banded
//! section sheet every document kind is drawn on.

use chrono::{Months, NaiveDate};

use crate::layout::{truncate, wrap, Canvas, Color, FontSet, PageSize, Rect, Weight};

pub const PLACEHOLDER: &str = "—";
pub const DATE_FORMAT: &str = "%d.%m.%Y";

pub const MARGIN: f32 = 15.0;
pub const HEADER_BAR_HEIGHT: f32 = 7.0;
pub const SECTION_GAP: f32 = 4.0;
pub const BOX_PADDING: f32 = 3.0;
pub const ROW_HEIGHT: f32 = 6.0;
pub const BODY_SIZE: f32 = 9.0;
pub const LABEL_SIZE: f32 = 8.5;

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Shift a day.month.year date by whole years; `None` if the input does not parse.
pub fn add_years(value: &str, years: u32) -> Option<String> {
    parse_date(value)
        .and_then(|date| date.checked_add_months(Months::new(years * 12)))
        .map(format_date)
}

/// The value itself, or an em-dash when it is missing or blank.
pub fn or_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(text) if !text.trim().is_empty() => text,
        _ => PLACEHOLDER,
    }
}

/// Height of a checklist box laid out in `columns` columns.
pub fn checklist_height(items: usize, columns: usize, row_height: f32, padding: f32, minimum: f32) -> f32 {
    let rows = items.div_ceil(columns.max(1));
    (rows as f32 * row_height + 2.0 * padding).max(minimum)
}

/// A page sequence drawn top to bottom as banded sections.
///
/// Each section is a coloured header bar followed by a bordered content box. A running
/// cursor tracks the next free y; a section that would cross the bottom margin starts on a
/// fresh page instead.
pub struct Sheet<'f> {
    canvas: Canvas<'f>,
    cursor: f32,
}

impl<'f> Sheet<'f> {
    pub fn new(fonts: &'f FontSet, size: PageSize) -> Self {
        Self {
            canvas: Canvas::new(fonts, size),
            cursor: MARGIN,
        }
    }

    pub fn canvas(&mut self) -> &mut Canvas<'f> {
        &mut self.canvas
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn advance(&mut self, by: f32) {
        self.cursor += by;
    }

    pub fn content_width(&self) -> f32 {
        self.canvas.width() - 2.0 * MARGIN
    }

    pub fn remaining(&self) -> f32 {
        self.canvas.height() - MARGIN - self.cursor
    }

    pub fn page_break(&mut self) {
        self.canvas.add_page();
        self.cursor = MARGIN;
    }

    /// Break the page unless `height` still fits below the cursor.
    pub fn ensure_space(&mut self, height: f32) {
        if height > self.remaining() && self.cursor > MARGIN {
            self.page_break();
        }
        if height > self.remaining() {
            log::warn!(
                "Section of {:.1}mm is taller than a page and will overflow the bottom margin",
                height
            );
        }
    }

    /// Document title band with an optional right-aligned reference line.
    pub fn title(&mut self, title: &str, reference: Option<&str>) {
        let width = self.content_width();
        let band = Rect::new(MARGIN, self.cursor, width, 12.0);
        self.canvas.fill_rect(band, Color::HEADER);
        let measure = self.canvas.measure(14.0, Weight::Bold);
        let fitted = truncate(&measure, title, width - 6.0);
        self.canvas.text(MARGIN + 3.0, self.cursor + 8.2, &fitted, 14.0, Weight::Bold, Color::WHITE);
        self.cursor += band.h;

        if let Some(reference) = reference {
            self.cursor += 1.5;
            self.canvas.text_aligned(
                MARGIN,
                width,
                self.cursor + 3.5,
                reference,
                8.0,
                Weight::Regular,
                Color::MUTED,
                crate::layout::Align::Right,
            );
            self.cursor += 4.0;
        }
        self.cursor += SECTION_GAP;
    }

    /// Coloured bar with a white caption at the cursor.
    pub fn header_bar(&mut self, title: &str) {
        let width = self.content_width();
        let bar = Rect::new(MARGIN, self.cursor, width, HEADER_BAR_HEIGHT);
        self.canvas.fill_rect(bar, Color::HEADER);
        let measure = self.canvas.measure(10.0, Weight::Bold);
        let fitted = truncate(&measure, title, width - 6.0);
        self.canvas.text(MARGIN + 3.0, bar.y + 4.9, &fitted, 10.0, Weight::Bold, Color::WHITE);
        self.cursor = bar.bottom();
    }

    /// Draw a banded section whose content box is `content_height` tall.
    pub fn section<F>(&mut self, title: &str, content_height: f32, draw: F)
    where
        F: FnOnce(&mut Canvas<'f>, Rect),
    {
        self.ensure_space(HEADER_BAR_HEIGHT + content_height);
        self.header_bar(title);

        let content = Rect::new(MARGIN, self.cursor, self.content_width(), content_height);
        self.canvas.stroke_rect(content, Color::BORDER, 0.3);
        draw(&mut self.canvas, content);

        self.cursor = content.bottom() + SECTION_GAP;
    }

    pub fn finish(self, title: &str) -> Result<Vec<u8>, crate::layout::LayoutError> {
        self.canvas.finish(title)
    }
}

/// Two-column "label: value" rows inside a content box. Values wrap within their column.
pub fn label_value_rows(canvas: &mut Canvas<'_>, area: Rect, label_width: f32, rows: &[(&str, &str)]) -> f32 {
    let inner = area.inset(BOX_PADDING);
    let value_x = inner.x + label_width;
    let value_width = inner.w - label_width;
    let label_measure = canvas.measure(LABEL_SIZE, Weight::Bold);
    let value_measure = canvas.measure(BODY_SIZE, Weight::Regular);

    let mut y = inner.y;
    for (label, value) in rows {
        let label = truncate(&label_measure, label, label_width - 2.0);
        canvas.text(inner.x, y + 4.2, &label, LABEL_SIZE, Weight::Bold, Color::BLACK);
        let mut lines = 0;
        for line in wrap(value_measure, value, value_width) {
            canvas.text(value_x, y + 4.2 + lines as f32 * 4.5, &line, BODY_SIZE, Weight::Regular, Color::BLACK);
            lines += 1;
        }
        y += ROW_HEIGHT.max(lines as f32 * 4.5 + 1.5);
    }
    y - inner.y
}

/// Height `label_value_rows` will need for the same rows.
pub fn label_value_height(fonts: &FontSet, width: f32, label_width: f32, rows: &[(&str, &str)]) -> f32 {
    let value_measure = fonts.measure(BODY_SIZE, Weight::Regular);
    let value_width = width - 2.0 * BOX_PADDING - label_width;
    let body: f32 = rows
        .iter()
        .map(|(_, value)| {
            let lines = wrap(value_measure, value, value_width).count();
            ROW_HEIGHT.max(lines as f32 * 4.5 + 1.5)
        })
        .sum();
    body + 2.0 * BOX_PADDING
}

/// A signature block: role caption, name, title, and a line to sign on.
pub fn signature_block(canvas: &mut Canvas<'_>, area: Rect, role: &str, name: Option<&str>, title: Option<&str>) {
    let bold = canvas.measure(LABEL_SIZE, Weight::Bold);
    let regular = canvas.measure(BODY_SIZE, Weight::Regular);
    let width = area.w - 4.0;
    let role = truncate(&bold, role, width);
    let name = truncate(&regular, or_placeholder(name), width);
    let title = truncate(&regular, or_placeholder(title), width);

    canvas.text_aligned(area.x + 2.0, width, area.y + 5.0, &role, LABEL_SIZE, Weight::Bold, Color::HEADER, crate::layout::Align::Center);
    canvas.text_aligned(area.x + 2.0, width, area.y + 10.5, &name, BODY_SIZE, Weight::Regular, Color::BLACK, crate::layout::Align::Center);
    canvas.text_aligned(area.x + 2.0, width, area.y + 15.0, &title, BODY_SIZE, Weight::Regular, Color::MUTED, crate::layout::Align::Center);
    let line_y = area.bottom() - 5.0;
    canvas.line(area.x + 8.0, line_y, area.right() - 8.0, line_y, Color::BORDER, 0.3);
    canvas.text_aligned(area.x + 2.0, width, line_y + 3.5, "İmza", 7.0, Weight::Regular, Color::MUTED, crate::layout::Align::Center);
}

/// Square checkbox with a caption; checked boxes are filled.
pub fn checkbox(canvas: &mut Canvas<'_>, x: f32, y: f32, label: &str, checked: bool, max_width: f32) {
    let square = Rect::new(x, y, 3.5, 3.5);
    if checked {
        canvas.fill_rect(square, Color::ACCENT);
    }
    canvas.stroke_rect(square, Color::BLACK, 0.25);
    let measure = canvas.measure(BODY_SIZE, Weight::Regular);
    let label = truncate(&measure, label, max_width - 5.5);
    canvas.text(x + 5.5, y + 3.0, &label, BODY_SIZE, Weight::Regular, Color::BLACK);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_years_keeps_day_and_month() {
        assert_eq!(add_years("15.03.2025", 4).as_deref(), Some("15.03.2029"));
        assert_eq!(add_years("29.02.2024", 1).as_deref(), Some("28.02.2025"));
        assert_eq!(add_years("2025-03-15", 1), None);
    }

    #[test]
    fn test_placeholder_for_missing_values() {
        assert_eq!(or_placeholder(None), PLACEHOLDER);
        assert_eq!(or_placeholder(Some("   ")), PLACEHOLDER);
        assert_eq!(or_placeholder(Some("Ankara")), "Ankara");
    }

    #[test]
    fn test_checklist_height_uses_rows_not_items() {
        // 7 items in 2 columns need 4 rows
        assert_eq!(checklist_height(7, 2, 6.0, 3.0, 10.0), 4.0 * 6.0 + 6.0);
        assert_eq!(checklist_height(0, 2, 6.0, 3.0, 10.0), 10.0);
    }

    #[test]
    fn test_section_breaks_page_when_full() {
        let fonts = FontSet::builtin();
        let mut sheet = Sheet::new(&fonts, PageSize::A4Portrait);
        sheet.section("Birinci", 200.0, |_, _| {});
        sheet.section("İkinci", 100.0, |_, area| assert_eq!(area.y, MARGIN + HEADER_BAR_HEIGHT));
        assert_eq!(sheet.canvas().page_count(), 2);
    }
}
