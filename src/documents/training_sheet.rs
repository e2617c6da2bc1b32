//! Eğitim Katılım Formu: multi-day training schedule and participant roster.
//!
//! The roster is a grid with fixed identity columns and one signature column per training
//! day. It continues onto new pages with the header row repeated.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common::{
    label_value_height, label_value_rows, or_placeholder, signature_block, Sheet, BODY_SIZE, BOX_PADDING,
    HEADER_BAR_HEIGHT, MARGIN, SECTION_GAP,
};
use super::company::Company;
use super::naming::document_file_name;
use super::traits::{Render, Validator};
use super::{DocumentKind, GeneratedDocument, OutputFormat, Participant, RenderError, Signatory};
use crate::layout::{
    draw_badges, layout_badges, truncate, Align, BadgeStyle, Canvas, Color, FontSet, PageSize, Rect, Weight,
};

const LABEL_WIDTH: f32 = 40.0;
const SCHEDULE_ROW: f32 = 8.0;
const DATE_COLUMN: f32 = 34.0;
const TABLE_HEADER_HEIGHT: f32 = 10.0;
const TABLE_ROW_HEIGHT: f32 = 7.0;
const TABLE_TEXT_SIZE: f32 = 8.0;
const SIGNATURE_HEIGHT: f32 = 26.0;
// days beyond this switch the sheet to landscape
const PORTRAIT_DAY_LIMIT: usize = 4;

/// Fixed identity columns: label and width in mm.
const IDENTITY_COLUMNS: [(&str, f32); 4] = [("No", 9.0), ("Ad Soyad", 46.0), ("TC Kimlik No", 26.0), ("Görevi", 32.0)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubjectCategory {
    Genel,
    Saglik,
    Teknik,
    Diger,
}

impl SubjectCategory {
    pub const ALL: [SubjectCategory; 4] = [
        SubjectCategory::Genel,
        SubjectCategory::Saglik,
        SubjectCategory::Teknik,
        SubjectCategory::Diger,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SubjectCategory::Genel => "Genel Konular",
            SubjectCategory::Saglik => "Sağlık Konuları",
            SubjectCategory::Teknik => "Teknik Konular",
            SubjectCategory::Diger => "Diğer Konular",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrainingDay {
    /// dd.mm.yyyy
    pub date: String,
    #[serde(default)]
    pub categories: Vec<SubjectCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrainingSheetRequest {
    pub company: Company,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub trainer: Option<Signatory>,
    pub days: Vec<TrainingDay>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl Validator for TrainingSheetRequest {
    fn validate(&self) -> Result<(), String> {
        use super::validation::*;

        let mut errors = ValidationErrors::new();
        validate_required(&self.company.name, "company.name", "Firma Unvanı", &mut errors);
        validate_not_empty(&self.days, "days", "eğitim günü", &mut errors);
        for (i, day) in self.days.iter().enumerate() {
            validate_date(&day.date, &format!("days[{}].date", i), "Eğitim Tarihi", &mut errors);
        }
        for (i, participant) in self.participants.iter().enumerate() {
            validate_required(&participant.name, &format!("participants[{}].name", i), "Ad Soyad", &mut errors);
            validate_national_id_optional(
                &participant.national_id,
                &format!("participants[{}].national_id", i),
                &mut errors,
            );
        }
        errors.into_result()
    }
}

struct Column {
    label: String,
    caption: Option<String>,
    width: f32,
}

fn roster_columns(days: &[TrainingDay], table_width: f32) -> Vec<Column> {
    let mut columns: Vec<Column> = IDENTITY_COLUMNS
        .iter()
        .map(|(label, width)| Column {
            label: (*label).to_string(),
            caption: None,
            width: *width,
        })
        .collect();
    let fixed: f32 = IDENTITY_COLUMNS.iter().map(|(_, w)| w).sum();
    let day_width = (table_width - fixed) / days.len().max(1) as f32;
    for (i, day) in days.iter().enumerate() {
        columns.push(Column {
            label: format!("{}. Gün", i + 1),
            caption: Some(day.date.clone()),
            width: day_width,
        });
    }
    columns
}

fn draw_roster_header(canvas: &mut Canvas<'_>, y: f32, columns: &[Column]) {
    let table_width: f32 = columns.iter().map(|c| c.width).sum();
    canvas.fill_rect(Rect::new(MARGIN, y, table_width, TABLE_HEADER_HEIGHT), Color::SHADE);
    let bold = canvas.measure(TABLE_TEXT_SIZE, Weight::Bold);
    let small = canvas.measure(6.5, Weight::Regular);

    let mut x = MARGIN;
    for column in columns {
        let cell = Rect::new(x, y, column.width, TABLE_HEADER_HEIGHT);
        canvas.stroke_rect(cell, Color::BORDER, 0.25);
        let label = truncate(&bold, &column.label, column.width - 1.5);
        match &column.caption {
            Some(caption) => {
                canvas.text_aligned(x, column.width, y + 4.2, &label, TABLE_TEXT_SIZE, Weight::Bold, Color::HEADER, Align::Center);
                let caption = truncate(&small, caption, column.width - 1.0);
                canvas.text_aligned(x, column.width, y + 8.3, &caption, 6.5, Weight::Regular, Color::MUTED, Align::Center);
            }
            None => {
                canvas.text_aligned(x, column.width, y + 6.3, &label, TABLE_TEXT_SIZE, Weight::Bold, Color::HEADER, Align::Center);
            }
        }
        x += column.width;
    }
}

fn draw_roster_row(canvas: &mut Canvas<'_>, y: f32, index: usize, participant: &Participant, columns: &[Column]) {
    let table_width: f32 = columns.iter().map(|c| c.width).sum();
    if index % 2 == 1 {
        canvas.fill_rect(Rect::new(MARGIN, y, table_width, TABLE_ROW_HEIGHT), Color::SHADE);
    }
    let number = (index + 1).to_string();
    let cells = [
        number.as_str(),
        participant.name.as_str(),
        or_placeholder(Some(participant.national_id.as_str())),
        or_placeholder(participant.title.as_deref()),
    ];
    let measure = canvas.measure(TABLE_TEXT_SIZE, Weight::Regular);

    let mut x = MARGIN;
    for (i, column) in columns.iter().enumerate() {
        canvas.stroke_rect(Rect::new(x, y, column.width, TABLE_ROW_HEIGHT), Color::BORDER, 0.25);
        // signature columns stay blank
        if let Some(text) = cells.get(i) {
            let fitted = truncate(&measure, text, column.width - 2.0);
            canvas.text(x + 1.0, y + 4.8, &fitted, TABLE_TEXT_SIZE, Weight::Regular, Color::BLACK);
        }
        x += column.width;
    }
}

impl TrainingSheetRequest {
    fn page_size(&self) -> PageSize {
        if self.days.len() > PORTRAIT_DAY_LIMIT {
            PageSize::A4Landscape
        } else {
            PageSize::A4Portrait
        }
    }

    fn draw_roster(&self, sheet: &mut Sheet<'_>) {
        let columns = roster_columns(&self.days, sheet.content_width());

        sheet.ensure_space(HEADER_BAR_HEIGHT + TABLE_HEADER_HEIGHT + TABLE_ROW_HEIGHT);
        sheet.header_bar("Katılımcı Listesi");
        let y = sheet.cursor();
        draw_roster_header(sheet.canvas(), y, &columns);
        sheet.advance(TABLE_HEADER_HEIGHT);

        for (index, participant) in self.participants.iter().enumerate() {
            if sheet.remaining() < TABLE_ROW_HEIGHT {
                sheet.page_break();
                sheet.header_bar("Katılımcı Listesi (devam)");
                let y = sheet.cursor();
                draw_roster_header(sheet.canvas(), y, &columns);
                sheet.advance(TABLE_HEADER_HEIGHT);
            }
            let y = sheet.cursor();
            draw_roster_row(sheet.canvas(), y, index, participant, &columns);
            sheet.advance(TABLE_ROW_HEIGHT);
        }
        sheet.advance(SECTION_GAP);
    }
}

impl Render for TrainingSheetRequest {
    fn title(&self) -> String {
        format!("{} - Eğitim Katılım Formu", self.company.name)
    }

    fn render(&self, fonts: &FontSet) -> Result<Vec<GeneratedDocument>, RenderError> {
        let mut sheet = Sheet::new(fonts, self.page_size());
        let width = sheet.content_width();

        let reference = format!("Belge No: {}", or_placeholder(self.document_number.as_deref()));
        sheet.title("EĞİTİM KATILIM FORMU", Some(reference.as_str()));

        let trainer = self.trainer.as_ref();
        let rows = [
            ("Firma Unvanı", self.company.name.as_str()),
            ("SGK Sicil No", or_placeholder(self.company.registration_number.as_deref())),
            ("Tehlike Sınıfı", self.company.danger_class.label()),
            ("Eğitim Yeri", or_placeholder(self.location.as_deref())),
            ("Eğitimci", or_placeholder(trainer.map(|t| t.name.as_str()))),
        ];
        let height = label_value_height(fonts, width, LABEL_WIDTH, &rows);
        sheet.section("Eğitim Bilgileri", height, |canvas, area| {
            label_value_rows(canvas, area, LABEL_WIDTH, &rows);
        });

        let style = BadgeStyle {
            fill: Color::HEADER,
            ..BadgeStyle::default()
        };
        let schedule_height = self.days.len().max(1) as f32 * SCHEDULE_ROW + 2.0 * BOX_PADDING;
        sheet.section("Eğitim Programı", schedule_height, |canvas, area| {
            let inner = area.inset(BOX_PADDING);
            let measure = canvas.measure(style.size, Weight::Bold);
            for (i, day) in self.days.iter().enumerate() {
                let y = inner.y + i as f32 * SCHEDULE_ROW;
                let label = format!("{}. Gün  {}", i + 1, day.date);
                canvas.text(inner.x, y + 4.3, &label, BODY_SIZE, Weight::Bold, Color::BLACK);
                let labels = day.categories.iter().map(|c| c.label());
                let placed = layout_badges(labels, &measure, inner.x + DATE_COLUMN, inner.right(), &style);
                if placed.is_empty() {
                    canvas.text(inner.x + DATE_COLUMN, y + 4.3, super::common::PLACEHOLDER, BODY_SIZE, Weight::Regular, Color::MUTED);
                }
                draw_badges(canvas, &placed, y, &style);
            }
        });

        self.draw_roster(&mut sheet);

        let employer = self.company.employer.as_deref();
        sheet.section("Onay", SIGNATURE_HEIGHT, |canvas, area| {
            let half = area.w / 2.0;
            signature_block(
                canvas,
                Rect::new(area.x, area.y, half, area.h),
                "Eğitimci",
                trainer.map(|t| t.name.as_str()),
                trainer.and_then(|t| t.title.as_deref()),
            );
            signature_block(canvas, Rect::new(area.x + half, area.y, half, area.h), "İşveren / İşveren Vekili", employer, None);
        });

        let bytes = sheet.finish(&self.title())?;
        Ok(vec![GeneratedDocument {
            filename: document_file_name(&self.company.name, DocumentKind::TrainingSheet, OutputFormat::Pdf),
            bytes,
            format: OutputFormat::Pdf,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::company::DangerClass;

    fn request(participants: usize, days: usize) -> TrainingSheetRequest {
        TrainingSheetRequest {
            company: Company {
                id: "c-3".into(),
                name: "Ege Gıda Üretim".into(),
                address: None,
                registration_number: None,
                employer: Some("Zeynep Arslan".into()),
                danger_class: DangerClass::Tehlikeli,
            },
            document_number: None,
            location: Some("Toplantı Salonu".into()),
            trainer: Some(Signatory {
                name: "Ali Çelik".into(),
                title: Some("A Sınıfı İGU".into()),
            }),
            days: (0..days)
                .map(|i| TrainingDay {
                    date: format!("{:02}.09.2025", i + 1),
                    categories: vec![SubjectCategory::Genel, SubjectCategory::Teknik],
                })
                .collect(),
            participants: (0..participants)
                .map(|i| Participant {
                    name: format!("Katılımcı {}", i + 1),
                    national_id: "10000000146".into(),
                    title: Some("Operatör".into()),
                })
                .collect(),
        }
    }

    #[test]
    fn test_roster_columns_fill_table_width() {
        let req = request(1, 3);
        let columns = roster_columns(&req.days, 180.0);
        assert_eq!(columns.len(), 4 + 3);
        let total: f32 = columns.iter().map(|c| c.width).sum();
        assert!((total - 180.0).abs() < 0.01);
        assert_eq!(columns[5].label, "2. Gün");
    }

    #[test]
    fn test_small_roster_fits_one_page() {
        let fonts = FontSet::builtin();
        let docs = request(5, 2).render(&fonts).unwrap();
        assert_eq!(docs[0].filename, "Ege Gida - Egitim Katilim Formu.pdf");
        let pdf = lopdf::Document::load_mem(&docs[0].bytes).unwrap();
        assert_eq!(pdf.get_pages().len(), 1);
    }

    #[test]
    fn test_long_roster_continues_on_next_page() {
        let fonts = FontSet::builtin();
        let docs = request(60, 2).render(&fonts).unwrap();
        let pdf = lopdf::Document::load_mem(&docs[0].bytes).unwrap();
        assert!(pdf.get_pages().len() >= 2);
    }

    #[test]
    fn test_many_days_switch_to_landscape() {
        assert_eq!(request(1, 2).page_size(), PageSize::A4Portrait);
        assert_eq!(request(1, 6).page_size(), PageSize::A4Landscape);
    }

    #[test]
    fn test_validation_checks_days_and_ids() {
        let mut req = request(1, 0);
        req.participants[0].national_id = "123".into();
        let message = req.validate().unwrap_err();
        assert!(message.contains("days"));
        assert!(message.contains("participants[0].national_id"));
    }
}
