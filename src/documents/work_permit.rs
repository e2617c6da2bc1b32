//! Çalışma İzni (permit to work) form.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common::{
    checkbox, checklist_height, label_value_height, label_value_rows, or_placeholder, signature_block, Sheet,
    BODY_SIZE, BOX_PADDING, ROW_HEIGHT,
};
use super::company::Company;
use super::naming::document_file_name;
use super::traits::{Render, Validator};
use super::{DocumentKind, GeneratedDocument, OutputFormat, RenderError, Signatory};
use crate::layout::{draw_badges, layout_badges, BadgeStyle, Color, FontSet, PageSize, Rect, Weight};

const LABEL_WIDTH: f32 = 40.0;
const PERMIT_COLUMNS: usize = 3;
const SAFETY_COLUMNS: usize = 2;
const MIN_CHECKLIST_HEIGHT: f32 = 12.0;
const SIGNATURE_HEIGHT: f32 = 26.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PermitType {
    HotWork,
    WorkAtHeight,
    ConfinedSpace,
    Electrical,
    Excavation,
    Chemical,
    Lifting,
    Other,
}

impl PermitType {
    pub const ALL: [PermitType; 8] = [
        PermitType::HotWork,
        PermitType::WorkAtHeight,
        PermitType::ConfinedSpace,
        PermitType::Electrical,
        PermitType::Excavation,
        PermitType::Chemical,
        PermitType::Lifting,
        PermitType::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PermitType::HotWork => "Sıcak Çalışma",
            PermitType::WorkAtHeight => "Yüksekte Çalışma",
            PermitType::ConfinedSpace => "Kapalı Alan",
            PermitType::Electrical => "Elektrikli Çalışma",
            PermitType::Excavation => "Kazı Çalışması",
            PermitType::Chemical => "Kimyasal Madde",
            PermitType::Lifting => "Kaldırma İşlemi",
            PermitType::Other => "Diğer",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkPermitRequest {
    pub company: Company,
    #[serde(default)]
    pub permit_number: Option<String>,
    /// dd.mm.yyyy
    pub issue_date: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    /// Start of the permitted window, e.g. "08:00"
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub permit_types: Vec<PermitType>,
    #[serde(default)]
    pub safety_measures: Vec<String>,
    /// Personal protective equipment labels.
    #[serde(default)]
    pub ppe: Vec<String>,
    #[serde(default)]
    pub requester: Option<Signatory>,
    #[serde(default)]
    pub approver: Option<Signatory>,
}

/// Height of the safety-measure box for `items` entries.
pub fn safety_checklist_height(items: usize) -> f32 {
    checklist_height(items, SAFETY_COLUMNS, ROW_HEIGHT, BOX_PADDING, MIN_CHECKLIST_HEIGHT)
}

fn draw_checklist<'a, I>(canvas: &mut crate::layout::Canvas<'_>, area: Rect, columns: usize, items: I)
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    let inner = area.inset(BOX_PADDING);
    let column_width = inner.w / columns as f32;
    for (i, (label, checked)) in items.into_iter().enumerate() {
        let x = inner.x + (i % columns) as f32 * column_width;
        let y = inner.y + (i / columns) as f32 * ROW_HEIGHT + 1.0;
        checkbox(canvas, x, y, label, checked, column_width - 2.0);
    }
}

impl Validator for WorkPermitRequest {
    fn validate(&self) -> Result<(), String> {
        use super::validation::*;

        let mut errors = ValidationErrors::new();
        validate_required(&self.company.name, "company.name", "Firma Unvanı", &mut errors);
        validate_date(&self.issue_date, "issue_date", "Düzenleme Tarihi", &mut errors);
        validate_required(&self.location, "location", "Çalışma Yeri", &mut errors);
        validate_required(&self.start_time, "start_time", "Başlangıç Saati", &mut errors);
        validate_required(&self.end_time, "end_time", "Bitiş Saati", &mut errors);
        errors.into_result()
    }
}

impl Render for WorkPermitRequest {
    fn title(&self) -> String {
        format!("{} - Çalışma İzni", self.company.name)
    }

    fn render(&self, fonts: &FontSet) -> Result<Vec<GeneratedDocument>, RenderError> {
        let mut sheet = Sheet::new(fonts, PageSize::A4Portrait);
        let width = sheet.content_width();

        let reference = format!(
            "İzin No: {}   Tarih: {}",
            or_placeholder(self.permit_number.as_deref()),
            or_placeholder(Some(self.issue_date.as_str()))
        );
        sheet.title("ÇALIŞMA İZNİ FORMU", Some(reference.as_str()));

        let company_rows = [
            ("Firma Unvanı", self.company.name.as_str()),
            ("Adres", or_placeholder(self.company.address.as_deref())),
        ];
        let height = label_value_height(fonts, width, LABEL_WIDTH, &company_rows);
        sheet.section("İşyeri Bilgileri", height, |canvas, area| {
            label_value_rows(canvas, area, LABEL_WIDTH, &company_rows);
        });

        let window = format!("{} - {}", self.start_time.trim(), self.end_time.trim());
        let work_rows = [
            ("Çalışma Yeri", self.location.as_str()),
            ("Çalışma Saatleri", window.as_str()),
            ("İşin Tanımı", or_placeholder(Some(self.description.as_str()))),
        ];
        let height = label_value_height(fonts, width, LABEL_WIDTH, &work_rows);
        sheet.section("Çalışma Bilgileri", height, |canvas, area| {
            label_value_rows(canvas, area, LABEL_WIDTH, &work_rows);
        });

        let height = checklist_height(PermitType::ALL.len(), PERMIT_COLUMNS, ROW_HEIGHT, BOX_PADDING, MIN_CHECKLIST_HEIGHT);
        sheet.section("İzin Türü", height, |canvas, area| {
            let items = PermitType::ALL
                .iter()
                .map(|kind| (kind.label(), self.permit_types.contains(kind)));
            draw_checklist(canvas, area, PERMIT_COLUMNS, items);
        });

        sheet.section(
            "Alınacak Güvenlik Önlemleri",
            safety_checklist_height(self.safety_measures.len()),
            |canvas, area| {
                if self.safety_measures.is_empty() {
                    let inner = area.inset(BOX_PADDING);
                    canvas.text(inner.x, inner.y + 4.0, super::common::PLACEHOLDER, BODY_SIZE, Weight::Regular, Color::MUTED);
                    return;
                }
                let items = self.safety_measures.iter().map(|m| (m.as_str(), true));
                draw_checklist(canvas, area, SAFETY_COLUMNS, items);
            },
        );

        let style = BadgeStyle::default();
        sheet.section("Kişisel Koruyucu Donanım", style.height + 2.0 * BOX_PADDING, |canvas, area| {
            let inner = area.inset(BOX_PADDING);
            if self.ppe.is_empty() {
                canvas.text(inner.x, inner.y + 4.0, super::common::PLACEHOLDER, BODY_SIZE, Weight::Regular, Color::MUTED);
                return;
            }
            let measure = canvas.measure(style.size, Weight::Bold);
            let placed = layout_badges(self.ppe.iter().map(String::as_str), &measure, inner.x, inner.right(), &style);
            draw_badges(canvas, &placed, inner.y, &style);
        });

        let requester = self.requester.as_ref();
        let approver = self.approver.as_ref();
        sheet.section("Onay", SIGNATURE_HEIGHT, |canvas, area| {
            let half = area.w / 2.0;
            signature_block(
                canvas,
                Rect::new(area.x, area.y, half, area.h),
                "İzni İsteyen",
                requester.map(|s| s.name.as_str()),
                requester.and_then(|s| s.title.as_deref()),
            );
            signature_block(
                canvas,
                Rect::new(area.x + half, area.y, half, area.h),
                "İzni Veren",
                approver.map(|s| s.name.as_str()),
                approver.and_then(|s| s.title.as_deref()),
            );
        });

        let bytes = sheet.finish(&self.title())?;
        Ok(vec![GeneratedDocument {
            filename: document_file_name(&self.company.name, DocumentKind::WorkPermit, OutputFormat::Pdf),
            bytes,
            format: OutputFormat::Pdf,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::company::DangerClass;

    fn request() -> WorkPermitRequest {
        WorkPermitRequest {
            company: Company {
                id: "c-9".into(),
                name: "Deniz Tersanecilik".into(),
                address: Some("Tuzla / İstanbul".into()),
                registration_number: None,
                employer: None,
                danger_class: DangerClass::CokTehlikeli,
            },
            permit_number: Some("CI-2025-014".into()),
            issue_date: "12.06.2025".into(),
            location: "3 No'lu kızak".into(),
            description: "Gövde saclarının kaynakla birleştirilmesi".into(),
            start_time: "08:00".into(),
            end_time: "17:30".into(),
            permit_types: vec![PermitType::HotWork, PermitType::WorkAtHeight],
            safety_measures: vec![
                "Yangın söndürücü hazır".into(),
                "Gaz ölçümü yapıldı".into(),
                "Alan bariyerle çevrildi".into(),
                "Yangın gözcüsü atandı".into(),
                "Yanıcı malzemeler uzaklaştırıldı".into(),
                "Emniyet kemeri kontrol edildi".into(),
                "İskele etiketi yeşil".into(),
            ],
            ppe: vec!["Baret".into(), "Kaynak Maskesi".into(), "Deri Eldiven".into()],
            requester: None,
            approver: Some(Signatory {
                name: "Hakan Yıldız".into(),
                title: Some("Vardiya Amiri".into()),
            }),
        }
    }

    #[test]
    fn test_seven_safety_measures_take_four_rows() {
        assert_eq!(safety_checklist_height(7), 4.0 * ROW_HEIGHT + 2.0 * BOX_PADDING);
        assert_eq!(safety_checklist_height(0), MIN_CHECKLIST_HEIGHT);
    }

    #[test]
    fn test_render_permit() {
        let fonts = FontSet::builtin();
        let docs = request().render(&fonts).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "Deniz Tersanecilik - Calisma Izni.pdf");
        let pdf = lopdf::Document::load_mem(&docs[0].bytes).unwrap();
        assert_eq!(pdf.get_pages().len(), 1);
    }

    #[test]
    fn test_many_measures_spill_onto_second_page() {
        let fonts = FontSet::builtin();
        let mut long = request();
        long.safety_measures = (1..=80).map(|i| format!("Önlem {}", i)).collect();
        let docs = long.render(&fonts).unwrap();
        let pdf = lopdf::Document::load_mem(&docs[0].bytes).unwrap();
        assert!(pdf.get_pages().len() >= 2);
    }

    #[test]
    fn test_permit_type_deserialization() {
        let kinds: Vec<PermitType> = serde_json::from_str(r#"["hot_work","confined_space"]"#).unwrap();
        assert_eq!(kinds, vec![PermitType::HotWork, PermitType::ConfinedSpace]);
    }
}
