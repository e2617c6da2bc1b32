//! Acil Durum Eylem Planı (emergency action plan) cover document.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common::{
    add_years, label_value_height, label_value_rows, or_placeholder, signature_block, Sheet, BOX_PADDING,
    BODY_SIZE,
};
use super::company::Company;
use super::naming::document_file_name;
use super::traits::{Render, Validator};
use super::{DocumentKind, GeneratedDocument, OutputFormat, RenderError, Signatory};
use crate::layout::{draw_badges, layout_badges, wrap, BadgeStyle, Color, FontSet, PageSize, Rect, Weight};

const LABEL_WIDTH: f32 = 48.0;
const SIGNATURE_HEIGHT: f32 = 26.0;

const SCOPE_TEXT: &str = "Bu plan, işyerinde meydana gelebilecek yangın, deprem, patlama, kimyasal \
yayılım ve benzeri acil durumlarda çalışanların ve ziyaretçilerin güvenliğini sağlamak; müdahale, \
tahliye ve ilk yardım görevlerini önceden belirlemek amacıyla 6331 sayılı İş Sağlığı ve Güvenliği \
Kanunu ile İşyerlerinde Acil Durumlar Hakkında Yönetmelik hükümlerine göre hazırlanmıştır.";

const DEFAULT_EMERGENCIES: [&str; 5] = ["Yangın", "Deprem", "Sel", "Patlama", "İlk Yardım"];

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmergencyPlanRequest {
    pub company: Company,
    /// Preparation date, dd.mm.yyyy
    pub preparation_date: String,
    /// Derived from the danger class when omitted.
    #[serde(default)]
    pub validity_date: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub revision: Option<String>,
    /// Emergency types covered by the plan; the standard set when empty.
    #[serde(default)]
    pub emergency_types: Vec<String>,
    #[serde(default)]
    pub expert: Option<Signatory>,
    #[serde(default)]
    pub doctor: Option<Signatory>,
}

impl EmergencyPlanRequest {
    pub fn validity_date(&self) -> Option<String> {
        match self.validity_date.as_deref().map(str::trim) {
            Some(date) if !date.is_empty() => Some(date.to_string()),
            _ => add_years(
                &self.preparation_date,
                self.company.danger_class.emergency_plan_validity_years(),
            ),
        }
    }

    fn emergency_labels(&self) -> Vec<&str> {
        if self.emergency_types.is_empty() {
            DEFAULT_EMERGENCIES.to_vec()
        } else {
            self.emergency_types.iter().map(String::as_str).collect()
        }
    }
}

impl Validator for EmergencyPlanRequest {
    fn validate(&self) -> Result<(), String> {
        use super::validation::*;

        let mut errors = ValidationErrors::new();
        validate_required(&self.company.name, "company.name", "Firma Unvanı", &mut errors);
        validate_date(&self.preparation_date, "preparation_date", "Hazırlanma Tarihi", &mut errors);
        validate_date_optional(self.validity_date.as_deref(), "validity_date", &mut errors);
        errors.into_result()
    }
}

impl Render for EmergencyPlanRequest {
    fn title(&self) -> String {
        format!("{} - Acil Durum Eylem Planı", self.company.name)
    }

    fn render(&self, fonts: &FontSet) -> Result<Vec<GeneratedDocument>, RenderError> {
        let mut sheet = Sheet::new(fonts, PageSize::A4Portrait);
        let width = sheet.content_width();
        let company = &self.company;

        let reference = format!(
            "Belge No: {}   Revizyon: {}",
            or_placeholder(self.document_number.as_deref()),
            or_placeholder(self.revision.as_deref())
        );
        sheet.title("ACİL DURUM EYLEM PLANI", Some(reference.as_str()));

        let company_rows = [
            ("Firma Unvanı", company.name.as_str()),
            ("Adres", or_placeholder(company.address.as_deref())),
            ("SGK Sicil No", or_placeholder(company.registration_number.as_deref())),
            ("İşveren / Vekili", or_placeholder(company.employer.as_deref())),
            ("Tehlike Sınıfı", company.danger_class.label()),
        ];
        let height = label_value_height(fonts, width, LABEL_WIDTH, &company_rows);
        sheet.section("İşyeri Bilgileri", height, |canvas, area| {
            label_value_rows(canvas, area, LABEL_WIDTH, &company_rows);
        });

        let validity = self.validity_date();
        let document_rows = [
            ("Hazırlanma Tarihi", or_placeholder(Some(self.preparation_date.as_str()))),
            ("Geçerlilik Tarihi", or_placeholder(validity.as_deref())),
            ("Belge No", or_placeholder(self.document_number.as_deref())),
            ("Revizyon No", or_placeholder(self.revision.as_deref())),
        ];
        let height = label_value_height(fonts, width, LABEL_WIDTH, &document_rows);
        sheet.section("Belge Bilgileri", height, |canvas, area| {
            label_value_rows(canvas, area, LABEL_WIDTH, &document_rows);
        });

        let body = fonts.measure(BODY_SIZE, Weight::Regular);
        let scope_lines: Vec<_> = wrap(body, SCOPE_TEXT, width - 2.0 * BOX_PADDING).collect();
        let height = scope_lines.len() as f32 * 4.5 + 2.0 * BOX_PADDING;
        sheet.section("Amaç ve Kapsam", height, |canvas, area| {
            let inner = area.inset(BOX_PADDING);
            for (i, line) in scope_lines.iter().enumerate() {
                canvas.text(inner.x, inner.y + 3.5 + i as f32 * 4.5, line, BODY_SIZE, Weight::Regular, Color::BLACK);
            }
        });

        let style = BadgeStyle::default();
        let labels = self.emergency_labels();
        sheet.section("Acil Durum Türleri", style.height + 2.0 * BOX_PADDING, |canvas, area| {
            let inner = area.inset(BOX_PADDING);
            let measure = canvas.measure(style.size, Weight::Bold);
            let placed = layout_badges(labels.iter().copied(), &measure, inner.x, inner.right(), &style);
            draw_badges(canvas, &placed, inner.y, &style);
        });

        let expert = self.expert.as_ref();
        let doctor = self.doctor.as_ref();
        sheet.section("Onay", SIGNATURE_HEIGHT, |canvas, area| {
            let column = area.w / 3.0;
            let cell = |i: usize| Rect::new(area.x + i as f32 * column, area.y, column, area.h);
            signature_block(canvas, cell(0), "İşveren / İşveren Vekili", company.employer.as_deref(), None);
            signature_block(
                canvas,
                cell(1),
                "İş Güvenliği Uzmanı",
                expert.map(|s| s.name.as_str()),
                expert.and_then(|s| s.title.as_deref()),
            );
            signature_block(
                canvas,
                cell(2),
                "İşyeri Hekimi",
                doctor.map(|s| s.name.as_str()),
                doctor.and_then(|s| s.title.as_deref()),
            );
        });

        let title = self.title();
        let bytes = sheet.finish(&title)?;
        Ok(vec![GeneratedDocument {
            filename: document_file_name(&company.name, DocumentKind::EmergencyPlan, OutputFormat::Pdf),
            bytes,
            format: OutputFormat::Pdf,
        }])
    }
}
