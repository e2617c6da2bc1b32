//! Temel İSG eğitim sertifikası. One landscape page per participant.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common::{add_years, or_placeholder, signature_block, BODY_SIZE};
use super::company::Company;
use super::naming::document_file_name;
use super::traits::{Render, Validator};
use super::{DocumentKind, GeneratedDocument, OutputFormat, Participant, RenderError, Signatory};
use crate::layout::{truncate, wrap, Align, Canvas, Color, FontSet, PageSize, Rect, Weight};

const FRAME_INSET: f32 = 8.0;
const SIDE: f32 = 20.0;
const CURRICULUM_TOP: f32 = 98.0;
const CURRICULUM_SIZE: f32 = 7.0;
const CURRICULUM_LINE: f32 = 3.2;
const SIGNATURE_TOP: f32 = 170.0;

const GENERAL_SUBJECTS: &[&str] = &[
    "Çalışma mevzuatı ile ilgili bilgiler",
    "Çalışanların yasal hak ve sorumlulukları",
    "İşyeri temizliği ve düzeni",
    "İş kazası ve meslek hastalığından doğan hukuki sonuçlar",
];

const HEALTH_SUBJECTS: &[&str] = &[
    "Meslek hastalıklarının sebepleri",
    "Hastalıktan korunma prensipleri ve korunma tekniklerinin uygulanması",
    "Biyolojik ve psikososyal risk etmenleri",
    "İlk yardım",
    "Tütün ürünlerinin zararları ve pasif etkilenim",
];

const TECHNICAL_SUBJECTS: &[&str] = &[
    "Kimyasal, fiziksel ve ergonomik risk etmenleri",
    "Elle kaldırma ve taşıma",
    "Parlama, patlama, yangın ve yangından korunma",
    "İş ekipmanlarının güvenli kullanımı",
    "Ekranlı araçlarla çalışma",
    "Elektrik tehlikeleri, riskleri ve önlemleri",
    "İş kazalarının sebepleri ve korunma prensipleri",
    "Güvenlik ve sağlık işaretleri",
    "Kişisel koruyucu donanım kullanımı",
    "İSG genel kuralları ve güvenlik kültürü",
    "Tahliye ve kurtarma",
];

const CURRICULUM: [(&str, &[&str]); 3] = [
    ("Genel Konular", GENERAL_SUBJECTS),
    ("Sağlık Konuları", HEALTH_SUBJECTS),
    ("Teknik Konular", TECHNICAL_SUBJECTS),
];

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CertificateRequest {
    pub company: Company,
    pub participants: Vec<Participant>,
    /// First training day, dd.mm.yyyy
    pub training_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Derived from the danger class when omitted.
    #[serde(default)]
    pub validity_date: Option<String>,
    #[serde(default)]
    pub certificate_number: Option<String>,
    #[serde(default)]
    pub trainer: Option<Signatory>,
    #[serde(default)]
    pub doctor: Option<Signatory>,
}

impl CertificateRequest {
    pub fn duration_hours(&self) -> u32 {
        self.company.danger_class.training_hours()
    }

    pub fn validity_date(&self) -> Option<String> {
        if let Some(date) = self.validity_date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            return Some(date.to_string());
        }
        let last_day = self
            .end_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&self.training_date);
        add_years(last_day, self.company.danger_class.training_validity_years())
    }

    fn date_span(&self) -> String {
        match self.end_date.as_deref().map(str::trim) {
            Some(end) if !end.is_empty() && end != self.training_date.trim() => {
                format!("{} - {}", self.training_date.trim(), end)
            }
            _ => self.training_date.trim().to_string(),
        }
    }

    fn number_for(&self, index: usize) -> Option<String> {
        let base = self.certificate_number.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        if self.participants.len() > 1 {
            Some(format!("{}-{}", base, index + 1))
        } else {
            Some(base.to_string())
        }
    }

    fn draw(&self, canvas: &mut Canvas<'_>, participant: &Participant, number: Option<&str>) {
        let width = canvas.width();
        let height = canvas.height();
        let inner_width = width - 2.0 * SIDE;

        let outer = Rect::new(FRAME_INSET, FRAME_INSET, width - 2.0 * FRAME_INSET, height - 2.0 * FRAME_INSET);
        canvas.stroke_rect(outer, Color::HEADER, 1.2);
        canvas.stroke_rect(outer.inset(2.0), Color::BADGE, 0.4);

        canvas.text_aligned(SIDE, inner_width, 30.0, "EĞİTİM SERTİFİKASI", 24.0, Weight::Bold, Color::HEADER, Align::Center);
        canvas.text_aligned(
            SIDE,
            inner_width,
            38.0,
            "Temel İş Sağlığı ve Güvenliği Eğitimi",
            12.0,
            Weight::Regular,
            Color::MUTED,
            Align::Center,
        );

        let name_measure = canvas.measure(20.0, Weight::Bold);
        let name = truncate(&name_measure, &participant.name, inner_width);
        canvas.text_aligned(SIDE, inner_width, 52.0, &name, 20.0, Weight::Bold, Color::BLACK, Align::Center);
        let identity = format!(
            "TC Kimlik No: {}    Görevi: {}",
            or_placeholder(Some(participant.national_id.as_str())),
            or_placeholder(participant.title.as_deref())
        );
        canvas.text_aligned(SIDE, inner_width, 59.0, &identity, 10.0, Weight::Regular, Color::BLACK, Align::Center);

        let statement = format!(
            "{} bünyesinde {} tarihinde düzenlenen {} saatlik temel iş sağlığı ve güvenliği eğitimini \
             başarıyla tamamlayarak bu sertifikayı almaya hak kazanmıştır.",
            self.company.name,
            self.date_span(),
            self.duration_hours()
        );
        let body = canvas.measure(11.0, Weight::Regular);
        let mut y = 68.0;
        for line in wrap(body, &statement, inner_width - 20.0) {
            canvas.text_aligned(SIDE, inner_width, y, &line, 11.0, Weight::Regular, Color::BLACK, Align::Center);
            y += 5.0;
        }

        let validity = self.validity_date();
        let details = format!(
            "Sertifika No: {}    Tehlike Sınıfı: {}    Süre: {} saat    Geçerlilik: {}",
            or_placeholder(number),
            self.company.danger_class.label(),
            self.duration_hours(),
            or_placeholder(validity.as_deref())
        );
        canvas.text_aligned(SIDE, inner_width, y + 3.0, &details, BODY_SIZE, Weight::Bold, Color::HEADER, Align::Center);

        self.draw_curriculum(canvas, inner_width);

        let column = inner_width / 3.0;
        let cell = |i: usize| Rect::new(SIDE + i as f32 * column, SIGNATURE_TOP, column, 26.0);
        let trainer = self.trainer.as_ref();
        let doctor = self.doctor.as_ref();
        signature_block(canvas, cell(0), "Eğitimci", trainer.map(|s| s.name.as_str()), trainer.and_then(|s| s.title.as_deref()));
        signature_block(canvas, cell(1), "İşyeri Hekimi", doctor.map(|s| s.name.as_str()), doctor.and_then(|s| s.title.as_deref()));
        signature_block(canvas, cell(2), "İşveren / İşveren Vekili", self.company.employer.as_deref(), None);
    }

    fn draw_curriculum(&self, canvas: &mut Canvas<'_>, inner_width: f32) {
        let gap = 4.0;
        let column = (inner_width - 2.0 * gap) / 3.0;
        let measure = canvas.measure(CURRICULUM_SIZE, Weight::Regular);

        for (i, (heading, subjects)) in CURRICULUM.iter().enumerate() {
            let x = SIDE + i as f32 * (column + gap);
            let bar = Rect::new(x, CURRICULUM_TOP, column, 6.0);
            canvas.fill_rect(bar, Color::HEADER);
            canvas.text_aligned(x, column, bar.y + 4.3, heading, 9.0, Weight::Bold, Color::WHITE, Align::Center);

            let mut y = bar.bottom() + 3.5;
            for subject in subjects.iter() {
                let mut first = true;
                for line in wrap(measure, subject, column - 5.0) {
                    if first {
                        canvas.text(x + 1.0, y, "•", CURRICULUM_SIZE, Weight::Regular, Color::BADGE);
                        first = false;
                    }
                    canvas.text(x + 4.0, y, &line, CURRICULUM_SIZE, Weight::Regular, Color::BLACK);
                    y += CURRICULUM_LINE;
                }
            }
        }
    }
}

impl Validator for CertificateRequest {
    fn validate(&self) -> Result<(), String> {
        use super::validation::*;

        let mut errors = ValidationErrors::new();
        validate_required(&self.company.name, "company.name", "Firma Unvanı", &mut errors);
        validate_date(&self.training_date, "training_date", "Eğitim Tarihi", &mut errors);
        validate_date_optional(self.end_date.as_deref(), "end_date", &mut errors);
        validate_date_optional(self.validity_date.as_deref(), "validity_date", &mut errors);
        validate_not_empty(&self.participants, "participants", "katılımcı", &mut errors);
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

impl Render for CertificateRequest {
    fn title(&self) -> String {
        format!("{} - Eğitim Sertifikaları", self.company.name)
    }

    fn render(&self, fonts: &FontSet) -> Result<Vec<GeneratedDocument>, RenderError> {
        if self.participants.is_empty() {
            return Err(RenderError::NothingToRender("participants"));
        }

        let mut documents = Vec::with_capacity(self.participants.len());
        for (index, participant) in self.participants.iter().enumerate() {
            let mut canvas = Canvas::new(fonts, PageSize::A4Landscape);
            let number = self.number_for(index);
            self.draw(&mut canvas, participant, number.as_deref());

            let title = format!("{} - Eğitim Sertifikası", participant.name);
            documents.push(GeneratedDocument {
                filename: document_file_name(&participant.name, DocumentKind::Certificate, OutputFormat::Pdf),
                bytes: canvas.finish(&title)?,
                format: OutputFormat::Pdf,
            });
        }
        Ok(documents)
    }
}
