//! Document kinds and the single-document renderer.
//!
//! Each kind is its own request type carrying only the fields it needs:
//! - `EmergencyPlanRequest` - Acil Durum Eylem Planı
//! - `WorkPermitRequest` - Çalışma İzni
//! - `TrainingSheetRequest` - Eğitim Katılım Formu
//! - `CertificateRequest` - Eğitim Sertifikası, one per participant
//!
//! [`DocumentRequest`] is the tagged union over them, dispatched through [`Render`].

pub mod certificate;
pub mod common;
pub mod company;
pub mod emergency_plan;
pub mod handlers;
pub mod naming;
pub mod traits;
pub mod training_sheet;
pub mod validation;
pub mod work_permit;

pub use certificate::CertificateRequest;
pub use company::{Company, DangerClass};
pub use emergency_plan::EmergencyPlanRequest;
pub use traits::{Render, Validator};
pub use training_sheet::{SubjectCategory, TrainingDay, TrainingSheetRequest};
pub use work_permit::{PermitType, WorkPermitRequest};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use crate::layout::{FontSet, LayoutError};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to lay out document: {0}")]
    Layout(#[from] LayoutError),
    #[error("nothing to render: {0} is empty")]
    NothingToRender(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    EmergencyPlan,
    WorkPermit,
    TrainingSheet,
    Certificate,
}

impl DocumentKind {
    pub fn slug(self) -> &'static str {
        match self {
            DocumentKind::EmergencyPlan => "emergency_plan",
            DocumentKind::WorkPermit => "work_permit",
            DocumentKind::TrainingSheet => "training_sheet",
            DocumentKind::Certificate => "certificate",
        }
    }

    /// ASCII suffix used in file names.
    pub fn file_suffix(self) -> &'static str {
        match self {
            DocumentKind::EmergencyPlan => "Acil Durum Eylem Plani",
            DocumentKind::WorkPermit => "Calisma Izni",
            DocumentKind::TrainingSheet => "Egitim Katilim Formu",
            DocumentKind::Certificate => "Egitim Sertifikasi",
        }
    }

    /// Report-history document type.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::EmergencyPlan => "Acil Durum Eylem Planı",
            DocumentKind::WorkPermit => "Çalışma İzni",
            DocumentKind::TrainingSheet => "Eğitim Katılım Formu",
            DocumentKind::Certificate => "Eğitim Sertifikası",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Word,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Word => "docx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Word => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Word => "word",
        }
    }
}

/// A person who signs a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Signatory {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Participant {
    pub name: String,
    /// TC Kimlik No
    #[serde(default)]
    pub national_id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// One rendered file.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum DocumentRequest {
    EmergencyPlan(EmergencyPlanRequest),
    WorkPermit(WorkPermitRequest),
    TrainingSheet(TrainingSheetRequest),
    Certificate(CertificateRequest),
}

impl DocumentRequest {
    /// Parse the kind-specific record.
    pub fn from_value(kind: DocumentKind, data: Value) -> serde_json::Result<Self> {
        Ok(match kind {
            DocumentKind::EmergencyPlan => DocumentRequest::EmergencyPlan(serde_json::from_value(data)?),
            DocumentKind::WorkPermit => DocumentRequest::WorkPermit(serde_json::from_value(data)?),
            DocumentKind::TrainingSheet => DocumentRequest::TrainingSheet(serde_json::from_value(data)?),
            DocumentKind::Certificate => DocumentRequest::Certificate(serde_json::from_value(data)?),
        })
    }

    /// Build one batch entity's record from a shared template: the company is substituted,
    /// and the report date and document number land on the kind's primary date and number.
    pub fn for_entity(
        kind: DocumentKind,
        template: &Value,
        company: &Company,
        report_date: &str,
        number: Option<String>,
    ) -> serde_json::Result<Self> {
        let mut data = match template {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        data.insert("company".to_string(), serde_json::to_value(company)?);

        let date = Value::String(report_date.to_string());
        let number = number.map(Value::String).unwrap_or(Value::Null);
        match kind {
            DocumentKind::EmergencyPlan => {
                data.insert("preparation_date".into(), date);
                data.insert("document_number".into(), number);
            }
            DocumentKind::WorkPermit => {
                data.insert("issue_date".into(), date);
                data.insert("permit_number".into(), number);
            }
            DocumentKind::TrainingSheet => {
                let has_days = data.get("days").and_then(Value::as_array).is_some_and(|d| !d.is_empty());
                if !has_days {
                    let categories: Vec<SubjectCategory> = SubjectCategory::ALL.to_vec();
                    data.insert(
                        "days".into(),
                        serde_json::json!([{ "date": report_date, "categories": categories }]),
                    );
                }
                data.insert("document_number".into(), number);
            }
            DocumentKind::Certificate => {
                data.insert("training_date".into(), date);
                data.insert("certificate_number".into(), number);
            }
        }
        Self::from_value(kind, Value::Object(data))
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            DocumentRequest::EmergencyPlan(_) => DocumentKind::EmergencyPlan,
            DocumentRequest::WorkPermit(_) => DocumentKind::WorkPermit,
            DocumentRequest::TrainingSheet(_) => DocumentKind::TrainingSheet,
            DocumentRequest::Certificate(_) => DocumentKind::Certificate,
        }
    }

    pub fn company(&self) -> &Company {
        match self {
            DocumentRequest::EmergencyPlan(r) => &r.company,
            DocumentRequest::WorkPermit(r) => &r.company,
            DocumentRequest::TrainingSheet(r) => &r.company,
            DocumentRequest::Certificate(r) => &r.company,
        }
    }

    /// Fill in derived validity dates so a snapshot can be re-rendered unchanged later.
    pub fn resolved(mut self) -> Self {
        match &mut self {
            DocumentRequest::EmergencyPlan(r) => r.validity_date = r.validity_date(),
            DocumentRequest::Certificate(r) => r.validity_date = r.validity_date(),
            DocumentRequest::WorkPermit(_) | DocumentRequest::TrainingSheet(_) => {}
        }
        self
    }

    /// The kind-specific record as JSON, without the tag.
    pub fn data(&self) -> Value {
        let result = match self {
            DocumentRequest::EmergencyPlan(r) => serde_json::to_value(r),
            DocumentRequest::WorkPermit(r) => serde_json::to_value(r),
            DocumentRequest::TrainingSheet(r) => serde_json::to_value(r),
            DocumentRequest::Certificate(r) => serde_json::to_value(r),
        };
        result.unwrap_or(Value::Null)
    }

    fn as_render(&self) -> &dyn Render {
        match self {
            DocumentRequest::EmergencyPlan(r) => r,
            DocumentRequest::WorkPermit(r) => r,
            DocumentRequest::TrainingSheet(r) => r,
            DocumentRequest::Certificate(r) => r,
        }
    }

    fn as_validator(&self) -> &dyn Validator {
        match self {
            DocumentRequest::EmergencyPlan(r) => r,
            DocumentRequest::WorkPermit(r) => r,
            DocumentRequest::TrainingSheet(r) => r,
            DocumentRequest::Certificate(r) => r,
        }
    }
}

impl Validator for DocumentRequest {
    fn validate(&self) -> Result<(), String> {
        self.as_validator().validate()
    }
}

impl Render for DocumentRequest {
    fn title(&self) -> String {
        self.as_render().title()
    }

    fn render(&self, fonts: &FontSet) -> Result<Vec<GeneratedDocument>, RenderError> {
        self.as_render().render(fonts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn company() -> Company {
        Company {
            id: "c-1".into(),
            name: "Marmara Kimya".into(),
            address: None,
            registration_number: None,
            employer: None,
            danger_class: DangerClass::CokTehlikeli,
        }
    }

    #[test]
    fn test_tagged_request_deserialization() {
        let body = json!({
            "kind": "work_permit",
            "data": {
                "company": { "id": "1", "name": "Test", "danger_class": "tehlikeli" },
                "issue_date": "01.01.2025",
                "location": "Depo",
                "start_time": "09:00",
                "end_time": "12:00"
            }
        });
        let request: DocumentRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.kind(), DocumentKind::WorkPermit);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_for_entity_applies_batch_parameters() {
        let request = DocumentRequest::for_entity(
            DocumentKind::EmergencyPlan,
            &json!({ "revision": "2" }),
            &company(),
            "05.05.2025",
            Some("ADEP-7".into()),
        )
        .unwrap()
        .resolved();

        match &request {
            DocumentRequest::EmergencyPlan(plan) => {
                assert_eq!(plan.preparation_date, "05.05.2025");
                assert_eq!(plan.document_number.as_deref(), Some("ADEP-7"));
                assert_eq!(plan.revision.as_deref(), Some("2"));
                assert_eq!(plan.validity_date.as_deref(), Some("05.05.2027"));
            }
            other => panic!("unexpected kind {:?}", other.kind()),
        }
        assert_eq!(request.data()["company"]["name"], "Marmara Kimya");
    }

    #[test]
    fn test_training_sheet_entity_gets_default_day() {
        let request = DocumentRequest::for_entity(
            DocumentKind::TrainingSheet,
            &Value::Null,
            &company(),
            "03.03.2025",
            None,
        )
        .unwrap();
        match request {
            DocumentRequest::TrainingSheet(sheet) => {
                assert_eq!(sheet.days.len(), 1);
                assert_eq!(sheet.days[0].categories.len(), 4);
            }
            other => panic!("unexpected kind {:?}", other.kind()),
        }
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(OutputFormat::Word.extension(), "docx");
        assert_eq!(OutputFormat::Pdf.mime_type(), "application/pdf");
        assert_eq!(DocumentKind::Certificate.slug(), "certificate");
    }
}
