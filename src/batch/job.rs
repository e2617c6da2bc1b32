//! Batch input and its expansion into an ordered job list.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::BatchError;
use crate::documents::validation::{
    validate_date, validate_not_empty, ValidationError, ValidationErrors,
};
use crate::documents::{Company, DocumentKind, DocumentRequest, OutputFormat, Validator};

/// Index of a job in its batch's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub struct JobId(pub usize);

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct FormatSelection {
    #[serde(default)]
    pub pdf: bool,
    #[serde(default)]
    pub word: bool,
}

impl FormatSelection {
    pub fn formats(&self) -> Vec<OutputFormat> {
        let mut formats = Vec::with_capacity(2);
        if self.pdf {
            formats.push(OutputFormat::Pdf);
        }
        if self.word {
            formats.push(OutputFormat::Word);
        }
        formats
    }
}

/// Document numbers: one caller-supplied value, or a prefix plus a counter that advances
/// with the entity's position in the batch.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DocumentNumbering {
    Auto {
        #[serde(default)]
        prefix: String,
        #[serde(default = "default_start")]
        start: u32,
    },
    Manual {
        value: String,
    },
}

fn default_start() -> u32 {
    1
}

impl DocumentNumbering {
    pub fn number_for(&self, position: usize) -> String {
        match self {
            DocumentNumbering::Auto { prefix, start } => {
                format!("{}{:03}", prefix, u64::from(*start) + position as u64)
            }
            DocumentNumbering::Manual { value } => value.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchRequest {
    pub kind: DocumentKind,
    pub companies: Vec<Company>,
    /// Shared report date, dd.mm.yyyy
    pub report_date: String,
    /// Per-company report dates keyed by company id.
    #[serde(default)]
    pub date_overrides: HashMap<String, String>,
    #[serde(default)]
    pub numbering: Option<DocumentNumbering>,
    pub formats: FormatSelection,
    /// Kind-specific fields shared by every company.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub template: Value,
}

/// One (entity, format) unit of work. Created once, consumed once.
#[derive(Debug, Clone)]
pub struct DocumentJob {
    pub id: JobId,
    pub entity_id: String,
    pub format: OutputFormat,
    pub request: Arc<DocumentRequest>,
}

impl BatchRequest {
    fn report_date_for(&self, company: &Company) -> &str {
        self.date_overrides
            .get(&company.id)
            .map(String::as_str)
            .unwrap_or(&self.report_date)
    }

    /// Validate the selection and expand entities × formats into jobs, entity-major.
    ///
    /// Any problem here is an input error: nothing is returned and the batch never starts.
    pub fn expand(&self) -> Result<Vec<DocumentJob>, BatchError> {
        let mut errors = ValidationErrors::new();
        validate_not_empty(&self.companies, "companies", "firma", &mut errors);
        validate_date(&self.report_date, "report_date", "Rapor Tarihi", &mut errors);
        for (id, date) in &self.date_overrides {
            validate_date(date, &format!("date_overrides.{}", id), "Rapor Tarihi", &mut errors);
        }
        let formats = self.formats.formats();
        validate_not_empty(&formats, "formats", "çıktı biçimi", &mut errors);
        if !errors.is_empty() {
            return Err(BatchError::Validation(errors.to_message()));
        }

        let mut requests = Vec::with_capacity(self.companies.len());
        for (position, company) in self.companies.iter().enumerate() {
            let number = self.numbering.as_ref().map(|n| n.number_for(position));
            let prefix = format!("companies[{}]", position);
            match DocumentRequest::for_entity(self.kind, &self.template, company, self.report_date_for(company), number) {
                Ok(request) => {
                    if let Err(message) = request.validate() {
                        errors.add(ValidationError::new(prefix, message));
                    }
                    requests.push(Arc::new(request.resolved()));
                }
                Err(e) => errors.add(
                    ValidationError::new(prefix, format!("Belge verisi okunamadı: {}", e))
                        .with_suggestion("Şablon alanlarını belge türüne göre kontrol edin"),
                ),
            }
        }
        if !errors.is_empty() {
            return Err(BatchError::Validation(errors.to_message()));
        }

        let mut jobs = Vec::with_capacity(requests.len() * formats.len());
        for (company, request) in self.companies.iter().zip(requests) {
            for format in &formats {
                jobs.push(DocumentJob {
                    id: JobId(jobs.len()),
                    entity_id: company.id.clone(),
                    format: *format,
                    request: Arc::clone(&request),
                });
            }
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::DangerClass;
    use serde_json::json;

    fn company(id: &str, name: &str) -> Company {
        Company {
            id: id.into(),
            name: name.into(),
            address: None,
            registration_number: None,
            employer: None,
            danger_class: DangerClass::AzTehlikeli,
        }
    }

    fn batch(companies: Vec<Company>, formats: FormatSelection) -> BatchRequest {
        BatchRequest {
            kind: DocumentKind::EmergencyPlan,
            companies,
            report_date: "10.01.2025".into(),
            date_overrides: HashMap::new(),
            numbering: Some(DocumentNumbering::Auto {
                prefix: "ADEP-".into(),
                start: 7,
            }),
            formats,
            template: Value::Null,
        }
    }

    #[test]
    fn test_expands_entities_times_formats() {
        let request = batch(
            vec![company("a", "Alfa Yapı"), company("b", "Beta Tekstil")],
            FormatSelection { pdf: true, word: true },
        );
        let jobs = request.expand().unwrap();
        assert_eq!(jobs.len(), 4);
        let order: Vec<(&str, OutputFormat)> = jobs.iter().map(|j| (j.entity_id.as_str(), j.format)).collect();
        assert_eq!(
            order,
            vec![
                ("a", OutputFormat::Pdf),
                ("a", OutputFormat::Word),
                ("b", OutputFormat::Pdf),
                ("b", OutputFormat::Word),
            ]
        );
        assert_eq!(jobs[3].id, JobId(3));
    }

    #[test]
    fn test_auto_numbering_and_date_overrides() {
        let mut request = batch(
            vec![company("a", "Alfa Yapı"), company("b", "Beta Tekstil")],
            FormatSelection { pdf: true, word: false },
        );
        request.date_overrides.insert("b".into(), "20.02.2025".into());
        let jobs = request.expand().unwrap();

        let data = jobs[1].request.data();
        assert_eq!(data["preparation_date"], "20.02.2025");
        assert_eq!(data["document_number"], "ADEP-008");
        assert_eq!(jobs[0].request.data()["document_number"], "ADEP-007");
    }

    #[test]
    fn test_manual_numbering_is_shared() {
        let numbering = DocumentNumbering::Manual { value: "X-1".into() };
        assert_eq!(numbering.number_for(0), "X-1");
        assert_eq!(numbering.number_for(5), "X-1");
        let parsed: DocumentNumbering = serde_json::from_value(json!({ "mode": "auto", "prefix": "P" })).unwrap();
        assert_eq!(parsed.number_for(0), "P001");
    }

    #[test]
    fn test_input_errors_stop_the_batch() {
        let request = batch(vec![], FormatSelection::default());
        match request.expand() {
            Err(BatchError::Validation(message)) => {
                assert!(message.contains("companies"));
                assert!(message.contains("formats"));
            }
            other => panic!("expected validation error, got {:?}", other.map(|j| j.len())),
        }
    }

    #[test]
    fn test_template_errors_are_input_errors() {
        let mut request = batch(vec![company("a", "Alfa")], FormatSelection { pdf: true, word: false });
        request.kind = DocumentKind::WorkPermit;
        // work permits need a location and a time window
        request.template = json!({ "location": "" });
        assert!(matches!(request.expand(), Err(BatchError::Validation(_))));
    }
}
