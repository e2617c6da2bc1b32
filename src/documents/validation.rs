//! Input validation for render and batch requests.
//!
//! Errors accumulate into one readable, Turkish-language message so the caller can fix every
//! field in a single round trip.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use super::common::parse_date;

lazy_static! {
    static ref DATE_PATTERN: Regex = Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").unwrap();
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    /// Human-readable message in Turkish
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} boş bırakılamaz", label))
            .with_suggestion(format!("Lütfen geçerli bir {} girin", label.to_lowercase()))
    }

    pub fn empty_list(field: &str, label: &str) -> Self {
        Self::new(field, format!("En az bir {} seçilmelidir", label))
    }

    pub fn invalid_national_id(field: &str) -> Self {
        Self::new(field, "TC Kimlik No 11 haneli olmalı ve 0 ile başlamamalıdır")
            .with_suggestion("Kimlik kartındaki numarayı kontrol edin, örnek: 12345678901")
    }

    pub fn invalid_date(field: &str, value: &str) -> Self {
        Self::new(field, format!("'{}' geçerli bir tarih değil", value))
            .with_suggestion("GG.AA.YYYY biçimini kullanın, örnek: 15.03.2025")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Numbered list of every error, with a closing hint.
    pub fn to_message(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }

        let mut parts = vec![format!("Doğrulama başarısız: {} hata bulundu\n", self.errors.len())];
        for (i, error) in self.errors.iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, error));
        }
        parts.push(String::new());
        parts.push("Lütfen yukarıdaki alanları düzeltip tekrar deneyin.".to_string());

        parts.join("\n")
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.to_message())
        }
    }
}

pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

pub fn validate_not_empty<T>(values: &[T], field: &str, label: &str, errors: &mut ValidationErrors) {
    if values.is_empty() {
        errors.add(ValidationError::empty_list(field, label));
    }
}

/// Required day.month.year date that must also exist on the calendar.
pub fn validate_date(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(ValidationError::empty_field(field, label));
        return;
    }
    if !DATE_PATTERN.is_match(trimmed) || parse_date(trimmed).is_none() {
        errors.add(ValidationError::invalid_date(field, trimmed));
    }
}

pub fn validate_date_optional(value: Option<&str>, field: &str, errors: &mut ValidationErrors) {
    match value.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => {
            if !DATE_PATTERN.is_match(trimmed) || parse_date(trimmed).is_none() {
                errors.add(ValidationError::invalid_date(field, trimmed));
            }
        }
        _ => {}
    }
}

/// TC Kimlik No: 11 digits, first digit non-zero. Blank is accepted.
pub fn validate_national_id_optional(value: &str, field: &str, errors: &mut ValidationErrors) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return;
    }
    let digits_only = trimmed.chars().all(|c| c.is_ascii_digit());
    if trimmed.len() != 11 || !digits_only || trimmed.starts_with('0') {
        errors.add(ValidationError::invalid_national_id(field));
    }
}
