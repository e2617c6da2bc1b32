//! Company records forwarded by the caller, and the danger classification offsets.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Workplace danger class from the national hazard list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DangerClass {
    AzTehlikeli,
    Tehlikeli,
    CokTehlikeli,
}

impl DangerClass {
    pub fn label(self) -> &'static str {
        match self {
            DangerClass::AzTehlikeli => "Az Tehlikeli",
            DangerClass::Tehlikeli => "Tehlikeli",
            DangerClass::CokTehlikeli => "Çok Tehlikeli",
        }
    }

    /// Years an emergency action plan stays valid.
    pub fn emergency_plan_validity_years(self) -> u32 {
        match self {
            DangerClass::AzTehlikeli => 6,
            DangerClass::Tehlikeli => 4,
            DangerClass::CokTehlikeli => 2,
        }
    }

    /// Years a basic safety training certificate stays valid.
    pub fn training_validity_years(self) -> u32 {
        match self {
            DangerClass::AzTehlikeli => 3,
            DangerClass::Tehlikeli => 2,
            DangerClass::CokTehlikeli => 1,
        }
    }

    /// Minimum hours of basic safety training per employee.
    pub fn training_hours(self) -> u32 {
        match self {
            DangerClass::AzTehlikeli => 8,
            DangerClass::Tehlikeli => 12,
            DangerClass::CokTehlikeli => 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    /// SGK workplace registration number.
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub employer: Option<String>,
    pub danger_class: DangerClass,
}
