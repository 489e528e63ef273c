//! Verification settings passed explicitly to the orchestrator.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::DocumentType;

/// Required fields per document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredFields {
    #[serde(default = "default_contract_fields")]
    pub contract: Vec<String>,
    #[serde(default = "default_disclosure_fields")]
    pub disclosure: Vec<String>,
    #[serde(default = "default_equipment_fields")]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub auto: Vec<String>,
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn default_contract_fields() -> Vec<String> {
    strings(&[
        "seller_name",
        "buyer_name",
        "property_location",
        "sale_price_amount",
        "contract_date",
        "settlement_date",
    ])
}

fn default_disclosure_fields() -> Vec<String> {
    strings(&[
        "license_holder_name",
        "license_holder_registration",
        "broker_license_number",
        "escrow_office",
        "land_category",
        "floor_area_ratio",
    ])
}

fn default_equipment_fields() -> Vec<String> {
    strings(&["item_numbers"])
}

impl Default for RequiredFields {
    fn default() -> Self {
        Self {
            contract: default_contract_fields(),
            disclosure: default_disclosure_fields(),
            equipment: default_equipment_fields(),
            auto: Vec::new(),
        }
    }
}

impl RequiredFields {
    pub fn for_type(&self, document_type: DocumentType) -> &[String] {
        match document_type {
            DocumentType::Contract => &self.contract,
            DocumentType::Disclosure => &self.disclosure,
            DocumentType::Equipment => &self.equipment,
            DocumentType::Auto => &self.auto,
        }
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Overall limit on one model call, including its retry
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Dates further in the future than this are flagged
    #[serde(default = "default_future_tolerance_years")]
    pub future_tolerance_years: u32,
    #[serde(default)]
    pub required_fields: RequiredFields,
    /// Known-correct disclosure form values (license holder, escrow office, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub reference_values: BTreeMap<String, String>,
    /// Fixed "today" for date checks; the local date when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today: Option<NaiveDate>,
}

fn default_timeout_secs() -> u64 {
    420
}

fn default_future_tolerance_years() -> u32 {
    10
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            future_tolerance_years: default_future_tolerance_years(),
            required_fields: RequiredFields::default(),
            reference_values: BTreeMap::new(),
            today: None,
        }
    }
}

impl VerifyConfig {
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_reference_value(mut self, field: &str, value: &str) -> Self {
        self.reference_values
            .insert(field.to_string(), value.to_string());
        self
    }
}
