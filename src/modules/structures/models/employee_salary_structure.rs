// Binds one employee to a salary structure with a concrete basic salary
// over an effective date range. Only one assignment per employee may be
// active at a time; the repository deactivates siblings on save.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::salary_structure::{sum_amounts, SalaryStructure, StructureEntry};
use crate::core::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSalaryStructure {
    pub id: String,
    pub employee_id: i64,
    pub company_id: i64,
    pub salary_structure_id: String,
    pub basic_salary: Decimal,
    #[serde(default)]
    pub custom_allowances: Vec<StructureEntry>,
    #[serde(default)]
    pub custom_deductions: Vec<StructureEntry>,
    pub effective_from: NaiveDate,
    /// Open-ended when absent
    pub effective_to: Option<NaiveDate>,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    /// Structure template, loaded alongside the assignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<SalaryStructure>,
}

impl EmployeeSalaryStructure {
    pub fn new(
        employee_id: i64,
        company_id: i64,
        structure: &SalaryStructure,
        basic_salary: Decimal,
        effective_from: NaiveDate,
        effective_to: Option<NaiveDate>,
    ) -> Result<Self> {
        if basic_salary < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Basic salary must be non-negative, got: {}",
                basic_salary
            )));
        }

        if let Some(to) = effective_to {
            if to < effective_from {
                return Err(AppError::validation(format!(
                    "effective_to ({}) must not be before effective_from ({})",
                    to, effective_from
                )));
            }
        }

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            employee_id,
            company_id,
            salary_structure_id: structure.id.clone(),
            basic_salary,
            custom_allowances: vec![],
            custom_deductions: vec![],
            effective_from,
            effective_to,
            is_active: true,
            notes: None,
            created_at: Some(now),
            updated_at: Some(now),
            structure: Some(structure.clone()),
        })
    }

    pub fn with_custom_allowances(mut self, entries: Vec<StructureEntry>) -> Self {
        self.custom_allowances = entries;
        self
    }

    pub fn with_custom_deductions(mut self, entries: Vec<StructureEntry>) -> Self {
        self.custom_deductions = entries;
        self
    }

    /// Whether the effective range covers `date` (both ends inclusive)
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        if self.effective_from > date {
            return false;
        }

        match self.effective_to {
            Some(to) => to >= date,
            None => true,
        }
    }

    /// Entry overriding the parameters of a component
    ///
    /// Employee-specific entries win over the structure template's.
    pub fn entry_for(&self, component_code: &str) -> Option<&StructureEntry> {
        self.custom_allowances
            .iter()
            .chain(self.custom_deductions.iter())
            .find(|entry| entry.component_code == component_code)
            .or_else(|| {
                self.structure
                    .as_ref()
                    .and_then(|structure| structure.entry_for(component_code))
            })
    }

    pub fn total_allowances(&self) -> Decimal {
        let template = self
            .structure
            .as_ref()
            .map(SalaryStructure::total_allowances)
            .unwrap_or(Decimal::ZERO);
        template + sum_amounts(&self.custom_allowances)
    }

    pub fn total_deductions(&self) -> Decimal {
        let template = self
            .structure
            .as_ref()
            .map(SalaryStructure::total_deductions)
            .unwrap_or(Decimal::ZERO);
        template + sum_amounts(&self.custom_deductions)
    }

    pub fn gross_salary(&self) -> Decimal {
        self.basic_salary + self.total_allowances()
    }

    pub fn net_salary(&self) -> Decimal {
        self.gross_salary() - self.total_deductions()
    }
}
