use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};

/// Pay frequency a structure is designed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayPeriod {
    Monthly,
    BiWeekly,
    Weekly,
    Annual,
}

impl Default for PayPeriod {
    fn default() -> Self {
        PayPeriod::Monthly
    }
}

impl PayPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::BiWeekly => "bi_weekly",
            Self::Weekly => "weekly",
            Self::Annual => "annual",
        }
    }

    /// Nominal number of days covered by one period
    pub fn days_in_period(&self) -> u32 {
        match self {
            Self::Weekly => 7,
            Self::BiWeekly => 14,
            Self::Monthly => 30,
            Self::Annual => 365,
        }
    }
}

impl std::fmt::Display for PayPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for PayPeriod {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "monthly" => Ok(Self::Monthly),
            "bi_weekly" => Ok(Self::BiWeekly),
            "weekly" => Ok(Self::Weekly),
            "annual" => Ok(Self::Annual),
            _ => Err(format!("Invalid pay period: {}", value)),
        }
    }
}

/// Allowance or deduction line of a structure, keyed by component code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureEntry {
    pub component_code: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub rate: Option<Decimal>,
}

impl StructureEntry {
    pub fn amount(component_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            component_code: component_code.into(),
            amount: Some(amount),
            rate: None,
        }
    }

    pub fn rate(component_code: impl Into<String>, rate: Decimal) -> Self {
        Self {
            component_code: component_code.into(),
            amount: None,
            rate: Some(rate),
        }
    }
}

/// Sum of the fixed amounts of a list of entries
pub(crate) fn sum_amounts(entries: &[StructureEntry]) -> Decimal {
    entries
        .iter()
        .map(|entry| entry.amount.unwrap_or(Decimal::ZERO))
        .sum()
}

/// Named salary template configured by HR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryStructure {
    pub id: String,
    pub company_id: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub pay_period: PayPeriod,
    pub basic_salary: Decimal,
    #[serde(default)]
    pub allowances: Vec<StructureEntry>,
    #[serde(default)]
    pub deductions: Vec<StructureEntry>,
    pub is_active: bool,
    /// At most one default structure per company
    pub is_default: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SalaryStructure {
    pub fn new(
        company_id: i64,
        name: impl Into<String>,
        code: impl Into<String>,
        basic_salary: Decimal,
    ) -> Result<Self> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(AppError::validation("Salary structure name cannot be empty"));
        }

        if basic_salary < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Basic salary must be non-negative, got: {}",
                basic_salary
            )));
        }

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            company_id,
            name,
            code: code.into(),
            description: None,
            pay_period: PayPeriod::Monthly,
            basic_salary,
            allowances: vec![],
            deductions: vec![],
            is_active: true,
            is_default: false,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    pub fn with_allowances(mut self, allowances: Vec<StructureEntry>) -> Self {
        self.allowances = allowances;
        self
    }

    pub fn with_deductions(mut self, deductions: Vec<StructureEntry>) -> Self {
        self.deductions = deductions;
        self
    }

    /// `SS-0001`, `SS-0002`, ... after the highest existing code
    pub fn generate_code<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
        let last = existing
            .into_iter()
            .filter_map(|code| code.strip_prefix("SS-"))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        format!("SS-{:04}", last + 1)
    }

    pub fn total_allowances(&self) -> Decimal {
        sum_amounts(&self.allowances)
    }

    pub fn total_deductions(&self) -> Decimal {
        sum_amounts(&self.deductions)
    }

    pub fn gross_salary(&self) -> Decimal {
        self.basic_salary + self.total_allowances()
    }

    pub fn net_salary(&self) -> Decimal {
        self.gross_salary() - self.total_deductions()
    }

    /// Entry configured for a component code, allowances first
    pub fn entry_for(&self, component_code: &str) -> Option<&StructureEntry> {
        self.allowances
            .iter()
            .chain(self.deductions.iter())
            .find(|entry| entry.component_code == component_code)
    }
}
