// A salary component is a reusable, company-scoped rule that yields one
// payslip line. The calculation method is a tagged variant so that each
// method carries exactly the parameter it needs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};

/// What a component contributes to the payslip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Earning,
    Deduction,
    EmployerContribution,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earning => "earning",
            Self::Deduction => "deduction",
            Self::EmployerContribution => "employer_contribution",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Earning => "Earning",
            Self::Deduction => "Deduction",
            Self::EmployerContribution => "Employer Contribution",
        }
    }

    /// Prefix used for generated component codes
    pub fn code_prefix(&self) -> &'static str {
        match self {
            Self::Earning => "ERN-",
            Self::Deduction => "DED-",
            Self::EmployerContribution => "EMP-",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for ComponentKind {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "earning" => Ok(Self::Earning),
            "deduction" => Ok(Self::Deduction),
            "employer_contribution" => Ok(Self::EmployerContribution),
            _ => Err(format!("Invalid component kind: {}", value)),
        }
    }
}

/// How a component's amount is derived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "calculation_type", rename_all = "snake_case")]
pub enum CalculationMethod {
    /// Configured amount, independent of any base
    Fixed { amount: Option<Decimal> },
    /// Percentage of the base amount
    Percentage { rate: Option<Decimal> },
    /// Arithmetic formula over calculation-context variables
    Computed { formula: Option<String> },
    /// Manual amount supplied at calculation time
    Variable,
}

impl CalculationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "fixed",
            Self::Percentage { .. } => "percentage",
            Self::Computed { .. } => "computed",
            Self::Variable => "variable",
        }
    }

    /// Rebuild the variant from its storage columns
    pub fn from_columns(
        calculation_type: &str,
        default_amount: Option<Decimal>,
        default_rate: Option<Decimal>,
        formula: Option<String>,
    ) -> Result<Self> {
        match calculation_type {
            "fixed" => Ok(Self::Fixed {
                amount: default_amount,
            }),
            "percentage" => Ok(Self::Percentage { rate: default_rate }),
            "computed" => Ok(Self::Computed { formula }),
            "variable" => Ok(Self::Variable),
            other => Err(AppError::internal(format!(
                "Invalid calculation type in database: {}",
                other
            ))),
        }
    }

    /// Split into `(default_amount, default_rate, formula)` storage columns
    pub fn to_columns(&self) -> (Option<Decimal>, Option<Decimal>, Option<String>) {
        match self {
            Self::Fixed { amount } => (*amount, None, None),
            Self::Percentage { rate } => (None, *rate, None),
            Self::Computed { formula } => (None, None, formula.clone()),
            Self::Variable => (None, None, None),
        }
    }

    pub fn rate(&self) -> Option<Decimal> {
        match self {
            Self::Percentage { rate } => *rate,
            _ => None,
        }
    }
}

/// Company-scoped definition of one payslip line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryComponent {
    pub id: String,
    pub company_id: i64,
    pub name: String,
    /// Unique code; identifies special components such as overtime
    pub code: String,
    pub description: Option<String>,
    pub kind: ComponentKind,
    #[serde(flatten)]
    pub calculation: CalculationMethod,
    pub is_taxable: bool,
    pub is_provident_fund_applicable: bool,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SalaryComponent {
    /// Create a new active component with validation
    pub fn new(
        company_id: i64,
        name: impl Into<String>,
        code: impl Into<String>,
        kind: ComponentKind,
        calculation: CalculationMethod,
        display_order: i32,
    ) -> Result<Self> {
        let name = name.into();
        let code = code.into();

        Self::validate_name(&name)?;
        Self::validate_code(&code)?;
        Self::validate_calculation(&calculation)?;

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            company_id,
            name,
            code,
            description: None,
            kind,
            calculation,
            is_taxable: false,
            is_provident_fund_applicable: false,
            is_active: true,
            display_order,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    pub fn taxable(mut self, is_taxable: bool) -> Self {
        self.is_taxable = is_taxable;
        self
    }

    pub fn provident_fund_applicable(mut self, applicable: bool) -> Self {
        self.is_provident_fund_applicable = applicable;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Retire the component; historical payslips keep their snapshots
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Some(Utc::now());
    }

    /// Next code for `kind` after the highest existing code with the same prefix
    ///
    /// `ERN-001`, `ERN-002`, ... Codes that do not parse are ignored.
    pub fn generate_code<'a>(kind: ComponentKind, existing: impl IntoIterator<Item = &'a str>) -> String {
        let prefix = kind.code_prefix();
        let last = existing
            .into_iter()
            .filter_map(|code| code.strip_prefix(prefix))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        format!("{}{:03}", prefix, last + 1)
    }

    fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(AppError::validation("Component name cannot be empty"));
        }

        if name.len() > 255 {
            return Err(AppError::validation(
                "Component name cannot exceed 255 characters",
            ));
        }

        Ok(())
    }

    fn validate_code(code: &str) -> Result<()> {
        if code.trim().is_empty() {
            return Err(AppError::validation("Component code cannot be empty"));
        }

        if code.chars().any(char::is_whitespace) {
            return Err(AppError::validation(format!(
                "Component code cannot contain whitespace: '{}'",
                code
            )));
        }

        Ok(())
    }

    fn validate_calculation(calculation: &CalculationMethod) -> Result<()> {
        match calculation {
            CalculationMethod::Fixed { amount: Some(amount) } if *amount < Decimal::ZERO => Err(
                AppError::validation(format!("Fixed amount must be non-negative, got: {}", amount)),
            ),
            CalculationMethod::Percentage { rate: Some(rate) }
                if *rate < Decimal::ZERO || *rate > Decimal::ONE_HUNDRED =>
            {
                Err(AppError::validation(format!(
                    "Percentage rate must be between 0 and 100, got: {}",
                    rate
                )))
            }
            _ => Ok(()),
        }
    }
}
