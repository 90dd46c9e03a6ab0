use crate::core::{AppError, Currency, Result};
use crate::modules::payslips::models::PayslipNumbering;
use crate::modules::taxes::TaxBracketTable;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

/// Payroll conventions used by the calculation engine
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollConfig {
    pub currency: Currency,
    pub working_days_per_month: u32,
    pub working_hours_per_day: Decimal,
    pub overtime_multiplier: Decimal,
    /// Component code that receives the overtime amount
    pub overtime_component_code: String,
    pub payslip_number_prefix: String,
    pub payslip_number_length: usize,
    pub tax_brackets: TaxBracketTable,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            currency: Currency::INR,
            working_days_per_month: 22,
            working_hours_per_day: Decimal::from(8),
            overtime_multiplier: Decimal::new(15, 1),
            overtime_component_code: "OT".to_string(),
            payslip_number_prefix: "PS-".to_string(),
            payslip_number_length: 6,
            tax_brackets: TaxBracketTable::default(),
        }
    }
}

impl PayrollConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let tax_brackets = match env::var("TAX_BRACKETS_FILE") {
            Ok(path) if !path.trim().is_empty() => {
                let source = std::fs::read_to_string(&path).map_err(|e| {
                    AppError::Configuration(format!("Cannot read TAX_BRACKETS_FILE {}: {}", path, e))
                })?;
                TaxBracketTable::from_yaml(&source)?
            }
            _ => defaults.tax_brackets,
        };

        Ok(PayrollConfig {
            currency: match env::var("PAYROLL_CURRENCY") {
                Ok(value) => Currency::from_str(&value).map_err(AppError::Configuration)?,
                Err(_) => defaults.currency,
            },
            working_days_per_month: parse_var("WORKING_DAYS_PER_MONTH", defaults.working_days_per_month)?,
            working_hours_per_day: parse_var("WORKING_HOURS_PER_DAY", defaults.working_hours_per_day)?,
            overtime_multiplier: parse_var("OVERTIME_MULTIPLIER", defaults.overtime_multiplier)?,
            overtime_component_code: env::var("OVERTIME_COMPONENT_CODE")
                .unwrap_or(defaults.overtime_component_code),
            payslip_number_prefix: env::var("PAYSLIP_NUMBER_PREFIX")
                .unwrap_or(defaults.payslip_number_prefix),
            payslip_number_length: parse_var("PAYSLIP_NUMBER_LENGTH", defaults.payslip_number_length)?,
            tax_brackets,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.working_days_per_month == 0 || self.working_days_per_month > 31 {
            return Err(AppError::Configuration(format!(
                "Working days per month must be between 1 and 31, got {}",
                self.working_days_per_month
            )));
        }

        if self.working_hours_per_day <= Decimal::ZERO || self.working_hours_per_day > Decimal::from(24) {
            return Err(AppError::Configuration(format!(
                "Working hours per day must be between 0 and 24, got {}",
                self.working_hours_per_day
            )));
        }

        if self.overtime_multiplier < Decimal::ONE {
            return Err(AppError::Configuration(format!(
                "Overtime multiplier must be at least 1, got {}",
                self.overtime_multiplier
            )));
        }

        if self.overtime_component_code.trim().is_empty() {
            return Err(AppError::Configuration(
                "Overtime component code cannot be empty".to_string(),
            ));
        }

        if self.payslip_number_length == 0 || self.payslip_number_length > 18 {
            return Err(AppError::Configuration(format!(
                "Payslip number length must be between 1 and 18, got {}",
                self.payslip_number_length
            )));
        }

        Ok(())
    }

    pub fn numbering(&self) -> PayslipNumbering {
        PayslipNumbering::new(self.payslip_number_prefix.clone(), self.payslip_number_length)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", name))),
        Err(_) => Ok(default),
    }
}
