use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CalculationDetails, PayslipItem, PayslipStatus};
use crate::core::{AppError, Result};
use crate::modules::attendance::models::{month_bounds, AttendanceSummary};
use crate::modules::employees::Employee;
use crate::modules::structures::EmployeeSalaryStructure;

/// One employee's pay for one calendar month
///
/// Unique per (employee, pay year, pay month). Items are owned exclusively
/// and replaced as a whole when the payslip is recalculated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payslip {
    pub id: String,
    /// Sequential human-facing number, assigned when first stored
    pub payslip_number: String,
    pub employee_id: i64,
    pub company_id: i64,
    pub salary_structure_id: String,
    pub pay_year: i32,
    pub pay_month: u32,
    pub pay_period_start: NaiveDate,
    pub pay_period_end: NaiveDate,
    pub status: PayslipStatus,

    // Snapshot of the inputs
    pub basic_salary: Decimal,
    pub total_working_days: i32,
    pub days_present: i32,
    pub days_absent: i32,
    pub overtime_hours: Decimal,

    // Computed aggregates
    pub total_earnings: Decimal,
    pub total_deductions: Decimal,
    pub gross_salary: Decimal,
    pub net_salary: Decimal,
    pub employer_contributions: Decimal,
    pub overtime_amount: Decimal,
    pub taxable_income: Decimal,
    pub tax_deducted: Decimal,
    pub provident_fund: Decimal,

    // Processing audit
    pub processed_date: Option<NaiveDate>,
    pub processed_by: Option<i64>,
    pub approved_date: Option<NaiveDate>,
    pub approved_by: Option<i64>,
    pub paid_date: Option<NaiveDate>,
    pub paid_by: Option<i64>,

    pub notes: Option<String>,
    pub calculation_details: Option<CalculationDetails>,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub items: Vec<PayslipItem>,
}

impl Payslip {
    /// Fresh draft for a period, with salary and attendance snapshots taken
    /// and all aggregates at zero
    pub fn draft(
        employee: &Employee,
        assignment: &EmployeeSalaryStructure,
        attendance: &AttendanceSummary,
        year: i32,
        month: u32,
    ) -> Result<Self> {
        let (pay_period_start, pay_period_end) = month_bounds(year, month)?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            payslip_number: String::new(),
            employee_id: employee.id,
            company_id: employee.company_id,
            salary_structure_id: assignment.salary_structure_id.clone(),
            pay_year: year,
            pay_month: month,
            pay_period_start,
            pay_period_end,
            status: PayslipStatus::Draft,
            basic_salary: assignment.basic_salary,
            total_working_days: attendance.total_working_days,
            days_present: attendance.days_present,
            days_absent: attendance.days_absent,
            overtime_hours: attendance.overtime_hours,
            total_earnings: Decimal::ZERO,
            total_deductions: Decimal::ZERO,
            gross_salary: Decimal::ZERO,
            net_salary: Decimal::ZERO,
            employer_contributions: Decimal::ZERO,
            overtime_amount: Decimal::ZERO,
            taxable_income: Decimal::ZERO,
            tax_deducted: Decimal::ZERO,
            provident_fund: Decimal::ZERO,
            processed_date: None,
            processed_by: None,
            approved_date: None,
            approved_by: None,
            paid_date: None,
            paid_by: None,
            notes: None,
            calculation_details: None,
            created_by: None,
            updated_by: None,
            created_at: Some(now),
            updated_at: Some(now),
            items: vec![],
        })
    }

    /// Keep the identity of an already stored payslip for the same period
    pub fn adopt_identity(&mut self, existing: &Payslip) {
        self.id = existing.id.clone();
        self.payslip_number = existing.payslip_number.clone();
        self.created_at = existing.created_at;
        self.created_by = existing.created_by;
        self.notes = existing.notes.clone();
        for item in &mut self.items {
            item.payslip_id = existing.id.clone();
        }
    }

    pub fn is_editable(&self) -> bool {
        self.status == PayslipStatus::Draft
    }

    /// Draft -> Pending
    pub fn process(&mut self, user_id: i64) -> Result<()> {
        self.transition("process", PayslipStatus::Pending, user_id)?;
        self.processed_date = Some(Utc::now().date_naive());
        self.processed_by = Some(user_id);
        Ok(())
    }

    /// Pending -> Approved
    pub fn approve(&mut self, user_id: i64) -> Result<()> {
        self.transition("approve", PayslipStatus::Approved, user_id)?;
        self.approved_date = Some(Utc::now().date_naive());
        self.approved_by = Some(user_id);
        Ok(())
    }

    /// Approved -> Paid
    pub fn mark_paid(&mut self, user_id: i64) -> Result<()> {
        self.transition("mark as paid", PayslipStatus::Paid, user_id)?;
        self.paid_date = Some(Utc::now().date_naive());
        self.paid_by = Some(user_id);
        Ok(())
    }

    /// Draft, Pending or Approved -> Cancelled
    pub fn cancel(&mut self, user_id: i64, reason: Option<&str>) -> Result<()> {
        self.transition("cancel", PayslipStatus::Cancelled, user_id)?;

        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            let line = format!("Cancelled: {}", reason.trim());
            self.notes = Some(match self.notes.take() {
                Some(notes) if !notes.is_empty() => format!("{}\n{}", notes, line),
                _ => line,
            });
        }

        Ok(())
    }

    fn transition(&mut self, action: &str, next: PayslipStatus, user_id: i64) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::validation(format!(
                "Cannot {} payslip {} in status {}",
                action, self.payslip_number, self.status
            )));
        }

        self.status = next;
        self.updated_by = Some(user_id);
        self.updated_at = Some(Utc::now());
        Ok(())
    }
}

/// Payslip number format: prefix followed by a zero-padded sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayslipNumbering {
    pub prefix: String,
    pub length: usize,
}

impl Default for PayslipNumbering {
    fn default() -> Self {
        Self {
            prefix: "PS-".to_string(),
            length: 6,
        }
    }
}

impl PayslipNumbering {
    pub fn new(prefix: impl Into<String>, length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            length,
        }
    }

    pub fn format(&self, sequence: u64) -> String {
        format!("{}{:0width$}", self.prefix, sequence, width = self.length)
    }

    /// Number following the highest one issued so far
    pub fn next_after<'a>(&self, issued: impl IntoIterator<Item = &'a str>) -> String {
        let last = issued
            .into_iter()
            .filter_map(|number| number.strip_prefix(self.prefix.as_str()))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        self.format(last + 1)
    }
}
