// Monthly payslip generation batch.
//
// Employees are processed one after another. An existing payslip for the
// period is left alone unless the run is forced; a failure for one employee
// is recorded and the batch moves on.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use super::payslip_calculation_service::{PayrollRepositories, PayslipCalculationService};
use crate::core::Result;
use crate::modules::attendance::models::month_bounds;
use crate::modules::employees::{Employee, EmployeeRepository};
use crate::modules::payslips::repositories::PayslipRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub year: i32,
    pub month: u32,
    pub company_id: Option<i64>,
    pub employee_id: Option<i64>,
    /// Recalculate payslips that already exist for the period
    pub force: bool,
}

impl GenerationRequest {
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            company_id: None,
            employee_id: None,
            force: false,
        }
    }

    /// Request for the calendar month before `today`
    pub fn previous_month(today: NaiveDate) -> Self {
        if today.month() == 1 {
            Self::new(today.year() - 1, 12)
        } else {
            Self::new(today.year(), today.month() - 1)
        }
    }

    /// Fill in missing year/month from `today`
    ///
    /// Without either, the previous calendar month is used. A month alone
    /// is taken in the current year; a year alone keeps the previous month's
    /// number.
    pub fn resolve(year: Option<i32>, month: Option<u32>, today: NaiveDate) -> Self {
        let previous = Self::previous_month(today);
        match (year, month) {
            (Some(year), Some(month)) => Self::new(year, month),
            (None, Some(month)) => Self::new(today.year(), month),
            (Some(year), None) => Self::new(year, previous.month),
            (None, None) => previous,
        }
    }

    pub fn for_company(mut self, company_id: Option<i64>) -> Self {
        self.company_id = company_id;
        self
    }

    pub fn for_employee(mut self, employee_id: Option<i64>) -> Self {
        self.employee_id = employee_id;
        self
    }

    pub fn forced(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationFailure {
    pub employee_id: i64,
    pub employee_name: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GenerationSummary {
    pub year: i32,
    pub month: u32,
    pub processed: usize,
    /// Already had a payslip and the run was not forced
    pub skipped: usize,
    pub failed: usize,
    /// Sum of net salary over the payslips generated by this run
    pub total_net_salary: Decimal,
    pub failures: Vec<GenerationFailure>,
}

impl GenerationSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed
    }
}

pub struct PayslipGenerationJob {
    employees: Arc<dyn EmployeeRepository>,
    payslips: Arc<dyn PayslipRepository>,
    calculation: Arc<PayslipCalculationService>,
}

impl PayslipGenerationJob {
    pub fn new(repositories: &PayrollRepositories, calculation: Arc<PayslipCalculationService>) -> Self {
        Self {
            employees: repositories.employees.clone(),
            payslips: repositories.payslips.clone(),
            calculation,
        }
    }

    pub async fn run(&self, request: &GenerationRequest) -> Result<GenerationSummary> {
        month_bounds(request.year, request.month)?;

        let mut summary = GenerationSummary {
            year: request.year,
            month: request.month,
            ..GenerationSummary::default()
        };

        let employees = self
            .employees
            .list_payable(request.company_id, request.employee_id)
            .await?;

        if employees.is_empty() {
            warn!(
                year = request.year,
                month = request.month,
                company_id = request.company_id,
                employee_id = request.employee_id,
                "No employees with an active salary structure to process"
            );
            return Ok(summary);
        }

        info!(
            year = request.year,
            month = request.month,
            employees = employees.len(),
            force = request.force,
            "Generating payslips"
        );

        for employee in &employees {
            match self.generate_one(employee, request).await {
                Ok(Some(net_salary)) => {
                    summary.processed += 1;
                    summary.total_net_salary += net_salary;
                }
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!(
                        employee_id = employee.id,
                        year = request.year,
                        month = request.month,
                        error = %e,
                        "Failed to generate payslip"
                    );
                    summary.failed += 1;
                    summary.failures.push(GenerationFailure {
                        employee_id: employee.id,
                        employee_name: employee.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            year = request.year,
            month = request.month,
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed,
            total_net_salary = %summary.total_net_salary,
            "Payslip generation completed"
        );

        Ok(summary)
    }

    /// Net salary of the generated payslip, `None` when skipped
    async fn generate_one(
        &self,
        employee: &Employee,
        request: &GenerationRequest,
    ) -> Result<Option<Decimal>> {
        let existing = self
            .payslips
            .find_by_period(employee.id, request.year, request.month)
            .await?;

        if let Some(existing) = existing {
            if !request.force {
                info!(
                    employee_id = employee.id,
                    payslip_number = existing.payslip_number.as_str(),
                    "Payslip already exists; skipping"
                );
                return Ok(None);
            }
        }

        let payslip = self
            .calculation
            .calculate_payslip(employee, request.year, request.month)
            .await?;

        Ok(Some(payslip.net_salary))
    }
}
