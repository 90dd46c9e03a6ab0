// Payslip calculation orchestration.
//
// Implements:
// - Calculate a payslip for an employee and month (upsert, number kept)
// - Calculate with manual amounts for variable components
// - Recalculate a draft payslip, carrying its manual amounts forward
// - Bulk calculation that logs and skips per-employee failures

use std::sync::Arc;

use sqlx::MySqlPool;
use tracing::{error, info};

use super::component_evaluator::ComponentInputs;
use super::payslip_calculator::PayslipCalculator;
use crate::config::PayrollConfig;
use crate::core::{AppError, Result};
use crate::modules::attendance::models::month_bounds;
use crate::modules::attendance::{AttendanceRepository, AttendanceSummary, MySqlAttendanceRepository};
use crate::modules::components::{MySqlSalaryComponentRepository, SalaryComponentRepository};
use crate::modules::employees::{Employee, EmployeeRepository, MySqlEmployeeRepository};
use crate::modules::payslips::models::Payslip;
use crate::modules::payslips::repositories::{MySqlPayslipRepository, PayslipRepository};
use crate::modules::structures::{MySqlSalaryStructureRepository, SalaryStructureRepository};

/// Every store the payroll engine reads or writes
#[derive(Clone)]
pub struct PayrollRepositories {
    pub components: Arc<dyn SalaryComponentRepository>,
    pub structures: Arc<dyn SalaryStructureRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
    pub payslips: Arc<dyn PayslipRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
}

impl PayrollRepositories {
    pub fn mysql(pool: MySqlPool) -> Self {
        Self {
            components: Arc::new(MySqlSalaryComponentRepository::new(pool.clone())),
            structures: Arc::new(MySqlSalaryStructureRepository::new(pool.clone())),
            attendance: Arc::new(MySqlAttendanceRepository::new(pool.clone())),
            payslips: Arc::new(MySqlPayslipRepository::new(pool.clone())),
            employees: Arc::new(MySqlEmployeeRepository::new(pool)),
        }
    }
}

pub struct PayslipCalculationService {
    repositories: PayrollRepositories,
    calculator: PayslipCalculator,
}

impl PayslipCalculationService {
    pub fn new(repositories: PayrollRepositories, config: Arc<PayrollConfig>) -> Self {
        Self {
            repositories,
            calculator: PayslipCalculator::new(config),
        }
    }

    /// Calculate (or recalculate in place) an employee's payslip for a month
    ///
    /// # Errors
    /// * `NotFound` - no active salary structure covers the first day of the month
    /// * `Validation` - a payslip exists for the period and is no longer a draft
    pub async fn calculate_payslip(&self, employee: &Employee, year: i32, month: u32) -> Result<Payslip> {
        self.calculate_payslip_with_inputs(employee, year, month, &ComponentInputs::new())
            .await
    }

    /// Same as [`calculate_payslip`](Self::calculate_payslip), with manual
    /// amounts for variable components keyed by component code
    pub async fn calculate_payslip_with_inputs(
        &self,
        employee: &Employee,
        year: i32,
        month: u32,
        inputs: &ComponentInputs,
    ) -> Result<Payslip> {
        info!(employee_id = employee.id, year, month, "Calculating payslip");

        let (period_start, _) = month_bounds(year, month)?;
        let config = self.calculator.config();

        let assignment = self
            .repositories
            .structures
            .find_effective_assignment(employee.id, period_start)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No active salary structure found for employee {} ({}) in {}-{:02}",
                    employee.name, employee.id, year, month
                ))
            })?;

        let existing = self
            .repositories
            .payslips
            .find_by_period(employee.id, year, month)
            .await?;

        if let Some(existing) = &existing {
            if !existing.is_editable() {
                return Err(AppError::validation(format!(
                    "Payslip {} for employee {} is {} and can no longer be recalculated",
                    existing.payslip_number, employee.id, existing.status
                )));
            }
        }

        let defaults = AttendanceSummary::with_defaults(
            employee.id,
            employee.company_id,
            year,
            month,
            config.working_days_per_month,
            config.working_hours_per_day,
        )?;
        let attendance = self.repositories.attendance.find_or_create(defaults).await?;

        let components = self
            .repositories
            .components
            .list_active(employee.company_id)
            .await?;

        let mut payslip = Payslip::draft(employee, &assignment, &attendance, year, month)?;
        if let Some(existing) = &existing {
            payslip.adopt_identity(existing);
        }

        self.calculator
            .calculate(&mut payslip, &components, &assignment, &attendance, inputs);

        let payslip = self
            .repositories
            .payslips
            .save_calculation(payslip, &config.numbering())
            .await?;

        info!(
            employee_id = employee.id,
            payslip_id = payslip.id.as_str(),
            payslip_number = payslip.payslip_number.as_str(),
            items = payslip.items.len(),
            net_salary = %payslip.net_salary,
            "Payslip calculated"
        );

        Ok(payslip)
    }

    /// Re-run the calculation of a draft payslip for its employee and period
    pub async fn recalculate_payslip(&self, payslip: &Payslip) -> Result<Payslip> {
        if !payslip.is_editable() {
            return Err(AppError::validation(format!(
                "Payslip {} is {} and can no longer be recalculated",
                payslip.payslip_number, payslip.status
            )));
        }

        let employee = self
            .repositories
            .employees
            .find_by_id(payslip.employee_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Employee {} not found", payslip.employee_id))
            })?;

        let inputs: ComponentInputs = payslip
            .calculation_details
            .as_ref()
            .map(|details| details.manual_amounts.clone().into_iter().collect())
            .unwrap_or_default();

        info!(
            payslip_id = payslip.id.as_str(),
            employee_id = employee.id,
            "Recalculating payslip"
        );

        self.calculate_payslip_with_inputs(&employee, payslip.pay_year, payslip.pay_month, &inputs)
            .await
    }

    /// Calculate payslips one employee at a time
    ///
    /// Failures are logged and the employee is left out of the result.
    pub async fn bulk_calculate_payslips(
        &self,
        employees: &[Employee],
        year: i32,
        month: u32,
    ) -> Vec<Payslip> {
        let mut payslips = Vec::with_capacity(employees.len());

        for employee in employees {
            match self.calculate_payslip(employee, year, month).await {
                Ok(payslip) => payslips.push(payslip),
                Err(e) => {
                    error!(
                        employee_id = employee.id,
                        year,
                        month,
                        error = %e,
                        "Failed to calculate payslip"
                    );
                }
            }
        }

        payslips
    }
}
