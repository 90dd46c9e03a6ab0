// In-memory repositories
//
// Behave like the MySQL implementations for the queries the engine issues:
// soft filters on active rows, upsert per (employee, year, month), and
// payslip numbers assigned on first save.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use payslip_engine::attendance::{AttendanceRepository, AttendanceSummary};
use payslip_engine::components::{SalaryComponent, SalaryComponentRepository};
use payslip_engine::core::{AppError, Result};
use payslip_engine::employees::{Employee, EmployeeRepository};
use payslip_engine::payslips::{
    Payslip, PayslipNumbering, PayslipRepository, PayrollRepositories,
};
use payslip_engine::structures::{
    EmployeeSalaryStructure, SalaryStructure, SalaryStructureRepository,
};

fn lock_error<T>(_: T) -> AppError {
    AppError::internal("in-memory store lock poisoned")
}

#[derive(Default)]
pub struct InMemoryComponentRepository {
    components: Mutex<Vec<SalaryComponent>>,
}

#[async_trait]
impl SalaryComponentRepository for InMemoryComponentRepository {
    async fn list_active(&self, company_id: i64) -> Result<Vec<SalaryComponent>> {
        let components = self.components.lock().map_err(lock_error)?;
        let mut active: Vec<SalaryComponent> = components
            .iter()
            .filter(|c| c.company_id == company_id && c.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(active)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<SalaryComponent>> {
        let components = self.components.lock().map_err(lock_error)?;
        Ok(components.iter().find(|c| c.code == code).cloned())
    }

    async fn create(&self, mut component: SalaryComponent) -> Result<SalaryComponent> {
        let mut components = self.components.lock().map_err(lock_error)?;
        if component.code.is_empty() {
            component.code = SalaryComponent::generate_code(
                component.kind,
                components.iter().map(|c| c.code.as_str()),
            );
        }
        if components.iter().any(|c| c.code == component.code) {
            return Err(AppError::validation(format!(
                "Component code '{}' already exists",
                component.code
            )));
        }
        components.push(component.clone());
        Ok(component)
    }

    async fn deactivate(&self, id: &str) -> Result<()> {
        let mut components = self.components.lock().map_err(lock_error)?;
        let component = components
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found(format!("Component {} not found", id)))?;
        component.deactivate();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryStructureRepository {
    structures: Mutex<Vec<SalaryStructure>>,
    assignments: Mutex<Vec<EmployeeSalaryStructure>>,
}

impl InMemoryStructureRepository {
    /// Active assignments, whatever their effective range
    pub fn has_active_assignment(&self, employee_id: i64) -> bool {
        self.assignments
            .lock()
            .map(|assignments| {
                assignments
                    .iter()
                    .any(|a| a.employee_id == employee_id && a.is_active)
            })
            .unwrap_or(false)
    }
}

#[async_trait]
impl SalaryStructureRepository for InMemoryStructureRepository {
    async fn find_effective_assignment(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<Option<EmployeeSalaryStructure>> {
        let assignment = {
            let assignments = self.assignments.lock().map_err(lock_error)?;
            assignments
                .iter()
                .filter(|a| a.employee_id == employee_id && a.is_active && a.is_effective_on(date))
                .max_by_key(|a| a.effective_from)
                .cloned()
        };

        let Some(mut assignment) = assignment else {
            return Ok(None);
        };
        assignment.structure = self.find_structure(&assignment.salary_structure_id).await?;
        Ok(Some(assignment))
    }

    async fn find_structure(&self, id: &str) -> Result<Option<SalaryStructure>> {
        let structures = self.structures.lock().map_err(lock_error)?;
        Ok(structures.iter().find(|s| s.id == id).cloned())
    }

    async fn create_structure(&self, structure: SalaryStructure) -> Result<SalaryStructure> {
        let mut structures = self.structures.lock().map_err(lock_error)?;
        if structure.is_default {
            for other in structures
                .iter_mut()
                .filter(|s| s.company_id == structure.company_id)
            {
                other.is_default = false;
            }
        }
        structures.push(structure.clone());
        Ok(structure)
    }

    async fn assign(&self, assignment: EmployeeSalaryStructure) -> Result<EmployeeSalaryStructure> {
        let mut assignments = self.assignments.lock().map_err(lock_error)?;
        if assignment.is_active {
            for other in assignments
                .iter_mut()
                .filter(|a| a.employee_id == assignment.employee_id)
            {
                other.is_active = false;
            }
        }
        assignments.push(assignment.clone());
        Ok(assignment)
    }
}

#[derive(Default)]
pub struct InMemoryAttendanceRepository {
    summaries: Mutex<HashMap<(i64, i32, u32), AttendanceSummary>>,
}

#[async_trait]
impl AttendanceRepository for InMemoryAttendanceRepository {
    async fn find(&self, employee_id: i64, year: i32, month: u32) -> Result<Option<AttendanceSummary>> {
        let summaries = self.summaries.lock().map_err(lock_error)?;
        Ok(summaries.get(&(employee_id, year, month)).cloned())
    }

    async fn find_or_create(&self, defaults: AttendanceSummary) -> Result<AttendanceSummary> {
        let mut summaries = self.summaries.lock().map_err(lock_error)?;
        let key = (defaults.employee_id, defaults.year, defaults.month);
        Ok(summaries.entry(key).or_insert(defaults).clone())
    }

    async fn save(&self, summary: &AttendanceSummary) -> Result<()> {
        let mut summaries = self.summaries.lock().map_err(lock_error)?;
        summaries.insert(
            (summary.employee_id, summary.year, summary.month),
            summary.clone(),
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPayslipRepository {
    payslips: Mutex<Vec<Payslip>>,
}

impl InMemoryPayslipRepository {
    pub fn count(&self) -> usize {
        self.payslips.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Store a payslip as-is, bypassing numbering
    pub fn insert(&self, payslip: Payslip) {
        if let Ok(mut payslips) = self.payslips.lock() {
            payslips.push(payslip);
        }
    }
}

#[async_trait]
impl PayslipRepository for InMemoryPayslipRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Payslip>> {
        let payslips = self.payslips.lock().map_err(lock_error)?;
        Ok(payslips.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_period(&self, employee_id: i64, year: i32, month: u32) -> Result<Option<Payslip>> {
        let payslips = self.payslips.lock().map_err(lock_error)?;
        Ok(payslips
            .iter()
            .find(|p| p.employee_id == employee_id && p.pay_year == year && p.pay_month == month)
            .cloned())
    }

    async fn list_for_period(
        &self,
        company_id: Option<i64>,
        year: i32,
        month: u32,
    ) -> Result<Vec<Payslip>> {
        let payslips = self.payslips.lock().map_err(lock_error)?;
        Ok(payslips
            .iter()
            .filter(|p| p.pay_year == year && p.pay_month == month)
            .filter(|p| company_id.map_or(true, |company| p.company_id == company))
            .map(|p| Payslip {
                items: vec![],
                ..p.clone()
            })
            .collect())
    }

    async fn save_calculation(
        &self,
        mut payslip: Payslip,
        numbering: &PayslipNumbering,
    ) -> Result<Payslip> {
        let mut payslips = self.payslips.lock().map_err(lock_error)?;

        let position = payslips.iter().position(|p| {
            p.employee_id == payslip.employee_id
                && p.pay_year == payslip.pay_year
                && p.pay_month == payslip.pay_month
        });

        match position {
            Some(index) => {
                let existing = &payslips[index];
                if !existing.is_editable() {
                    return Err(AppError::validation(format!(
                        "Payslip {} is {} and can no longer be recalculated",
                        existing.payslip_number, existing.status
                    )));
                }
                payslip.id = existing.id.clone();
                payslip.payslip_number = existing.payslip_number.clone();
                for item in &mut payslip.items {
                    item.payslip_id = payslip.id.clone();
                }
                payslips[index] = payslip.clone();
            }
            None => {
                payslip.payslip_number =
                    numbering.next_after(payslips.iter().map(|p| p.payslip_number.as_str()));
                payslips.push(payslip.clone());
            }
        }

        Ok(payslip)
    }

    async fn update_status(&self, payslip: &Payslip) -> Result<()> {
        let mut payslips = self.payslips.lock().map_err(lock_error)?;
        let stored = payslips
            .iter_mut()
            .find(|p| p.id == payslip.id)
            .ok_or_else(|| AppError::not_found(format!("Payslip {} not found", payslip.id)))?;

        stored.status = payslip.status;
        stored.processed_date = payslip.processed_date;
        stored.processed_by = payslip.processed_by;
        stored.approved_date = payslip.approved_date;
        stored.approved_by = payslip.approved_by;
        stored.paid_date = payslip.paid_date;
        stored.paid_by = payslip.paid_by;
        stored.notes = payslip.notes.clone();
        stored.updated_by = payslip.updated_by;
        stored.updated_at = payslip.updated_at;
        Ok(())
    }
}

pub struct InMemoryEmployeeRepository {
    employees: Mutex<Vec<Employee>>,
    structures: Arc<InMemoryStructureRepository>,
}

impl InMemoryEmployeeRepository {
    pub fn new(structures: Arc<InMemoryStructureRepository>) -> Self {
        Self {
            employees: Mutex::new(vec![]),
            structures,
        }
    }

    pub fn add(&self, employee: Employee) {
        if let Ok(mut employees) = self.employees.lock() {
            employees.push(employee);
        }
    }
}

#[async_trait]
impl EmployeeRepository for InMemoryEmployeeRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>> {
        let employees = self.employees.lock().map_err(lock_error)?;
        Ok(employees.iter().find(|e| e.id == id).cloned())
    }

    async fn list_payable(
        &self,
        company_id: Option<i64>,
        employee_id: Option<i64>,
    ) -> Result<Vec<Employee>> {
        let employees = self.employees.lock().map_err(lock_error)?;
        let mut payable: Vec<Employee> = employees
            .iter()
            .filter(|e| company_id.map_or(true, |company| e.company_id == company))
            .filter(|e| employee_id.map_or(true, |id| e.id == id))
            .filter(|e| self.structures.has_active_assignment(e.id))
            .cloned()
            .collect();
        payable.sort_by_key(|e| e.id);
        Ok(payable)
    }
}

/// All five stores, with typed handles kept for seeding and assertions
pub struct InMemoryPayroll {
    pub components: Arc<InMemoryComponentRepository>,
    pub structures: Arc<InMemoryStructureRepository>,
    pub attendance: Arc<InMemoryAttendanceRepository>,
    pub payslips: Arc<InMemoryPayslipRepository>,
    pub employees: Arc<InMemoryEmployeeRepository>,
}

impl InMemoryPayroll {
    pub fn new() -> Self {
        let structures = Arc::new(InMemoryStructureRepository::default());
        Self {
            components: Arc::new(InMemoryComponentRepository::default()),
            employees: Arc::new(InMemoryEmployeeRepository::new(structures.clone())),
            structures,
            attendance: Arc::new(InMemoryAttendanceRepository::default()),
            payslips: Arc::new(InMemoryPayslipRepository::default()),
        }
    }

    pub fn repositories(&self) -> PayrollRepositories {
        PayrollRepositories {
            components: self.components.clone(),
            structures: self.structures.clone(),
            attendance: self.attendance.clone(),
            payslips: self.payslips.clone(),
            employees: self.employees.clone(),
        }
    }
}

impl Default for InMemoryPayroll {
    fn default() -> Self {
        Self::new()
    }
}
