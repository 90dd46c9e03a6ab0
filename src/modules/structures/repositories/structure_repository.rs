// MySQL access for salary structures and employee assignments.
//
// Implements:
// - Create structure (single default per company)
// - Assign structure to employee (single active assignment per employee)
// - Look up the assignment effective on a date, with its template loaded

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};

use crate::core::{AppError, Result};
use crate::modules::structures::models::{
    EmployeeSalaryStructure, PayPeriod, SalaryStructure, StructureEntry,
};

#[async_trait]
pub trait SalaryStructureRepository: Send + Sync {
    /// Active assignment whose effective range covers `date`, template included
    async fn find_effective_assignment(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<Option<EmployeeSalaryStructure>>;

    async fn find_structure(&self, id: &str) -> Result<Option<SalaryStructure>>;

    /// Persist a structure; saving a default clears other defaults of the company
    async fn create_structure(&self, structure: SalaryStructure) -> Result<SalaryStructure>;

    /// Persist an assignment; saving an active one deactivates the employee's others
    async fn assign(&self, assignment: EmployeeSalaryStructure) -> Result<EmployeeSalaryStructure>;
}

pub struct MySqlSalaryStructureRepository {
    pool: MySqlPool,
}

impl MySqlSalaryStructureRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SalaryStructureRepository for MySqlSalaryStructureRepository {
    async fn find_effective_assignment(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> Result<Option<EmployeeSalaryStructure>> {
        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT
                id, employee_id, company_id, salary_structure_id, basic_salary,
                custom_allowances, custom_deductions, effective_from, effective_to,
                is_active, notes, created_at, updated_at
            FROM payslip_employee_salary_structures
            WHERE employee_id = ?
              AND is_active = TRUE
              AND effective_from <= ?
              AND (effective_to IS NULL OR effective_to >= ?)
            ORDER BY effective_from DESC
            LIMIT 1
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch salary assignment: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let structure = self.find_structure(&row.salary_structure_id).await?;
        let mut assignment = row.into_assignment();
        assignment.structure = structure;

        Ok(Some(assignment))
    }

    async fn find_structure(&self, id: &str) -> Result<Option<SalaryStructure>> {
        let row = sqlx::query_as::<_, StructureRow>(
            r#"
            SELECT
                id, company_id, name, code, description, pay_period, basic_salary,
                allowances, deductions, is_active, is_default, created_at, updated_at
            FROM payslip_salary_structures
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch salary structure: {}", e)))?;

        match row {
            Some(r) => Ok(Some(r.try_into()?)),
            None => Ok(None),
        }
    }

    async fn create_structure(&self, structure: SalaryStructure) -> Result<SalaryStructure> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        if structure.is_default {
            sqlx::query(
                r#"
                UPDATE payslip_salary_structures
                SET is_default = FALSE
                WHERE company_id = ? AND id <> ?
                "#,
            )
            .bind(structure.company_id)
            .bind(&structure.id)
            .execute(tx.as_mut())
            .await
            .map_err(|e| AppError::Internal(format!("Failed to clear default structure: {}", e)))?;
        }

        sqlx::query(
            r#"
            INSERT INTO payslip_salary_structures (
                id, company_id, name, code, description, pay_period, basic_salary,
                allowances, deductions, is_active, is_default, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&structure.id)
        .bind(structure.company_id)
        .bind(&structure.name)
        .bind(&structure.code)
        .bind(&structure.description)
        .bind(structure.pay_period.as_str())
        .bind(structure.basic_salary)
        .bind(Json(&structure.allowances))
        .bind(Json(&structure.deductions))
        .bind(structure.is_active)
        .bind(structure.is_default)
        .bind(structure.created_at)
        .bind(structure.updated_at)
        .execute(tx.as_mut())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create salary structure: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(structure)
    }

    async fn assign(&self, assignment: EmployeeSalaryStructure) -> Result<EmployeeSalaryStructure> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        if assignment.is_active {
            sqlx::query(
                r#"
                UPDATE payslip_employee_salary_structures
                SET is_active = FALSE, updated_at = ?
                WHERE employee_id = ? AND id <> ?
                "#,
            )
            .bind(Utc::now())
            .bind(assignment.employee_id)
            .bind(&assignment.id)
            .execute(tx.as_mut())
            .await
            .map_err(|e| {
                AppError::Internal(format!("Failed to deactivate previous assignments: {}", e))
            })?;
        }

        sqlx::query(
            r#"
            INSERT INTO payslip_employee_salary_structures (
                id, employee_id, company_id, salary_structure_id, basic_salary,
                custom_allowances, custom_deductions, effective_from, effective_to,
                is_active, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&assignment.id)
        .bind(assignment.employee_id)
        .bind(assignment.company_id)
        .bind(&assignment.salary_structure_id)
        .bind(assignment.basic_salary)
        .bind(Json(&assignment.custom_allowances))
        .bind(Json(&assignment.custom_deductions))
        .bind(assignment.effective_from)
        .bind(assignment.effective_to)
        .bind(assignment.is_active)
        .bind(&assignment.notes)
        .bind(assignment.created_at)
        .bind(assignment.updated_at)
        .execute(tx.as_mut())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create salary assignment: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(assignment)
    }
}

#[derive(Debug, FromRow)]
struct StructureRow {
    id: String,
    company_id: i64,
    name: String,
    code: String,
    description: Option<String>,
    pay_period: String,
    basic_salary: Decimal,
    allowances: Option<Json<Vec<StructureEntry>>>,
    deductions: Option<Json<Vec<StructureEntry>>>,
    is_active: bool,
    is_default: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<StructureRow> for SalaryStructure {
    type Error = AppError;

    fn try_from(row: StructureRow) -> Result<Self> {
        let pay_period = PayPeriod::try_from(row.pay_period)
            .map_err(|e| AppError::Internal(format!("Invalid structure in database: {}", e)))?;

        Ok(SalaryStructure {
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            code: row.code,
            description: row.description,
            pay_period,
            basic_salary: row.basic_salary,
            allowances: row.allowances.map(|json| json.0).unwrap_or_default(),
            deductions: row.deductions.map(|json| json.0).unwrap_or_default(),
            is_active: row.is_active,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: String,
    employee_id: i64,
    company_id: i64,
    salary_structure_id: String,
    basic_salary: Decimal,
    custom_allowances: Option<Json<Vec<StructureEntry>>>,
    custom_deductions: Option<Json<Vec<StructureEntry>>>,
    effective_from: NaiveDate,
    effective_to: Option<NaiveDate>,
    is_active: bool,
    notes: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl AssignmentRow {
    fn into_assignment(self) -> EmployeeSalaryStructure {
        EmployeeSalaryStructure {
            id: self.id,
            employee_id: self.employee_id,
            company_id: self.company_id,
            salary_structure_id: self.salary_structure_id,
            basic_salary: self.basic_salary,
            custom_allowances: self.custom_allowances.map(|json| json.0).unwrap_or_default(),
            custom_deductions: self.custom_deductions.map(|json| json.0).unwrap_or_default(),
            effective_from: self.effective_from,
            effective_to: self.effective_to,
            is_active: self.is_active,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            structure: None,
        }
    }
}
