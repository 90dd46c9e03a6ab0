// Read-only view of the host application's employee directory.

use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::employees::models::Employee;

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>>;

    /// Employees holding an active salary assignment, optionally narrowed to
    /// one company and/or one employee
    async fn list_payable(
        &self,
        company_id: Option<i64>,
        employee_id: Option<i64>,
    ) -> Result<Vec<Employee>>;
}

pub struct MySqlEmployeeRepository {
    pool: MySqlPool,
}

impl MySqlEmployeeRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for MySqlEmployeeRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Employee>> {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, name, company_id
            FROM employees_employees
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch employee: {}", e)))
    }

    async fn list_payable(
        &self,
        company_id: Option<i64>,
        employee_id: Option<i64>,
    ) -> Result<Vec<Employee>> {
        sqlx::query_as::<_, Employee>(
            r#"
            SELECT e.id, e.name, e.company_id
            FROM employees_employees e
            WHERE e.deleted_at IS NULL
              AND (? IS NULL OR e.company_id = ?)
              AND (? IS NULL OR e.id = ?)
              AND EXISTS (
                  SELECT 1 FROM payslip_employee_salary_structures s
                  WHERE s.employee_id = e.id AND s.is_active = TRUE
              )
            ORDER BY e.id
            "#,
        )
        .bind(company_id)
        .bind(company_id)
        .bind(employee_id)
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list employees: {}", e)))
    }
}
