// MySQL access for salary component definitions.
//
// The calculation engine only reads components; creation and deactivation
// are here for configuration seeding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};

use crate::core::{AppError, Result};
use crate::modules::components::models::{CalculationMethod, ComponentKind, SalaryComponent};

/// Read/write access to salary component definitions
#[async_trait]
pub trait SalaryComponentRepository: Send + Sync {
    /// Active components of a company, ordered by display order then name
    async fn list_active(&self, company_id: i64) -> Result<Vec<SalaryComponent>>;

    /// Find a component by its unique code
    async fn find_by_code(&self, code: &str) -> Result<Option<SalaryComponent>>;

    /// Persist a new component; an empty code is replaced by a generated one
    async fn create(&self, component: SalaryComponent) -> Result<SalaryComponent>;

    /// Mark a component inactive
    async fn deactivate(&self, id: &str) -> Result<()>;
}

/// Repository for salary component database operations
pub struct MySqlSalaryComponentRepository {
    pool: MySqlPool,
}

impl MySqlSalaryComponentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn existing_codes(&self, prefix: &str) -> Result<Vec<String>> {
        let codes: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT code FROM payslip_salary_components
            WHERE code LIKE ?
            "#,
        )
        .bind(format!("{}%", prefix))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch component codes: {}", e)))?;

        Ok(codes.into_iter().map(|(code,)| code).collect())
    }
}

#[async_trait]
impl SalaryComponentRepository for MySqlSalaryComponentRepository {
    async fn list_active(&self, company_id: i64) -> Result<Vec<SalaryComponent>> {
        let rows = sqlx::query_as::<_, SalaryComponentRow>(
            r#"
            SELECT
                id, company_id, name, code, description, type, calculation_type,
                default_amount, default_rate, formula, is_taxable,
                is_provident_fund_applicable, is_active, display_order,
                created_at, updated_at
            FROM payslip_salary_components
            WHERE company_id = ? AND is_active = TRUE AND deleted_at IS NULL
            ORDER BY display_order ASC, name ASC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch salary components: {}", e)))?;

        rows.into_iter().map(|row| row.try_into()).collect()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<SalaryComponent>> {
        let row = sqlx::query_as::<_, SalaryComponentRow>(
            r#"
            SELECT
                id, company_id, name, code, description, type, calculation_type,
                default_amount, default_rate, formula, is_taxable,
                is_provident_fund_applicable, is_active, display_order,
                created_at, updated_at
            FROM payslip_salary_components
            WHERE code = ? AND deleted_at IS NULL
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch salary component: {}", e)))?;

        match row {
            Some(r) => Ok(Some(r.try_into()?)),
            None => Ok(None),
        }
    }

    async fn create(&self, mut component: SalaryComponent) -> Result<SalaryComponent> {
        if component.code.trim().is_empty() {
            let existing = self.existing_codes(component.kind.code_prefix()).await?;
            component.code = SalaryComponent::generate_code(
                component.kind,
                existing.iter().map(String::as_str),
            );
        }

        let (default_amount, default_rate, formula) = component.calculation.to_columns();

        sqlx::query(
            r#"
            INSERT INTO payslip_salary_components (
                id, company_id, name, code, description, type, calculation_type,
                default_amount, default_rate, formula, is_taxable,
                is_provident_fund_applicable, is_active, display_order,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&component.id)
        .bind(component.company_id)
        .bind(&component.name)
        .bind(&component.code)
        .bind(&component.description)
        .bind(component.kind.as_str())
        .bind(component.calculation.as_str())
        .bind(default_amount)
        .bind(default_rate)
        .bind(formula)
        .bind(component.is_taxable)
        .bind(component.is_provident_fund_applicable)
        .bind(component.is_active)
        .bind(component.display_order)
        .bind(component.created_at)
        .bind(component.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::validation(format!(
                        "Salary component with code '{}' already exists",
                        component.code
                    ));
                }
            }
            AppError::Internal(format!("Failed to create salary component: {}", e))
        })?;

        Ok(component)
    }

    async fn deactivate(&self, id: &str) -> Result<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE payslip_salary_components
            SET is_active = FALSE, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to deactivate component: {}", e)))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found(format!(
                "Salary component with id '{}' not found",
                id
            )));
        }

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct SalaryComponentRow {
    id: String,
    company_id: i64,
    name: String,
    code: String,
    description: Option<String>,
    #[sqlx(rename = "type")]
    kind: String,
    calculation_type: String,
    default_amount: Option<Decimal>,
    default_rate: Option<Decimal>,
    formula: Option<String>,
    is_taxable: bool,
    is_provident_fund_applicable: bool,
    is_active: bool,
    display_order: i32,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<SalaryComponentRow> for SalaryComponent {
    type Error = AppError;

    fn try_from(row: SalaryComponentRow) -> Result<Self> {
        let kind = ComponentKind::try_from(row.kind)
            .map_err(|e| AppError::Internal(format!("Invalid component in database: {}", e)))?;
        let calculation = CalculationMethod::from_columns(
            &row.calculation_type,
            row.default_amount,
            row.default_rate,
            row.formula,
        )?;

        Ok(SalaryComponent {
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            code: row.code,
            description: row.description,
            kind,
            calculation,
            is_taxable: row.is_taxable,
            is_provident_fund_applicable: row.is_provident_fund_applicable,
            is_active: row.is_active,
            display_order: row.display_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
