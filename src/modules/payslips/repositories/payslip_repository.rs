// MySQL persistence for payslips and their items.
//
// Implements:
// - Atomic recalculation: upsert header, delete old items, insert new items
// - Sequential payslip numbering under the header's row locks
// - Status/audit updates for lifecycle transitions

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result};
use crate::modules::components::ComponentKind;
use crate::modules::payslips::models::{
    CalculationDetails, Payslip, PayslipItem, PayslipNumbering, PayslipStatus,
};

#[async_trait]
pub trait PayslipRepository: Send + Sync {
    /// Payslip with its items
    async fn find_by_id(&self, id: &str) -> Result<Option<Payslip>>;

    /// Payslip of an employee for a period, with its items
    async fn find_by_period(&self, employee_id: i64, year: i32, month: u32)
        -> Result<Option<Payslip>>;

    /// Headers (no items) of a period, optionally for one company
    async fn list_for_period(
        &self,
        company_id: Option<i64>,
        year: i32,
        month: u32,
    ) -> Result<Vec<Payslip>>;

    /// Store a calculated payslip and replace its items in one transaction
    ///
    /// A payslip already stored for the same (employee, year, month) keeps
    /// its id and number; a new one receives the next number. The stored
    /// payslip must still be a draft, checked under the row lock; a
    /// soft-deleted one is restored as a draft.
    ///
    /// # Errors
    /// * `Validation` - the stored payslip is no longer a draft
    async fn save_calculation(&self, payslip: Payslip, numbering: &PayslipNumbering)
        -> Result<Payslip>;

    /// Persist status, audit stamps and notes
    async fn update_status(&self, payslip: &Payslip) -> Result<()>;
}

pub struct MySqlPayslipRepository {
    pool: MySqlPool,
}

impl MySqlPayslipRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, payslip_id: &str) -> Result<Vec<PayslipItem>> {
        let rows = sqlx::query_as::<_, PayslipItemRow>(
            r#"
            SELECT
                id, payslip_id, salary_component_id, component_name, component_code,
                component_type, base_amount, rate, calculated_amount,
                calculation_notes, display_order
            FROM payslip_payslip_items
            WHERE payslip_id = ?
            ORDER BY display_order ASC, component_name ASC
            "#,
        )
        .bind(payslip_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch payslip items: {}", e)))?;

        rows.into_iter().map(|row| row.try_into()).collect()
    }

    async fn with_items(&self, row: Option<PayslipRow>) -> Result<Option<Payslip>> {
        let Some(row) = row else {
            return Ok(None);
        };

        let mut payslip: Payslip = row.try_into()?;
        payslip.items = self.load_items(&payslip.id).await?;
        Ok(Some(payslip))
    }

    async fn next_number(
        tx: &mut Transaction<'_, MySql>,
        numbering: &PayslipNumbering,
    ) -> Result<String> {
        let last: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT payslip_number
            FROM payslip_payslips
            WHERE LEFT(payslip_number, CHAR_LENGTH(?)) = ?
            ORDER BY CHAR_LENGTH(payslip_number) DESC, payslip_number DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(&numbering.prefix)
        .bind(&numbering.prefix)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch last payslip number: {}", e)))?;

        Ok(numbering.next_after(last.iter().map(|(number,)| number.as_str())))
    }
}

#[async_trait]
impl PayslipRepository for MySqlPayslipRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Payslip>> {
        let row = sqlx::query_as::<_, PayslipRow>(
            r#"
            SELECT
                id, payslip_number, employee_id, company_id, salary_structure_id,
                pay_year, pay_month, pay_period_start, pay_period_end, status,
                basic_salary, total_working_days, days_present, days_absent,
                overtime_hours, total_earnings, total_deductions, gross_salary,
                net_salary, employer_contributions, overtime_amount, taxable_income,
                tax_deducted, provident_fund, processed_date, processed_by,
                approved_date, approved_by, paid_date, paid_by, notes,
                calculation_details, created_by, updated_by, created_at, updated_at
            FROM payslip_payslips
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch payslip: {}", e)))?;

        self.with_items(row).await
    }

    async fn find_by_period(
        &self,
        employee_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Option<Payslip>> {
        let row = sqlx::query_as::<_, PayslipRow>(
            r#"
            SELECT
                id, payslip_number, employee_id, company_id, salary_structure_id,
                pay_year, pay_month, pay_period_start, pay_period_end, status,
                basic_salary, total_working_days, days_present, days_absent,
                overtime_hours, total_earnings, total_deductions, gross_salary,
                net_salary, employer_contributions, overtime_amount, taxable_income,
                tax_deducted, provident_fund, processed_date, processed_by,
                approved_date, approved_by, paid_date, paid_by, notes,
                calculation_details, created_by, updated_by, created_at, updated_at
            FROM payslip_payslips
            WHERE employee_id = ? AND pay_year = ? AND pay_month = ?
              AND deleted_at IS NULL
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .bind(month as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch payslip: {}", e)))?;

        self.with_items(row).await
    }

    async fn list_for_period(
        &self,
        company_id: Option<i64>,
        year: i32,
        month: u32,
    ) -> Result<Vec<Payslip>> {
        let rows = sqlx::query_as::<_, PayslipRow>(
            r#"
            SELECT
                id, payslip_number, employee_id, company_id, salary_structure_id,
                pay_year, pay_month, pay_period_start, pay_period_end, status,
                basic_salary, total_working_days, days_present, days_absent,
                overtime_hours, total_earnings, total_deductions, gross_salary,
                net_salary, employer_contributions, overtime_amount, taxable_income,
                tax_deducted, provident_fund, processed_date, processed_by,
                approved_date, approved_by, paid_date, paid_by, notes,
                calculation_details, created_by, updated_by, created_at, updated_at
            FROM payslip_payslips
            WHERE pay_year = ? AND pay_month = ?
              AND (? IS NULL OR company_id = ?)
              AND deleted_at IS NULL
            ORDER BY payslip_number ASC
            "#,
        )
        .bind(year)
        .bind(month as i32)
        .bind(company_id)
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list payslips: {}", e)))?;

        rows.into_iter().map(|row| row.try_into()).collect()
    }

    async fn save_calculation(
        &self,
        mut payslip: Payslip,
        numbering: &PayslipNumbering,
    ) -> Result<Payslip> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        let existing = sqlx::query_as::<_, LockedPayslipRow>(
            r#"
            SELECT id, payslip_number, status, deleted_at
            FROM payslip_payslips
            WHERE employee_id = ? AND pay_year = ? AND pay_month = ?
            FOR UPDATE
            "#,
        )
        .bind(payslip.employee_id)
        .bind(payslip.pay_year)
        .bind(payslip.pay_month as i32)
        .fetch_optional(tx.as_mut())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to lock payslip: {}", e)))?;

        match existing {
            Some(locked) if locked.deleted_at.is_some() => {
                // A soft-deleted payslip for the period comes back as a fresh draft
                sqlx::query(
                    r#"
                    UPDATE payslip_payslips
                    SET status = ?, processed_date = NULL, processed_by = NULL,
                        approved_date = NULL, approved_by = NULL,
                        paid_date = NULL, paid_by = NULL, notes = NULL,
                        deleted_at = NULL
                    WHERE id = ?
                    "#,
                )
                .bind(PayslipStatus::Draft.as_str())
                .bind(&locked.id)
                .execute(tx.as_mut())
                .await
                .map_err(|e| AppError::Internal(format!("Failed to restore payslip: {}", e)))?;

                payslip.id = locked.id;
                payslip.payslip_number = locked.payslip_number;
            }
            Some(locked) => {
                if locked.status != PayslipStatus::Draft.as_str() {
                    return Err(AppError::validation(format!(
                        "Payslip {} is {} and can no longer be recalculated",
                        locked.payslip_number, locked.status
                    )));
                }
                payslip.id = locked.id;
                payslip.payslip_number = locked.payslip_number;
            }
            None => {
                payslip.payslip_number = Self::next_number(&mut tx, numbering).await?;
            }
        }

        for item in &mut payslip.items {
            item.payslip_id = payslip.id.clone();
        }

        sqlx::query(
            r#"
            INSERT INTO payslip_payslips (
                id, payslip_number, employee_id, company_id, salary_structure_id,
                pay_year, pay_month, pay_period_start, pay_period_end, status,
                basic_salary, total_working_days, days_present, days_absent,
                overtime_hours, total_earnings, total_deductions, gross_salary,
                net_salary, employer_contributions, overtime_amount, taxable_income,
                tax_deducted, provident_fund, processed_date, processed_by,
                approved_date, approved_by, paid_date, paid_by, notes,
                calculation_details, created_by, updated_by, created_at, updated_at
            ) VALUES (
                ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?
            )
            ON DUPLICATE KEY UPDATE
                salary_structure_id = VALUES(salary_structure_id),
                pay_period_start = VALUES(pay_period_start),
                pay_period_end = VALUES(pay_period_end),
                basic_salary = VALUES(basic_salary),
                total_working_days = VALUES(total_working_days),
                days_present = VALUES(days_present),
                days_absent = VALUES(days_absent),
                overtime_hours = VALUES(overtime_hours),
                total_earnings = VALUES(total_earnings),
                total_deductions = VALUES(total_deductions),
                gross_salary = VALUES(gross_salary),
                net_salary = VALUES(net_salary),
                employer_contributions = VALUES(employer_contributions),
                overtime_amount = VALUES(overtime_amount),
                taxable_income = VALUES(taxable_income),
                tax_deducted = VALUES(tax_deducted),
                provident_fund = VALUES(provident_fund),
                calculation_details = VALUES(calculation_details),
                updated_by = VALUES(updated_by),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(&payslip.id)
        .bind(&payslip.payslip_number)
        .bind(payslip.employee_id)
        .bind(payslip.company_id)
        .bind(&payslip.salary_structure_id)
        .bind(payslip.pay_year)
        .bind(payslip.pay_month as i32)
        .bind(payslip.pay_period_start)
        .bind(payslip.pay_period_end)
        .bind(payslip.status.as_str())
        .bind(payslip.basic_salary)
        .bind(payslip.total_working_days)
        .bind(payslip.days_present)
        .bind(payslip.days_absent)
        .bind(payslip.overtime_hours)
        .bind(payslip.total_earnings)
        .bind(payslip.total_deductions)
        .bind(payslip.gross_salary)
        .bind(payslip.net_salary)
        .bind(payslip.employer_contributions)
        .bind(payslip.overtime_amount)
        .bind(payslip.taxable_income)
        .bind(payslip.tax_deducted)
        .bind(payslip.provident_fund)
        .bind(payslip.processed_date)
        .bind(payslip.processed_by)
        .bind(payslip.approved_date)
        .bind(payslip.approved_by)
        .bind(payslip.paid_date)
        .bind(payslip.paid_by)
        .bind(&payslip.notes)
        .bind(payslip.calculation_details.as_ref().map(Json))
        .bind(payslip.created_by)
        .bind(payslip.updated_by)
        .bind(payslip.created_at)
        .bind(payslip.updated_at)
        .execute(tx.as_mut())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to save payslip: {}", e)))?;

        sqlx::query("DELETE FROM payslip_payslip_items WHERE payslip_id = ?")
            .bind(&payslip.id)
            .execute(tx.as_mut())
            .await
            .map_err(|e| AppError::Internal(format!("Failed to clear payslip items: {}", e)))?;

        for item in &payslip.items {
            sqlx::query(
                r#"
                INSERT INTO payslip_payslip_items (
                    id, payslip_id, salary_component_id, component_name, component_code,
                    component_type, base_amount, rate, calculated_amount,
                    calculation_notes, display_order, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.id)
            .bind(&item.payslip_id)
            .bind(&item.salary_component_id)
            .bind(&item.component_name)
            .bind(&item.component_code)
            .bind(item.component_kind.as_str())
            .bind(item.base_amount)
            .bind(item.rate)
            .bind(item.calculated_amount)
            .bind(&item.calculation_notes)
            .bind(item.display_order)
            .bind(payslip.updated_at)
            .bind(payslip.updated_at)
            .execute(tx.as_mut())
            .await
            .map_err(|e| AppError::Internal(format!("Failed to insert payslip item: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(payslip)
    }

    async fn update_status(&self, payslip: &Payslip) -> Result<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE payslip_payslips
            SET status = ?,
                processed_date = ?, processed_by = ?,
                approved_date = ?, approved_by = ?,
                paid_date = ?, paid_by = ?,
                notes = ?, updated_by = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(payslip.status.as_str())
        .bind(payslip.processed_date)
        .bind(payslip.processed_by)
        .bind(payslip.approved_date)
        .bind(payslip.approved_by)
        .bind(payslip.paid_date)
        .bind(payslip.paid_by)
        .bind(&payslip.notes)
        .bind(payslip.updated_by)
        .bind(payslip.updated_at)
        .bind(&payslip.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update payslip status: {}", e)))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::not_found(format!(
                "Payslip with id '{}' not found",
                payslip.id
            )));
        }

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct LockedPayslipRow {
    id: String,
    payslip_number: String,
    status: String,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct PayslipRow {
    id: String,
    payslip_number: String,
    employee_id: i64,
    company_id: i64,
    salary_structure_id: String,
    pay_year: i32,
    pay_month: i32,
    pay_period_start: NaiveDate,
    pay_period_end: NaiveDate,
    status: String,
    basic_salary: Decimal,
    total_working_days: i32,
    days_present: i32,
    days_absent: i32,
    overtime_hours: Decimal,
    total_earnings: Decimal,
    total_deductions: Decimal,
    gross_salary: Decimal,
    net_salary: Decimal,
    employer_contributions: Decimal,
    overtime_amount: Decimal,
    taxable_income: Decimal,
    tax_deducted: Decimal,
    provident_fund: Decimal,
    processed_date: Option<NaiveDate>,
    processed_by: Option<i64>,
    approved_date: Option<NaiveDate>,
    approved_by: Option<i64>,
    paid_date: Option<NaiveDate>,
    paid_by: Option<i64>,
    notes: Option<String>,
    calculation_details: Option<Json<CalculationDetails>>,
    created_by: Option<i64>,
    updated_by: Option<i64>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<PayslipRow> for Payslip {
    type Error = AppError;

    fn try_from(row: PayslipRow) -> Result<Self> {
        let status = PayslipStatus::try_from(row.status)
            .map_err(|e| AppError::Internal(format!("Invalid payslip in database: {}", e)))?;
        let pay_month = u32::try_from(row.pay_month).map_err(|_| {
            AppError::Internal(format!("Invalid pay month in database: {}", row.pay_month))
        })?;

        Ok(Payslip {
            id: row.id,
            payslip_number: row.payslip_number,
            employee_id: row.employee_id,
            company_id: row.company_id,
            salary_structure_id: row.salary_structure_id,
            pay_year: row.pay_year,
            pay_month,
            pay_period_start: row.pay_period_start,
            pay_period_end: row.pay_period_end,
            status,
            basic_salary: row.basic_salary,
            total_working_days: row.total_working_days,
            days_present: row.days_present,
            days_absent: row.days_absent,
            overtime_hours: row.overtime_hours,
            total_earnings: row.total_earnings,
            total_deductions: row.total_deductions,
            gross_salary: row.gross_salary,
            net_salary: row.net_salary,
            employer_contributions: row.employer_contributions,
            overtime_amount: row.overtime_amount,
            taxable_income: row.taxable_income,
            tax_deducted: row.tax_deducted,
            provident_fund: row.provident_fund,
            processed_date: row.processed_date,
            processed_by: row.processed_by,
            approved_date: row.approved_date,
            approved_by: row.approved_by,
            paid_date: row.paid_date,
            paid_by: row.paid_by,
            notes: row.notes,
            calculation_details: row.calculation_details.map(|json| json.0),
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            items: vec![],
        })
    }
}

#[derive(Debug, FromRow)]
struct PayslipItemRow {
    id: String,
    payslip_id: String,
    salary_component_id: String,
    component_name: String,
    component_code: String,
    component_type: String,
    base_amount: Decimal,
    rate: Option<Decimal>,
    calculated_amount: Decimal,
    calculation_notes: Option<String>,
    display_order: i32,
}

impl TryFrom<PayslipItemRow> for PayslipItem {
    type Error = AppError;

    fn try_from(row: PayslipItemRow) -> Result<Self> {
        let component_kind = ComponentKind::try_from(row.component_type)
            .map_err(|e| AppError::Internal(format!("Invalid payslip item in database: {}", e)))?;

        Ok(PayslipItem {
            id: row.id,
            payslip_id: row.payslip_id,
            salary_component_id: row.salary_component_id,
            component_name: row.component_name,
            component_code: row.component_code,
            component_kind,
            base_amount: row.base_amount,
            rate: row.rate,
            calculated_amount: row.calculated_amount,
            calculation_notes: row.calculation_notes,
            display_order: row.display_order,
        })
    }
}
