use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};

use crate::core::{AppError, Result};
use crate::modules::attendance::models::AttendanceSummary;

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn find(&self, employee_id: i64, year: i32, month: u32)
        -> Result<Option<AttendanceSummary>>;

    /// Return the stored summary for the defaults' period, inserting the
    /// defaults first when none exists
    async fn find_or_create(&self, defaults: AttendanceSummary) -> Result<AttendanceSummary>;

    /// Insert or replace the figures of a period
    async fn save(&self, summary: &AttendanceSummary) -> Result<()>;
}

pub struct MySqlAttendanceRepository {
    pool: MySqlPool,
}

impl MySqlAttendanceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceRepository for MySqlAttendanceRepository {
    async fn find(
        &self,
        employee_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Option<AttendanceSummary>> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT
                id, employee_id, company_id, year, month, total_working_days,
                days_present, days_absent, days_weekend, days_holiday, days_leave,
                regular_hours, overtime_hours, late_hours, early_departure_hours,
                daily_breakdown, is_finalized, finalized_at, finalized_by,
                created_at, updated_at
            FROM payslip_attendance_summaries
            WHERE employee_id = ? AND year = ? AND month = ?
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .bind(month as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch attendance summary: {}", e)))?;

        match row {
            Some(r) => Ok(Some(r.try_into()?)),
            None => Ok(None),
        }
    }

    async fn find_or_create(&self, defaults: AttendanceSummary) -> Result<AttendanceSummary> {
        // The (employee, year, month) unique key makes a concurrent insert a no-op
        sqlx::query(
            r#"
            INSERT IGNORE INTO payslip_attendance_summaries (
                id, employee_id, company_id, year, month, total_working_days,
                days_present, days_absent, days_weekend, days_holiday, days_leave,
                regular_hours, overtime_hours, late_hours, early_departure_hours,
                daily_breakdown, is_finalized, finalized_at, finalized_by,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&defaults.id)
        .bind(defaults.employee_id)
        .bind(defaults.company_id)
        .bind(defaults.year)
        .bind(defaults.month as i32)
        .bind(defaults.total_working_days)
        .bind(defaults.days_present)
        .bind(defaults.days_absent)
        .bind(defaults.days_weekend)
        .bind(defaults.days_holiday)
        .bind(defaults.days_leave)
        .bind(defaults.regular_hours)
        .bind(defaults.overtime_hours)
        .bind(defaults.late_hours)
        .bind(defaults.early_departure_hours)
        .bind(defaults.daily_breakdown.as_ref().map(Json))
        .bind(defaults.is_finalized)
        .bind(defaults.finalized_at)
        .bind(defaults.finalized_by)
        .bind(defaults.created_at)
        .bind(defaults.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create attendance summary: {}", e)))?;

        self.find(defaults.employee_id, defaults.year, defaults.month)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Attendance summary for employee {} vanished after insert",
                    defaults.employee_id
                ))
            })
    }

    async fn save(&self, summary: &AttendanceSummary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payslip_attendance_summaries (
                id, employee_id, company_id, year, month, total_working_days,
                days_present, days_absent, days_weekend, days_holiday, days_leave,
                regular_hours, overtime_hours, late_hours, early_departure_hours,
                daily_breakdown, is_finalized, finalized_at, finalized_by,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                total_working_days = VALUES(total_working_days),
                days_present = VALUES(days_present),
                days_absent = VALUES(days_absent),
                days_weekend = VALUES(days_weekend),
                days_holiday = VALUES(days_holiday),
                days_leave = VALUES(days_leave),
                regular_hours = VALUES(regular_hours),
                overtime_hours = VALUES(overtime_hours),
                late_hours = VALUES(late_hours),
                early_departure_hours = VALUES(early_departure_hours),
                daily_breakdown = VALUES(daily_breakdown),
                is_finalized = VALUES(is_finalized),
                finalized_at = VALUES(finalized_at),
                finalized_by = VALUES(finalized_by),
                updated_at = VALUES(updated_at)
            "#,
        )
        .bind(&summary.id)
        .bind(summary.employee_id)
        .bind(summary.company_id)
        .bind(summary.year)
        .bind(summary.month as i32)
        .bind(summary.total_working_days)
        .bind(summary.days_present)
        .bind(summary.days_absent)
        .bind(summary.days_weekend)
        .bind(summary.days_holiday)
        .bind(summary.days_leave)
        .bind(summary.regular_hours)
        .bind(summary.overtime_hours)
        .bind(summary.late_hours)
        .bind(summary.early_departure_hours)
        .bind(summary.daily_breakdown.as_ref().map(Json))
        .bind(summary.is_finalized)
        .bind(summary.finalized_at)
        .bind(summary.finalized_by)
        .bind(summary.created_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to save attendance summary: {}", e)))?;

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct AttendanceRow {
    id: String,
    employee_id: i64,
    company_id: i64,
    year: i32,
    month: i32,
    total_working_days: i32,
    days_present: i32,
    days_absent: i32,
    days_weekend: i32,
    days_holiday: i32,
    days_leave: i32,
    regular_hours: Decimal,
    overtime_hours: Decimal,
    late_hours: Decimal,
    early_departure_hours: Decimal,
    daily_breakdown: Option<Json<serde_json::Value>>,
    is_finalized: bool,
    finalized_at: Option<DateTime<Utc>>,
    finalized_by: Option<i64>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<AttendanceRow> for AttendanceSummary {
    type Error = AppError;

    fn try_from(row: AttendanceRow) -> Result<Self> {
        let month = u32::try_from(row.month)
            .map_err(|_| AppError::Internal(format!("Invalid month in database: {}", row.month)))?;

        Ok(AttendanceSummary {
            id: row.id,
            employee_id: row.employee_id,
            company_id: row.company_id,
            year: row.year,
            month,
            total_working_days: row.total_working_days,
            days_present: row.days_present,
            days_absent: row.days_absent,
            days_weekend: row.days_weekend,
            days_holiday: row.days_holiday,
            days_leave: row.days_leave,
            regular_hours: row.regular_hours,
            overtime_hours: row.overtime_hours,
            late_hours: row.late_hours,
            early_departure_hours: row.early_departure_hours,
            daily_breakdown: row.daily_breakdown.map(|json| json.0),
            is_finalized: row.is_finalized,
            finalized_at: row.finalized_at,
            finalized_by: row.finalized_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
