// Monthly attendance roll-up for one employee. The payroll engine only reads
// it; when no record exists for a period one is created that assumes full
// attendance.

use chrono::{DateTime, Datelike, Month, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub id: String,
    pub employee_id: i64,
    pub company_id: i64,
    pub year: i32,
    pub month: u32,
    pub total_working_days: i32,
    pub days_present: i32,
    pub days_absent: i32,
    pub days_weekend: i32,
    pub days_holiday: i32,
    pub days_leave: i32,
    pub regular_hours: Decimal,
    pub overtime_hours: Decimal,
    pub late_hours: Decimal,
    pub early_departure_hours: Decimal,
    /// Day-by-day detail as recorded by the attendance source
    pub daily_breakdown: Option<serde_json::Value>,
    pub is_finalized: bool,
    pub finalized_at: Option<DateTime<Utc>>,
    pub finalized_by: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AttendanceSummary {
    /// Full-attendance record for a month without recorded attendance
    ///
    /// Days present equal the configured working days and regular hours are
    /// working days times hours per day. Weekend days are counted from the
    /// calendar.
    pub fn with_defaults(
        employee_id: i64,
        company_id: i64,
        year: i32,
        month: u32,
        working_days: u32,
        hours_per_day: Decimal,
    ) -> Result<Self> {
        let days_weekend = weekend_days_in_month(year, month)?;
        let working_days = i32::try_from(working_days).map_err(|_| {
            AppError::validation(format!("Working days out of range: {}", working_days))
        })?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            employee_id,
            company_id,
            year,
            month,
            total_working_days: working_days,
            days_present: working_days,
            days_absent: 0,
            days_weekend,
            days_holiday: 0,
            days_leave: 0,
            regular_hours: Decimal::from(working_days) * hours_per_day,
            overtime_hours: Decimal::ZERO,
            late_hours: Decimal::ZERO,
            early_departure_hours: Decimal::ZERO,
            daily_breakdown: None,
            is_finalized: false,
            finalized_at: None,
            finalized_by: None,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    /// Share of working days attended; 0 when the month has no working days
    pub fn attendance_ratio(&self) -> Decimal {
        if self.total_working_days <= 0 {
            return Decimal::ZERO;
        }

        Decimal::from(self.days_present) / Decimal::from(self.total_working_days.max(1))
    }

    pub fn attendance_percentage(&self) -> Decimal {
        self.attendance_ratio() * Decimal::ONE_HUNDRED
    }

    /// Working days the employee is paid for at the regular rate
    pub fn regular_pay_days(&self) -> Decimal {
        Decimal::from(self.total_working_days) * self.attendance_percentage()
            / Decimal::ONE_HUNDRED
    }

    pub fn overtime_amount(&self, hourly_rate: Decimal, multiplier: Decimal) -> Decimal {
        self.overtime_hours * hourly_rate * multiplier
    }

    pub fn month_name(&self) -> String {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name().to_string())
            .unwrap_or_else(|| self.month.to_string())
    }

    /// Lock the record; later attendance changes must go through a new period
    pub fn finalize(&mut self, user_id: i64) -> Result<()> {
        if self.is_finalized {
            return Err(AppError::validation(format!(
                "Attendance for {} {} is already finalized",
                self.month_name(),
                self.year
            )));
        }

        let now = Utc::now();
        self.is_finalized = true;
        self.finalized_at = Some(now);
        self.finalized_by = Some(user_id);
        self.updated_at = Some(now);

        Ok(())
    }
}

/// First and last day of a calendar month
pub(crate) fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::validation(format!("Invalid pay period: {}-{}", year, month)))?;

    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let end = next
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| AppError::validation(format!("Invalid pay period: {}-{}", year, month)))?;

    Ok((start, end))
}

fn weekend_days_in_month(year: i32, month: u32) -> Result<i32> {
    let (start, end) = month_bounds(year, month)?;

    let count = start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .count();

    Ok(count as i32)
}
