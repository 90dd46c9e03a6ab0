use std::sync::Arc;

use tracing::info;

use crate::core::{AppError, Result};
use crate::modules::payslips::models::Payslip;
use crate::modules::payslips::repositories::PayslipRepository;

/// Payslip lookups and lifecycle transitions
pub struct PayslipService {
    payslips: Arc<dyn PayslipRepository>,
}

impl PayslipService {
    pub fn new(payslips: Arc<dyn PayslipRepository>) -> Self {
        Self { payslips }
    }

    pub async fn find(&self, id: &str) -> Result<Payslip> {
        self.payslips
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payslip with id '{}' not found", id)))
    }

    pub async fn list_for_period(
        &self,
        company_id: Option<i64>,
        year: i32,
        month: u32,
    ) -> Result<Vec<Payslip>> {
        self.payslips.list_for_period(company_id, year, month).await
    }

    /// Submit a draft for approval
    pub async fn process(&self, id: &str, user_id: i64) -> Result<Payslip> {
        self.transition(id, "processed", |payslip| payslip.process(user_id))
            .await
    }

    pub async fn approve(&self, id: &str, user_id: i64) -> Result<Payslip> {
        self.transition(id, "approved", |payslip| payslip.approve(user_id))
            .await
    }

    pub async fn mark_paid(&self, id: &str, user_id: i64) -> Result<Payslip> {
        self.transition(id, "paid", |payslip| payslip.mark_paid(user_id))
            .await
    }

    /// Cancel from Draft, Pending or Approved; paid payslips cannot be cancelled
    pub async fn cancel(&self, id: &str, user_id: i64, reason: Option<&str>) -> Result<Payslip> {
        self.transition(id, "cancelled", |payslip| payslip.cancel(user_id, reason))
            .await
    }

    async fn transition<F>(&self, id: &str, outcome: &str, apply: F) -> Result<Payslip>
    where
        F: FnOnce(&mut Payslip) -> Result<()>,
    {
        let mut payslip = self.find(id).await?;
        let previous = payslip.status;

        apply(&mut payslip)?;
        self.payslips.update_status(&payslip).await?;

        info!(
            payslip_id = payslip.id.as_str(),
            payslip_number = payslip.payslip_number.as_str(),
            from = previous.as_str(),
            to = payslip.status.as_str(),
            "Payslip {}",
            outcome
        );

        Ok(payslip)
    }
}
