use serde::{Deserialize, Serialize};

/// Payslip lifecycle state
///
/// ```text
/// Draft --process--> Pending --approve--> Approved --mark_paid--> Paid
///   \                  |                     |
///    +-----------------+------cancel---------+--> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayslipStatus {
    /// Calculated, still editable and recalculable
    Draft,
    /// Submitted for approval
    Pending,
    Approved,
    Paid,
    Cancelled,
}

impl Default for PayslipStatus {
    fn default() -> Self {
        PayslipStatus::Draft
    }
}

impl PayslipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: PayslipStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Pending)
                | (Self::Pending, Self::Approved)
                | (Self::Approved, Self::Paid)
                | (Self::Draft, Self::Cancelled)
                | (Self::Pending, Self::Cancelled)
                | (Self::Approved, Self::Cancelled)
        )
    }
}

impl std::fmt::Display for PayslipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for PayslipStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid payslip status: {}", value)),
        }
    }
}
