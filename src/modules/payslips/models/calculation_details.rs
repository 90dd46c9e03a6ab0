use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PayslipItem;
use crate::modules::components::ComponentKind;

pub const AUTOMATED_METHOD: &str = "automated";

/// Audit snapshot stored with a payslip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationDetails {
    /// RFC 3339 timestamp of the run
    pub calculation_date: String,
    pub calculation_method: String,
    pub items_breakdown: Vec<ItemBreakdown>,
    /// Manual amounts supplied for variable components, by component code
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub manual_amounts: BTreeMap<String, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemBreakdown {
    pub component: String,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub base_amount: Decimal,
    pub rate: Option<Decimal>,
    pub calculated_amount: Decimal,
    pub notes: Option<String>,
}

impl CalculationDetails {
    pub fn automated(
        calculated_at: DateTime<Utc>,
        items: &[PayslipItem],
        manual_amounts: BTreeMap<String, Decimal>,
    ) -> Self {
        Self {
            calculation_date: calculated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            calculation_method: AUTOMATED_METHOD.to_string(),
            items_breakdown: items.iter().map(ItemBreakdown::from).collect(),
            manual_amounts,
        }
    }
}

impl From<&PayslipItem> for ItemBreakdown {
    fn from(item: &PayslipItem) -> Self {
        Self {
            component: item.component_name.clone(),
            code: item.component_code.clone(),
            kind: item.component_kind,
            base_amount: item.base_amount,
            rate: item.rate,
            calculated_amount: item.calculated_amount,
            notes: item.calculation_notes.clone(),
        }
    }
}
