mod calculation_details;
mod payslip;
mod payslip_item;
mod payslip_status;

pub use calculation_details::{CalculationDetails, ItemBreakdown, AUTOMATED_METHOD};
pub use payslip::{Payslip, PayslipNumbering};
pub use payslip_item::PayslipItem;
pub use payslip_status::PayslipStatus;
