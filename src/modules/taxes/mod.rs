pub mod models;
pub mod services;

pub use models::{TaxBracket, TaxBracketTable};
pub use services::IncomeTaxCalculator;
