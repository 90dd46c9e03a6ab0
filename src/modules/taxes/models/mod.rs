mod tax_bracket;

pub use tax_bracket::{TaxBracket, TaxBracketTable};
