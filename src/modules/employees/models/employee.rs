use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Employee as seen by payroll: identity and tenant only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub company_id: i64,
}

impl Employee {
    pub fn new(id: i64, name: impl Into<String>, company_id: i64) -> Self {
        Self {
            id,
            name: name.into(),
            company_id,
        }
    }
}
