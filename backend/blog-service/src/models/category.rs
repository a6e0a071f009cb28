use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Shared reference data. Not owned by any account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
}
