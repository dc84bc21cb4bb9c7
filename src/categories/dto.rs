use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::categories::repo::Category;
use crate::models::TxnKind;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TxnKind,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Query-string filters for the category listing.
#[derive(Debug, Deserialize, Default)]
pub struct CategoryQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TxnKind,
    pub color: String,
    pub icon: String,
    pub is_default: bool,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            kind: c.kind,
            color: c.color,
            icon: c.icon,
            is_default: c.is_default,
        }
    }
}
