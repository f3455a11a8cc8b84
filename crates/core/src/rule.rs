use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub user_id: UserId,
    pub name: String,
}

/// Assigns `category_id` to any transaction whose description contains `needle`.
/// Lower `position` wins when several rules match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub id: i64,
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub needle: String,
    pub position: i64,
}
