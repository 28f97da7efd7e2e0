use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Administrator-defined keyword blocked from captions.
///
/// Matching is case-insensitive and substring-based; only active entries
/// participate in checks. All mutation happens through the admin surface.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlacklistEntry {
    pub id: i64,
    /// Stored lowercase; uniqueness is enforced case-insensitively
    pub keyword: String,
    /// Free-form grouping: general, hate, spam, adult, ...
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl BlacklistEntry {
    /// Convenience constructor for tests and seeds.
    pub fn active(id: i64, keyword: &str) -> Self {
        Self {
            id,
            keyword: keyword.to_lowercase(),
            category: "general".into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
