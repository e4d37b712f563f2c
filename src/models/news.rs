use chrono::{DateTime, Utc};
use serde::Serialize;

/// A published news item. The image, when present, is stored base64-encoded.
#[derive(Debug, Clone, Serialize)]
pub struct NewsItem {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating or replacing a news item.
#[derive(Debug, Clone)]
pub struct NewsDraft {
    pub title: String,
    pub content: String,
    pub image: Option<String>,
}
