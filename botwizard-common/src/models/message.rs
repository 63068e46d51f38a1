use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One bot interaction in the append-only message log. Immutable once
/// written; the basis for all analytics.
#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct MessageLogEntry {
    pub message_id: Uuid,
    pub project_id: Uuid,
    pub chat_id: String,
    /// Telegram user id as reported by the platform. Absent for channel
    /// posts with no author.
    pub user_id: Option<String>,
    pub message_text: Option<String>,
    pub bot_response: Option<String>,
    /// Response latency in milliseconds.
    pub response_time_ms: Option<i64>,
    pub is_escalated: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct Channel {
    pub channel_id: Uuid,
    pub project_id: Uuid,
    /// 'parents', 'staff' or 'announcements'.
    pub channel_type: String,
    pub chat_id: String,
    pub chat_title: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct FaqEntry {
    pub faq_id: Uuid,
    pub project_id: Uuid,
    pub question: String,
    pub answer: String,
    /// JSON array of keywords, kept as raw text like the bot stores it.
    pub keywords: Option<String>,
    pub priority: i32,
    pub is_active: bool,
}
