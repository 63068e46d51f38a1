use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Named dashboard time range. Resolution is "now minus N days" through
/// "now"; an unrecognized name falls back to seven days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    OneDay,
    SevenDays,
    ThirtyDays,
    NinetyDays,
}

impl TimeRange {
    pub fn parse(name: &str) -> Self {
        match name {
            "1d" => TimeRange::OneDay,
            "7d" => TimeRange::SevenDays,
            "30d" => TimeRange::ThirtyDays,
            "90d" => TimeRange::NinetyDays,
            _ => TimeRange::SevenDays,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            TimeRange::OneDay => 1,
            TimeRange::SevenDays => 7,
            TimeRange::ThirtyDays => 30,
            TimeRange::NinetyDays => 90,
        }
    }

    pub fn start_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::SevenDays
    }
}

/// Which projects a query covers: one project, or everything owned by a
/// dashboard user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsScope {
    Project(Uuid),
    Owner(Uuid),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QuestionCount {
    pub question: String,
    pub count: i64,
}

/// Cross-project dashboard summary.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub total_users: i64,
    pub total_messages: i64,
    /// Rounded to whole milliseconds; 0 when there are no messages.
    pub avg_response_time: i64,
    /// Percentage with one decimal place; 0 when there are no messages.
    pub escalation_rate: f64,
    pub top_questions: Vec<QuestionCount>,
    pub message_trend: Vec<DayCount>,
}

impl OverviewStats {
    pub fn empty() -> Self {
        Self {
            total_users: 0,
            total_messages: 0,
            avg_response_time: 0,
            escalation_rate: 0.0,
            top_questions: Vec::new(),
            message_trend: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelBreakdown {
    pub channel_type: String,
    pub chat_title: Option<String>,
    pub message_count: i64,
    pub unique_users: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HourCount {
    /// Hour of day, 0-23, regardless of date.
    pub hour: u32,
    pub count: i64,
}

/// FAQ usage attributed by substring containment of the FAQ answer within
/// the bot response. Approximate; one response may count toward several
/// FAQ entries.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FaqUsage {
    pub question: String,
    pub answer: String,
    pub usage_count: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetailStats {
    pub unique_users: i64,
    pub total_messages: i64,
    pub avg_response_time: i64,
    pub escalation_rate: f64,
    pub channels: Vec<ChannelBreakdown>,
    pub hourly_activity: Vec<HourCount>,
    pub faq_effectiveness: Vec<FaqUsage>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserActivityRow {
    pub user_id: String,
    pub message_count: i64,
    pub first_message: DateTime<Utc>,
    pub last_message: DateTime<Utc>,
    pub avg_response_time: i64,
}
