// botwizard-core/src/analytics/aggregate.rs
//
// Pure aggregation over message log slices. Bucketing is strictly by
// timestamp value; the log is usually timestamp-ordered per project but
// nothing here depends on it. Day buckets use the UTC calendar date,
// fixed system-wide. All rates and averages are zero when the denominator
// is zero.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Timelike;

use botwizard_common::models::analytics::{
    ChannelBreakdown, DayCount, FaqUsage, HourCount, OverviewStats, ProjectDetailStats,
    QuestionCount, UserActivityRow,
};
use botwizard_common::models::{Channel, FaqEntry, MessageLogEntry};

fn unique_user_count(entries: &[MessageLogEntry]) -> i64 {
    entries
        .iter()
        .filter_map(|e| e.user_id.as_deref())
        .collect::<HashSet<_>>()
        .len() as i64
}

/// Mean of the recorded latencies, rounded to whole milliseconds. Entries
/// without a latency are excluded from the mean; no latencies at all
/// means 0.
fn avg_response_time(entries: &[MessageLogEntry]) -> i64 {
    let latencies: Vec<i64> = entries.iter().filter_map(|e| e.response_time_ms).collect();
    if latencies.is_empty() {
        return 0;
    }
    let sum: i64 = latencies.iter().sum();
    (sum as f64 / latencies.len() as f64).round() as i64
}

/// Escalated share of all messages as a percentage with one decimal
/// place; 0 when there are no messages.
fn escalation_rate(entries: &[MessageLogEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let escalated = entries.iter().filter(|e| e.is_escalated).count();
    let rate = escalated as f64 / entries.len() as f64 * 100.0;
    (rate * 10.0).round() / 10.0
}

fn message_trend(entries: &[MessageLogEntry]) -> Vec<DayCount> {
    let mut by_day = BTreeMap::new();
    for e in entries {
        *by_day.entry(e.created_at.date_naive()).or_insert(0i64) += 1;
    }
    by_day
        .into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect()
}

/// Questions ranked by descending count; ties broken by earliest first
/// occurrence in the slice. Matching is by exact message text,
/// case-sensitive.
fn top_questions(entries: &[MessageLogEntry], limit: usize) -> Vec<QuestionCount> {
    struct Tally {
        count: i64,
        first_seen: usize,
    }

    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for (idx, e) in entries.iter().enumerate() {
        let Some(text) = e.message_text.as_deref() else {
            continue;
        };
        tallies
            .entry(text)
            .and_modify(|t| t.count += 1)
            .or_insert(Tally { count: 1, first_seen: idx });
    }

    let mut ranked: Vec<(&str, Tally)> = tallies.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.count
            .cmp(&a.1.count)
            .then(a.1.first_seen.cmp(&b.1.first_seen))
    });

    ranked
        .into_iter()
        .take(limit)
        .map(|(question, t)| QuestionCount {
            question: question.to_string(),
            count: t.count,
        })
        .collect()
}

pub fn overview(entries: &[MessageLogEntry], top_limit: usize) -> OverviewStats {
    OverviewStats {
        total_users: unique_user_count(entries),
        total_messages: entries.len() as i64,
        avg_response_time: avg_response_time(entries),
        escalation_rate: escalation_rate(entries),
        top_questions: top_questions(entries, top_limit),
        message_trend: message_trend(entries),
    }
}

/// All 24 hour-of-day buckets, summed across the whole range regardless
/// of date.
fn hourly_activity(entries: &[MessageLogEntry]) -> Vec<HourCount> {
    let mut counts = [0i64; 24];
    for e in entries {
        counts[e.created_at.hour() as usize] += 1;
    }
    counts
        .iter()
        .enumerate()
        .map(|(hour, &count)| HourCount { hour: hour as u32, count })
        .collect()
}

fn channel_breakdown(entries: &[MessageLogEntry], channels: &[Channel]) -> Vec<ChannelBreakdown> {
    channels
        .iter()
        .map(|ch| {
            let in_channel: Vec<&MessageLogEntry> =
                entries.iter().filter(|e| e.chat_id == ch.chat_id).collect();
            let unique_users = in_channel
                .iter()
                .filter_map(|e| e.user_id.as_deref())
                .collect::<HashSet<_>>()
                .len() as i64;
            ChannelBreakdown {
                channel_type: ch.channel_type.clone(),
                chat_title: ch.chat_title.clone(),
                message_count: in_channel.len() as i64,
                unique_users,
            }
        })
        .collect()
}

/// Usage attributed by substring containment of the FAQ answer within the
/// bot response. Lossy by design: one response may match several entries,
/// and editing an answer re-attributes history. Sorted by descending
/// usage, stable within ties.
fn faq_usage(entries: &[MessageLogEntry], faqs: &[FaqEntry]) -> Vec<FaqUsage> {
    let mut usage: Vec<FaqUsage> = faqs
        .iter()
        .map(|f| {
            let count = entries
                .iter()
                .filter(|e| {
                    e.bot_response
                        .as_deref()
                        .is_some_and(|r| r.contains(f.answer.as_str()))
                })
                .count() as i64;
            FaqUsage {
                question: f.question.clone(),
                answer: f.answer.clone(),
                usage_count: count,
            }
        })
        .collect();

    usage.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
    usage
}

pub fn project_detail(
    entries: &[MessageLogEntry],
    channels: &[Channel],
    faqs: &[FaqEntry],
) -> ProjectDetailStats {
    ProjectDetailStats {
        unique_users: unique_user_count(entries),
        total_messages: entries.len() as i64,
        avg_response_time: avg_response_time(entries),
        escalation_rate: escalation_rate(entries),
        channels: channel_breakdown(entries, channels),
        hourly_activity: hourly_activity(entries),
        faq_effectiveness: faq_usage(entries, faqs),
    }
}

/// Per-user totals, busiest first, truncated to `limit`. Ties are broken
/// by user id for a deterministic order.
pub fn user_activity(entries: &[MessageLogEntry], limit: usize) -> Vec<UserActivityRow> {
    struct UserTally<'a> {
        entries: Vec<&'a MessageLogEntry>,
    }

    let mut by_user: HashMap<&str, UserTally> = HashMap::new();
    for e in entries {
        let Some(user_id) = e.user_id.as_deref() else {
            continue;
        };
        by_user
            .entry(user_id)
            .or_insert_with(|| UserTally { entries: Vec::new() })
            .entries
            .push(e);
    }

    let mut rows: Vec<UserActivityRow> = by_user
        .into_iter()
        .filter_map(|(user_id, tally)| {
            let first = tally.entries.iter().map(|e| e.created_at).min()?;
            let last = tally.entries.iter().map(|e| e.created_at).max()?;
            let latencies: Vec<i64> = tally
                .entries
                .iter()
                .filter_map(|e| e.response_time_ms)
                .collect();
            let avg = if latencies.is_empty() {
                0
            } else {
                (latencies.iter().sum::<i64>() as f64 / latencies.len() as f64).round() as i64
            };

            Some(UserActivityRow {
                user_id: user_id.to_string(),
                message_count: tally.entries.len() as i64,
                first_message: first,
                last_message: last,
                avg_response_time: avg,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.message_count
            .cmp(&a.message_count)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    rows.truncate(limit);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn entry(
        project_id: Uuid,
        user: &str,
        text: &str,
        latency: i64,
        escalated: bool,
        created_at: chrono::DateTime<Utc>,
    ) -> MessageLogEntry {
        MessageLogEntry {
            message_id: Uuid::new_v4(),
            project_id,
            chat_id: "chat-1".into(),
            user_id: Some(user.to_string()),
            message_text: Some(text.to_string()),
            bot_response: None,
            response_time_ms: Some(latency),
            is_escalated: escalated,
            created_at,
        }
    }

    #[test]
    fn overview_of_empty_log_is_all_zeros() {
        let stats = overview(&[], 10);
        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.total_messages, 0);
        assert_eq!(stats.avg_response_time, 0);
        assert_eq!(stats.escalation_rate, 0.0);
        assert!(stats.top_questions.is_empty());
        assert!(stats.message_trend.is_empty());
    }

    #[test]
    fn overview_matches_the_documented_scenario() {
        // 10 messages, 2 escalated, latencies 100..=1000ms.
        let project = Uuid::new_v4();
        let now = Utc::now();
        let entries: Vec<MessageLogEntry> = (0..10)
            .map(|i| {
                entry(
                    project,
                    &format!("user-{i}"),
                    "when is the next class?",
                    (i as i64 + 1) * 100,
                    i < 2,
                    now - Duration::hours(i as i64),
                )
            })
            .collect();

        let stats = overview(&entries, 10);
        assert_eq!(stats.total_messages, 10);
        assert_eq!(stats.total_users, 10);
        assert_eq!(stats.avg_response_time, 550);
        assert_eq!(stats.escalation_rate, 20.0);
    }

    #[test]
    fn escalation_rate_keeps_one_decimal() {
        let project = Uuid::new_v4();
        let now = Utc::now();
        let entries: Vec<MessageLogEntry> = (0..3)
            .map(|i| entry(project, "u", "q", 100, i == 0, now))
            .collect();

        // 1/3 = 33.333... -> 33.3
        assert_eq!(escalation_rate(&entries), 33.3);
    }

    #[test]
    fn top_questions_rank_by_count_then_first_occurrence() {
        let project = Uuid::new_v4();
        let now = Utc::now();
        let texts = ["b", "a", "b", "c", "a", "b"];
        let entries: Vec<MessageLogEntry> = texts
            .iter()
            .map(|t| entry(project, "u", t, 100, false, now))
            .collect();

        let top = top_questions(&entries, 10);
        assert_eq!(top[0].question, "b");
        assert_eq!(top[0].count, 3);
        assert_eq!(top[1].question, "a");
        assert_eq!(top[1].count, 2);
        assert_eq!(top[2].question, "c");
        assert_eq!(top[2].count, 1);

        // "x" and "y" both appear once; "x" occurs first and must come
        // first in the ranking.
        let entries: Vec<MessageLogEntry> = ["x", "y"]
            .iter()
            .map(|t| entry(project, "u", t, 100, false, now))
            .collect();
        let top = top_questions(&entries, 10);
        assert_eq!(top[0].question, "x");
        assert_eq!(top[1].question, "y");
    }

    #[test]
    fn top_questions_respects_the_limit() {
        let project = Uuid::new_v4();
        let now = Utc::now();
        let entries: Vec<MessageLogEntry> = (0..20)
            .map(|i| entry(project, "u", &format!("q-{i}"), 100, false, now))
            .collect();

        assert_eq!(top_questions(&entries, 10).len(), 10);
    }

    #[test]
    fn message_trend_buckets_by_utc_calendar_date() {
        let project = Uuid::new_v4();
        let d1 = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 0).unwrap();
        let d2 = Utc.with_ymd_and_hms(2025, 3, 2, 0, 1, 0).unwrap();
        let entries = vec![
            entry(project, "u", "q", 100, false, d1),
            entry(project, "u", "q", 100, false, d2),
            entry(project, "u", "q", 100, false, d2),
        ];

        let trend = message_trend(&entries);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].date, d1.date_naive());
        assert_eq!(trend[0].count, 1);
        assert_eq!(trend[1].date, d2.date_naive());
        assert_eq!(trend[1].count, 2);
    }

    #[test]
    fn hourly_activity_sums_across_days() {
        let project = Uuid::new_v4();
        let day1 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2025, 3, 2, 9, 30, 0).unwrap();
        let entries = vec![
            entry(project, "u", "q", 100, false, day1),
            entry(project, "u", "q", 100, false, day2),
        ];

        let hours = hourly_activity(&entries);
        assert_eq!(hours.len(), 24);
        assert_eq!(hours[9].count, 2);
        assert_eq!(hours[10].count, 0);
    }

    #[test]
    fn bucketing_does_not_depend_on_entry_order() {
        let project = Uuid::new_v4();
        let now = Utc::now();
        let mut entries = vec![
            entry(project, "u1", "q", 100, false, now),
            entry(project, "u2", "q", 200, false, now - Duration::days(1)),
            entry(project, "u3", "q", 300, true, now - Duration::hours(2)),
        ];
        let forward = overview(&entries, 10);
        entries.reverse();
        let backward = overview(&entries, 10);

        assert_eq!(forward.total_messages, backward.total_messages);
        assert_eq!(forward.message_trend, backward.message_trend);
        assert_eq!(forward.escalation_rate, backward.escalation_rate);
    }

    #[test]
    fn faq_usage_counts_substring_matches() {
        let project = Uuid::new_v4();
        let now = Utc::now();
        let mut e1 = entry(project, "u", "q", 100, false, now);
        e1.bot_response = Some("Classes start at 5pm on Monday.".into());
        let mut e2 = entry(project, "u", "q", 100, false, now);
        e2.bot_response = Some("Please pay by the 5th.".into());

        let faqs = vec![
            FaqEntry {
                faq_id: Uuid::new_v4(),
                project_id: project,
                question: "When do classes start?".into(),
                answer: "start at 5pm".into(),
                keywords: None,
                priority: 0,
                is_active: true,
            },
            FaqEntry {
                faq_id: Uuid::new_v4(),
                project_id: project,
                question: "Unused".into(),
                answer: "never matched".into(),
                keywords: None,
                priority: 0,
                is_active: true,
            },
        ];

        let usage = faq_usage(&[e1, e2], &faqs);
        assert_eq!(usage[0].question, "When do classes start?");
        assert_eq!(usage[0].usage_count, 1);
        assert_eq!(usage[1].usage_count, 0);
    }

    #[test]
    fn channel_breakdown_counts_per_chat() {
        let project = Uuid::new_v4();
        let now = Utc::now();
        let mut e1 = entry(project, "u1", "q", 100, false, now);
        e1.chat_id = "chat-parents".into();
        let mut e2 = entry(project, "u2", "q", 100, false, now);
        e2.chat_id = "chat-parents".into();
        let mut e3 = entry(project, "u1", "q", 100, false, now);
        e3.chat_id = "chat-staff".into();

        let channels = vec![
            Channel {
                channel_id: Uuid::new_v4(),
                project_id: project,
                channel_type: "parents".into(),
                chat_id: "chat-parents".into(),
                chat_title: Some("Parents".into()),
                is_active: true,
                created_at: now,
            },
            Channel {
                channel_id: Uuid::new_v4(),
                project_id: project,
                channel_type: "staff".into(),
                chat_id: "chat-staff".into(),
                chat_title: Some("Staff".into()),
                is_active: true,
                created_at: now,
            },
        ];

        let breakdown = channel_breakdown(&[e1, e2, e3], &channels);
        assert_eq!(breakdown[0].message_count, 2);
        assert_eq!(breakdown[0].unique_users, 2);
        assert_eq!(breakdown[1].message_count, 1);
        assert_eq!(breakdown[1].unique_users, 1);
    }

    #[test]
    fn user_activity_orders_and_truncates() {
        let project = Uuid::new_v4();
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut entries = Vec::new();
        for i in 0..3 {
            entries.push(entry(project, "busy", "q", 100, false, base + Duration::hours(i)));
        }
        entries.push(entry(project, "quiet", "q", 400, false, base));

        let rows = user_activity(&entries, 50);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, "busy");
        assert_eq!(rows[0].message_count, 3);
        assert_eq!(rows[0].first_message, base);
        assert_eq!(rows[0].last_message, base + Duration::hours(2));
        assert_eq!(rows[0].avg_response_time, 100);
        assert_eq!(rows[1].user_id, "quiet");

        let rows = user_activity(&entries, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, "busy");
    }

    #[test]
    fn entries_without_latency_do_not_skew_the_average() {
        let project = Uuid::new_v4();
        let now = Utc::now();
        let e1 = entry(project, "u", "q", 100, false, now);
        let e2 = entry(project, "u", "q", 300, false, now);
        let mut e3 = entry(project, "u", "q", 0, false, now);
        e3.response_time_ms = None;

        assert_eq!(avg_response_time(&[e1, e2, e3]), 200);
    }
}
