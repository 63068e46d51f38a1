// botwizard-core/src/analytics/mod.rs
//
// Dashboard statistics over the append-only message log. The aggregation
// itself is pure and synchronous (see `aggregate`); this service resolves
// the query scope to project ids, fetches the rows, and delegates.

pub mod aggregate;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::Error;
use botwizard_common::models::analytics::{
    AnalyticsScope, OverviewStats, ProjectDetailStats, TimeRange, UserActivityRow,
};
use botwizard_common::traits::repository_traits::{
    ChannelRepository, FaqRepository, MessageLogRepository, ProjectRepository,
};

pub const DEFAULT_TOP_QUESTIONS: usize = 10;
pub const DEFAULT_USER_LIMIT: usize = 50;

pub struct AnalyticsService {
    projects: Arc<dyn ProjectRepository>,
    messages: Arc<dyn MessageLogRepository>,
    faqs: Arc<dyn FaqRepository>,
    channels: Arc<dyn ChannelRepository>,
}

impl AnalyticsService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        messages: Arc<dyn MessageLogRepository>,
        faqs: Arc<dyn FaqRepository>,
        channels: Arc<dyn ChannelRepository>,
    ) -> Self {
        Self {
            projects,
            messages,
            faqs,
            channels,
        }
    }

    async fn resolve_scope(&self, scope: AnalyticsScope) -> Result<Vec<Uuid>, Error> {
        match scope {
            AnalyticsScope::Project(id) => Ok(vec![id]),
            AnalyticsScope::Owner(user_id) => self.projects.project_ids_for_owner(user_id).await,
        }
    }

    /// Cross-project dashboard summary. A scope resolving to no projects
    /// yields the zeroed shape rather than an error, so brand-new
    /// accounts get an empty dashboard.
    pub async fn overview(
        &self,
        scope: AnalyticsScope,
        range: TimeRange,
    ) -> Result<OverviewStats, Error> {
        let project_ids = self.resolve_scope(scope).await?;
        if project_ids.is_empty() {
            return Ok(OverviewStats::empty());
        }

        let now = Utc::now();
        let entries = self
            .messages
            .fetch_in_range(&project_ids, range.start_from(now), now)
            .await?;

        Ok(aggregate::overview(&entries, DEFAULT_TOP_QUESTIONS))
    }

    /// Per-project detail with channel breakdown, hourly activity and FAQ
    /// usage.
    pub async fn project_detail(
        &self,
        project_id: Uuid,
        range: TimeRange,
    ) -> Result<ProjectDetailStats, Error> {
        let now = Utc::now();
        let entries = self
            .messages
            .fetch_in_range(&[project_id], range.start_from(now), now)
            .await?;
        let channels = self.channels.active_for_project(project_id).await?;
        let faqs = self.faqs.active_for_project(project_id).await?;

        Ok(aggregate::project_detail(&entries, &channels, &faqs))
    }

    /// Most active users in the scope, busiest first.
    pub async fn user_activity(
        &self,
        scope: AnalyticsScope,
        range: TimeRange,
        limit: Option<usize>,
    ) -> Result<Vec<UserActivityRow>, Error> {
        let project_ids = self.resolve_scope(scope).await?;
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let entries = self
            .messages
            .fetch_in_range(&project_ids, range.start_from(now), now)
            .await?;

        Ok(aggregate::user_activity(
            &entries,
            limit.unwrap_or(DEFAULT_USER_LIMIT),
        ))
    }
}
