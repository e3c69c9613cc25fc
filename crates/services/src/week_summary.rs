use chrono::{DateTime, Utc};
use std::sync::Arc;

use goals_core::model::WeekSummary;
use goals_core::{WeekPolicy, WeekWindow};
use storage::repository::{CompletionRepository, GoalRepository, InMemoryRepository, Storage};

use crate::Clock;
use crate::error::SummaryError;

/// Computes weekly progress from the goal and completion repositories.
///
/// This service owns:
/// - the time source (`Clock`) for "this week"
/// - the week policy (canonical offset for week edges and day keys)
/// - read-only repository access
///
/// Every call recomputes from storage; nothing is cached between calls.
#[derive(Clone)]
pub struct WeekSummaryService {
    clock: Clock,
    policy: WeekPolicy,
    goals: Arc<dyn GoalRepository>,
    completions: Arc<dyn CompletionRepository>,
}

impl WeekSummaryService {
    #[must_use]
    pub fn new(
        clock: Clock,
        policy: WeekPolicy,
        goals: Arc<dyn GoalRepository>,
        completions: Arc<dyn CompletionRepository>,
    ) -> Self {
        Self {
            clock,
            policy,
            goals,
            completions,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, policy: WeekPolicy, storage: &Storage) -> Self {
        Self::new(
            clock,
            policy,
            Arc::clone(&storage.goals),
            Arc::clone(&storage.completions),
        )
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        let repo = InMemoryRepository::new();
        Self::new(
            clock,
            WeekPolicy::utc(),
            Arc::new(repo.clone()),
            Arc::new(repo),
        )
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The inclusive window the summary for `now` covers.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::InvalidInput` if the week cannot be represented.
    pub fn week_window(&self, now: DateTime<Utc>) -> Result<WeekWindow, SummaryError> {
        Ok(WeekWindow::containing(now, &self.policy)?)
    }

    /// Summarise the week containing `now`.
    ///
    /// Reads the goals created by the end of the week and the completions
    /// inside it, then folds them into one `WeekSummary`. Either the whole
    /// summary is returned or an error; there is no partial result.
    ///
    /// # Errors
    ///
    /// Returns `SummaryError::InvalidInput` before any read if the window
    /// cannot be computed, and `SummaryError::Storage` with the repository's
    /// error when a read fails.
    pub async fn compute_week_summary(
        &self,
        now: DateTime<Utc>,
    ) -> Result<WeekSummary, SummaryError> {
        let window = self.week_window(now)?;
        tracing::debug!(
            %now,
            start = %window.start(),
            end = %window.end(),
            "computing week summary"
        );

        let goals = self
            .goals
            .list_goals(window.end())
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "listing goals failed"))?;
        let completions = self
            .completions
            .list_completions(window.start(), window.end())
            .await
            .inspect_err(|err| tracing::warn!(error = %err, "listing completions failed"))?;

        let summary = WeekSummary::aggregate(&window, &goals, completions);
        tracing::debug!(
            completed = summary.completed(),
            total = summary.total(),
            days = summary.goals_per_day().len(),
            "week summary ready"
        );
        Ok(summary)
    }

    /// Summarise the week containing the clock's current time.
    ///
    /// # Errors
    ///
    /// Same as `compute_week_summary`.
    pub async fn current_week_summary(&self) -> Result<WeekSummary, SummaryError> {
        self.compute_week_summary(self.clock.now()).await
    }
}
