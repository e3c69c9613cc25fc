use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CompletionId, GoalId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GoalError {
    #[error("goal title cannot be empty")]
    EmptyTitle,

    #[error("desired weekly frequency must be > 0")]
    InvalidFrequency,
}

//
// ─── GOAL ──────────────────────────────────────────────────────────────────────
//

/// A recurring commitment with a target number of completions per week.
///
/// A goal only counts toward a week's expected total once it exists, i.e.
/// when `created_at` is on or before the last instant of that week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    id: GoalId,
    title: String,
    desired_weekly_frequency: u32,
    created_at: DateTime<Utc>,
}

impl Goal {
    /// Creates a new goal.
    ///
    /// # Errors
    ///
    /// Returns `GoalError::EmptyTitle` if the trimmed title is empty, or
    /// `GoalError::InvalidFrequency` if the weekly target is zero.
    pub fn new(
        id: GoalId,
        title: impl Into<String>,
        desired_weekly_frequency: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GoalError> {
        let title = title.into();
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(GoalError::EmptyTitle);
        }
        if desired_weekly_frequency == 0 {
            return Err(GoalError::InvalidFrequency);
        }

        Ok(Self {
            id,
            title: trimmed.to_string(),
            desired_weekly_frequency,
            created_at,
        })
    }

    /// Rehydrate a goal from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `GoalError` if the stored row violates the goal invariants.
    pub fn from_persisted(
        id: GoalId,
        title: String,
        desired_weekly_frequency: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, GoalError> {
        Self::new(id, title, desired_weekly_frequency, created_at)
    }

    #[must_use]
    pub fn id(&self) -> GoalId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn desired_weekly_frequency(&self) -> u32 {
        self.desired_weekly_frequency
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True when the goal exists at `instant`.
    #[must_use]
    pub fn exists_at(&self, instant: DateTime<Utc>) -> bool {
        self.created_at <= instant
    }
}

//
// ─── COMPLETIONS ───────────────────────────────────────────────────────────────
//

/// Record that a goal was completed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalCompletion {
    pub id: CompletionId,
    pub goal_id: GoalId,
    pub created_at: DateTime<Utc>,
}

impl GoalCompletion {
    #[must_use]
    pub fn new(id: CompletionId, goal_id: GoalId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            goal_id,
            created_at,
        }
    }
}

/// A completion joined to the title of the goal it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitledCompletion {
    pub completion: GoalCompletion,
    pub title: String,
}

impl TitledCompletion {
    #[must_use]
    pub fn new(completion: GoalCompletion, title: impl Into<String>) -> Self {
        Self {
            completion,
            title: title.into(),
        }
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completion.created_at
    }
}
