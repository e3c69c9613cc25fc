//! Demo data for local runs: a handful of goals and a spread of completions
//! over the days leading up to a reference instant.

use chrono::{DateTime, Duration, Utc};
use goals_core::model::{CompletionId, Goal, GoalCompletion, GoalError, GoalId};
use thiserror::Error;

use crate::repository::{Storage, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Goal(#[from] GoalError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Counts written by `seed_demo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub goals: usize,
    pub completions: usize,
}

impl SeedReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.goals == 0 && self.completions == 0
    }
}

const DEMO_GOALS: [(&str, u32, i64); 3] = [
    ("Drink water", 7, 21),
    ("Exercise", 3, 14),
    ("Read 20 pages", 5, 1),
];

/// (goal index, hours before `now`)
const DEMO_COMPLETIONS: [(usize, i64); 8] = [
    (0, 1),
    (2, 3),
    (0, 26),
    (1, 28),
    (0, 50),
    (1, 75),
    (0, 98),
    (2, 12),
];

/// Write the demo goals and completions relative to `now`.
///
/// Does nothing when any goal already exists, so it is safe to run twice.
///
/// # Errors
///
/// Returns `SeedError` if a record is invalid or cannot be stored.
pub async fn seed_demo(storage: &Storage, now: DateTime<Utc>) -> Result<SeedReport, SeedError> {
    if !storage.goals.list_goals(DateTime::<Utc>::MAX_UTC).await?.is_empty() {
        tracing::info!("goals already present; skipping seed");
        return Ok(SeedReport {
            goals: 0,
            completions: 0,
        });
    }

    let mut goals = Vec::with_capacity(DEMO_GOALS.len());
    for (idx, (title, frequency, days_ago)) in DEMO_GOALS.iter().enumerate() {
        let goal = Goal::new(
            GoalId::new(idx as u64 + 1),
            *title,
            *frequency,
            now - Duration::days(*days_ago),
        )?;
        storage.writer.insert_goal(&goal).await?;
        goals.push(goal);
    }

    let mut completions = 0;
    for (idx, (goal_idx, hours_ago)) in DEMO_COMPLETIONS.iter().enumerate() {
        let completion = GoalCompletion::new(
            CompletionId::new(idx as u64 + 1),
            goals[*goal_idx].id(),
            now - Duration::hours(*hours_ago),
        );
        storage.writer.insert_completion(&completion).await?;
        completions += 1;
    }

    tracing::info!(goals = goals.len(), completions, "seeded demo data");
    Ok(SeedReport {
        goals: goals.len(),
        completions,
    })
}
