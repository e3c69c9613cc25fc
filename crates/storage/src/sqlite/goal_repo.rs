use chrono::{DateTime, Utc};
use goals_core::model::{Goal, GoalCompletion};

use super::{
    SqliteRepository,
    mapping::{id_i64, map_goal_row, ts_bound_nanos, ts_to_nanos, write_err},
};
use crate::repository::{GoalRepository, GoalWriteRepository, StorageError};

#[async_trait::async_trait]
impl GoalRepository for SqliteRepository {
    async fn list_goals(&self, created_before: DateTime<Utc>) -> Result<Vec<Goal>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, title, desired_weekly_frequency, created_at
                FROM goals
                WHERE created_at <= ?1
                ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(ts_bound_nanos(created_before))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_goal_row(&row)?);
        }
        tracing::debug!(rows = out.len(), %created_before, "listed goals");
        Ok(out)
    }
}

#[async_trait::async_trait]
impl GoalWriteRepository for SqliteRepository {
    async fn insert_goal(&self, goal: &Goal) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO goals (id, title, desired_weekly_frequency, created_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(id_i64("goal_id", goal.id().value())?)
        .bind(goal.title())
        .bind(i64::from(goal.desired_weekly_frequency()))
        .bind(ts_to_nanos("created_at", goal.created_at())?)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        Ok(())
    }

    async fn insert_completion(&self, completion: &GoalCompletion) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO goal_completions (id, goal_id, created_at)
                VALUES (?1, ?2, ?3)
            ",
        )
        .bind(id_i64("completion_id", completion.id.value())?)
        .bind(id_i64("goal_id", completion.goal_id.value())?)
        .bind(ts_to_nanos("created_at", completion.created_at)?)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        Ok(())
    }
}
