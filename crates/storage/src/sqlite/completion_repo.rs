use chrono::{DateTime, Utc};
use goals_core::model::TitledCompletion;

use super::{
    SqliteRepository,
    mapping::{map_titled_completion_row, ts_bound_nanos},
};
use crate::repository::{CompletionRepository, StorageError};

#[async_trait::async_trait]
impl CompletionRepository for SqliteRepository {
    async fn list_completions(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TitledCompletion>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT c.id, c.goal_id, c.created_at, g.title
                FROM goal_completions c
                INNER JOIN goals g ON g.id = c.goal_id
                WHERE c.created_at >= ?1 AND c.created_at <= ?2
                ORDER BY c.created_at ASC, c.id ASC
            ",
        )
        .bind(ts_bound_nanos(from))
        .bind(ts_bound_nanos(to))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_titled_completion_row(&row)?);
        }
        tracing::debug!(rows = out.len(), %from, %to, "listed completions");
        Ok(out)
    }
}
