use chrono::{DateTime, Utc};
use goals_core::model::{CompletionId, Goal, GoalCompletion, GoalId, TitledCompletion};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn goal_id_from_i64(v: i64) -> Result<GoalId, StorageError> {
    Ok(GoalId::new(i64_to_u64("goal_id", v)?))
}

pub(crate) fn completion_id_from_i64(v: i64) -> Result<CompletionId, StorageError> {
    Ok(CompletionId::new(i64_to_u64("completion_id", v)?))
}

/// Instants are stored as unix nanoseconds so range filters compare numbers, not text,
/// at the full precision of `DateTime<Utc>`.
pub(crate) fn ts_to_nanos(field: &'static str, ts: DateTime<Utc>) -> Result<i64, StorageError> {
    ts.timestamp_nanos_opt()
        .ok_or_else(|| StorageError::Serialization(format!("{field} out of range: {ts}")))
}

/// Query bound in unix nanoseconds. Stored values always fit in `i64`, so a bound
/// past either end clamps to it.
pub(crate) fn ts_bound_nanos(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_nanos_opt()
        .unwrap_or(if ts.timestamp() < 0 { i64::MIN } else { i64::MAX })
}

pub(crate) fn ts_from_nanos(v: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_nanos(v)
}

/// Maps write failures: constraint violations become `Conflict`, everything else is a
/// connection problem.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
            StorageError::Conflict
        }
        _ => StorageError::Connection(e.to_string()),
    }
}

pub(crate) fn map_goal_row(row: &sqlx::sqlite::SqliteRow) -> Result<Goal, StorageError> {
    let frequency_i64: i64 = row.try_get("desired_weekly_frequency").map_err(ser)?;
    let frequency = u32::try_from(frequency_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid desired_weekly_frequency: {frequency_i64}"))
    })?;

    Goal::from_persisted(
        goal_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        frequency,
        ts_from_nanos(row.try_get::<i64, _>("created_at").map_err(ser)?),
    )
    .map_err(ser)
}

pub(crate) fn map_titled_completion_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<TitledCompletion, StorageError> {
    let completion = GoalCompletion::new(
        completion_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        goal_id_from_i64(row.try_get::<i64, _>("goal_id").map_err(ser)?)?,
        ts_from_nanos(row.try_get::<i64, _>("created_at").map_err(ser)?),
    );
    Ok(TitledCompletion::new(
        completion,
        row.try_get::<String, _>("title").map_err(ser)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use goals_core::time::fixed_now;

    #[test]
    fn nanos_keep_sub_millisecond_instants() {
        let now = fixed_now() + chrono::Duration::nanoseconds(250_500_007);
        let back = ts_from_nanos(ts_to_nanos("created_at", now).unwrap());
        assert_eq!(back, now);
    }

    #[test]
    fn out_of_range_instants_are_rejected_on_write_and_clamped_as_bounds() {
        assert!(matches!(
            ts_to_nanos("created_at", DateTime::<Utc>::MAX_UTC),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(ts_bound_nanos(DateTime::<Utc>::MAX_UTC), i64::MAX);
        assert_eq!(ts_bound_nanos(DateTime::<Utc>::MIN_UTC), i64::MIN);
        assert_eq!(
            ts_bound_nanos(fixed_now()),
            ts_to_nanos("created_at", fixed_now()).unwrap()
        );
    }

    #[test]
    fn negative_ids_are_rejected() {
        assert!(matches!(
            goal_id_from_i64(-1),
            Err(StorageError::Serialization(_))
        ));
        assert!(matches!(
            id_i64("goal_id", u64::MAX),
            Err(StorageError::Serialization(_))
        ));
    }
}
