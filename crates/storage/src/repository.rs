use async_trait::async_trait;
use chrono::{DateTime, Utc};
use goals_core::model::{Goal, GoalCompletion, GoalId, TitledCompletion};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Read contract for goals.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// List every goal created at or before `created_before`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried.
    async fn list_goals(&self, created_before: DateTime<Utc>) -> Result<Vec<Goal>, StorageError>;
}

/// Read contract for completions.
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// List completions with `from <= created_at <= to`, each joined to its
    /// goal's title, ordered by `created_at` ascending (ties by id).
    ///
    /// Completions whose goal is missing are not returned.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be queried.
    async fn list_completions(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TitledCompletion>, StorageError>;
}

/// Write path used for seeding and tests. The summary never needs it.
#[async_trait]
pub trait GoalWriteRepository: Send + Sync {
    /// Persist a new goal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id is taken, or other storage errors.
    async fn insert_goal(&self, goal: &Goal) -> Result<(), StorageError>;

    /// Record a completion for an existing goal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id is taken or the goal is unknown.
    async fn insert_completion(&self, completion: &GoalCompletion) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    goals: Arc<Mutex<HashMap<GoalId, Goal>>>,
    completions: Arc<Mutex<Vec<GoalCompletion>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            goals: Arc::new(Mutex::new(HashMap::new())),
            completions: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl GoalRepository for InMemoryRepository {
    async fn list_goals(&self, created_before: DateTime<Utc>) -> Result<Vec<Goal>, StorageError> {
        let guard = self
            .goals
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<Goal> = guard
            .values()
            .filter(|goal| goal.created_at() <= created_before)
            .cloned()
            .collect();
        found.sort_by_key(|goal| (goal.created_at(), goal.id()));
        Ok(found)
    }
}

#[async_trait]
impl CompletionRepository for InMemoryRepository {
    async fn list_completions(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TitledCompletion>, StorageError> {
        let goals = self
            .goals
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let completions = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut found: Vec<TitledCompletion> = completions
            .iter()
            .filter(|c| from <= c.created_at && c.created_at <= to)
            .filter_map(|c| {
                goals
                    .get(&c.goal_id)
                    .map(|goal| TitledCompletion::new(*c, goal.title()))
            })
            .collect();
        found.sort_by_key(|row| (row.completion.created_at, row.completion.id));
        Ok(found)
    }
}

#[async_trait]
impl GoalWriteRepository for InMemoryRepository {
    async fn insert_goal(&self, goal: &Goal) -> Result<(), StorageError> {
        let mut guard = self
            .goals
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.contains_key(&goal.id()) {
            return Err(StorageError::Conflict);
        }
        guard.insert(goal.id(), goal.clone());
        Ok(())
    }

    async fn insert_completion(&self, completion: &GoalCompletion) -> Result<(), StorageError> {
        let goals = self
            .goals
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if !goals.contains_key(&completion.goal_id) {
            return Err(StorageError::Conflict);
        }
        let mut guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.iter().any(|c| c.id == completion.id) {
            return Err(StorageError::Conflict);
        }
        guard.push(*completion);
        Ok(())
    }
}

/// Aggregates goal and completion repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub goals: Arc<dyn GoalRepository>,
    pub completions: Arc<dyn CompletionRepository>,
    pub writer: Arc<dyn GoalWriteRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    pub(crate) fn from_repository<R>(repo: R) -> Self
    where
        R: GoalRepository + CompletionRepository + GoalWriteRepository + Clone + 'static,
    {
        let goals: Arc<dyn GoalRepository> = Arc::new(repo.clone());
        let completions: Arc<dyn CompletionRepository> = Arc::new(repo.clone());
        let writer: Arc<dyn GoalWriteRepository> = Arc::new(repo);
        Self {
            goals,
            completions,
            writer,
        }
    }
}
